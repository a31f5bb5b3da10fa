//! End-to-end collection building.
//!
//! Text input flows through [`extract_references`], set expansion, batched
//! checksum lookup and deduplication before a single collection file is
//! written. osu!collector dumps skip straight to deduplication.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::collection::{
    ChecksumSet, CollectionError, CollectionFile, collection_path, normalize_name, write_collection,
};
use crate::collector::{CollectorClient, CollectorError, CollectorFilter};
use crate::parser::{ClassifiedReference, ExtractionResult, extract_references};
use crate::resolver::{CatalogApi, ChecksumResolver, ResolveError, SetResolver};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input file could not be read
    #[error("cannot read input '{}': {source}\n  Suggestion: Check the input file path", path.display())]
    Input {
        /// Input path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created
    #[error("cannot create output directory '{}': {source}", path.display())]
    OutputDir {
        /// Output directory
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Resolving references through the API failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Dumping from osu!collector failed
    #[error(transparent)]
    Collector(#[from] CollectorError),

    /// Building or writing the collection file failed
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Whether lookup failures are skipped instead of aborting the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IgnorePolicy {
    /// Skip sets whose beatmap listing fails
    pub invalid_set_ids: bool,
    /// Skip beatmap batches whose lookup fails
    pub invalid_map_ids: bool,
}

/// Where the collection file is written and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    dir: PathBuf,
    name: String,
}

impl OutputTarget {
    /// Creates a target; the name is normalized with [`normalize_name`].
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidName`] for an unusable name.
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Result<Self, CollectionError> {
        Ok(Self {
            dir: dir.into(),
            name: normalize_name(name)?,
        })
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the collection file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        collection_path(&self.dir, &self.name)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Set references found in the input
    pub sets: usize,
    /// Beatmap references found in the input
    pub beatmaps: usize,
    /// Tokens that could not be classified
    pub rejected: usize,
    /// Distinct beatmap IDs looked up after set expansion
    pub beatmaps_requested: usize,
    /// Unique checksums written
    pub checksums: usize,
    /// Path of the written file
    pub output: PathBuf,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} beatmap(s) to {}",
            self.checksums,
            self.output.display()
        )?;
        if self.sets + self.beatmaps + self.rejected > 0 {
            write!(
                f,
                " ({} set(s), {} beatmap link(s), {} rejected)",
                self.sets, self.beatmaps, self.rejected
            )?;
        }
        Ok(())
    }
}

/// Resolved checksums plus how many beatmap IDs were looked up.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Unique checksums in resolution order
    pub checksums: ChecksumSet,
    /// Distinct beatmap IDs sent to the checksum lookup
    pub beatmaps_requested: usize,
}

/// Resolves classified references into unique checksums.
///
/// References are walked in input order; each set is expanded in place, so
/// beatmap IDs keep the order their reference first appeared in. Each
/// distinct set is listed once.
///
/// # Errors
///
/// Returns [`ResolveError`] for a failed lookup not covered by `policy`.
#[instrument(skip(api, extraction), fields(references = extraction.len()))]
pub async fn resolve_references(
    api: &dyn CatalogApi,
    extraction: &ExtractionResult,
    policy: IgnorePolicy,
) -> Result<Resolution, ResolveError> {
    let sets = SetResolver::new(api);
    let mut seen_sets = HashSet::new();
    let mut beatmap_ids = Vec::new();

    for reference in &extraction.references {
        match reference {
            ClassifiedReference::Set { id } => {
                if !seen_sets.insert(*id) {
                    debug!(set_id = id, "set already expanded");
                    continue;
                }
                beatmap_ids.extend(sets.resolve(*id, policy.invalid_set_ids).await?);
            }
            ClassifiedReference::Item { id } => beatmap_ids.push(*id),
            ClassifiedReference::Rejected { .. } => {}
        }
    }

    let details = ChecksumResolver::new(api)
        .resolve(&beatmap_ids, policy.invalid_map_ids)
        .await?;
    let beatmaps_requested = beatmap_ids.iter().collect::<HashSet<_>>().len();

    let mut checksums = ChecksumSet::new();
    for detail in details {
        if !checksums.add(detail.checksum) {
            debug!(beatmap_id = detail.beatmap_id, "duplicate checksum");
        }
    }
    info!(
        beatmaps = beatmaps_requested,
        checksums = checksums.len(),
        "References resolved"
    );
    Ok(Resolution {
        checksums,
        beatmaps_requested,
    })
}

/// Reads `input`, resolves every reference in it and writes the collection.
///
/// # Errors
///
/// Returns [`PipelineError`] if the input cannot be read, resolution fails
/// outside `policy`, or the collection cannot be written. Nothing is written
/// on failure.
#[instrument(skip(api, input, target), fields(input = %input.display(), output = %target.path().display()))]
pub async fn run_file_pipeline(
    api: &dyn CatalogApi,
    input: &Path,
    target: &OutputTarget,
    policy: IgnorePolicy,
) -> Result<PipelineReport, PipelineError> {
    let text = tokio::fs::read_to_string(input)
        .await
        .map_err(|source| PipelineError::Input {
            path: input.to_path_buf(),
            source,
        })?;

    let extraction = extract_references(&text);
    if extraction.is_empty() {
        warn!("No references found in input");
    }
    let resolution = resolve_references(api, &extraction, policy).await?;

    let mut report = PipelineReport {
        sets: extraction.set_ids().count(),
        beatmaps: extraction.item_ids().count(),
        rejected: extraction.rejected_count(),
        beatmaps_requested: resolution.beatmaps_requested,
        ..PipelineReport::default()
    };
    write_target(target, resolution.checksums, &mut report).await?;
    Ok(report)
}

/// Dumps an osu!collector collection, optionally filtered, and writes it.
///
/// # Errors
///
/// Returns [`PipelineError`] if the dump fails or the collection cannot be
/// written.
#[instrument(skip(client, filter, target), fields(output = %target.path().display()))]
pub async fn run_collector_pipeline(
    client: &CollectorClient,
    collection_id: u32,
    filter: Option<&CollectorFilter>,
    target: &OutputTarget,
) -> Result<PipelineReport, PipelineError> {
    let dumped = match filter {
        Some(filter) => client.dump_filtered(collection_id, filter).await?,
        None => client.dump(collection_id).await?,
    };
    let checksums: ChecksumSet = dumped.into_iter().collect();

    let mut report = PipelineReport::default();
    write_target(target, checksums, &mut report).await?;
    Ok(report)
}

async fn write_target(
    target: &OutputTarget,
    checksums: ChecksumSet,
    report: &mut PipelineReport,
) -> Result<(), PipelineError> {
    if checksums.is_empty() {
        warn!(name = target.name(), "Collection is empty");
    }
    tokio::fs::create_dir_all(target.dir())
        .await
        .map_err(|source| PipelineError::OutputDir {
            path: target.dir().to_path_buf(),
            source,
        })?;

    let path = target.path();
    let file = CollectionFile::from_set(target.name(), checksums);
    write_collection(&file, &path)?;

    report.checksums = file.checksums.len();
    report.output = path;
    Ok(())
}
