//! Collection Factory Core Library
//!
//! This library turns lists of osu! beatmap and beatmap set references into
//! an osu! collection file (`collection.db` layout).
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Classification of free text into set and beatmap references
//! - [`gateway`] - Rate-limited, authenticated osu! API access
//! - [`resolver`] - Set expansion and batched checksum lookup
//! - [`collection`] - Deduplication and the binary collection file format
//! - [`collector`] - osu!collector collection dumps
//! - [`pipeline`] - End-to-end runs from input to written file

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collection;
pub mod collector;
pub mod gateway;
pub mod parser;
pub mod pipeline;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use collection::{ChecksumSet, CollectionError, CollectionFile, read_collection, write_collection};
pub use collector::{CollectorClient, CollectorError, CollectorFilter, SortBy};
pub use gateway::{Gateway, GatewayConfig, GatewayError, PermitPool};
pub use parser::{ClassifiedReference, ExtractionResult, classify, extract_references};
pub use pipeline::{
    IgnorePolicy, OutputTarget, PipelineError, PipelineReport, resolve_references,
    run_collector_pipeline, run_file_pipeline,
};
pub use resolver::{CatalogApi, ChecksumResolver, OsuApi, ResolveError, SetResolver};
