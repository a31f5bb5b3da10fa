//! Input parsing module for extracting beatmap and beatmap set references.
//!
//! This module scans raw text for anything that looks like a catalog link or
//! a bare beatmap ID and classifies each candidate into a typed reference.
//!
//! # Current Support
//!
//! - Set links: `…/beatmapsets/<id>` and the legacy `…/s/<id>`
//! - Beatmap links: `…/beatmaps/<id>`, `…/b/<id>`
//! - Old-site query links: `…/p/beatmap?b=<id>`
//! - Bare IDs as the leading token of a line
//!
//! # Example
//!
//! ```
//! use collection_factory::parser::{classify, ClassifiedReference};
//!
//! let refs = classify("https://osu.ppy.sh/beatmapsets/123\n4567 hard diff");
//! assert_eq!(refs[0], ClassifiedReference::Set { id: 123 });
//! assert_eq!(refs[1], ClassifiedReference::Item { id: 4567 });
//! ```

mod reference;
mod rules;
mod shape;

pub use reference::{ClassifiedReference, ExtractionResult, RejectReason};
pub use rules::{ClassificationRule, RULES, SET_CONTAINER_SEGMENTS};
pub use shape::{LinkShape, MAX_ID_DIGITS, TokenShape};

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

/// Regex pattern for finding link-shaped tokens in text.
/// Matches an optional http(s) scheme, a dotted host, and a path.
#[allow(clippy::expect_used)]
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:https?://)?(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}(?::\d{1,5})?/[^\s<>"'\]]*"#,
    )
    .expect("link regex is valid") // Static pattern, safe to panic
});

/// Classifies every candidate reference found in the input text.
///
/// Candidates are link-shaped tokens anywhere in a line and a leading run of
/// digits at the start of a line. Output preserves first-occurrence order;
/// repeated references are kept (deduplication happens downstream).
///
/// Rejected candidates are logged at warn level and returned as
/// [`ClassifiedReference::Rejected`]; they never abort extraction.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
#[must_use]
pub fn classify(input: &str) -> Vec<ClassifiedReference> {
    let mut references = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(first) = line
            .split_whitespace()
            .next()
            .map(trim_sentence_punctuation)
            && !first.is_empty()
            && first.bytes().all(|b| b.is_ascii_digit())
        {
            references.push(classify_shape(first, &TokenShape::BareDigits(first)));
        }

        for link_match in LINK_PATTERN.find_iter(line) {
            let token = clean_link_trailing(link_match.as_str());
            references.push(classify_token(token));
        }
    }

    references
}

/// Classifies a single link-shaped or all-digit token.
#[must_use]
pub fn classify_token(token: &str) -> ClassifiedReference {
    let shape = if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        TokenShape::BareDigits(token)
    } else {
        TokenShape::Link(LinkShape::parse(token))
    };
    classify_shape(token, &shape)
}

fn classify_shape(token: &str, shape: &TokenShape<'_>) -> ClassifiedReference {
    let reference = rules::apply_rules(token, shape);
    match &reference {
        ClassifiedReference::Rejected { token, reason } => {
            warn!(token = %token, %reason, "Skipping unrecognized reference");
        }
        other => debug!(reference = %other, "classified reference"),
    }
    reference
}

/// Extracts references from input text into an [`ExtractionResult`].
///
/// Empty input returns an empty result (not an error).
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
#[must_use]
pub fn extract_references(input: &str) -> ExtractionResult {
    let mut result = ExtractionResult::new();

    if input.trim().is_empty() {
        debug!("Empty input provided");
        return result;
    }

    for reference in classify(input) {
        result.push(reference);
    }

    info!(
        sets = result.set_ids().count(),
        beatmaps = result.item_ids().count(),
        rejected = result.rejected_count(),
        "Extraction complete"
    );

    result
}

/// Strips trailing sentence punctuation from a leading token (`2116202,`).
fn trim_sentence_punctuation(token: &str) -> &str {
    token.trim_end_matches(['.', ',', ';', ':', '!', '?', ')'])
}

/// Strips sentence punctuation and unbalanced closing brackets captured at the end of a link.
fn clean_link_trailing(link: &str) -> &str {
    let mut result = link;

    while let Some(last) = result.chars().last() {
        match last {
            '.' | ',' | ';' | ':' | '!' | '?' => {
                result = &result[..result.len() - 1];
            }
            ')' => {
                let open_count = result.chars().filter(|&c| c == '(').count();
                let close_count = result.chars().filter(|&c| c == ')').count();
                if close_count > open_count {
                    result = &result[..result.len() - 1];
                } else {
                    break;
                }
            }
            _ => break,
        }
    }

    result
}
