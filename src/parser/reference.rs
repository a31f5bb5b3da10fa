//! Types representing classified beatmap references and extraction results.

use std::fmt;

/// Why a candidate token could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Looked like a catalog link but matched no classification rule
    UnrecognizedShape,
    /// A bare leading number that is zero or longer than the catalog ID space allows
    IdOutOfRange,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedShape => write!(f, "unrecognized shape"),
            Self::IdOutOfRange => write!(f, "identifier is zero or longer than 8 digits"),
        }
    }
}

/// A single token classified into a typed reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedReference {
    /// A beatmap set (container of difficulties)
    Set {
        /// Beatmap set ID
        id: u32,
    },
    /// A single beatmap (difficulty)
    Item {
        /// Beatmap ID
        id: u32,
    },
    /// A token that looked like a reference but could not be classified
    Rejected {
        /// The raw token, after trailing punctuation cleanup
        token: String,
        /// Why classification failed
        reason: RejectReason,
    },
}

impl ClassifiedReference {
    /// Creates a rejected reference for a token with an unrecognized shape.
    #[must_use]
    pub fn unrecognized(token: impl Into<String>) -> Self {
        Self::Rejected {
            token: token.into(),
            reason: RejectReason::UnrecognizedShape,
        }
    }

    /// Returns true for rejected tokens.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl fmt::Display for ClassifiedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set { id } => write!(f, "[set] {id}"),
            Self::Item { id } => write!(f, "[beatmap] {id}"),
            Self::Rejected { token, reason } => write!(f, "[rejected] {token} ({reason})"),
        }
    }
}

/// Ordered classification output for one input text.
#[derive(Debug, Default, Clone)]
pub struct ExtractionResult {
    /// Classified references in first-occurrence order
    pub references: Vec<ClassifiedReference>,
}

impl ExtractionResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a classified reference.
    pub fn push(&mut self, reference: ClassifiedReference) {
        self.references.push(reference);
    }

    /// Returns true if nothing was found in the input.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Returns the number of classified references, rejects included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Returns set IDs in input order (duplicates preserved).
    pub fn set_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.references.iter().filter_map(|r| match r {
            ClassifiedReference::Set { id } => Some(*id),
            _ => None,
        })
    }

    /// Returns beatmap IDs in input order (duplicates preserved).
    pub fn item_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.references.iter().filter_map(|r| match r {
            ClassifiedReference::Item { id } => Some(*id),
            _ => None,
        })
    }

    /// Returns the rejected tokens.
    pub fn rejected(&self) -> impl Iterator<Item = &ClassifiedReference> {
        self.references.iter().filter(|r| r.is_rejected())
    }

    /// Returns count of rejected tokens.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected().count()
    }
}

impl fmt::Display for ExtractionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Extracted {} sets, {} beatmaps ({} rejected)",
            self.set_ids().count(),
            self.item_ids().count(),
            self.rejected_count()
        )
    }
}
