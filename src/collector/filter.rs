//! Filters for osu!collector dumps.

use std::fmt;
use std::str::FromStr;

use super::CollectorError;

/// Attribute an osu!collector dump is filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Beats per minute
    Bpm,
    /// Star rating
    DifficultyRating,
}

impl SortBy {
    /// Query value understood by osu!collector.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bpm => "bpm",
            Self::DifficultyRating => "difficulty_rating",
        }
    }

    /// Human-readable name for logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Bpm => "bpm",
            Self::DifficultyRating => "star rating",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bpm" => Ok(Self::Bpm),
            "difficulty_rating" | "sr" | "stars" => Ok(Self::DifficultyRating),
            other => Err(CollectorError::invalid_filter(&format!(
                "unknown filter '{other}', expected bpm or difficulty_rating"
            ))),
        }
    }
}

/// Inclusive range filter on one beatmap attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectorFilter {
    sort_by: SortBy,
    min: f64,
    max: f64,
}

impl CollectorFilter {
    /// Creates a filter.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::InvalidFilter`] when a bound is negative or
    /// not finite, or when `min > max`.
    pub fn new(sort_by: SortBy, min: f64, max: f64) -> Result<Self, CollectorError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
            return Err(CollectorError::invalid_filter(
                "filter bounds must be non-negative numbers",
            ));
        }
        if min > max {
            return Err(CollectorError::invalid_filter(&format!(
                "minimum {min} is greater than maximum {max}"
            )));
        }
        Ok(Self { sort_by, min, max })
    }

    /// Attribute being filtered on.
    #[must_use]
    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    /// Lower bound.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }
}
