//! Era buckets for temporal filtering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collection::Record;

/// One of the fixed temporal buckets a search can be narrowed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Era {
    /// Effective end year before 1500.
    #[serde(rename = "before1500")]
    Before1500,
    /// Begin year at most 1800 and effective end year at least 1500.
    #[serde(rename = "1500-1800")]
    From1500To1800,
    /// Begin year after 1800.
    #[serde(rename = "after1800")]
    After1800,
    /// No temporal constraint.
    #[default]
    #[serde(rename = "all", alias = "unconstrained")]
    Unconstrained,
}

/// Returned when an era tag is not one of the known buckets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown era '{0}': expected one of before1500, 1500-1800, after1800, all (or unconstrained)")]
pub struct ParseEraError(String);

impl Era {
    /// All buckets, unconstrained last.
    pub const ALL: [Self; 4] = [
        Self::Before1500,
        Self::From1500To1800,
        Self::After1800,
        Self::Unconstrained,
    ];

    /// Stable tag used in URLs, config and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before1500 => "before1500",
            Self::From1500To1800 => "1500-1800",
            Self::After1800 => "after1800",
            Self::Unconstrained => "all",
        }
    }

    /// True when `record` falls inside this bucket.
    ///
    /// Buckets overlap: an object begun in 1700 and finished in 1900 falls in
    /// `1500-1800` but not `after1800`, which looks only at the begin year.
    #[must_use]
    pub fn matches(self, record: &Record) -> bool {
        let begin = record.begin_year;
        let end = record.effective_end_year();
        match self {
            Self::Before1500 => end < 1500,
            Self::From1500To1800 => begin <= 1800 && end >= 1500,
            Self::After1800 => begin > 1800,
            Self::Unconstrained => true,
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Era {
    type Err = ParseEraError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "before1500" => Ok(Self::Before1500),
            "1500-1800" => Ok(Self::From1500To1800),
            "after1800" => Ok(Self::After1800),
            "" | "all" | "any" | "unconstrained" => Ok(Self::Unconstrained),
            _ => Err(ParseEraError(raw.to_string())),
        }
    }
}
