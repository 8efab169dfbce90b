//! # Error Module
//!
//! Structural failures that abort a run. Per-record problems (malformed
//! identifiers, records with no candidates) are recorded as data instead.

use crate::model::{EntityId, Period, SecurityKey};
use crate::temporal::Interval;
use std::fmt;
use thiserror::Error;

/// Two validity segments of the same security that claim the same days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOverlap {
    pub security_key: SecurityKey,
    /// Row positions in the reference table as supplied.
    pub first_row: usize,
    pub second_row: usize,
    pub first: Interval,
    pub second: Interval,
}

impl fmt::Display for SegmentOverlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: row {} {} overlaps row {} {}",
            self.security_key, self.first_row, self.first, self.second_row, self.second
        )
    }
}

/// An entity-period key that occurs more than once in a provider panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub entity_id: EntityId,
    pub period: Period,
    pub occurrences: usize,
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} x{}", self.entity_id, self.period, self.occurrences)
    }
}

#[derive(Debug, Error)]
pub enum CrosswalkError {
    #[error("reference table has {} overlapping segment pair(s): {}", .0.len(), join(.0))]
    OverlappingSegments(Vec<SegmentOverlap>),

    #[error("reference row {row} for {security_key} has an empty validity window")]
    InvalidSegment { row: usize, security_key: SecurityKey },

    #[error(
        "provider {provider} has {} duplicate entity-period key(s): {}",
        .keys.len(),
        join(.keys)
    )]
    DuplicateRecords {
        provider: String,
        keys: Vec<DuplicateKey>,
    },

    #[error("tier weight {tier_weight} must exceed the combined non-tier maximum {non_tier_max}")]
    InvalidWeights { tier_weight: f64, non_tier_max: f64 },

    #[error("no provider registered under {0:?}")]
    UnknownProvider(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<figment::Error> for CrosswalkError {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    const SHOWN: usize = 10;
    let mut out = items
        .iter()
        .take(SHOWN)
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    if items.len() > SHOWN {
        out.push_str(&format!("; ... {} more", items.len() - SHOWN));
    }
    out
}

pub type Result<T> = std::result::Result<T, CrosswalkError>;
