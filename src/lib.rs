//! # Crosswalk
//!
//! A temporal, hierarchical identifier-matching engine that maps provider-native
//! company identifiers (ESG vendor issuer ids, perm ids, symbols) onto a stable
//! financial-database entity key.
//!
//! Provider observations are matched against a versioned security master by
//! CUSIP6, then ISIN-embedded CUSIP6, then ticker, with each candidate checked for
//! temporal overlap and scored. The best candidate per entity-period is rolled up
//! into one key per entity, and the per-provider crosswalks are consolidated into
//! a single mapping keyed by entity key.

pub mod aggregate;
pub mod config;
pub mod consolidate;
pub mod dedup;
pub mod error;
pub mod index;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod score;
pub mod select;
pub mod temporal;
pub mod test_support;

// Re-export main types for convenience
pub use aggregate::{AggregationMode, EntityAggregator};
pub use config::CrosswalkConfig;
pub use consolidate::{consolidate, Consolidation};
pub use dedup::DuplicatePolicy;
pub use error::{CrosswalkError, Result};
pub use index::ReferenceIndex;
pub use matcher::{HierarchicalMatcher, MatchOutcome};
pub use model::{
    ConsolidatedEntry, ConsolidatedRow, CrosswalkRow, EntityId, EntityKey, LinkQuality,
    MatchCandidate, MatchSource, Period, ProviderRecord, ReferenceRow, ReferenceSegment,
    SecurityKey, YearlyMatchRow,
};
pub use pipeline::{CrosswalkOutput, Pipeline, ProviderRun, ProviderSummary};
pub use provider::{InMemoryProvider, ProviderKind, ProviderSource};
pub use score::{QualityScorer, ScoreWeights};
pub use temporal::Interval;
