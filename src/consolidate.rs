//! # Cross-Provider Consolidation
//!
//! Merges per-provider crosswalks into one row per entity key, plus a long
//! table with one entry per matched provider entity. Unmatched entities are
//! counted per provider as coverage gaps.

use crate::model::{ConsolidatedEntry, ConsolidatedRow, CrosswalkRow, EntityId, EntityKey};
use std::collections::BTreeMap;
use tracing::info;

/// Consolidated outputs for a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Consolidation {
    /// One row per distinct entity key, ordered by key.
    pub rows: Vec<ConsolidatedRow>,
    /// One entry per matched provider entity, ordered by provider then entity id.
    pub entries: Vec<ConsolidatedEntry>,
    /// Unmatched entity count per provider.
    pub coverage_gaps: BTreeMap<String, usize>,
}

impl Consolidation {
    pub fn row(&self, entity_key: &EntityKey) -> Option<&ConsolidatedRow> {
        self.rows
            .binary_search_by(|row| row.entity_key.cmp(entity_key))
            .ok()
            .map(|position| &self.rows[position])
    }

    /// Keys reported by every provider in the run.
    pub fn fully_covered(&self) -> impl Iterator<Item = &ConsolidatedRow> {
        let providers = self.coverage_gaps.len();
        self.rows
            .iter()
            .filter(move |row| row.provider_count() == providers)
    }

    pub fn total_gaps(&self) -> usize {
        self.coverage_gaps.values().sum()
    }
}

/// Merge crosswalks given as `(provider, rows)` pairs.
///
/// Every provider appears in each row's map, with an empty id list when it has
/// no entity mapping to that key.
pub fn consolidate<'a, I>(crosswalks: I) -> Consolidation
where
    I: IntoIterator<Item = (&'a str, &'a [CrosswalkRow])>,
{
    let mut by_key: BTreeMap<EntityKey, BTreeMap<String, Vec<EntityId>>> = BTreeMap::new();
    let mut entries = Vec::new();
    let mut coverage_gaps: BTreeMap<String, usize> = BTreeMap::new();

    for (provider, rows) in crosswalks {
        let gaps = coverage_gaps.entry(provider.to_string()).or_insert(0);
        for row in rows {
            let Some(entity_key) = &row.entity_key else {
                *gaps += 1;
                continue;
            };
            by_key
                .entry(entity_key.clone())
                .or_default()
                .entry(provider.to_string())
                .or_default()
                .push(row.entity_id.clone());
            entries.push(ConsolidatedEntry {
                provider: provider.to_string(),
                entity_id: row.entity_id.clone(),
                entity_key: entity_key.clone(),
                security_key: row.security_key.clone(),
                years_covered: row.years_covered,
                first_period: row.first_period,
                last_period: row.last_period,
            });
        }
    }

    let rows: Vec<ConsolidatedRow> = by_key
        .into_iter()
        .map(|(entity_key, mut providers)| {
            for provider in coverage_gaps.keys() {
                let ids = providers.entry(provider.clone()).or_default();
                ids.sort();
                ids.dedup();
            }
            ConsolidatedRow {
                entity_key,
                providers,
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        a.provider
            .cmp(&b.provider)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    let consolidation = Consolidation {
        rows,
        entries,
        coverage_gaps,
    };
    info!(
        entity_keys = consolidation.rows.len(),
        entries = consolidation.entries.len(),
        fully_covered = consolidation.fully_covered().count(),
        unmatched = consolidation.total_gaps(),
        "consolidated crosswalks"
    );
    for (provider, gaps) in &consolidation.coverage_gaps {
        if *gaps > 0 {
            info!(provider = provider.as_str(), unmatched = *gaps, "coverage gap");
        }
    }
    consolidation
}
