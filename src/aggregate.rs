//! # Entity Aggregation
//!
//! Rolls the yearly matches of one provider entity into a single crosswalk row.
//! Rows are put in canonical order before any floating-point accumulation, so
//! the winner and its total do not depend on the order rows arrive in.

use crate::model::{CrosswalkRow, EntityId, EntityKey, Period, SecurityKey, YearlyMatchRow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use time::Date;

/// How per-period scores roll up into an entity-key total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationMode {
    /// Plain sum of per-period scores.
    #[default]
    Sum,
    /// Each period's score scaled by its overlap share of the period.
    OverlapWeighted,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EntityAggregator {
    mode: AggregationMode,
}

#[derive(Debug, Default)]
struct KeyTally {
    total: f64,
    periods: BTreeSet<Period>,
    max_overlap: i64,
    /// Row count and summed score per security.
    securities: BTreeMap<SecurityKey, (usize, f64)>,
    first_seen: Option<Date>,
    last_seen: Option<Date>,
    open_ended: bool,
}

impl KeyTally {
    fn best_security(&self) -> Option<&SecurityKey> {
        self.securities
            .iter()
            .fold(None, |best: Option<(&SecurityKey, &(usize, f64))>, (key, stats)| {
                match best {
                    Some((_, current))
                        if stats.0 < current.0
                            || (stats.0 == current.0 && stats.1 <= current.1) =>
                    {
                        best
                    }
                    _ => Some((key, stats)),
                }
            })
            .map(|(key, _)| key)
    }
}

impl EntityAggregator {
    pub fn new(mode: AggregationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    /// One crosswalk row per entity id, ordered by entity id.
    pub fn aggregate(&self, provider: &str, rows: &[YearlyMatchRow]) -> Vec<CrosswalkRow> {
        let mut by_entity: BTreeMap<&EntityId, Vec<&YearlyMatchRow>> = BTreeMap::new();
        for row in rows {
            by_entity.entry(&row.entity_id).or_default().push(row);
        }
        by_entity
            .into_iter()
            .map(|(entity_id, rows)| self.aggregate_entity(provider, entity_id, rows))
            .collect()
    }

    /// Crosswalk row for one entity from all of its yearly rows.
    pub fn aggregate_entity(
        &self,
        provider: &str,
        entity_id: &EntityId,
        mut rows: Vec<&YearlyMatchRow>,
    ) -> CrosswalkRow {
        rows.sort_by(|a, b| canonical_order(a, b));

        let entity_name = rows.iter().find_map(|row| row.entity_name.clone());
        let matched_periods: BTreeSet<Period> = rows
            .iter()
            .filter(|row| row.is_matched())
            .map(|row| row.period)
            .collect();

        let mut tallies: BTreeMap<&EntityKey, KeyTally> = BTreeMap::new();
        for row in &rows {
            let Some(matched) = &row.matched else {
                continue;
            };
            let contribution = self.contribution(row.period, matched.score, matched.overlap_days);
            let tally = tallies.entry(&matched.entity_key).or_default();
            tally.total += contribution;
            tally.periods.insert(row.period);
            tally.max_overlap = tally.max_overlap.max(matched.overlap_days);
            let security = tally
                .securities
                .entry(matched.security_key.clone())
                .or_insert((0, 0.0));
            security.0 += 1;
            security.1 += contribution;
            tally.first_seen = Some(
                tally
                    .first_seen
                    .map_or(matched.valid_from, |seen| seen.min(matched.valid_from)),
            );
            match matched.valid_to {
                Some(end) => {
                    tally.last_seen = Some(tally.last_seen.map_or(end, |seen| seen.max(end)))
                }
                None => tally.open_ended = true,
            }
        }

        let winner = tallies
            .iter()
            .max_by(|(key_a, a), (key_b, b)| compare_tallies(key_a, a, key_b, b));

        let Some((entity_key, tally)) = winner else {
            return CrosswalkRow::unmatched(provider, entity_id.clone(), entity_name);
        };

        CrosswalkRow {
            provider: provider.to_string(),
            entity_id: entity_id.clone(),
            entity_name,
            entity_key: Some((*entity_key).clone()),
            security_key: tally.best_security().cloned(),
            years_covered: matched_periods.len(),
            first_period: matched_periods.first().copied(),
            last_period: matched_periods.last().copied(),
            total_score: Some(tally.total),
            key_periods: tally.periods.len(),
            max_overlap_days: Some(tally.max_overlap),
            first_seen: tally.first_seen,
            last_seen: if tally.open_ended {
                None
            } else {
                tally.last_seen
            },
        }
    }

    fn contribution(&self, period: Period, score: f64, overlap_days: i64) -> f64 {
        match self.mode {
            AggregationMode::Sum => score,
            AggregationMode::OverlapWeighted => {
                let period_days = period
                    .interval()
                    .and_then(|interval| interval.duration())
                    .unwrap_or(1)
                    .max(1);
                score * (overlap_days as f64 / period_days as f64).clamp(0.0, 1.0)
            }
        }
    }
}

fn canonical_order(a: &YearlyMatchRow, b: &YearlyMatchRow) -> Ordering {
    let key = |row: &YearlyMatchRow| {
        row.matched
            .as_ref()
            .map(|m| (m.entity_key.clone(), m.security_key.clone()))
    };
    a.period
        .cmp(&b.period)
        .then_with(|| key(a).cmp(&key(b)))
        .then_with(|| {
            let score = |row: &YearlyMatchRow| row.matched.as_ref().map_or(f64::MIN, |m| m.score);
            score(a).total_cmp(&score(b))
        })
        .then_with(|| a.entity_name.cmp(&b.entity_name))
}

/// `Greater` when `a` should win: total, then periods, then overlap, then lower key.
fn compare_tallies(key_a: &EntityKey, a: &KeyTally, key_b: &EntityKey, b: &KeyTally) -> Ordering {
    a.total
        .total_cmp(&b.total)
        .then_with(|| a.periods.len().cmp(&b.periods.len()))
        .then_with(|| a.max_overlap.cmp(&b.max_overlap))
        .then_with(|| key_b.cmp(key_a))
}
