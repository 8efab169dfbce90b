//! # Pipeline Module
//!
//! Runs the full crosswalk for a configuration value: the reference index is
//! built once, each registered provider is deduplicated, matched, selected and
//! aggregated against it, and the per-provider crosswalks are consolidated.
//!
//! The index is never mutated after construction, so records are matched on
//! the rayon pool without locks. Parallel and sequential runs produce identical
//! output because results are collected in input order and every selection
//! step breaks ties deterministically.

use crate::aggregate::EntityAggregator;
use crate::config::CrosswalkConfig;
use crate::consolidate::{consolidate, Consolidation};
use crate::dedup;
use crate::error::{CrosswalkError, Result};
use crate::index::ReferenceIndex;
use crate::matcher::HierarchicalMatcher;
use crate::model::{
    CrosswalkRow, EntityId, EntityKey, MatchSource, ProviderRecord, ReferenceSegment,
    YearlyMatchRow,
};
use crate::provider::{self, ProviderSource};
use crate::score::QualityScorer;
use crate::select::to_yearly_row;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Match statistics for one provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderSummary {
    pub provider: String,
    /// Entity-period records after deduplication.
    pub records: usize,
    pub duplicates_collapsed: usize,
    /// Records with at least one identifier known to the reference table.
    pub reference_coverage: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub by_cusip6: usize,
    pub by_isin: usize,
    pub by_ticker: usize,
    pub unique_entities: usize,
    pub matched_entities: usize,
    pub unique_entity_keys: usize,
}

impl ProviderSummary {
    /// Share of records matched, in `[0, 1]`.
    pub fn match_rate(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            self.matched as f64 / self.records as f64
        }
    }

    pub fn count_for(&self, source: MatchSource) -> usize {
        match source {
            MatchSource::Cusip6 => self.by_cusip6,
            MatchSource::Isin => self.by_isin,
            MatchSource::Ticker => self.by_ticker,
        }
    }
}

/// Outputs of one provider run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRun {
    pub provider: String,
    /// One row per deduplicated record, in input order.
    pub yearly: Vec<YearlyMatchRow>,
    /// One row per entity id, ordered by entity id.
    pub crosswalk: Vec<CrosswalkRow>,
    pub summary: ProviderSummary,
}

/// Outputs of a complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrosswalkOutput {
    pub providers: Vec<ProviderRun>,
    pub consolidation: Consolidation,
}

impl CrosswalkOutput {
    pub fn provider(&self, name: &str) -> Option<&ProviderRun> {
        self.providers.iter().find(|run| run.provider == name)
    }
}

/// Crosswalk pipeline bound to one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: CrosswalkConfig,
    scorer: QualityScorer,
    aggregator: EntityAggregator,
}

impl Pipeline {
    /// Validate `config` and prepare the scoring stages.
    pub fn new(config: CrosswalkConfig) -> Result<Self> {
        config.validate()?;
        let scorer = config.scorer()?;
        let aggregator = EntityAggregator::new(config.matching.aggregation);
        Ok(Self {
            config,
            scorer,
            aggregator,
        })
    }

    pub fn config(&self) -> &CrosswalkConfig {
        &self.config
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    #[instrument(skip_all, fields(segments = segments.len()))]
    pub fn build_index(&self, segments: Vec<ReferenceSegment>) -> Result<ReferenceIndex> {
        ReferenceIndex::build(segments)
    }

    /// One yearly row per record, in input order.
    #[instrument(skip(self, index, records), fields(records = records.len()), level = "debug")]
    pub fn match_records(
        &self,
        index: &ReferenceIndex,
        provider: &str,
        records: &[ProviderRecord],
    ) -> Vec<YearlyMatchRow> {
        let matcher = HierarchicalMatcher::new(index, &self.scorer);
        let parallel = self.config.matching.parallel
            && records.len() >= self.config.matching.parallel_min_records;
        debug!(parallel, "matching records");

        if parallel {
            records
                .par_iter()
                .map(|record| to_yearly_row(provider, &matcher.match_record(record)))
                .collect()
        } else {
            records
                .iter()
                .map(|record| to_yearly_row(provider, &matcher.match_record(record)))
                .collect()
        }
    }

    /// Deduplicate, match, select and aggregate one provider panel.
    #[instrument(skip(self, index, records), fields(records = records.len()))]
    pub fn run_provider(
        &self,
        index: &ReferenceIndex,
        provider: &str,
        records: Vec<ProviderRecord>,
    ) -> Result<ProviderRun> {
        let deduplicated = dedup::resolve(provider, records, self.config.dedup.policy)?;
        let records = deduplicated.records;

        let reference_coverage = records
            .iter()
            .filter(|record| !index.candidate_keys_for(&record.identifiers()).is_empty())
            .count();
        debug!(reference_coverage, "records with reference coverage");

        let yearly = self.match_records(index, provider, &records);
        let crosswalk = self.aggregator.aggregate(provider, &yearly);
        let summary = summarize(
            provider,
            &yearly,
            &crosswalk,
            deduplicated.collapsed.len(),
            reference_coverage,
        );

        info!(
            provider,
            records = summary.records,
            matched = summary.matched,
            match_rate = summary.match_rate(),
            cusip6 = summary.by_cusip6,
            isin = summary.by_isin,
            ticker = summary.by_ticker,
            unique_entities = summary.unique_entities,
            unique_entity_keys = summary.unique_entity_keys,
            "provider matched"
        );

        Ok(ProviderRun {
            provider: provider.to_string(),
            yearly,
            crosswalk,
            summary,
        })
    }

    /// Load a registered provider and run it against `index`.
    pub fn run_source(
        &self,
        index: &ReferenceIndex,
        source: &dyn ProviderSource,
    ) -> anyhow::Result<ProviderRun> {
        let registration = self.config.provider(source.name())?;
        let records = provider::extract(source, registration.kind)?;
        Ok(self.run_provider(index, source.name(), records)?)
    }

    /// Full run: index the reference table, process every enabled provider in
    /// registry order, consolidate.
    ///
    /// Sources must be registered under distinct names; disabled registrations
    /// are skipped.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub fn run(
        &self,
        segments: Vec<ReferenceSegment>,
        sources: &[&dyn ProviderSource],
    ) -> anyhow::Result<CrosswalkOutput> {
        let mut names = BTreeSet::new();
        for source in sources {
            self.config.provider(source.name())?;
            if !names.insert(source.name()) {
                return Err(CrosswalkError::Config(format!(
                    "source {:?} supplied twice",
                    source.name()
                ))
                .into());
            }
        }
        let index = self.build_index(segments)?;

        let mut providers = Vec::new();
        for registration in &self.config.providers {
            let Some(source) = sources.iter().find(|s| s.name() == registration.name) else {
                continue;
            };
            if !registration.enabled {
                info!(provider = registration.name.as_str(), "provider disabled, skipping");
                continue;
            }
            providers.push(self.run_source(&index, *source)?);
        }

        let consolidation = consolidate(
            providers
                .iter()
                .map(|run| (run.provider.as_str(), run.crosswalk.as_slice())),
        );
        Ok(CrosswalkOutput {
            providers,
            consolidation,
        })
    }
}

fn summarize(
    provider: &str,
    yearly: &[YearlyMatchRow],
    crosswalk: &[CrosswalkRow],
    duplicates_collapsed: usize,
    reference_coverage: usize,
) -> ProviderSummary {
    let mut summary = ProviderSummary {
        provider: provider.to_string(),
        records: yearly.len(),
        duplicates_collapsed,
        reference_coverage,
        ..ProviderSummary::default()
    };
    for row in yearly {
        match row.match_source() {
            Some(MatchSource::Cusip6) => summary.by_cusip6 += 1,
            Some(MatchSource::Isin) => summary.by_isin += 1,
            Some(MatchSource::Ticker) => summary.by_ticker += 1,
            None => summary.unmatched += 1,
        }
    }
    summary.matched = summary.records - summary.unmatched;
    summary.unique_entities = yearly
        .iter()
        .map(|row| &row.entity_id)
        .collect::<BTreeSet<&EntityId>>()
        .len();
    summary.matched_entities = crosswalk.iter().filter(|row| row.is_matched()).count();
    summary.unique_entity_keys = crosswalk
        .iter()
        .filter_map(|row| row.entity_key.as_ref())
        .collect::<BTreeSet<&EntityKey>>()
        .len();
    summary
}
