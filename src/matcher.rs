//! # Hierarchical Matching
//!
//! Walks the identifier tiers of a provider record in reliability order and
//! stops at the first tier that yields at least one temporally overlapping
//! reference segment. Lookups only read the index, so one matcher can be
//! shared by any number of worker threads.

use crate::index::ReferenceIndex;
use crate::model::{MatchCandidate, MatchSource, ProviderRecord};
use crate::score::QualityScorer;
use crate::temporal;
use tracing::trace;

/// Candidates produced for one record.
#[derive(Debug, Clone)]
pub struct MatchOutcome<'a> {
    pub record: &'a ProviderRecord,
    /// Tier that produced the candidates; `None` when unmatched.
    pub source: Option<MatchSource>,
    /// Overlapping candidates in index order.
    pub candidates: Vec<MatchCandidate<'a>>,
}

impl MatchOutcome<'_> {
    pub fn is_matched(&self) -> bool {
        !self.candidates.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HierarchicalMatcher<'a> {
    index: &'a ReferenceIndex,
    scorer: &'a QualityScorer,
}

impl<'a> HierarchicalMatcher<'a> {
    pub fn new(index: &'a ReferenceIndex, scorer: &'a QualityScorer) -> Self {
        Self { index, scorer }
    }

    /// Candidates for `record` from the most reliable productive tier.
    ///
    /// A tier whose identifier is absent, or whose segments all miss the
    /// observation period, falls through to the next tier.
    pub fn match_record(&self, record: &'a ProviderRecord) -> MatchOutcome<'a> {
        let unmatched = MatchOutcome {
            record,
            source: None,
            candidates: Vec::new(),
        };
        let Some(observation) = record.period.interval() else {
            return unmatched;
        };
        let period_days = observation.duration().unwrap_or(1);
        let identifiers = record.identifiers();

        for source in MatchSource::HIERARCHY {
            let Some(value) = identifiers.for_source(source) else {
                continue;
            };
            let candidates: Vec<MatchCandidate<'a>> = self
                .index
                .lookup(source, value)
                .filter_map(|entry| {
                    let overlap_days = temporal::overlap_days(&observation, &entry.validity)?;
                    Some(MatchCandidate {
                        match_source: source,
                        overlap_days,
                        score: self
                            .scorer
                            .score(source, &entry.segment, overlap_days, period_days),
                        record,
                        segment: &entry.segment,
                    })
                })
                .collect();

            if !candidates.is_empty() {
                trace!(
                    entity_id = %record.entity_id,
                    period = %record.period,
                    source = source.as_str(),
                    candidates = candidates.len(),
                    "tier matched"
                );
                return MatchOutcome {
                    record,
                    source: Some(source),
                    candidates,
                };
            }
        }
        unmatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKey, Period, ReferenceSegment, SecurityKey};
    use time::macros::date;

    fn index() -> ReferenceIndex {
        ReferenceIndex::build(vec![
            ReferenceSegment::new(
                EntityKey::new("GVK123"),
                SecurityKey::new("PERM1"),
                date!(2015 - 01 - 01),
                Some(date!(2099 - 01 - 01)),
            )
            .with_cusip6("037833")
            .with_ticker("AAPL")
            .with_common(true)
            .with_exchange("NASDAQ"),
            ReferenceSegment::new(
                EntityKey::new("GVK999"),
                SecurityKey::new("PERM9"),
                date!(2000 - 01 - 01),
                Some(date!(2010 - 01 - 01)),
            )
            .with_cusip6("555555")
            .with_ticker("OLD"),
            ReferenceSegment::new(
                EntityKey::new("GVK777"),
                SecurityKey::new("PERM7"),
                date!(2018 - 01 - 01),
                None,
            )
            .with_ticker("OLD"),
        ])
        .unwrap()
    }

    #[test]
    fn test_cusip_tier_wins_first() {
        let index = index();
        let scorer = QualityScorer::default();
        let matcher = HierarchicalMatcher::new(&index, &scorer);
        let record = ProviderRecord::new("P1", Period::Year(2020))
            .with_cusip("037833100")
            .with_ticker("AAPL");

        let outcome = matcher.match_record(&record);
        assert_eq!(outcome.source, Some(MatchSource::Cusip6));
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].overlap_days, 366);
    }

    #[test]
    fn test_isin_tier_used_without_cusip() {
        let index = index();
        let scorer = QualityScorer::default();
        let matcher = HierarchicalMatcher::new(&index, &scorer);
        let record = ProviderRecord::new("P1", Period::Year(2021)).with_isin("US0378331005");

        let outcome = matcher.match_record(&record);
        assert_eq!(outcome.source, Some(MatchSource::Isin));
        assert_eq!(outcome.candidates[0].overlap_days, 365);
    }

    #[test]
    fn test_non_overlapping_tier_falls_through() {
        let index = index();
        let scorer = QualityScorer::default();
        let matcher = HierarchicalMatcher::new(&index, &scorer);
        let record = ProviderRecord::new("P2", Period::Year(2020))
            .with_cusip("555555AA1")
            .with_ticker("OLD");

        let outcome = matcher.match_record(&record);
        assert_eq!(outcome.source, Some(MatchSource::Ticker));
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].segment.entity_key.as_str(), "GVK777");
    }

    #[test]
    fn test_unknown_ticker_is_unmatched() {
        let index = index();
        let scorer = QualityScorer::default();
        let matcher = HierarchicalMatcher::new(&index, &scorer);
        let record = ProviderRecord::new("P3", Period::Year(2020)).with_ticker("ZZZZ");

        let outcome = matcher.match_record(&record);
        assert!(!outcome.is_matched());
        assert_eq!(outcome.source, None);
    }

    #[test]
    fn test_as_of_period_is_single_day() {
        let index = index();
        let scorer = QualityScorer::default();
        let matcher = HierarchicalMatcher::new(&index, &scorer);
        let record = ProviderRecord::new("P1", Period::AsOf(date!(2020 - 06 - 30)))
            .with_cusip("037833100");

        let outcome = matcher.match_record(&record);
        assert_eq!(outcome.candidates[0].overlap_days, 1);
    }
}
