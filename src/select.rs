//! # Best-Match Selection
//!
//! Picks one candidate per provider record. Exact score ties fall back to
//! primary link, primary security, lower security key and finally the order
//! candidates were produced in, so the choice never depends on scheduling.

use crate::matcher::MatchOutcome;
use crate::model::{MatchCandidate, MatchedSegment, YearlyMatchRow};
use std::cmp::Ordering;

/// Preference order between two candidates; `Greater` means `a` is better.
pub fn compare_candidates(a: &MatchCandidate<'_>, b: &MatchCandidate<'_>) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| {
            a.segment
                .link_quality
                .is_primary()
                .cmp(&b.segment.link_quality.is_primary())
        })
        .then_with(|| {
            a.segment
                .is_primary_security
                .cmp(&b.segment.is_primary_security)
        })
        .then_with(|| b.segment.security_key.cmp(&a.segment.security_key))
}

/// Highest-ranked candidate; the earliest one wins a complete tie.
pub fn select_best<'c, 'a>(
    candidates: &'c [MatchCandidate<'a>],
) -> Option<&'c MatchCandidate<'a>> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if compare_candidates(candidate, current) != Ordering::Greater => {
            Some(current)
        }
        _ => Some(candidate),
    })
}

/// Yearly match row for one matcher outcome.
pub fn to_yearly_row(provider: &str, outcome: &MatchOutcome<'_>) -> YearlyMatchRow {
    let record = outcome.record;
    YearlyMatchRow {
        provider: provider.to_string(),
        entity_id: record.entity_id.clone(),
        entity_name: record.entity_name.clone(),
        period: record.period,
        candidate_count: outcome.candidates.len(),
        matched: select_best(&outcome.candidates).map(MatchedSegment::from),
    }
}
