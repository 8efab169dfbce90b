//! # Duplicate Resolution
//!
//! Collapses provider records sharing an `(entity_id, period)` key before
//! matching. The policy is explicit; the default refuses to pick a winner.

use crate::error::{CrosswalkError, DuplicateKey, Result};
use crate::model::{EntityId, Period, ProviderRecord};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How to treat several records for one entity-period key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Abort the provider run and report every duplicated key.
    #[default]
    Reject,
    /// Keep the earliest record in input order.
    KeepFirst,
    /// Keep the latest record in input order.
    KeepLast,
    /// Field-wise merge: first non-null value in input order wins.
    Merge,
}

/// Records with unique keys plus the keys that had to be collapsed.
#[derive(Debug, Clone, Default)]
pub struct Deduplicated {
    /// One record per key, in order of each key's first appearance.
    pub records: Vec<ProviderRecord>,
    /// Collapsed keys sorted by entity id then period.
    pub collapsed: Vec<DuplicateKey>,
}

/// Apply `policy` to a provider panel.
pub fn resolve(
    provider: &str,
    records: Vec<ProviderRecord>,
    policy: DuplicatePolicy,
) -> Result<Deduplicated> {
    let mut slots: HashMap<(EntityId, Period), usize> = HashMap::with_capacity(records.len());
    let mut groups: Vec<Vec<ProviderRecord>> = Vec::with_capacity(records.len());

    for record in records {
        let key = (record.entity_id.clone(), record.period);
        match slots.get(&key) {
            Some(&slot) => groups[slot].push(record),
            None => {
                slots.insert(key, groups.len());
                groups.push(vec![record]);
            }
        }
    }

    let mut collapsed: Vec<DuplicateKey> = groups
        .iter()
        .filter(|group| group.len() > 1)
        .map(|group| DuplicateKey {
            entity_id: group[0].entity_id.clone(),
            period: group[0].period,
            occurrences: group.len(),
        })
        .collect();
    collapsed.sort_by(|a, b| {
        a.entity_id
            .cmp(&b.entity_id)
            .then_with(|| a.period.cmp(&b.period))
    });

    if collapsed.is_empty() {
        let records = groups.into_iter().flatten().collect();
        return Ok(Deduplicated { records, collapsed });
    }

    if policy == DuplicatePolicy::Reject {
        return Err(CrosswalkError::DuplicateRecords {
            provider: provider.to_string(),
            keys: collapsed,
        });
    }

    warn!(
        provider,
        keys = collapsed.len(),
        ?policy,
        "collapsed duplicate entity-period records"
    );

    let records = groups
        .into_iter()
        .filter_map(|group| collapse(group, policy))
        .collect();
    Ok(Deduplicated { records, collapsed })
}

fn collapse(group: Vec<ProviderRecord>, policy: DuplicatePolicy) -> Option<ProviderRecord> {
    match policy {
        DuplicatePolicy::Reject | DuplicatePolicy::KeepFirst => group.into_iter().next(),
        DuplicatePolicy::KeepLast => group.into_iter().last(),
        DuplicatePolicy::Merge => {
            let mut rest = group.into_iter();
            let mut merged = rest.next()?;
            for record in rest {
                merged.entity_name = merged.entity_name.or(record.entity_name);
                merged.cusip = merged.cusip.or(record.cusip);
                merged.isin = merged.isin.or(record.isin);
                merged.ticker = merged.ticker.or(record.ticker);
            }
            Some(merged)
        }
    }
}
