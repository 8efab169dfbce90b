//! # Indexing Module
//!
//! Read-only lookup structures over the security master: CUSIP6 and ticker
//! buckets for candidate retrieval, and per-security timelines for temporal
//! scans. Building the index validates that no security has two segments
//! claiming the same day.

use crate::error::{CrosswalkError, Result, SegmentOverlap};
use crate::model::{Identifiers, MatchSource, ReferenceSegment, SecurityKey};
use crate::normalize;
use crate::temporal::{is_overlapping, Day, Interval};
use hashbrown::HashMap;
use tracing::{debug, info};

/// A reference segment with its position in the input table and validity window.
#[derive(Debug, Clone)]
pub struct IndexedSegment {
    pub row: usize,
    pub segment: ReferenceSegment,
    pub validity: Interval,
}

/// Counts describing a built index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub segments: usize,
    pub securities: usize,
    pub cusip6_keys: usize,
    pub ticker_keys: usize,
}

/// Immutable index over reference segments.
///
/// Every bucket lists segment positions ordered by `(valid_from, security_key, row)`.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    entries: Vec<IndexedSegment>,
    by_cusip6: HashMap<String, Vec<usize>>,
    by_ticker: HashMap<String, Vec<usize>>,
    by_security: HashMap<SecurityKey, Vec<usize>>,
}

impl ReferenceIndex {
    /// Build the index, canonicalising segment identifiers.
    ///
    /// # Errors
    /// `InvalidSegment` for an empty validity window, `OverlappingSegments`
    /// listing every pair of same-security segments that share a day.
    pub fn build(segments: Vec<ReferenceSegment>) -> Result<Self> {
        let mut entries = Vec::with_capacity(segments.len());
        for (row, mut segment) in segments.into_iter().enumerate() {
            let validity = segment
                .validity()
                .map_err(|_| CrosswalkError::InvalidSegment {
                    row,
                    security_key: segment.security_key.clone(),
                })?;
            segment.cusip6 = segment.cusip6.as_deref().and_then(normalize::cusip6_key);
            segment.ticker = segment.ticker.as_deref().and_then(normalize::ticker);
            segment.exchange_code = segment.exchange_code.as_deref().and_then(normalize::exchange);
            entries.push(IndexedSegment {
                row,
                segment,
                validity,
            });
        }

        let mut by_cusip6: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_ticker: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_security: HashMap<SecurityKey, Vec<usize>> = HashMap::new();

        for (position, entry) in entries.iter().enumerate() {
            if let Some(cusip6) = &entry.segment.cusip6 {
                by_cusip6.entry(cusip6.clone()).or_default().push(position);
            }
            if let Some(ticker) = &entry.segment.ticker {
                by_ticker.entry(ticker.clone()).or_default().push(position);
            }
            by_security
                .entry(entry.segment.security_key.clone())
                .or_default()
                .push(position);
        }

        let order = |positions: &mut Vec<usize>| {
            positions.sort_by(|&a, &b| {
                let (a, b) = (&entries[a], &entries[b]);
                a.validity
                    .cmp(&b.validity)
                    .then_with(|| a.segment.security_key.cmp(&b.segment.security_key))
                    .then_with(|| a.row.cmp(&b.row))
            });
        };
        by_cusip6.values_mut().for_each(order);
        by_ticker.values_mut().for_each(order);
        by_security.values_mut().for_each(order);

        let index = Self {
            entries,
            by_cusip6,
            by_ticker,
            by_security,
        };
        index.validate_timelines()?;

        let stats = index.stats();
        info!(
            segments = stats.segments,
            securities = stats.securities,
            cusip6_keys = stats.cusip6_keys,
            ticker_keys = stats.ticker_keys,
            "reference index built"
        );
        Ok(index)
    }

    fn validate_timelines(&self) -> Result<()> {
        let mut overlaps = Vec::new();
        for (security_key, positions) in &self.by_security {
            // Segments still open at the current start; positions are sorted by start.
            let mut active: Vec<&IndexedSegment> = Vec::new();
            for &position in positions {
                let current = &self.entries[position];
                active.retain(|previous| previous.validity.end > current.validity.start);
                for previous in &active {
                    if is_overlapping(&previous.validity, &current.validity) {
                        overlaps.push(SegmentOverlap {
                            security_key: security_key.clone(),
                            first_row: previous.row,
                            second_row: current.row,
                            first: previous.validity,
                            second: current.validity,
                        });
                    }
                }
                active.push(current);
            }
        }

        if overlaps.is_empty() {
            return Ok(());
        }
        overlaps.sort_by(|a, b| {
            a.security_key
                .cmp(&b.security_key)
                .then_with(|| a.first_row.cmp(&b.first_row))
                .then_with(|| a.second_row.cmp(&b.second_row))
        });
        debug!(pairs = overlaps.len(), "overlapping reference segments");
        Err(CrosswalkError::OverlappingSegments(overlaps))
    }

    /// Segments whose identifier for `source` equals `value`, in bucket order.
    ///
    /// `Cusip6` and `Isin` both resolve through the CUSIP6 bucket.
    pub fn lookup(
        &self,
        source: MatchSource,
        value: &str,
    ) -> impl Iterator<Item = &IndexedSegment> {
        let bucket = match source {
            MatchSource::Cusip6 | MatchSource::Isin => self.by_cusip6.get(value),
            MatchSource::Ticker => self.by_ticker.get(value),
        };
        bucket
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&position| &self.entries[position])
    }

    /// Timeline of a security, ordered by validity.
    pub fn segments_for_security(
        &self,
        security_key: &SecurityKey,
    ) -> impl Iterator<Item = &IndexedSegment> {
        self.by_security
            .get(security_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&position| &self.entries[position])
    }

    /// The segment of a security valid on `day`, if any.
    pub fn segment_at(&self, security_key: &SecurityKey, day: Day) -> Option<&IndexedSegment> {
        let positions = self.by_security.get(security_key)?;
        let after =
            positions.partition_point(|&position| self.entries[position].validity.start <= day);
        let candidate = &self.entries[*positions.get(after.checked_sub(1)?)?];
        candidate.validity.contains(day).then_some(candidate)
    }

    /// Tiers for which the reference table has at least one segment under the
    /// record's identifier, in hierarchy order.
    pub fn candidate_keys_for(&self, identifiers: &Identifiers) -> Vec<MatchSource> {
        MatchSource::HIERARCHY
            .into_iter()
            .filter(|&source| {
                identifiers
                    .for_source(source)
                    .is_some_and(|value| self.lookup(source, value).next().is_some())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            segments: self.entries.len(),
            securities: self.by_security.len(),
            cusip6_keys: self.by_cusip6.len(),
            ticker_keys: self.by_ticker.len(),
        }
    }
}
