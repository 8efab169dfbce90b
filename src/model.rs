//! # Data Model
//!
//! Reference segments, provider observations, match candidates and the three
//! output row shapes (yearly match, crosswalk, consolidated mapping).

use crate::normalize;
use crate::temporal::Interval;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use time::Date;

/// Stable database entity key (GVKEY).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey(pub String);

impl EntityKey {
    /// Build an entity key, zero-padding numeric keys to six digits.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match normalize::normalize_gvkey(&raw) {
            Some(key) => Self(key),
            None => Self(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Security-level key (PERMNO).
///
/// Ordering is numeric for all-digit keys, which sort ahead of any other key;
/// other keys compare lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityKey(pub String);

impl SecurityKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sort_key(&self) -> (u8, u64, &str) {
        match self.0.parse::<u64>() {
            Ok(value) if self.0.bytes().all(|b| b.is_ascii_digit()) => (0, value, self.0.as_str()),
            _ => (1, 0, self.0.as_str()),
        }
    }
}

impl PartialOrd for SecurityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SecurityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for SecurityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-native entity identifier (e.g. an issuer id or an org perm id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observation period of a provider record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// A full calendar year.
    Year(i32),
    /// A single as-of date.
    AsOf(Date),
}

impl Period {
    /// Observation window, `None` when the year is outside the supported calendar.
    pub fn interval(&self) -> Option<Interval> {
        match self {
            Period::Year(year) => Interval::calendar_year(*year),
            Period::AsOf(date) => Some(Interval::single_day(*date)),
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            Period::Year(year) => *year,
            Period::AsOf(date) => date.year(),
        }
    }

    fn rank(&self) -> (i64, i64, u8) {
        let (start, end) = self
            .interval()
            .map(|interval| (interval.start, interval.end))
            .unwrap_or((i64::from(self.year()), 0));
        let variant = match self {
            Period::Year(_) => 0,
            Period::AsOf(_) => 1,
        };
        (start, end, variant)
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.year().cmp(&other.year()))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(year) => write!(f, "{}", year),
            Period::AsOf(date) => write!(f, "{}", date),
        }
    }
}

/// Identifier tier a candidate was retrieved through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchSource {
    Cusip6,
    Isin,
    Ticker,
}

impl MatchSource {
    /// Tiers in the order the matcher consults them.
    pub const HIERARCHY: [MatchSource; 3] =
        [MatchSource::Cusip6, MatchSource::Isin, MatchSource::Ticker];

    /// Reliability rank; higher is more reliable.
    pub fn reliability(self) -> u8 {
        match self {
            MatchSource::Cusip6 => 3,
            MatchSource::Isin => 2,
            MatchSource::Ticker => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchSource::Cusip6 => "CUSIP6",
            MatchSource::Isin => "ISIN",
            MatchSource::Ticker => "TICKER",
        }
    }
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal reliability of the entity-key to security-key link.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LinkQuality(pub u8);

impl LinkQuality {
    /// Contribution of a primary link marker.
    const PRIMARY_MARKER: u8 = 3;
    pub const MAX: LinkQuality = LinkQuality(Self::PRIMARY_MARKER + 2);
    pub const PRIMARY: LinkQuality = LinkQuality(Self::PRIMARY_MARKER);
    pub const UNKNOWN: LinkQuality = LinkQuality(0);

    /// Derive the rank from link-table codes.
    ///
    /// `linkprim` of `P` or `C` marks a primary link; `linktype` ranks `LU` above
    /// `LC` above everything else.
    pub fn from_link_codes(linkprim: Option<&str>, linktype: Option<&str>) -> Self {
        let primary = match linkprim.map(|code| code.trim().to_ascii_uppercase()) {
            Some(code) if code == "P" || code == "C" => Self::PRIMARY_MARKER,
            _ => 0,
        };
        let link_type = match linktype.map(|code| code.trim().to_ascii_uppercase()) {
            Some(code) if code == "LU" => 2,
            Some(code) if code == "LC" => 1,
            _ => 0,
        };
        Self(primary + link_type)
    }

    pub fn is_primary(self) -> bool {
        self.0 >= Self::PRIMARY_MARKER
    }

    /// Rank scaled into `[0, 1]`.
    pub fn fraction(self) -> f64 {
        f64::from(self.0.min(Self::MAX.0)) / f64::from(Self::MAX.0)
    }
}

/// One validity interval of one security's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSegment {
    pub entity_key: EntityKey,
    pub security_key: SecurityKey,
    pub valid_from: Date,
    /// Exclusive end; `None` while the segment is current.
    pub valid_to: Option<Date>,
    pub cusip6: Option<String>,
    pub ticker: Option<String>,
    pub is_common: bool,
    pub is_primary_security: bool,
    pub exchange_code: Option<String>,
    pub link_quality: LinkQuality,
}

impl ReferenceSegment {
    pub fn new(
        entity_key: EntityKey,
        security_key: SecurityKey,
        valid_from: Date,
        valid_to: Option<Date>,
    ) -> Self {
        Self {
            entity_key,
            security_key,
            valid_from,
            valid_to,
            cusip6: None,
            ticker: None,
            is_common: false,
            is_primary_security: false,
            exchange_code: None,
            link_quality: LinkQuality::UNKNOWN,
        }
    }

    pub fn with_cusip6(mut self, cusip6: impl Into<String>) -> Self {
        self.cusip6 = Some(cusip6.into());
        self
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn with_common(mut self, is_common: bool) -> Self {
        self.is_common = is_common;
        self
    }

    pub fn with_primary_security(mut self, is_primary: bool) -> Self {
        self.is_primary_security = is_primary;
        self
    }

    pub fn with_exchange(mut self, exchange_code: impl Into<String>) -> Self {
        self.exchange_code = Some(exchange_code.into());
        self
    }

    pub fn with_link_quality(mut self, link_quality: LinkQuality) -> Self {
        self.link_quality = link_quality;
        self
    }

    /// Validity window, or an error when `valid_to <= valid_from`.
    pub fn validity(&self) -> anyhow::Result<Interval> {
        Interval::from_dates(self.valid_from, self.valid_to)
    }
}

/// Reference-table row as exported by the security-master build, before
/// flags and codes are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub entity_key: String,
    pub security_key: String,
    pub valid_from: Date,
    pub valid_to: Option<Date>,
    pub cusip: Option<String>,
    pub ticker: Option<String>,
    pub share_code: Option<i32>,
    pub exchange_code: Option<i32>,
    pub link_primary: Option<String>,
    pub link_type: Option<String>,
    /// Loose boolean text (`"1"`, `"Y"`, `"true"`, ...).
    pub primary_security: Option<String>,
}

impl ReferenceRow {
    pub fn into_segment(self) -> ReferenceSegment {
        let mut segment = ReferenceSegment::new(
            EntityKey::new(self.entity_key),
            SecurityKey::new(self.security_key),
            self.valid_from,
            self.valid_to,
        )
        .with_common(self.share_code.is_some_and(normalize::is_common_share_code))
        .with_primary_security(
            self.primary_security
                .as_deref()
                .is_some_and(normalize::coerce_boolean),
        )
        .with_link_quality(LinkQuality::from_link_codes(
            self.link_primary.as_deref(),
            self.link_type.as_deref(),
        ));
        segment.cusip6 = self.cusip;
        segment.ticker = self.ticker;
        segment.exchange_code = self
            .exchange_code
            .and_then(normalize::exchange_label)
            .map(str::to_string);
        segment
    }
}

/// One (entity, period) observation from a data vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub entity_id: EntityId,
    pub entity_name: Option<String>,
    pub period: Period,
    pub cusip: Option<String>,
    pub isin: Option<String>,
    pub ticker: Option<String>,
}

impl ProviderRecord {
    pub fn new(entity_id: impl Into<String>, period: Period) -> Self {
        Self {
            entity_id: EntityId::new(entity_id),
            entity_name: None,
            period,
            cusip: None,
            isin: None,
            ticker: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    pub fn with_cusip(mut self, cusip: impl Into<String>) -> Self {
        self.cusip = Some(cusip.into());
        self
    }

    pub fn with_isin(mut self, isin: impl Into<String>) -> Self {
        self.isin = Some(isin.into());
        self
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    /// Natural key of the observation.
    pub fn key(&self) -> (&EntityId, Period) {
        (&self.entity_id, self.period)
    }

    /// Canonical identifiers derived from the raw fields.
    pub fn identifiers(&self) -> Identifiers {
        Identifiers {
            cusip6: self.cusip.as_deref().and_then(normalize::cusip6),
            cusip6_from_isin: self.isin.as_deref().and_then(normalize::cusip6_from_isin),
            ticker: self.ticker.as_deref().and_then(normalize::ticker),
        }
    }
}

/// Derived, comparable identifiers of a provider record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifiers {
    pub cusip6: Option<String>,
    pub cusip6_from_isin: Option<String>,
    pub ticker: Option<String>,
}

impl Identifiers {
    /// Lookup value for a tier, if the record carries one.
    pub fn for_source(&self, source: MatchSource) -> Option<&str> {
        match source {
            MatchSource::Cusip6 => self.cusip6.as_deref(),
            MatchSource::Isin => self.cusip6_from_isin.as_deref(),
            MatchSource::Ticker => self.ticker.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cusip6.is_none() && self.cusip6_from_isin.is_none() && self.ticker.is_none()
    }
}

/// A proposed link between a provider record and a reference segment.
#[derive(Debug, Clone, Copy)]
pub struct MatchCandidate<'a> {
    pub match_source: MatchSource,
    pub overlap_days: i64,
    pub score: f64,
    pub record: &'a ProviderRecord,
    pub segment: &'a ReferenceSegment,
}

/// Fields of the selected candidate, flattened for output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSegment {
    pub match_source: MatchSource,
    pub score: f64,
    pub overlap_days: i64,
    pub entity_key: EntityKey,
    pub security_key: SecurityKey,
    pub is_common: bool,
    pub is_primary_security: bool,
    pub exchange_code: Option<String>,
    pub link_quality: LinkQuality,
    pub cusip6: Option<String>,
    pub ticker: Option<String>,
    pub valid_from: Date,
    pub valid_to: Option<Date>,
}

impl From<&MatchCandidate<'_>> for MatchedSegment {
    fn from(candidate: &MatchCandidate<'_>) -> Self {
        let segment = candidate.segment;
        Self {
            match_source: candidate.match_source,
            score: candidate.score,
            overlap_days: candidate.overlap_days,
            entity_key: segment.entity_key.clone(),
            security_key: segment.security_key.clone(),
            is_common: segment.is_common,
            is_primary_security: segment.is_primary_security,
            exchange_code: segment.exchange_code.clone(),
            link_quality: segment.link_quality,
            cusip6: segment.cusip6.clone(),
            ticker: segment.ticker.clone(),
            valid_from: segment.valid_from,
            valid_to: segment.valid_to,
        }
    }
}

/// Match outcome for one provider record; `matched` is `None` when unmatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyMatchRow {
    pub provider: String,
    pub entity_id: EntityId,
    pub entity_name: Option<String>,
    pub period: Period,
    /// Candidates that survived the overlap filter in the winning tier.
    pub candidate_count: usize,
    pub matched: Option<MatchedSegment>,
}

impl YearlyMatchRow {
    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }

    pub fn entity_key(&self) -> Option<&EntityKey> {
        self.matched.as_ref().map(|m| &m.entity_key)
    }

    pub fn match_source(&self) -> Option<MatchSource> {
        self.matched.as_ref().map(|m| m.match_source)
    }
}

/// One row per provider entity: its aggregated best entity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosswalkRow {
    pub provider: String,
    pub entity_id: EntityId,
    pub entity_name: Option<String>,
    pub entity_key: Option<EntityKey>,
    pub security_key: Option<SecurityKey>,
    /// Distinct periods with a match, whatever key they matched.
    pub years_covered: usize,
    pub first_period: Option<Period>,
    pub last_period: Option<Period>,
    /// Aggregate score of the winning key.
    pub total_score: Option<f64>,
    /// Distinct periods attributed to the winning key.
    pub key_periods: usize,
    pub max_overlap_days: Option<i64>,
    pub first_seen: Option<Date>,
    /// Latest segment end of the winning key; `None` when still current or unmatched.
    pub last_seen: Option<Date>,
}

impl CrosswalkRow {
    /// A row for an entity that was processed but never matched.
    pub fn unmatched(
        provider: impl Into<String>,
        entity_id: EntityId,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            entity_id,
            entity_name,
            entity_key: None,
            security_key: None,
            years_covered: 0,
            first_period: None,
            last_period: None,
            total_score: None,
            key_periods: 0,
            max_overlap_days: None,
            first_seen: None,
            last_seen: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.entity_key.is_some()
    }
}

/// One row per entity key with the provider entities that map to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedRow {
    pub entity_key: EntityKey,
    /// Provider name to the sorted entity ids mapping to this key.
    pub providers: BTreeMap<String, Vec<EntityId>>,
}

impl ConsolidatedRow {
    pub fn is_covered_by(&self, provider: &str) -> bool {
        self.providers
            .get(provider)
            .is_some_and(|ids| !ids.is_empty())
    }

    pub fn entity_ids(&self, provider: &str) -> &[EntityId] {
        self.providers
            .get(provider)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn provider_count(&self) -> usize {
        self.providers.values().filter(|ids| !ids.is_empty()).count()
    }
}

/// Long-format consolidated entry, one per matched provider entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedEntry {
    pub provider: String,
    pub entity_id: EntityId,
    pub entity_key: EntityKey,
    pub security_key: Option<SecurityKey>,
    pub years_covered: usize,
    pub first_period: Option<Period>,
    pub last_period: Option<Period>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_security_key_ordering() {
        let mut keys = vec![
            SecurityKey::new("PERM2"),
            SecurityKey::new("10001"),
            SecurityKey::new("9001"),
            SecurityKey::new("PERM10"),
        ];
        keys.sort();
        let ordered: Vec<&str> = keys.iter().map(SecurityKey::as_str).collect();
        assert_eq!(ordered, vec!["9001", "10001", "PERM10", "PERM2"]);
    }

    #[test]
    fn test_entity_key_padding() {
        assert_eq!(EntityKey::new("1234").as_str(), "001234");
        assert_eq!(EntityKey::new("1234.0").as_str(), "001234");
        assert_eq!(EntityKey::new("GVK123").as_str(), "GVK123");
    }

    #[test]
    fn test_period_ordering() {
        let mut periods = vec![
            Period::Year(2021),
            Period::AsOf(date!(2020 - 06 - 30)),
            Period::Year(2020),
        ];
        periods.sort();
        assert_eq!(
            periods,
            vec![
                Period::Year(2020),
                Period::AsOf(date!(2020 - 06 - 30)),
                Period::Year(2021)
            ]
        );
    }

    #[test]
    fn test_link_quality_codes() {
        let best = LinkQuality::from_link_codes(Some("P"), Some("LU"));
        let secondary = LinkQuality::from_link_codes(Some("J"), Some("LC"));
        assert_eq!(best, LinkQuality::MAX);
        assert!(best.is_primary());
        assert!(!secondary.is_primary());
        assert!(best > secondary);
        assert_eq!(LinkQuality::from_link_codes(None, None), LinkQuality::UNKNOWN);
        assert_eq!(best.fraction(), 1.0);
    }

    #[test]
    fn test_match_source_reliability() {
        let ranks: Vec<u8> = MatchSource::HIERARCHY
            .iter()
            .map(|source| source.reliability())
            .collect();
        assert_eq!(ranks, vec![3, 2, 1]);
        assert_eq!(serde_json::to_string(&MatchSource::Cusip6).unwrap(), "\"CUSIP6\"");
    }

    #[test]
    fn test_reference_row_interpretation() {
        let segment = ReferenceRow {
            entity_key: "1690.0".to_string(),
            security_key: "14593".to_string(),
            valid_from: date!(1980 - 12 - 12),
            valid_to: None,
            cusip: Some("03783310".to_string()),
            ticker: Some("AAPL".to_string()),
            share_code: Some(11),
            exchange_code: Some(3),
            link_primary: Some("P".to_string()),
            link_type: Some("LC".to_string()),
            primary_security: Some("Y".to_string()),
        }
        .into_segment();
        assert_eq!(segment.entity_key.as_str(), "001690");
        assert!(segment.is_common);
        assert!(segment.is_primary_security);
        assert_eq!(segment.exchange_code.as_deref(), Some("NASDAQ"));
        assert_eq!(segment.link_quality, LinkQuality(4));
    }

    #[test]
    fn test_segment_validity() {
        let segment = ReferenceSegment::new(
            EntityKey::new("1"),
            SecurityKey::new("1"),
            date!(2020 - 01 - 01),
            Some(date!(2020 - 01 - 01)),
        );
        assert!(segment.validity().is_err());
    }
}
