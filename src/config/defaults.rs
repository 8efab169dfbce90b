//! Default constants for crosswalk configuration.
//!
//! All scoring coefficients and tuning numbers are centralized here with documentation.

// =============================================================================
// Scoring Defaults
// =============================================================================

/// Score added per reliability rank of the match source.
/// CUSIP6 contributes 3x, ISIN 2x and TICKER 1x this weight. Must exceed the
/// sum of every other component maximum.
pub const DEFAULT_TIER_WEIGHT: f64 = 100.0;

/// Bonus for common (ordinary) share classes.
pub const DEFAULT_COMMON_WEIGHT: f64 = 30.0;

/// Bonus for the issuer's primary security.
pub const DEFAULT_PRIMARY_SECURITY_WEIGHT: f64 = 20.0;

/// Bonus for a listing on one of the preferred exchanges.
pub const DEFAULT_EXCHANGE_WEIGHT: f64 = 10.0;

/// Maximum contribution of the entity/security link-quality rank.
pub const DEFAULT_LINK_QUALITY_WEIGHT: f64 = 15.0;

/// Maximum contribution of the overlap share of the observation period.
pub const DEFAULT_OVERLAP_WEIGHT: f64 = 20.0;

/// Exchanges that earn the listing bonus.
pub const DEFAULT_PREFERRED_EXCHANGES: [&str; 2] = ["NYSE", "NASDAQ"];

pub fn default_preferred_exchanges() -> Vec<String> {
    DEFAULT_PREFERRED_EXCHANGES
        .iter()
        .map(|code| code.to_string())
        .collect()
}

// =============================================================================
// Matching Defaults
// =============================================================================

/// Match provider records on the rayon pool.
pub const DEFAULT_PARALLEL: bool = true;

/// Panels smaller than this are matched on the calling thread even when
/// parallel matching is enabled.
pub const DEFAULT_PARALLEL_MIN_RECORDS: usize = 512;

// =============================================================================
// Loading Defaults
// =============================================================================

/// Prefix of environment variables read by `CrosswalkConfig::load`.
pub const ENV_PREFIX: &str = "CROSSWALK_";

/// Separator between nested keys in environment variable names.
pub const ENV_SEPARATOR: &str = "__";
