//! # Identifier Normalization
//!
//! Pure functions that turn raw CUSIP, ISIN, ticker and key strings into
//! comparable canonical forms. Malformed input yields `None`; nothing here fails.

/// ISIN country prefixes whose national code embeds a CUSIP.
pub const CUSIP_ISIN_COUNTRIES: [&str; 2] = ["US", "CA"];

const CUSIP_LEN: usize = 9;
const CUSIP8_LEN: usize = 8;
const CUSIP6_LEN: usize = 6;
const ISIN_LEN: usize = 12;
const GVKEY_LEN: usize = 6;

/// Characters that separate a share-class or venue suffix from a ticker root.
const TICKER_SUFFIX_SEPARATORS: [char; 2] = ['.', '/'];

/// Trim and uppercase; empty strings become `None`.
pub fn normalize_string(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

fn compact_upper(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn is_alphanumeric(code: &str) -> bool {
    code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Issuer prefix of a full CUSIP.
///
/// Short values are left-padded with zeros to nine characters to undo leading
/// zeros lost to numeric storage. Anything that is not then exactly nine
/// alphanumeric characters is rejected.
pub fn cusip6(raw: &str) -> Option<String> {
    let code = compact_upper(raw);
    if code.is_empty() || code.len() > CUSIP_LEN || !is_alphanumeric(&code) {
        return None;
    }
    let padded = format!("{:0>width$}", code, width = CUSIP_LEN);
    Some(padded[..CUSIP6_LEN].to_string())
}

/// CUSIP6 embedded in a North American ISIN (characters 3 through 8).
pub fn cusip6_from_isin(raw: &str) -> Option<String> {
    let code = compact_upper(raw);
    if code.len() != ISIN_LEN || !is_alphanumeric(&code) {
        return None;
    }
    if !CUSIP_ISIN_COUNTRIES.contains(&&code[..2]) {
        return None;
    }
    Some(code[2..2 + CUSIP6_LEN].to_string())
}

/// Reference-side CUSIP6 from a six-character code, a CUSIP8 or a full CUSIP.
///
/// All-digit codes shorter than six characters are padded to six, and
/// seven-digit codes are read as a CUSIP8 that lost its leading zero.
/// Longer codes are truncated to their first six characters.
pub fn cusip6_key(raw: &str) -> Option<String> {
    let code = compact_upper(raw);
    if code.is_empty() || !is_alphanumeric(&code) {
        return None;
    }
    let all_digits = code.bytes().all(|b| b.is_ascii_digit());
    if all_digits && code.len() == CUSIP8_LEN - 1 {
        return Some(format!("0{}", &code[..CUSIP6_LEN - 1]));
    }
    if code.len() >= CUSIP6_LEN {
        return Some(code[..CUSIP6_LEN].to_string());
    }
    Some(format!("{:0>width$}", code, width = CUSIP6_LEN))
}

/// Uppercase, whitespace-free ticker root with any class suffix removed.
pub fn ticker(raw: &str) -> Option<String> {
    let code = compact_upper(raw);
    let root = code
        .split(|c| TICKER_SUFFIX_SEPARATORS.contains(&c))
        .next()
        .unwrap_or_default();
    if root.is_empty() {
        None
    } else {
        Some(root.to_string())
    }
}

/// Vendor symbol with a trailing alphabetic venue suffix removed
/// (`"VOD.L"` becomes `"VOD"`; `"BRK.B"` is treated the same way).
pub fn clean_symbol(raw: &str) -> Option<String> {
    let symbol = normalize_string(raw)?;
    match symbol.rsplit_once('.') {
        Some((root, suffix))
            if !root.is_empty()
                && !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_uppercase()) =>
        {
            Some(root.to_string())
        }
        _ => Some(symbol),
    }
}

/// Numeric entity keys as six zero-padded digits (`"1234.0"` becomes `"001234"`).
///
/// Returns `None` for keys that are not numeric.
pub fn normalize_gvkey(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{:0>width$}", digits, width = GVKEY_LEN))
}

/// Loose boolean parsing for flag columns.
pub fn coerce_boolean(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "t" | "y" | "yes"
    )
}

/// Label for a numeric listing-exchange code.
pub fn exchange_label(code: i32) -> Option<&'static str> {
    match code {
        1 => Some("NYSE"),
        2 => Some("AMEX"),
        3 => Some("NASDAQ"),
        _ => None,
    }
}

/// Canonical exchange code: numeric codes map to labels, others are uppercased.
pub fn exchange(raw: &str) -> Option<String> {
    let code = normalize_string(raw)?;
    match code.parse::<i32>() {
        Ok(numeric) => exchange_label(numeric).map(str::to_string),
        Err(_) => Some(code),
    }
}

/// Whether a share code denotes ordinary common stock.
pub fn is_common_share_code(share_code: i32) -> bool {
    matches!(share_code, 10 | 11)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cusip6_from_full_cusip() {
        assert_eq!(cusip6("037833100"), Some("037833".to_string()));
        assert_eq!(cusip6(" 037833100 "), Some("037833".to_string()));
        assert_eq!(cusip6("g1151c101"), Some("G1151C".to_string()));
    }

    #[test]
    fn test_cusip6_restores_lost_leading_zeros() {
        assert_eq!(cusip6("37833100"), Some("037833".to_string()));
        assert_eq!(cusip6("4567"), Some("000004".to_string()));
    }

    #[test]
    fn test_cusip6_rejects_malformed() {
        assert_eq!(cusip6(""), None);
        assert_eq!(cusip6("   "), None);
        assert_eq!(cusip6("0378331001"), None);
        assert_eq!(cusip6("03783-100"), None);
    }

    #[test]
    fn test_isin_north_american_only() {
        assert_eq!(
            cusip6_from_isin("US0378331005"),
            Some("037833".to_string())
        );
        assert_eq!(
            cusip6_from_isin("ca1360691010"),
            Some("136069".to_string())
        );
        assert_eq!(cusip6_from_isin("GB0002634946"), None);
        assert_eq!(cusip6_from_isin("US037833100"), None);
        assert_eq!(cusip6_from_isin("US03783310055"), None);
    }

    #[test]
    fn test_ticker_normalization() {
        assert_eq!(ticker(" aapl "), Some("AAPL".to_string()));
        assert_eq!(ticker("BRK.B"), Some("BRK".to_string()));
        assert_eq!(ticker("VOD.L"), Some("VOD".to_string()));
        assert_eq!(ticker("BF/A"), Some("BF".to_string()));
        assert_eq!(ticker(""), None);
        assert_eq!(ticker(".A"), None);
    }

    #[test]
    fn test_clean_symbol() {
        assert_eq!(clean_symbol("vod.l"), Some("VOD".to_string()));
        assert_eq!(clean_symbol("AAPL"), Some("AAPL".to_string()));
        assert_eq!(clean_symbol("X.1"), Some("X.1".to_string()));
        assert_eq!(clean_symbol("  "), None);
    }

    #[test]
    fn test_reference_cusip6_key() {
        assert_eq!(cusip6_key("037833"), Some("037833".to_string()));
        assert_eq!(cusip6_key("03783310"), Some("037833".to_string()));
        assert_eq!(cusip6_key("37833"), Some("037833".to_string()));
        assert_eq!(cusip6_key("3783310"), Some("037833".to_string()));
        assert_eq!(cusip6_key("03#833"), None);
    }

    #[test]
    fn test_gvkey_normalization() {
        assert_eq!(normalize_gvkey("1690"), Some("001690".to_string()));
        assert_eq!(normalize_gvkey("1690.0"), Some("001690".to_string()));
        assert_eq!(normalize_gvkey("GVK1"), None);
    }

    #[test]
    fn test_flags_and_exchanges() {
        assert!(coerce_boolean("Yes"));
        assert!(coerce_boolean("1"));
        assert!(!coerce_boolean("0"));
        assert!(!coerce_boolean(""));
        assert_eq!(exchange("3"), Some("NASDAQ".to_string()));
        assert_eq!(exchange("nyse"), Some("NYSE".to_string()));
        assert_eq!(exchange("9"), None);
        assert!(is_common_share_code(11));
        assert!(!is_common_share_code(73));
    }
}
