//! # Provider Sources
//!
//! A provider is only a way of loading records and choosing which raw
//! identifiers feed the matcher. Everything downstream of extraction is shared.

use crate::model::ProviderRecord;
use crate::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Built-in identifier extraction profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Organisation-level panel keyed by perm id; CUSIP and ISIN.
    Refinitiv,
    /// Issuer-level panel; CUSIP and ISIN.
    Msci,
    /// Symbol-keyed panel; ISIN and the cleaned symbol as ticker.
    Fmp,
    /// Every supplied identifier is used as is.
    Custom,
}

impl ProviderKind {
    pub fn profile(self) -> IdentifierProfile {
        match self {
            ProviderKind::Refinitiv | ProviderKind::Msci => IdentifierProfile {
                cusip: true,
                isin: true,
                ticker: false,
                clean_symbol: false,
            },
            ProviderKind::Fmp => IdentifierProfile {
                cusip: false,
                isin: true,
                ticker: true,
                clean_symbol: true,
            },
            ProviderKind::Custom => IdentifierProfile {
                cusip: true,
                isin: true,
                ticker: true,
                clean_symbol: false,
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Refinitiv => "refinitiv",
            ProviderKind::Msci => "msci",
            ProviderKind::Fmp => "fmp",
            ProviderKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Which raw identifier fields a provider contributes to matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierProfile {
    pub cusip: bool,
    pub isin: bool,
    pub ticker: bool,
    /// Strip a trailing venue suffix from the symbol before it is used as a ticker.
    pub clean_symbol: bool,
}

impl IdentifierProfile {
    /// Drop identifiers the profile does not use.
    pub fn apply(&self, mut record: ProviderRecord) -> ProviderRecord {
        if !self.cusip {
            record.cusip = None;
        }
        if !self.isin {
            record.isin = None;
        }
        if !self.ticker {
            record.ticker = None;
        } else if self.clean_symbol {
            record.ticker = record.ticker.as_deref().and_then(normalize::clean_symbol);
        }
        record
    }
}

/// Loads one provider's entity-period panel.
///
/// The identifier profile comes from the provider registry, not the source.
pub trait ProviderSource: Send + Sync {
    /// Registry name of the provider.
    fn name(&self) -> &str;

    /// Raw records, not yet deduplicated or profiled.
    fn records(&self) -> anyhow::Result<Vec<ProviderRecord>>;
}

/// Records with the `kind` identifier profile applied.
pub fn extract(
    source: &dyn ProviderSource,
    kind: ProviderKind,
) -> anyhow::Result<Vec<ProviderRecord>> {
    let profile = kind.profile();
    let records: Vec<ProviderRecord> = source
        .records()?
        .into_iter()
        .map(|record| profile.apply(record))
        .collect();
    let availability = IdentifierAvailability::measure(&records);
    info!(
        provider = source.name(),
        %kind,
        records = availability.records,
        cusip = availability.cusip,
        isin = availability.isin,
        ticker = availability.ticker,
        "provider identifiers extracted"
    );
    Ok(records)
}

/// Count of records carrying a usable value per identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentifierAvailability {
    pub records: usize,
    pub cusip: usize,
    pub isin: usize,
    pub ticker: usize,
}

impl IdentifierAvailability {
    pub fn measure(records: &[ProviderRecord]) -> Self {
        records.iter().fold(
            Self {
                records: records.len(),
                ..Self::default()
            },
            |mut counts, record| {
                let identifiers = record.identifiers();
                counts.cusip += usize::from(identifiers.cusip6.is_some());
                counts.isin += usize::from(identifiers.cusip6_from_isin.is_some());
                counts.ticker += usize::from(identifiers.ticker.is_some());
                counts
            },
        )
    }
}

/// Provider panel held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    name: String,
    records: Vec<ProviderRecord>,
}

impl InMemoryProvider {
    pub fn new(name: impl Into<String>, records: Vec<ProviderRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl ProviderSource for InMemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn records(&self) -> anyhow::Result<Vec<ProviderRecord>> {
        Ok(self.records.clone())
    }
}
