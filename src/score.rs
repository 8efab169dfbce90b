//! # Quality Scoring
//!
//! Weighted-sum score for a match candidate. The match-source component steps by
//! `tier_step` per reliability rank and `tier_step` must exceed the combined
//! maximum of every other component, so a more reliable tier always wins
//! regardless of the remaining attributes.

use crate::config::{
    DEFAULT_COMMON_WEIGHT, DEFAULT_EXCHANGE_WEIGHT, DEFAULT_LINK_QUALITY_WEIGHT,
    DEFAULT_OVERLAP_WEIGHT, DEFAULT_PRIMARY_SECURITY_WEIGHT, DEFAULT_TIER_WEIGHT,
};
use crate::error::{CrosswalkError, Result};
use crate::model::{MatchSource, ReferenceSegment};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

/// Component weights of the quality score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Added once per reliability rank of the match source.
    pub tier_step: f64,
    pub common: f64,
    pub primary_security: f64,
    pub preferred_exchange: f64,
    /// Scaled by the link-quality rank fraction.
    pub link_quality: f64,
    /// Scaled by overlap_days / period_days, capped at 1.
    pub overlap: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            tier_step: DEFAULT_TIER_WEIGHT,
            common: DEFAULT_COMMON_WEIGHT,
            primary_security: DEFAULT_PRIMARY_SECURITY_WEIGHT,
            preferred_exchange: DEFAULT_EXCHANGE_WEIGHT,
            link_quality: DEFAULT_LINK_QUALITY_WEIGHT,
            overlap: DEFAULT_OVERLAP_WEIGHT,
        }
    }
}

impl ScoreWeights {
    /// Largest total the non-tier components can contribute.
    pub fn non_tier_max(&self) -> f64 {
        self.common
            + self.primary_security
            + self.preferred_exchange
            + self.link_quality
            + self.overlap
    }

    /// Reject weights that would let attributes override a tier difference.
    pub fn validate(&self) -> Result<()> {
        let components = [
            self.tier_step,
            self.common,
            self.primary_security,
            self.preferred_exchange,
            self.link_quality,
            self.overlap,
        ];
        let non_tier_max = self.non_tier_max();
        if components.iter().any(|w| !w.is_finite() || *w < 0.0) || self.tier_step <= non_tier_max {
            return Err(CrosswalkError::InvalidWeights {
                tier_weight: self.tier_step,
                non_tier_max,
            });
        }
        Ok(())
    }
}

/// Scores candidates with validated weights and a preferred-exchange set.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    weights: ScoreWeights,
    preferred_exchanges: HashSet<String>,
}

impl QualityScorer {
    pub fn new<I, S>(weights: ScoreWeights, preferred_exchanges: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        weights.validate()?;
        Ok(Self {
            weights,
            preferred_exchanges: preferred_exchanges
                .into_iter()
                .filter_map(|code| crate::normalize::exchange(code.as_ref()))
                .collect(),
        })
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn is_preferred_exchange(&self, exchange_code: Option<&str>) -> bool {
        exchange_code.is_some_and(|code| self.preferred_exchanges.contains(code))
    }

    /// Score of a candidate whose observation period lasts `period_days`.
    pub fn score(
        &self,
        source: MatchSource,
        segment: &ReferenceSegment,
        overlap_days: i64,
        period_days: i64,
    ) -> f64 {
        let w = &self.weights;
        let mut score = w.tier_step * f64::from(source.reliability());

        if segment.is_common {
            score += w.common;
        }
        if segment.is_primary_security {
            score += w.primary_security;
        }
        if self.is_preferred_exchange(segment.exchange_code.as_deref()) {
            score += w.preferred_exchange;
        }
        score += w.link_quality * segment.link_quality.fraction();
        score += w.overlap * overlap_fraction(overlap_days, period_days);
        score
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            preferred_exchanges: crate::config::default_preferred_exchanges()
                .into_iter()
                .collect(),
        }
    }
}

fn overlap_fraction(overlap_days: i64, period_days: i64) -> f64 {
    if overlap_days <= 0 || period_days <= 0 {
        return 0.0;
    }
    (overlap_days as f64 / period_days as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKey, LinkQuality, SecurityKey};
    use time::macros::date;

    fn bare() -> ReferenceSegment {
        ReferenceSegment::new(
            EntityKey::new("1"),
            SecurityKey::new("10001"),
            date!(2000 - 01 - 01),
            None,
        )
    }

    fn ideal() -> ReferenceSegment {
        bare()
            .with_common(true)
            .with_primary_security(true)
            .with_exchange("NYSE")
            .with_link_quality(LinkQuality::MAX)
    }

    #[test]
    fn test_default_weights_are_valid() {
        assert!(ScoreWeights::default().validate().is_ok());
        assert!(ScoreWeights::default().non_tier_max() < DEFAULT_TIER_WEIGHT);
    }

    #[test]
    fn test_tier_dominance_with_identical_attributes() {
        let scorer = QualityScorer::default();
        let segment = ideal();
        let cusip = scorer.score(MatchSource::Cusip6, &segment, 365, 365);
        let isin = scorer.score(MatchSource::Isin, &segment, 365, 365);
        let ticker = scorer.score(MatchSource::Ticker, &segment, 365, 365);
        assert!(cusip > isin);
        assert!(isin > ticker);
    }

    #[test]
    fn test_tier_dominance_across_attributes() {
        let scorer = QualityScorer::default();
        let worst_cusip = scorer.score(MatchSource::Cusip6, &bare(), 1, 366);
        let best_isin = scorer.score(MatchSource::Isin, &ideal(), 366, 366);
        let worst_isin = scorer.score(MatchSource::Isin, &bare(), 1, 366);
        let best_ticker = scorer.score(MatchSource::Ticker, &ideal(), 366, 366);
        assert!(worst_cusip > best_isin);
        assert!(worst_isin > best_ticker);
    }

    #[test]
    fn test_each_attribute_raises_score() {
        let scorer = QualityScorer::default();
        let base = scorer.score(MatchSource::Cusip6, &bare(), 100, 365);
        let variants = [
            bare().with_common(true),
            bare().with_primary_security(true),
            bare().with_exchange("NASDAQ"),
            bare().with_link_quality(LinkQuality::PRIMARY),
        ];
        for variant in &variants {
            assert!(scorer.score(MatchSource::Cusip6, variant, 100, 365) > base);
        }
        assert!(scorer.score(MatchSource::Cusip6, &bare(), 200, 365) > base);
        assert_eq!(
            scorer.score(MatchSource::Cusip6, &bare().with_exchange("AMEX"), 100, 365),
            base
        );
    }

    #[test]
    fn test_overlap_is_bounded() {
        let scorer = QualityScorer::default();
        let full = scorer.score(MatchSource::Ticker, &bare(), 365, 365);
        let beyond = scorer.score(MatchSource::Ticker, &bare(), 10_000, 365);
        assert_eq!(full, beyond);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let weights = ScoreWeights {
            tier_step: 50.0,
            ..ScoreWeights::default()
        };
        assert!(matches!(
            QualityScorer::new(weights, ["NYSE"]),
            Err(CrosswalkError::InvalidWeights { .. })
        ));

        let negative = ScoreWeights {
            overlap: -1.0,
            ..ScoreWeights::default()
        };
        assert!(negative.validate().is_err());
    }
}
