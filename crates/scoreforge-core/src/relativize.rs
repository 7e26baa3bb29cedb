//! Maps a raw value onto the 0..=MAX_RATING scale against its batch population.
//!
//! By default two methods are picked from automatically. Percentile rank
//! (mid-rank ties) is used for near-discrete attributes with few distinct
//! levels; sigma bounds (mean +/- 2 sigma, clipped) are used once the
//! population has at least `min_distinct_values_for_sigma` distinct values.
//!
//! An attribute may override this through its [`ScoringConfig`]: force a
//! method, use min-max between two quantiles of the observed values, rate on
//! another scale, and choose what a population without spread yields.

use crate::consts::{MAX_RATING, NEUTRAL_RATING, SIGMA_WIDTH};
use crate::error::{EngineError, EngineResult};
use crate::stats::{FrozenHistogram, Population};
use scoreforge_protocol::{
    Cardinality, DegeneratePolicy, Direction, NormalizationConfig, NormalizationMethod,
    ScoringConfig,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Method {
    Percentile,
    Sigma,
    Quantile,
}

impl Method {
    pub fn select(distinct_values: usize, min_distinct_for_sigma: usize) -> Self {
        if distinct_values < min_distinct_for_sigma {
            Method::Percentile
        } else {
            Method::Sigma
        }
    }
}

/// A relativized value. Virtual ratings come from a degenerate population
/// under [`DegeneratePolicy::NeutralVirtual`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub value: f64,
    pub is_virtual: bool,
}

/// Sigma-bounded rating, before direction is applied.
pub fn sigma_rating(value: f64, population: &Cardinality) -> Option<f64> {
    if population.count == 0 {
        return None;
    }
    let mean = population.mean();
    let spread = SIGMA_WIDTH * population.sigma();
    let lower = mean - spread;
    let upper = mean + spread;
    if upper == lower {
        return Some(NEUTRAL_RATING);
    }
    let normalized = ((value - lower) / (upper - lower)).clamp(0.0, 1.0);
    Some(normalized * MAX_RATING)
}

/// Mid-rank percentile rating, before direction is applied.
pub fn percentile_rating(value: f64, histogram: &FrozenHistogram) -> Option<f64> {
    let total = histogram.total();
    if total == 0 {
        return None;
    }
    let (less, equal) = histogram.rank_counts(value);
    let percentile = (less as f64 + 0.5 * equal as f64) / total as f64;
    Some(percentile * MAX_RATING)
}

/// Min-max rating between the `low` and `high` nearest-rank quantiles, before
/// direction is applied. `None` when the bounds do not spread.
pub fn quantile_rating(value: f64, histogram: &FrozenHistogram, low: f64, high: f64) -> Option<f64> {
    let lower = histogram.quantile(low)?;
    let upper = histogram.quantile(high)?;
    if upper <= lower {
        return None;
    }
    let normalized = ((value - lower) / (upper - lower)).clamp(0.0, 1.0);
    Some(normalized * MAX_RATING)
}

#[inline(always)]
pub fn orient(rating: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Greater => rating,
        Direction::Lower => MAX_RATING - rating,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Relativizer {
    min_distinct_for_sigma: usize,
}

impl Relativizer {
    pub fn new(min_distinct_for_sigma: usize) -> Self {
        Self {
            min_distinct_for_sigma,
        }
    }

    pub fn method_for(&self, population: &Population) -> Method {
        Method::select(population.distinct_values(), self.min_distinct_for_sigma)
    }

    /// Method an attribute's override asks for, automatic selection otherwise.
    pub fn method_for_scoring(&self, population: &Population, scoring: Option<&ScoringConfig>) -> Method {
        match scoring.map(|s| s.normalization.method).unwrap_or_default() {
            NormalizationMethod::Auto => self.method_for(population),
            NormalizationMethod::Sigma => Method::Sigma,
            NormalizationMethod::Percentile => Method::Percentile,
            NormalizationMethod::MinMaxQuantile => Method::Quantile,
        }
    }

    pub fn relativize(
        &self,
        score: &str,
        value: f64,
        population: &Population,
        direction: Direction,
    ) -> EngineResult<f64> {
        self.rate(score, value, population, direction, None)
            .map(|r| r.value)
    }

    pub fn relativize_with(
        &self,
        method: Method,
        score: &str,
        value: f64,
        population: &Population,
        direction: Direction,
    ) -> EngineResult<f64> {
        self.rate_with(method, score, value, population, direction, &ScoringConfig::default())
            .map(|r| r.value)
    }

    /// Rates `value` honouring the attribute's scoring override, if any.
    pub fn rate(
        &self,
        score: &str,
        value: f64,
        population: &Population,
        direction: Direction,
        scoring: Option<&ScoringConfig>,
    ) -> EngineResult<Rating> {
        let method = self.method_for_scoring(population, scoring);
        let default = ScoringConfig::default();
        let scoring = scoring.unwrap_or(&default);
        self.rate_with(method, score, value, population, direction, scoring)
    }

    fn rate_with(
        &self,
        method: Method,
        score: &str,
        value: f64,
        population: &Population,
        direction: Direction,
        scoring: &ScoringConfig,
    ) -> EngineResult<Rating> {
        if !value.is_finite() {
            return Err(EngineError::resolution(score, format!("non-finite value {}", value)));
        }
        let scale = scoring.scale;
        if !(scale.min.is_finite() && scale.max.is_finite() && scale.min < scale.max) {
            return Err(EngineError::resolution(
                score,
                format!("invalid scale {}..{}", scale.min, scale.max),
            ));
        }
        let card = &population.cardinality;
        if card.count == 0 {
            return Err(EngineError::resolution(score, "empty population"));
        }
        if card.min == card.max {
            return degenerate(score, scoring);
        }

        let rating = match method {
            Method::Sigma => sigma_rating(value, card),
            Method::Percentile => percentile_rating(value, &population.histogram),
            Method::Quantile => {
                let (low, high) = quantile_bounds(score, &scoring.normalization)?;
                match quantile_rating(value, &population.histogram, low, high) {
                    Some(r) => Some(r),
                    None => return degenerate(score, scoring),
                }
            }
        }
        .ok_or_else(|| EngineError::resolution(score, "empty population"))?;

        // ratio is exactly 1.0 on the default scale
        let scaled = (rating * (scale.max / MAX_RATING)).clamp(scale.min, scale.max);
        let value = match direction {
            Direction::Greater => scaled,
            Direction::Lower => scale.min + scale.max - scaled,
        };
        Ok(Rating {
            value,
            is_virtual: false,
        })
    }
}

fn quantile_bounds(score: &str, normalization: &NormalizationConfig) -> EngineResult<(f64, f64)> {
    match (normalization.quantile_low, normalization.quantile_high) {
        (Some(low), Some(high)) if low.is_finite() && high.is_finite() && high > low => Ok((low, high)),
        (Some(low), Some(high)) => Err(EngineError::resolution(
            score,
            format!("invalid quantile bounds {}..{}", low, high),
        )),
        _ => Err(EngineError::resolution(score, "missing quantile bounds")),
    }
}

fn degenerate(score: &str, scoring: &ScoringConfig) -> EngineResult<Rating> {
    let neutral = scoring.scale.neutral();
    match scoring.degenerate_distribution_policy {
        DegeneratePolicy::Neutral => Ok(Rating {
            value: neutral,
            is_virtual: false,
        }),
        DegeneratePolicy::NeutralVirtual => Ok(Rating {
            value: neutral,
            is_virtual: true,
        }),
        DegeneratePolicy::Error => Err(EngineError::resolution(score, "degenerate distribution")),
    }
}
