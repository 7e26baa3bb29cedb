//! Weighted zero-fill composite.
//!
//! `IMPACT_SCORE = sum(weight * relativ)` over the configured sub-scores a
//! product holds. Absent sub-scores add nothing and the remaining weights are
//! used as configured, without renormalization. The composite is virtual when
//! none of the sub-scores it saw is real.
//!
//! A sub-score that carries an absolute measurement but no relativ value is
//! rated on the spot with sigma bounds against its own absolute population.

use super::finalize::{finalize_scores, FinalizeOptions};
use super::{AggregationStage, ProductOutcome};
use crate::consts::IMPACT_SCORE_NAME;
use crate::context::AggregationContext;
use crate::error::EngineResult;
use crate::relativize::{orient, sigma_rating};
use crate::stats::Contributions;
use scoreforge_protocol::{Product, Score, VerticalConfig};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ZeroFillComposite {
    pub value: f64,
    pub aggregates: BTreeMap<String, f64>,
    pub is_virtual: bool,
}

/// Pure composition step, independent of any stage state.
pub fn compose_zero_fill(
    product: &Product,
    vertical: &VerticalConfig,
    weights: &BTreeMap<String, f64>,
) -> ZeroFillComposite {
    let mut value = 0.0;
    let mut aggregates = BTreeMap::new();
    let mut any_real = false;

    for (name, &weight) in weights {
        let Some(score) = product.score(name) else {
            continue;
        };
        let relativ = match score.relativ_value() {
            Some(v) => v,
            None => {
                let fallback = score.absolute.as_ref().and_then(|abs| {
                    let raw = abs.value?;
                    sigma_rating(raw, abs).map(|r| orient(r, vertical.direction_for(name)))
                });
                match fallback {
                    Some(v) => v,
                    None => continue,
                }
            }
        };
        value += weight * relativ;
        aggregates.insert(name.clone(), weight);
        any_real |= !score.is_virtual;
    }

    ZeroFillComposite {
        value,
        aggregates,
        is_virtual: !any_real,
    }
}

pub struct ImpactScoreStage {
    score_name: String,
    weights: BTreeMap<String, f64>,
}

impl Default for ImpactScoreStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpactScoreStage {
    pub fn new() -> Self {
        Self {
            score_name: IMPACT_SCORE_NAME.to_string(),
            weights: BTreeMap::new(),
        }
    }
}

impl AggregationStage for ImpactScoreStage {
    fn name(&self) -> &str {
        "impact_score"
    }

    fn init(&mut self, ctx: &mut AggregationContext, _products: &[Product], vertical: &VerticalConfig) {
        self.weights = vertical
            .impact_score
            .as_ref()
            .map(|i| i.criterias_ponderation.clone())
            .unwrap_or_default();

        if self.weights.is_empty() {
            warn!(
                stage = self.name(),
                vertical = ctx.vertical_id(),
                "No impact score weights configured, no composite will be produced"
            );
        }
    }

    fn on_product(
        &self,
        product: &mut Product,
        vertical: &VerticalConfig,
        _ctx: &AggregationContext,
        sink: &mut Contributions,
    ) -> ProductOutcome {
        product.scores.remove(&self.score_name);
        if self.weights.is_empty() {
            return ProductOutcome::Skipped("no impact score weights".to_string());
        }

        let composite = compose_zero_fill(product, vertical, &self.weights);
        if !composite.is_virtual {
            sink.record(&self.score_name, composite.value);
        }

        let mut score = Score::measured(&self.score_name, composite.value);
        score.aggregates = composite.aggregates;
        score.is_virtual = composite.is_virtual;
        product.scores.insert(self.score_name.clone(), score);
        ProductOutcome::Processed
    }

    fn done(
        &mut self,
        ctx: &mut AggregationContext,
        products: &mut [Product],
        vertical: &VerticalConfig,
    ) -> EngineResult<()> {
        if self.weights.is_empty() {
            return Ok(());
        }
        let options = FinalizeOptions::builder().stage(self.name()).build();
        let summary = finalize_scores(ctx, products, vertical, &options);
        info!(
            stage = self.name(),
            vertical = ctx.vertical_id(),
            scores = summary.scores,
            failures = summary.failures,
            "Impact score computed"
        );
        Ok(())
    }
}
