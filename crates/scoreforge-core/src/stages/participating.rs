//! Renormalize-with-fallback composites, declared through attribute
//! `participate_in_scores` tags.

use super::finalize::{finalize_scores, FinalizeOptions};
use super::{AggregationStage, ProductOutcome};
use crate::context::AggregationContext;
use crate::error::EngineResult;
use crate::stats::Contributions;
use scoreforge_protocol::{Product, Score, VerticalConfig};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One tag-declared composite and its renormalized component weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipatingComposite {
    pub name: String,
    pub components: Vec<(String, f64)>,
}

impl ParticipatingComposite {
    /// Components are the scored attributes tagged with `name` that carry a
    /// positive weight. `None` when no such component exists.
    pub fn from_vertical(name: &str, vertical: &VerticalConfig) -> Option<Self> {
        let weights = &vertical.impact_score.as_ref()?.criterias_ponderation;

        let raw: Vec<(String, f64)> = vertical
            .score_attributes()
            .filter(|a| a.participate_in_scores.contains(name))
            .filter_map(|a| {
                weights
                    .get(&a.key)
                    .filter(|w| w.is_finite() && **w > 0.0)
                    .map(|w| (a.key.clone(), *w))
            })
            .collect();

        let total: f64 = raw.iter().map(|(_, w)| w).sum();
        if raw.is_empty() || total <= 0.0 {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            components: raw.into_iter().map(|(k, w)| (k, w / total)).collect(),
        })
    }

    /// `None` when a missing component has no batch statistics to fall back on.
    pub fn compose(&self, product: &Product, ctx: &AggregationContext) -> Option<FallbackComposite> {
        let mut value = 0.0;
        let mut aggregates = BTreeMap::new();
        let mut any_real = false;

        for (component, weight) in &self.components {
            let relativ = match product.real_score(component).and_then(|s| s.relativ_value()) {
                Some(v) => {
                    any_real = true;
                    v
                }
                None => ctx.relativ_population(component)?.mean(),
            };
            value += weight * relativ;
            aggregates.insert(component.clone(), *weight);
        }

        Some(FallbackComposite {
            value,
            aggregates,
            is_virtual: !any_real,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackComposite {
    pub value: f64,
    pub aggregates: BTreeMap<String, f64>,
    pub is_virtual: bool,
}

#[derive(Debug, Default)]
pub struct ParticipatingScoresStage {
    composites: Vec<ParticipatingComposite>,
}

impl ParticipatingScoresStage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AggregationStage for ParticipatingScoresStage {
    fn name(&self) -> &str {
        "participating_scores"
    }

    fn init(&mut self, ctx: &mut AggregationContext, _products: &[Product], vertical: &VerticalConfig) {
        self.composites = vertical
            .participating_composites()
            .into_iter()
            .filter_map(|name| {
                let composite = ParticipatingComposite::from_vertical(name, vertical);
                if composite.is_none() {
                    debug!(
                        stage = "participating_scores",
                        vertical = ctx.vertical_id(),
                        composite = name,
                        "No weighted component, composite dropped"
                    );
                }
                composite
            })
            .collect();
    }

    fn on_product(
        &self,
        product: &mut Product,
        _vertical: &VerticalConfig,
        ctx: &AggregationContext,
        sink: &mut Contributions,
    ) -> ProductOutcome {
        if self.composites.is_empty() {
            return ProductOutcome::Skipped("no participating composite".to_string());
        }

        let mut written = 0usize;
        for composite in &self.composites {
            product.scores.remove(&composite.name);
            let Some(result) = composite.compose(product, ctx) else {
                continue;
            };
            if !result.is_virtual {
                sink.record(&composite.name, result.value);
            }
            let mut score = Score::measured(&composite.name, result.value);
            score.aggregates = result.aggregates;
            score.is_virtual = result.is_virtual;
            product.scores.insert(composite.name.clone(), score);
            written += 1;
        }

        if written == 0 {
            return ProductOutcome::Skipped("no component statistics".to_string());
        }
        ProductOutcome::Processed
    }

    fn done(
        &mut self,
        ctx: &mut AggregationContext,
        products: &mut [Product],
        vertical: &VerticalConfig,
    ) -> EngineResult<()> {
        let options = FinalizeOptions::builder().stage(self.name()).build();
        let summary = finalize_scores(ctx, products, vertical, &options);
        info!(
            stage = self.name(),
            vertical = ctx.vertical_id(),
            composites = self.composites.len(),
            scores = summary.scores,
            "Participating scores computed"
        );
        Ok(())
    }
}
