use super::finalize::{finalize_scores, FinalizeOptions};
use super::{AggregationStage, ProductOutcome};
use crate::context::AggregationContext;
use crate::error::{EngineError, EngineResult};
use crate::stats::Contributions;
use scoreforge_protocol::{AttributeConfig, Product, Score, VerticalConfig};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Raw value lookup: canonical key first, then synonyms. First match wins.
pub fn resolve_raw<'a>(
    attribute: &AttributeConfig,
    attributes: &'a BTreeMap<String, String>,
) -> Option<&'a str> {
    attribute
        .lookup_keys()
        .find_map(|key| attributes.get(key))
        .map(String::as_str)
}

/// Parses a raw attribute string into the number fed to the score.
pub fn parse_value(attribute: &AttributeConfig, raw: &str) -> EngineResult<f64> {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.replace(',', ".").parse::<f64>() {
        if v.is_finite() {
            return Ok(v);
        }
        return Err(EngineError::resolution(
            &attribute.key,
            format!("non-finite value '{}'", raw),
        ));
    }

    if attribute.numeric_mapping.is_empty() {
        return Err(EngineError::resolution(
            &attribute.key,
            format!("cannot convert '{}' to a number", raw),
        ));
    }

    match attribute.numeric_mapping.get(trimmed) {
        Some(v) if v.is_finite() => Ok(*v),
        Some(v) => Err(EngineError::resolution(
            &attribute.key,
            format!("mapping for '{}' is not finite ({})", raw, v),
        )),
        None => Err(EngineError::resolution(
            &attribute.key,
            format!("no numeric mapping for '{}'", raw),
        )),
    }
}

/// Turns `as_score` attributes into scores stored under their canonical key,
/// then relativizes them against the vertical batch.
#[derive(Debug, Default)]
pub struct Attribute2ScoreStage;

impl Attribute2ScoreStage {
    pub fn new() -> Self {
        Self
    }
}

impl AggregationStage for Attribute2ScoreStage {
    fn name(&self) -> &str {
        "attribute2score"
    }

    fn on_product(
        &self,
        product: &mut Product,
        vertical: &VerticalConfig,
        _ctx: &AggregationContext,
        sink: &mut Contributions,
    ) -> ProductOutcome {
        let mut scored = 0usize;
        let mut last_error = None;

        for attribute in vertical.score_attributes() {
            // Synonyms never survive as separate score entries
            for synonym in attribute.synonyms.values().flatten() {
                product.scores.remove(synonym);
            }
            product.scores.remove(&attribute.key);

            let Some(raw) = resolve_raw(attribute, &product.attributes) else {
                continue;
            };

            match parse_value(attribute, raw) {
                Ok(value) => {
                    sink.record(&attribute.key, value);
                    product
                        .scores
                        .insert(attribute.key.clone(), Score::measured(&attribute.key, value));
                    scored += 1;
                }
                Err(e) => {
                    warn!(
                        stage = self.name(),
                        product = product.id,
                        "Attribute to score failed: {}",
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        if scored == 0 {
            return match last_error {
                Some(e) => ProductOutcome::Failed(e),
                None => ProductOutcome::Skipped("no scorable attribute".to_string()),
            };
        }
        ProductOutcome::Processed
    }

    fn done(
        &mut self,
        ctx: &mut AggregationContext,
        products: &mut [Product],
        vertical: &VerticalConfig,
    ) -> EngineResult<()> {
        info!(
            stage = self.name(),
            vertical = ctx.vertical_id(),
            "Scores relativisation for {} products",
            products.len()
        );
        let options = FinalizeOptions::builder()
            .stage(self.name())
            .synthesize_missing(true)
            .build();
        let summary = finalize_scores(ctx, products, vertical, &options);
        info!(
            stage = self.name(),
            scores = summary.scores,
            synthesized = summary.synthesized,
            failures = summary.failures,
            "Attribute scores finalized"
        );
        Ok(())
    }
}
