use super::finalize::{finalize_scores, FinalizeOptions};
use super::{AggregationStage, ProductOutcome};
use crate::consts::DATA_QUALITY_SCORE_NAME;
use crate::context::AggregationContext;
use crate::error::EngineResult;
use crate::stats::Contributions;
use scoreforge_protocol::{Product, Score, VerticalConfig};
use tracing::info;

/// Counts how many scored attributes a product really carries and turns that
/// count into the `DATA_QUALITY` score.
#[derive(Debug, Default)]
pub struct DataQualityStage;

impl DataQualityStage {
    pub fn new() -> Self {
        Self
    }

    pub fn real_score_count(product: &Product, vertical: &VerticalConfig) -> usize {
        vertical
            .score_attributes()
            .filter(|a| product.real_score(&a.key).is_some())
            .count()
    }
}

impl AggregationStage for DataQualityStage {
    fn name(&self) -> &str {
        "data_quality"
    }

    fn on_product(
        &self,
        product: &mut Product,
        vertical: &VerticalConfig,
        _ctx: &AggregationContext,
        sink: &mut Contributions,
    ) -> ProductOutcome {
        product.scores.remove(DATA_QUALITY_SCORE_NAME);
        if vertical.score_attributes().next().is_none() {
            return ProductOutcome::Skipped("vertical has no scored attribute".to_string());
        }

        let count = Self::real_score_count(product, vertical) as f64;
        sink.record(DATA_QUALITY_SCORE_NAME, count);
        product.scores.insert(
            DATA_QUALITY_SCORE_NAME.to_string(),
            Score::measured(DATA_QUALITY_SCORE_NAME, count),
        );
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
            scores = summary.scores,
            "Data quality computed"
        );
        Ok(())
    }
}
