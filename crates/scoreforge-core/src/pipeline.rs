use crate::config::EngineConfig;
use crate::context::AggregationContext;
use crate::error::EngineResult;
use crate::relativize::Relativizer;
use crate::stages::{AggregationStage, ProductOutcome, StageRegistry};
use crate::stats::Contributions;
use rayon::prelude::*;
use scoreforge_protocol::{Product, VerticalConfig};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    Completed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub name: String,
    pub status: StageStatus,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Values `done` could not relativize.
    pub resolution_failures: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub vertical_id: String,
    pub products: usize,
    pub stages: Vec<StageReport>,
}

impl BatchReport {
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn is_complete(&self) -> bool {
        self.stages.iter().all(|s| s.status == StageStatus::Completed)
    }
}

/// One vertical's configuration together with its product set.
#[derive(Debug, Clone)]
pub struct VerticalBatch {
    pub vertical: VerticalConfig,
    pub products: Vec<Product>,
}

/// Runs the configured stages over one vertical batch at a time.
///
/// Each stage goes through `init`, then `on_product` for the whole dataset,
/// then `done`. The next stage starts only after `done` returned. Contributions
/// produced by `on_product` are merged in dataset order so results do not
/// depend on scheduling.
pub struct Pipeline {
    config: EngineConfig,
    registry: StageRegistry,
}

impl Pipeline {
    pub fn from_config(config: EngineConfig) -> EngineResult<Self> {
        Self::with_registry(config, StageRegistry::standard())
    }

    /// Fails early when a configured stage name is not registered.
    pub fn with_registry(config: EngineConfig, registry: StageRegistry) -> EngineResult<Self> {
        registry.build(&config)?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run(&self, vertical: &VerticalConfig, products: &mut [Product]) -> EngineResult<BatchReport> {
        let mut stages = self.registry.build(&self.config)?;
        let relativizer = Relativizer::new(self.config.min_distinct_for(vertical));
        let mut ctx = AggregationContext::new(&vertical.id, relativizer);

        info!(
            vertical = %vertical.id,
            products = products.len(),
            stages = stages.len(),
            "Starting aggregation"
        );

        let mut report = BatchReport {
            vertical_id: vertical.id.clone(),
            products: products.len(),
            stages: Vec::with_capacity(stages.len()),
        };

        for stage in stages.iter_mut() {
            let stage_report = self.run_stage(stage.as_mut(), &mut ctx, vertical, products);
            report.stages.push(stage_report);
        }

        info!(
            vertical = %vertical.id,
            complete = report.is_complete(),
            "Aggregation finished"
        );
        Ok(report)
    }

    /// Runs independent verticals concurrently, each with its own context.
    pub fn run_many(&self, batches: &mut [VerticalBatch]) -> Vec<EngineResult<BatchReport>> {
        batches
            .par_iter_mut()
            .map(|batch| self.run(&batch.vertical, &mut batch.products))
            .collect()
    }

    fn run_stage(
        &self,
        stage: &mut dyn AggregationStage,
        ctx: &mut AggregationContext,
        vertical: &VerticalConfig,
        products: &mut [Product],
    ) -> StageReport {
        let start = Instant::now();
        let name = stage.name().to_string();
        debug!(stage = %name, vertical = %vertical.id, "Stage init");

        ctx.reset_batch();
        ctx.take_failures();
        stage.init(ctx, products, vertical);

        let outcomes: Vec<(ProductOutcome, Contributions)> = {
            let shared: &AggregationContext = ctx;
            let stage: &dyn AggregationStage = stage;
            let visit = |product: &mut Product| {
                let mut sink = Contributions::default();
                let outcome = stage.on_product(product, vertical, shared, &mut sink);
                (outcome, sink)
            };
            if self.config.parallel {
                products.par_iter_mut().map(visit).collect()
            } else {
                products.iter_mut().map(visit).collect()
            }
        };

        let mut report = StageReport {
            name: name.clone(),
            status: StageStatus::Completed,
            processed: 0,
            skipped: 0,
            failed: 0,
            resolution_failures: 0,
            elapsed_ms: 0,
        };

        for ((outcome, sink), product) in outcomes.into_iter().zip(products.iter()) {
            ctx.absorb(sink);
            match outcome {
                ProductOutcome::Processed => report.processed += 1,
                ProductOutcome::Skipped(reason) => {
                    debug!(stage = %name, product = product.id, "Skipped: {}", reason);
                    report.skipped += 1;
                }
                ProductOutcome::Failed(e) => {
                    warn!(stage = %name, product = product.id, "Product failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        if let Err(e) = stage.done(ctx, products, vertical) {
            error!(stage = %name, vertical = %vertical.id, "Stage finalization failed: {}", e);
            report.status = StageStatus::Failed(e.to_string());
        }
        report.resolution_failures = ctx.take_failures();

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            stage = %name,
            vertical = %vertical.id,
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            resolution_failures = report.resolution_failures,
            elapsed_ms = report.elapsed_ms,
            "Stage done"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::IMPACT_SCORE_NAME;
    use crate::error::EngineError;
    use scoreforge_protocol::{
        AttributeConfig, DegeneratePolicy, Direction, ImpactScoreConfig, ScoringConfig,
    };

    fn vertical() -> VerticalConfig {
        let mut weights = std::collections::BTreeMap::new();
        weights.insert("REPAIR".to_string(), 1.0);
        VerticalConfig::new("tv")
            .with_attribute(AttributeConfig::new("REPAIR").scored(Direction::Lower))
            .with_impact_score(ImpactScoreConfig {
                criterias_ponderation: weights,
                ..Default::default()
            })
    }

    #[test]
    fn test_unknown_stage_fails_construction() {
        let cfg = EngineConfig {
            stages: "nope".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::from_config(cfg),
            Err(EngineError::UnknownStage(_))
        ));
    }

    #[test]
    fn test_report_tallies() {
        let pipeline = Pipeline::from_config(EngineConfig::default()).unwrap();
        let mut products = vec![
            Product::new(1).with_attribute("REPAIR", "4"),
            Product::new(2).with_attribute("REPAIR", "9"),
            Product::new(3),
        ];
        let report = pipeline.run(&vertical(), &mut products).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.products, 3);
        let extract = report.stage("attribute2score").unwrap();
        assert_eq!((extract.processed, extract.skipped), (2, 1));
        let ranking = report.stage("ranking").unwrap();
        assert_eq!((ranking.processed, ranking.skipped), (2, 1));
        assert!(products[2].score(IMPACT_SCORE_NAME).unwrap().is_virtual);
    }

    #[test]
    fn test_unresolvable_values_are_reported() {
        let vertical = VerticalConfig::new("tv").with_attribute(
            AttributeConfig::new("NOISE")
                .scored(Direction::Lower)
                .with_scoring(ScoringConfig::default().with_policy(DegeneratePolicy::Error)),
        );
        let mut products = vec![
            Product::new(1).with_attribute("NOISE", "30"),
            Product::new(2).with_attribute("NOISE", "30"),
            Product::new(3).with_attribute("NOISE", "loud"),
        ];
        let cfg = EngineConfig {
            stages: "attribute2score".to_string(),
            ..Default::default()
        };
        let report = Pipeline::from_config(cfg)
            .unwrap()
            .run(&vertical, &mut products)
            .unwrap();

        let extract = report.stage("attribute2score").unwrap();
        assert!(report.is_complete());
        assert_eq!((extract.processed, extract.failed), (2, 1));
        // two measured plus one synthesized, all on a flat population
        assert_eq!(extract.resolution_failures, 3);
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let make = || -> Vec<Product> {
            (0..40)
                .map(|i| Product::new(i).with_attribute("REPAIR", &format!("{}", (i * 7) % 13)))
                .collect()
        };
        let mut parallel = make();
        let mut sequential = make();

        Pipeline::from_config(EngineConfig::default())
            .unwrap()
            .run(&vertical(), &mut parallel)
            .unwrap();
        Pipeline::from_config(EngineConfig {
            parallel: false,
            ..Default::default()
        })
        .unwrap()
        .run(&vertical(), &mut sequential)
        .unwrap();

        assert_eq!(parallel, sequential);
    }
}
