pub mod attribute2score;
pub mod data_quality;
pub mod finalize;
pub mod impact_score;
pub mod participating;
pub mod ranking;
pub mod registry;

pub use self::attribute2score::Attribute2ScoreStage;
pub use self::data_quality::DataQualityStage;
pub use self::impact_score::ImpactScoreStage;
pub use self::participating::ParticipatingScoresStage;
pub use self::ranking::RankingStage;
pub use self::registry::StageRegistry;

use crate::context::AggregationContext;
use crate::error::{EngineError, EngineResult};
use crate::stats::Contributions;
use scoreforge_protocol::{Product, VerticalConfig};
use strum_macros::{Display, EnumIter, EnumString};

/// Names of the stages shipped with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StageKind {
    #[strum(serialize = "attribute2score")]
    Attribute2Score,
    DataQuality,
    ParticipatingScores,
    ImpactScore,
    Ranking,
}

/// What happened to one product during `on_product`.
#[derive(Debug)]
pub enum ProductOutcome {
    Processed,
    Skipped(String),
    Failed(EngineError),
}

/// One step of the vertical aggregation. The pipeline calls `init` once, then
/// `on_product` for every product (possibly from several threads), then `done`
/// once every `on_product` call has returned.
pub trait AggregationStage: Send + Sync {
    fn name(&self) -> &str;

    fn init(
        &mut self,
        _ctx: &mut AggregationContext,
        _products: &[Product],
        _vertical: &VerticalConfig,
    ) {
    }

    /// Writes product-local values and records what the batch statistics
    /// should absorb. Must not depend on other products.
    fn on_product(
        &self,
        product: &mut Product,
        vertical: &VerticalConfig,
        ctx: &AggregationContext,
        sink: &mut Contributions,
    ) -> ProductOutcome;

    /// Finalizes scores from the now-stable batch statistics.
    fn done(
        &mut self,
        ctx: &mut AggregationContext,
        products: &mut [Product],
        vertical: &VerticalConfig,
    ) -> EngineResult<()>;
}
