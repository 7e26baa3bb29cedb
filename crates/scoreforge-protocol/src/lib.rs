pub mod cardinality;
pub mod product;
pub mod vertical;

pub use cardinality::Cardinality;
pub use product::{Product, ProductId, Ranking, Score};
pub use vertical::{
    AttributeConfig, DegeneratePolicy, Direction, ImpactScoreConfig, NormalizationConfig,
    NormalizationMethod, ScoreScale, ScoringConfig, VerticalConfig,
};
