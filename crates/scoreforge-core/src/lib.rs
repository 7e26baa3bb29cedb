// Re-export the data model so callers can depend on scoreforge_core alone
pub use scoreforge_protocol as protocol;
pub use scoreforge_protocol::{
    AttributeConfig, Cardinality, DegeneratePolicy, Direction, ImpactScoreConfig,
    NormalizationMethod, Product, ProductId, Ranking, Score, ScoringConfig, VerticalConfig,
};

pub mod config;
pub mod consts;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod relativize;
pub mod stages;
pub mod stats;
pub mod validation;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use pipeline::{BatchReport, Pipeline, StageReport, StageStatus, VerticalBatch};
pub use validation::{validate_vertical, ConfigIssue, Severity};
