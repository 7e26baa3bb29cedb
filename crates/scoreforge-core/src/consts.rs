/// Upper bound of every relativ value. Ratings live on 0..=MAX_RATING.
pub const MAX_RATING: f64 = scoreforge_protocol::vertical::DEFAULT_SCALE_MAX;

/// Neutral rating handed out when a population has no spread.
pub const NEUTRAL_RATING: f64 = MAX_RATING / 2.0;

/// Sigma bounds are mean +/- SIGMA_WIDTH standard deviations.
pub const SIGMA_WIDTH: f64 = 2.0;

/// Below this many distinct values, percentile rank is used instead of sigma.
pub const DEFAULT_MIN_DISTINCT_VALUES_FOR_SIGMA: usize = 10;

/// Top-level composite built by the weighted zero-fill strategy.
pub const IMPACT_SCORE_NAME: &str = "IMPACT_SCORE";

/// Meta score counting how many scored attributes a product really has.
pub const DATA_QUALITY_SCORE_NAME: &str = "DATA_QUALITY";

/// Stage order used when no explicit list is configured.
pub const DEFAULT_STAGES: &str =
    "attribute2score,data_quality,participating_scores,impact_score,ranking";

/// Worst/best band size when a vertical does not set its own.
pub use scoreforge_protocol::vertical::DEFAULT_BAND_LIMIT;
