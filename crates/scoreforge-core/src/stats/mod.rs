pub mod accumulator;
pub mod histogram;

pub use self::accumulator::{Contributions, Population, ScoreAccumulator, ScoreStatistics};
pub use self::histogram::{FrozenHistogram, ValueHistogram};
