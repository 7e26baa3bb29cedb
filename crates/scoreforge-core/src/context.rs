use crate::relativize::Relativizer;
use crate::stats::{Contributions, ScoreAccumulator};
use fnv::FnvHashMap;
use scoreforge_protocol::Cardinality;

/// State owned by one vertical batch. Created fresh for every run and threaded
/// through each stage's `init` / `on_product` / `done`.
///
/// `batch` holds the running statistics of the stage currently executing and is
/// reset before each stage. `relativ` keeps the relativ populations every
/// finalized score published, so later stages can read them.
#[derive(Debug)]
pub struct AggregationContext {
    vertical_id: String,
    relativizer: Relativizer,
    batch: ScoreAccumulator,
    relativ: FnvHashMap<String, Cardinality>,
    failures: usize,
}

impl AggregationContext {
    pub fn new(vertical_id: &str, relativizer: Relativizer) -> Self {
        Self {
            vertical_id: vertical_id.to_string(),
            relativizer,
            batch: ScoreAccumulator::default(),
            relativ: FnvHashMap::default(),
            failures: 0,
        }
    }

    pub fn vertical_id(&self) -> &str {
        &self.vertical_id
    }

    pub fn relativizer(&self) -> &Relativizer {
        &self.relativizer
    }

    pub fn reset_batch(&mut self) {
        self.batch.clear();
    }

    pub fn absorb(&mut self, contributions: Contributions) {
        self.batch.absorb(contributions);
    }

    pub fn batch(&self) -> &ScoreAccumulator {
        &self.batch
    }

    pub fn publish_relativ(&mut self, score: &str, population: Cardinality) {
        self.relativ.insert(score.to_string(), population);
    }

    pub fn relativ_population(&self, score: &str) -> Option<&Cardinality> {
        self.relativ.get(score).filter(|c| !c.is_empty())
    }

    /// Values a stage's `done` could not relativize.
    pub fn record_failures(&mut self, count: usize) {
        self.failures += count;
    }

    pub fn take_failures(&mut self) -> usize {
        std::mem::take(&mut self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_keeps_published_populations() {
        let mut ctx = AggregationContext::new("tv", Relativizer::new(10));
        let mut c = Contributions::default();
        c.record("A", 1.0);
        ctx.absorb(c);

        let mut rel = Cardinality::new();
        rel.increment(2.5);
        ctx.publish_relativ("A", rel);

        ctx.reset_batch();
        assert!(ctx.batch().is_empty());
        assert_eq!(ctx.relativ_population("A").map(|c| c.avg), Some(2.5));
    }

    #[test]
    fn test_failures_are_taken_once() {
        let mut ctx = AggregationContext::new("tv", Relativizer::new(10));
        ctx.record_failures(2);
        ctx.record_failures(1);
        assert_eq!(ctx.take_failures(), 3);
        assert_eq!(ctx.take_failures(), 0);
    }

    #[test]
    fn test_empty_population_is_hidden() {
        let mut ctx = AggregationContext::new("tv", Relativizer::new(10));
        ctx.publish_relativ("A", Cardinality::new());
        assert!(ctx.relativ_population("A").is_none());
    }
}
