use super::histogram::{FrozenHistogram, ValueHistogram};
use scoreforge_protocol::Cardinality;
use std::collections::BTreeMap;

/// Running statistics plus distinct-value buckets for a single score name.
#[derive(Debug, Clone, Default)]
pub struct ScoreStatistics {
    cardinality: Cardinality,
    histogram: ValueHistogram,
}

impl ScoreStatistics {
    pub fn increment(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.cardinality.increment(value);
        self.histogram.increment(value);
    }

    pub fn cardinality(&self) -> &Cardinality {
        &self.cardinality
    }

    pub fn distinct_values(&self) -> usize {
        self.histogram.distinct_values()
    }

    pub fn freeze(&self) -> Population {
        Population {
            cardinality: self.cardinality.clone(),
            histogram: self.histogram.freeze(),
        }
    }
}

/// Immutable snapshot of a score name's batch statistics, taken once every
/// `on_product` call of the stage has returned.
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub cardinality: Cardinality,
    pub histogram: FrozenHistogram,
}

impl Population {
    pub fn from_values(values: &[f64]) -> Self {
        let mut stats = ScoreStatistics::default();
        for &v in values {
            stats.increment(v);
        }
        stats.freeze()
    }

    pub fn distinct_values(&self) -> usize {
        self.histogram.distinct_values()
    }
}

/// Score name -> statistics for one stage over one vertical batch.
#[derive(Debug, Clone, Default)]
pub struct ScoreAccumulator {
    scores: BTreeMap<String, ScoreStatistics>,
}

impl ScoreAccumulator {
    pub fn increment(&mut self, score: &str, value: f64) {
        if !value.is_finite() {
            return;
        }
        match self.scores.get_mut(score) {
            Some(stats) => stats.increment(value),
            None => {
                let mut stats = ScoreStatistics::default();
                stats.increment(value);
                self.scores.insert(score.to_string(), stats);
            }
        }
    }

    pub fn absorb(&mut self, contributions: Contributions) {
        for (name, value) in contributions.entries {
            self.increment(&name, value);
        }
    }

    pub fn get(&self, score: &str) -> Option<&ScoreStatistics> {
        self.scores.get(score)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scores.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }
}

/// Values a single product feeds into the batch statistics. Collected per
/// product so that parallel visits never share a mutable accumulator.
#[derive(Debug, Clone, Default)]
pub struct Contributions {
    entries: Vec<(String, f64)>,
}

impl Contributions {
    pub fn record(&mut self, score: &str, value: f64) {
        self.entries.push((score.to_string(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
