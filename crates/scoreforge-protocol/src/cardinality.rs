use serde::{Deserialize, Serialize};

/// Running statistics for one score name over a batch, or a single product's
/// measurement embedded in its [`crate::Score`] together with the population
/// bounds it was measured against.
///
/// `min`, `max` and `avg` are only meaningful when `count > 0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cardinality {
    pub count: u64,
    pub sum: f64,
    pub sum_of_squares: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Cardinality {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one observation in. Non-finite input is ignored.
    pub fn increment(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }

        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }

        self.count += 1;
        self.sum += value;
        self.sum_of_squares += value * value;
        self.avg = self.clamped_mean();
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    /// Population variance, clamped at zero to absorb floating noise.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_of_squares / self.count as f64 - mean * mean).max(0.0)
    }

    pub fn sigma(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Same population statistics, carrying `value` as the measurement.
    pub fn with_value(&self, value: f64) -> Self {
        Self {
            value: Some(value),
            ..self.clone()
        }
    }

    // sum/count can drift a ulp outside [min, max]
    fn clamped_mean(&self) -> f64 {
        self.mean().clamp(self.min, self.max)
    }
}
