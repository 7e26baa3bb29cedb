#![allow(dead_code)]

use scoreforge_core::{AttributeConfig, Direction, ImpactScoreConfig, Product, VerticalConfig};
use std::collections::BTreeMap;

/// Builder for vertical configs to keep the scenario tests short.
pub struct VerticalBuilder {
    vertical: VerticalConfig,
    weights: BTreeMap<String, f64>,
    min_distinct: Option<usize>,
}

impl VerticalBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            vertical: VerticalConfig::new(id),
            weights: BTreeMap::new(),
            min_distinct: None,
        }
    }

    pub fn scored(mut self, key: &str, direction: Direction) -> Self {
        self.vertical = self
            .vertical
            .with_attribute(AttributeConfig::new(key).scored(direction));
        self
    }

    pub fn attribute(mut self, attribute: AttributeConfig) -> Self {
        self.vertical = self.vertical.with_attribute(attribute);
        self
    }

    pub fn weight(mut self, name: &str, weight: f64) -> Self {
        self.weights.insert(name.to_string(), weight);
        self
    }

    pub fn min_distinct(mut self, n: usize) -> Self {
        self.min_distinct = Some(n);
        self
    }

    pub fn build(self) -> VerticalConfig {
        if self.weights.is_empty() && self.min_distinct.is_none() {
            return self.vertical;
        }
        self.vertical.with_impact_score(ImpactScoreConfig {
            criterias_ponderation: self.weights,
            min_distinct_values_for_sigma: self.min_distinct,
        })
    }
}

pub fn product(id: u64, attributes: &[(&str, &str)]) -> Product {
    attributes
        .iter()
        .fold(Product::new(id), |p, (k, v)| p.with_attribute(k, v))
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
