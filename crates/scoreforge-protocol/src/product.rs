use crate::cardinality::Cardinality;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type ProductId = u64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,

    /// Optional sub-category label used for the specialized ranking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_population: Option<String>,

    /// Raw attribute values keyed by the provider-facing attribute name.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub scores: BTreeMap<String, Score>,

    #[serde(default)]
    pub ranking: Ranking,

    #[serde(default)]
    pub worst_scores: BTreeSet<String>,
    #[serde(default)]
    pub best_scores: BTreeSet<String>,
}

impl Product {
    pub fn new(id: ProductId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_sub_population(mut self, label: &str) -> Self {
        self.sub_population = Some(label.to_string());
        self
    }

    pub fn score(&self, name: &str) -> Option<&Score> {
        self.scores.get(name)
    }

    /// A score that exists, is not virtual and has been relativized.
    pub fn real_score(&self, name: &str) -> Option<&Score> {
        self.scores
            .get(name)
            .filter(|s| !s.is_virtual && s.relativ_value().is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub name: String,

    /// The user-facing number: the finalized relativ value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    /// This product's raw value plus the population it was measured against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute: Option<Cardinality>,

    /// Normalized 0..MAX_RATING value plus the relativ population.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relativ: Option<Cardinality>,

    /// Composite scores only: contributing sub-score name -> effective weight.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregates: BTreeMap<String, f64>,

    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,

    /// Ascending position of this score's relativ value inside the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lowest_score_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_score_id: Option<ProductId>,
}

impl Score {
    /// A real measurement, before relativization.
    pub fn measured(name: &str, raw: f64) -> Self {
        Self {
            name: name.to_string(),
            absolute: Some(Cardinality::new().with_value(raw)),
            ..Default::default()
        }
    }

    /// A synthesized measurement standing in for missing data.
    pub fn synthesized(name: &str, raw: f64) -> Self {
        Self {
            is_virtual: true,
            ..Self::measured(name, raw)
        }
    }

    pub fn absolute_value(&self) -> Option<f64> {
        self.absolute.as_ref().and_then(|c| c.value)
    }

    pub fn relativ_value(&self) -> Option<f64> {
        self.relativ.as_ref().and_then(|c| c.value)
    }

    /// Relativ value expressed on a 0..20 scale, rounded.
    pub fn on_20(&self, max_rating: f64) -> Option<u32> {
        self.relativ_value()
            .map(|v| (v * 20.0 / max_rating).round().max(0.0) as u32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_position: Option<u64>,
    #[serde(default)]
    pub global_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_best: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_better: Option<ProductId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialized_position: Option<u64>,
    #[serde(default)]
    pub specialized_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialized_best: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialized_better: Option<ProductId>,
}
