use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum_macros::{Display, EnumString};

/// Default size of the per-score worst and best bands.
pub const DEFAULT_BAND_LIMIT: usize = 3;

/// Upper bound of the default rating scale.
pub const DEFAULT_SCALE_MAX: f64 = 5.0;

/// Which end of the raw scale is the good one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Direction {
    #[default]
    Greater,
    Lower,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttributeConfig {
    /// Canonical key; scores are always stored under it.
    pub key: String,
    pub name: Option<String>,

    /// Alternative attribute names, grouped by provider. Providers are visited
    /// in name order, synonyms in the order they are declared.
    pub synonyms: BTreeMap<String, Vec<String>>,

    pub as_score: bool,
    pub better_is: Direction,

    /// Composite names this attribute takes part in.
    pub participate_in_scores: BTreeSet<String>,

    /// Text value -> number, for attributes that are not numeric.
    pub numeric_mapping: BTreeMap<String, f64>,

    /// Per-attribute normalization override. Absent means automatic method
    /// selection on the default 0..5 scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringConfig>,
}

impl AttributeConfig {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn scored(mut self, better_is: Direction) -> Self {
        self.as_score = true;
        self.better_is = better_is;
        self
    }

    pub fn with_synonym(mut self, provider: &str, synonym: &str) -> Self {
        let names = self.synonyms.entry(provider.to_string()).or_default();
        if !names.iter().any(|n| n == synonym) {
            names.push(synonym.to_string());
        }
        self
    }

    pub fn participating_in(mut self, composite: &str) -> Self {
        self.participate_in_scores.insert(composite.to_string());
        self
    }

    pub fn with_mapping(mut self, text: &str, value: f64) -> Self {
        self.numeric_mapping.insert(text.to_string(), value);
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = Some(scoring);
        self
    }

    /// Canonical key first, then every synonym: providers in name order,
    /// each provider's synonyms in declared order.
    pub fn lookup_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str())
            .chain(self.synonyms.values().flatten().map(String::as_str))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

/// How a score is mapped onto its rating scale.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum NormalizationMethod {
    /// Percentile or sigma, picked from the distinct-value count.
    #[default]
    Auto,
    Sigma,
    Percentile,
    /// Min-max between two quantiles of the observed values.
    MinMaxQuantile,
}

/// What to hand out when a population has no usable spread.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DegeneratePolicy {
    /// Scale midpoint, as a real score.
    #[default]
    Neutral,
    /// Refuse to rate the value.
    Error,
    /// Scale midpoint, flagged virtual.
    NeutralVirtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreScale {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: DEFAULT_SCALE_MAX,
        }
    }
}

impl ScoreScale {
    pub fn neutral(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizationConfig {
    pub method: NormalizationMethod,
    /// Quantile bounds, in 0..=1, used by `MIN_MAX_QUANTILE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantile_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantile_high: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub normalization: NormalizationConfig,
    pub scale: ScoreScale,
    pub degenerate_distribution_policy: DegeneratePolicy,
}

impl ScoringConfig {
    pub fn quantiles(low: f64, high: f64) -> Self {
        Self {
            normalization: NormalizationConfig {
                method: NormalizationMethod::MinMaxQuantile,
                quantile_low: Some(low),
                quantile_high: Some(high),
            },
            ..Default::default()
        }
    }

    pub fn with_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_distribution_policy = policy;
        self
    }

    pub fn with_scale(mut self, min: f64, max: f64) -> Self {
        self.scale = ScoreScale { min, max };
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImpactScoreConfig {
    /// Sub-score name -> weight. Weights need not sum to one.
    pub criterias_ponderation: BTreeMap<String, f64>,
    pub min_distinct_values_for_sigma: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerticalConfig {
    pub id: String,
    pub attributes: Vec<AttributeConfig>,
    pub impact_score: Option<ImpactScoreConfig>,
    pub worse_limit: usize,
    pub betters_limit: usize,
}

impl Default for VerticalConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            attributes: Vec::new(),
            impact_score: None,
            worse_limit: DEFAULT_BAND_LIMIT,
            betters_limit: DEFAULT_BAND_LIMIT,
        }
    }
}

impl VerticalConfig {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeConfig) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_impact_score(mut self, impact: ImpactScoreConfig) -> Self {
        self.impact_score = Some(impact);
        self
    }

    pub fn score_attributes(&self) -> impl Iterator<Item = &AttributeConfig> {
        self.attributes.iter().filter(|a| a.as_score)
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeConfig> {
        self.attributes.iter().find(|a| a.key == key)
    }

    /// Direction for any score name; composites and unknown names are
    /// greater-is-better.
    pub fn direction_for(&self, score_name: &str) -> Direction {
        self.attribute(score_name)
            .map(|a| a.better_is)
            .unwrap_or_default()
    }

    /// Normalization override for a score name, if its attribute declares one.
    pub fn scoring_for(&self, score_name: &str) -> Option<&ScoringConfig> {
        self.attribute(score_name).and_then(|a| a.scoring.as_ref())
    }

    /// All composite names declared through attribute participation tags.
    pub fn participating_composites(&self) -> BTreeSet<&str> {
        self.score_attributes()
            .flat_map(|a| a.participate_in_scores.iter().map(String::as_str))
            .collect()
    }
}
