//! Configuration gap detection for a vertical. Nothing here fails: the engine
//! degrades on every issue reported, the report only tells the operator why.

use crate::consts::{DATA_QUALITY_SCORE_NAME, IMPACT_SCORE_NAME};
use fnv::FnvHashMap;
use scoreforge_protocol::{NormalizationMethod, ScoringConfig, VerticalConfig};
use serde::Serialize;
use std::collections::BTreeSet;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub subject: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(severity: Severity, subject: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            subject: subject.to_string(),
            message: message.into(),
        }
    }
}

pub fn validate_vertical(vertical: &VerticalConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    // Names a weight may legitimately refer to
    let mut known: BTreeSet<&str> = vertical.score_attributes().map(|a| a.key.as_str()).collect();
    known.extend(vertical.participating_composites());
    known.insert(DATA_QUALITY_SCORE_NAME);

    let weights = match &vertical.impact_score {
        None => {
            issues.push(ConfigIssue::new(
                Severity::Warning,
                &vertical.id,
                "no impact score configuration, no composite will be produced",
            ));
            None
        }
        Some(impact) if impact.criterias_ponderation.is_empty() => {
            issues.push(ConfigIssue::new(
                Severity::Warning,
                &vertical.id,
                "impact score has no weights, no composite will be produced",
            ));
            None
        }
        Some(impact) => Some(&impact.criterias_ponderation),
    };

    if let Some(weights) = weights {
        for (name, weight) in weights {
            if !known.contains(name.as_str()) {
                issues.push(ConfigIssue::new(
                    Severity::Warning,
                    name,
                    "weight refers to an unknown score",
                ));
            }
            if name == IMPACT_SCORE_NAME {
                issues.push(ConfigIssue::new(
                    Severity::Error,
                    name,
                    "impact score cannot weight itself",
                ));
            }
            if !weight.is_finite() || *weight < 0.0 {
                issues.push(ConfigIssue::new(
                    Severity::Error,
                    name,
                    format!("invalid weight {}", weight),
                ));
            }
        }
    }

    for attribute in vertical.score_attributes() {
        if attribute.participate_in_scores.is_empty() {
            continue;
        }
        let weighted = weights
            .and_then(|w| w.get(&attribute.key))
            .is_some_and(|w| *w > 0.0);
        if !weighted {
            issues.push(ConfigIssue::new(
                Severity::Warning,
                &attribute.key,
                format!(
                    "participates in {} but has no positive weight",
                    attribute.participate_in_scores.iter().cloned().collect::<Vec<_>>().join(", ")
                ),
            ));
        }
    }

    for attribute in &vertical.attributes {
        if attribute.participate_in_scores.is_empty() || attribute.as_score {
            continue;
        }
        issues.push(ConfigIssue::new(
            Severity::Info,
            &attribute.key,
            "participation tags are ignored on an attribute that is not scored",
        ));
    }

    for attribute in vertical.score_attributes() {
        if let Some(scoring) = &attribute.scoring {
            if let Some(problem) = scoring_problem(scoring) {
                issues.push(ConfigIssue::new(Severity::Error, &attribute.key, problem));
            }
        }
    }

    let mut claimed: FnvHashMap<&str, &str> = FnvHashMap::default();
    for attribute in &vertical.attributes {
        for key in attribute.lookup_keys() {
            match claimed.get(key) {
                Some(owner) if *owner != attribute.key => issues.push(ConfigIssue::new(
                    Severity::Error,
                    key,
                    format!("claimed by both {} and {}", owner, attribute.key),
                )),
                Some(_) => {}
                None => {
                    claimed.insert(key, &attribute.key);
                }
            }
        }
    }

    issues
}

fn scoring_problem(scoring: &ScoringConfig) -> Option<String> {
    let scale = scoring.scale;
    if !(scale.min.is_finite() && scale.max.is_finite() && scale.min < scale.max) {
        return Some(format!("invalid scale {}..{}", scale.min, scale.max));
    }
    if scoring.normalization.method != NormalizationMethod::MinMaxQuantile {
        return None;
    }
    match (scoring.normalization.quantile_low, scoring.normalization.quantile_high) {
        (Some(low), Some(high))
            if (0.0..=1.0).contains(&low) && (0.0..=1.0).contains(&high) && low < high =>
        {
            None
        }
        (Some(low), Some(high)) => Some(format!("invalid quantile bounds {}..{}", low, high)),
        _ => Some("quantile normalization without bounds".to_string()),
    }
}
