use crate::consts::{DEFAULT_MIN_DISTINCT_VALUES_FOR_SIGMA, DEFAULT_STAGES, IMPACT_SCORE_NAME};
use crate::error::EngineResult;
use clap::{parser::ValueSource, ArgAction, ArgMatches, Args};
use scoreforge_protocol::VerticalConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ordered, comma-separated list of aggregation stages.
    #[arg(long, default_value = DEFAULT_STAGES)]
    pub stages: String,

    /// Visit products on the rayon pool during the accumulation phase.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub parallel: bool,

    /// Fallback threshold when a vertical does not set its own.
    #[arg(long, default_value_t = DEFAULT_MIN_DISTINCT_VALUES_FOR_SIGMA)]
    pub min_distinct_values_for_sigma: usize,

    /// Score name the ranking stage orders products by.
    #[arg(long, default_value = IMPACT_SCORE_NAME)]
    pub ranking_score: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stages: DEFAULT_STAGES.to_string(),
            parallel: true,
            min_distinct_values_for_sigma: DEFAULT_MIN_DISTINCT_VALUES_FOR_SIGMA,
            ranking_score: IMPACT_SCORE_NAME.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The vertical's own threshold wins over the engine-wide fallback.
    pub fn min_distinct_for(&self, vertical: &VerticalConfig) -> usize {
        vertical
            .impact_score
            .as_ref()
            .and_then(|i| i.min_distinct_values_for_sigma)
            .unwrap_or(self.min_distinct_values_for_sigma)
    }

    /// Overlays only the values that were typed on the command line.
    pub fn merge_from_cli(&mut self, cli: &EngineConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(stages, "stages");
        update_if_present!(parallel, "parallel");
        update_if_present!(min_distinct_values_for_sigma, "min_distinct_values_for_sigma");
        update_if_present!(ranking_score, "ranking_score");
    }
}
