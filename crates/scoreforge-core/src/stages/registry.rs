use super::{
    AggregationStage, Attribute2ScoreStage, DataQualityStage, ImpactScoreStage,
    ParticipatingScoresStage, RankingStage, StageKind,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use fnv::FnvHashMap;
use strum::IntoEnumIterator;

pub type StageFactory = Box<dyn Fn(&EngineConfig) -> Box<dyn AggregationStage> + Send + Sync>;

/// Stage name -> constructor. Built once, then used to instantiate the
/// configured stage list in order.
pub struct StageRegistry {
    factories: FnvHashMap<String, StageFactory>,
}

fn factory_for(kind: StageKind) -> StageFactory {
    match kind {
        StageKind::Attribute2Score => Box::new(|_: &EngineConfig| -> Box<dyn AggregationStage> {
            Box::new(Attribute2ScoreStage::new())
        }),
        StageKind::DataQuality => Box::new(|_: &EngineConfig| -> Box<dyn AggregationStage> {
            Box::new(DataQualityStage::new())
        }),
        StageKind::ParticipatingScores => {
            Box::new(|_: &EngineConfig| -> Box<dyn AggregationStage> {
                Box::new(ParticipatingScoresStage::new())
            })
        }
        StageKind::ImpactScore => Box::new(|_: &EngineConfig| -> Box<dyn AggregationStage> {
            Box::new(ImpactScoreStage::new())
        }),
        StageKind::Ranking => Box::new(|cfg: &EngineConfig| -> Box<dyn AggregationStage> {
            Box::new(RankingStage::new(&cfg.ranking_score))
        }),
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl StageRegistry {
    pub fn empty() -> Self {
        Self {
            factories: FnvHashMap::default(),
        }
    }

    /// Registry holding every stage shipped with the engine.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for kind in StageKind::iter() {
            registry.factories.insert(kind.to_string(), factory_for(kind));
        }
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&EngineConfig) -> Box<dyn AggregationStage> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Instantiates the configured stages in declared order.
    pub fn build(&self, config: &EngineConfig) -> EngineResult<Vec<Box<dyn AggregationStage>>> {
        config
            .stage_names()
            .into_iter()
            .map(|name| {
                self.factories
                    .get(name)
                    .map(|factory| factory(config))
                    .ok_or_else(|| EngineError::UnknownStage(name.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_builds_default_order() {
        let stages = StageRegistry::standard()
            .build(&EngineConfig::default())
            .unwrap();
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "attribute2score",
                "data_quality",
                "participating_scores",
                "impact_score",
                "ranking"
            ]
        );
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        let cfg = EngineConfig {
            stages: "attribute2score,bogus".to_string(),
            ..Default::default()
        };
        let err = StageRegistry::standard().build(&cfg).err().unwrap();
        assert!(matches!(err, EngineError::UnknownStage(ref n) if n == "bogus"));
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = StageRegistry::empty();
        registry.register("rank_quality", |_: &EngineConfig| -> Box<dyn AggregationStage> {
            Box::new(RankingStage::new("DATA_QUALITY"))
        });
        assert!(registry.contains("rank_quality"));
        assert!(!registry.contains("ranking"));

        let cfg = EngineConfig {
            stages: "rank_quality".to_string(),
            ..Default::default()
        };
        assert_eq!(registry.build(&cfg).unwrap().len(), 1);
    }
}
