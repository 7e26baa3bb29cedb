use super::{AggregationStage, ProductOutcome};
use crate::context::AggregationContext;
use crate::error::EngineResult;
use crate::stats::Contributions;
use itertools::Itertools;
use scoreforge_protocol::{Product, ProductId, Ranking, VerticalConfig};
use std::collections::BTreeMap;
use tracing::info;

/// Position of one product inside a ranked population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub position: u64,
    pub count: u64,
    pub best: ProductId,
    pub better: Option<ProductId>,
}

/// Orders `(index, id, value)` entries best first (ties by ascending id) and
/// returns the placement of each index.
pub fn rank_entries(entries: &[(usize, ProductId, f64)]) -> Vec<(usize, Placement)> {
    let ordered: Vec<&(usize, ProductId, f64)> = entries
        .iter()
        .sorted_by(|a, b| b.2.total_cmp(&a.2).then(a.1.cmp(&b.1)))
        .collect();

    let Some(best) = ordered.first().map(|e| e.1) else {
        return Vec::new();
    };
    let count = ordered.len() as u64;

    ordered
        .iter()
        .enumerate()
        .map(|(i, &&(idx, _, _))| {
            let placement = Placement {
                position: i as u64 + 1,
                count,
                best,
                better: i.checked_sub(1).map(|prev| ordered[prev].1),
            };
            (idx, placement)
        })
        .collect()
}

/// Ranks products on one finalized score, globally and within their
/// sub-population. Only real scores take part.
pub struct RankingStage {
    score_name: String,
}

impl RankingStage {
    pub fn new(score_name: &str) -> Self {
        Self {
            score_name: score_name.to_string(),
        }
    }

    fn ranked_value(&self, product: &Product) -> Option<f64> {
        product
            .real_score(&self.score_name)
            .and_then(|s| s.relativ_value())
    }
}

impl AggregationStage for RankingStage {
    fn name(&self) -> &str {
        "ranking"
    }

    fn on_product(
        &self,
        product: &mut Product,
        _vertical: &VerticalConfig,
        _ctx: &AggregationContext,
        _sink: &mut Contributions,
    ) -> ProductOutcome {
        if self.ranked_value(product).is_none() {
            return ProductOutcome::Skipped(format!("no real {} score", self.score_name));
        }
        ProductOutcome::Processed
    }

    fn done(
        &mut self,
        ctx: &mut AggregationContext,
        products: &mut [Product],
        _vertical: &VerticalConfig,
    ) -> EngineResult<()> {
        for product in products.iter_mut() {
            product.ranking = Ranking::default();
        }

        let entries: Vec<(usize, ProductId, f64)> = products
            .iter()
            .enumerate()
            .filter_map(|(i, p)| self.ranked_value(p).map(|v| (i, p.id, v)))
            .collect();

        for (idx, placement) in rank_entries(&entries) {
            let ranking = &mut products[idx].ranking;
            ranking.global_position = Some(placement.position);
            ranking.global_count = placement.count;
            ranking.global_best = Some(placement.best);
            ranking.global_better = placement.better;
        }

        let mut groups: BTreeMap<&str, Vec<(usize, ProductId, f64)>> = BTreeMap::new();
        for &(idx, id, value) in &entries {
            if let Some(label) = products[idx].sub_population.as_deref() {
                groups.entry(label).or_default().push((idx, id, value));
            }
        }
        let specialized: Vec<(usize, Placement)> =
            groups.values().flat_map(|g| rank_entries(g)).collect();
        let sub_populations = groups.len();

        for (idx, placement) in specialized {
            let ranking = &mut products[idx].ranking;
            ranking.specialized_position = Some(placement.position);
            ranking.specialized_count = placement.count;
            ranking.specialized_best = Some(placement.best);
            ranking.specialized_better = placement.better;
        }

        info!(
            stage = self.name(),
            vertical = ctx.vertical_id(),
            score = %self.score_name,
            ranked = entries.len(),
            sub_populations,
            "Ranking computed"
        );
        Ok(())
    }
}
