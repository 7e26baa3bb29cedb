use crate::context::AggregationContext;
use crate::relativize::Rating;
use itertools::Itertools;
use scoreforge_protocol::{Cardinality, Product, Score, VerticalConfig};
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct FinalizeOptions<'a> {
    stage: &'a str,
    /// Give products lacking the score a virtual one at the population mean.
    #[builder(default = false)]
    synthesize_missing: bool,
    /// Per-score ascending order plus worst/best bags.
    #[builder(default = true)]
    bands: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FinalizeSummary {
    pub scores: usize,
    pub synthesized: usize,
    pub failures: usize,
}

/// Turns the stage's accumulated statistics into final per-product scores:
/// absolute snapshots, virtual synthesis, relativization, the published relativ
/// population and the per-score bands.
pub fn finalize_scores(
    ctx: &mut AggregationContext,
    products: &mut [Product],
    vertical: &VerticalConfig,
    options: &FinalizeOptions,
) -> FinalizeSummary {
    let mut summary = FinalizeSummary::default();
    let names: Vec<String> = ctx.batch().names().map(str::to_string).collect();
    let relativizer = *ctx.relativizer();

    for name in &names {
        let population = match ctx.batch().get(name) {
            Some(stats) => stats.freeze(),
            None => continue,
        };
        if population.cardinality.is_empty() {
            warn!(stage = options.stage, score = %name, "No observations, skipping");
            continue;
        }

        let direction = vertical.direction_for(name);
        let scoring = vertical.scoring_for(name);
        debug!(
            stage = options.stage,
            score = %name,
            method = %relativizer.method_for_scoring(&population, scoring),
            count = population.cardinality.count,
            distinct = population.distinct_values(),
            min = population.cardinality.min,
            max = population.cardinality.max,
            avg = population.cardinality.avg,
            "Relativizing"
        );

        // 1. Absolute snapshots, synthesizing where data is missing
        for product in products.iter_mut() {
            if !product.scores.contains_key(name) {
                if !options.synthesize_missing {
                    continue;
                }
                product.scores.insert(
                    name.clone(),
                    Score::synthesized(name, population.cardinality.avg),
                );
                summary.synthesized += 1;
            }
            if let Some(score) = product.scores.get_mut(name) {
                if let Some(raw) = score.absolute_value() {
                    score.absolute = Some(population.cardinality.with_value(raw));
                }
            }
        }

        // 2. Relativ values against the frozen population
        let mut relativ_population = Cardinality::new();
        let relativ_values: Vec<Option<Rating>> = products
            .iter()
            .map(|product| {
                let score = product.scores.get(name)?;
                let raw = score.absolute_value()?;
                match relativizer.rate(name, raw, &population, direction, scoring) {
                    Ok(rating) => {
                        if !score.is_virtual && !rating.is_virtual {
                            relativ_population.increment(rating.value);
                        }
                        Some(rating)
                    }
                    Err(e) => {
                        warn!(stage = options.stage, product = product.id, "Relativization failed: {}", e);
                        summary.failures += 1;
                        None
                    }
                }
            })
            .collect();

        for (product, rating) in products.iter_mut().zip(&relativ_values) {
            if let Some(score) = product.scores.get_mut(name) {
                match rating {
                    Some(r) => {
                        score.relativ = Some(relativ_population.with_value(r.value));
                        score.value = Some(r.value);
                        score.is_virtual |= r.is_virtual;
                    }
                    None => {
                        score.relativ = None;
                        score.value = None;
                    }
                }
            }
        }

        ctx.publish_relativ(name, relativ_population);

        if options.bands {
            assign_bands(products, name, vertical);
        }
        summary.scores += 1;
    }

    ctx.record_failures(summary.failures);
    summary
}

/// Orders products ascending by relativ value (ties by id) and records the
/// position, extremes and worst/best bag membership for `name`.
pub fn assign_bands(products: &mut [Product], name: &str, vertical: &VerticalConfig) {
    for product in products.iter_mut() {
        product.worst_scores.remove(name);
        product.best_scores.remove(name);
    }

    let order: Vec<usize> = products
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.scores.get(name)?.relativ_value().map(|v| (i, p.id, v)))
        .sorted_by(|a, b| a.2.total_cmp(&b.2).then(a.1.cmp(&b.1)))
        .map(|(i, _, _)| i)
        .collect();

    let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
        return;
    };
    let lowest = products[first].id;
    let highest = products[last].id;
    let n = order.len();

    for (position, &idx) in order.iter().enumerate() {
        let product = &mut products[idx];
        if let Some(score) = product.scores.get_mut(name) {
            score.ranking = Some(position);
            score.lowest_score_id = Some(lowest);
            score.highest_score_id = Some(highest);
        }
        if position < vertical.worse_limit {
            product.worst_scores.insert(name.to_string());
        }
        if position + vertical.betters_limit >= n {
            product.best_scores.insert(name.to_string());
        }
    }
}
