use crate::reports;
use clap::Args;
use scoreforge::error::CliResult;
use scoreforge::loader;
use scoreforge_core::{EngineConfig, Pipeline, VerticalConfig};
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub engine: EngineConfig,

    /// Number of ranked products to print.
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Writes the scored products as JSON.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Also print each product's per-score breakdown.
    #[arg(long, default_value_t = false)]
    pub details: bool,
}

/// Returns `Ok(false)` when a stage could not be finalized.
pub fn run(
    args: &ScoreArgs,
    config: EngineConfig,
    vertical: &VerticalConfig,
    products_path: &str,
) -> CliResult<bool> {
    info!("Loading products: {}", products_path);
    let mut products = loader::load_products(products_path)?;

    let ranking_score = config.ranking_score.clone();
    let pipeline = Pipeline::from_config(config)?;
    let report = pipeline.run(vertical, &mut products)?;

    println!("\n=== SCORING: {} ({} products) ===", vertical.id, products.len());
    reports::print_stage_report(&report);
    reports::print_ranking(&products, &ranking_score, args.top);
    if args.details {
        reports::print_score_details(&products, vertical);
    }

    if let Some(path) = &args.output {
        loader::write_products(path, &products)?;
        info!("Scored products written to {}", path);
    }

    Ok(report.is_complete())
}
