use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use scoreforge_core::EngineConfig;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Vertical configuration (JSON).
    #[arg(global = true, short, long, default_value = "data/vertical.json")]
    vertical: String,

    /// Long-format product attributes (CSV).
    #[arg(global = true, short, long, default_value = "data/products.csv")]
    products: String,

    /// Engine settings file (JSON). Flags given on the command line win.
    #[arg(global = true, long)]
    engine_config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Score(cmd::score::ScoreArgs),
    Validate(cmd::validate::ValidateArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .init();

    info!("Loading vertical: {}", cli.vertical);
    let vertical = scoreforge::loader::load_vertical(&cli.vertical).unwrap_or_else(|e| {
        error!("{}", e);
        process::exit(1);
    });

    let outcome = match &cli.command {
        Commands::Score(args) => {
            let mut config = match &cli.engine_config {
                Some(path) => {
                    info!("Loading engine config from: {}", path);
                    EngineConfig::load_from_file(path).unwrap_or_else(|e| {
                        error!("{}", e);
                        process::exit(1);
                    })
                }
                None => EngineConfig::default(),
            };
            if let Some(sub_matches) = matches.subcommand_matches("score") {
                config.merge_from_cli(&args.engine, sub_matches);
            }
            cmd::score::run(args, config, &vertical, &cli.products)
        }
        Commands::Validate(args) => cmd::validate::run(args, &vertical),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
