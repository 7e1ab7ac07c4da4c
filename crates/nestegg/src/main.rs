mod logging;

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;

use nestegg_core::model::Settings;
use nestegg_core::{analyze_with, AnalysisOptions};

use logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "nestegg")]
#[command(about = "Retirement sufficiency analyzer: settings JSON in, analysis JSON out")]
struct Args {
    /// Path to the settings JSON file
    settings: PathBuf,

    /// Write the analysis JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Monte Carlo trial count (0 = default)
    #[arg(short, long, default_value_t = 0)]
    trials: usize,

    /// Base seed for the stochastic engine; omit for fresh entropy
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let raw = fs::read_to_string(&args.settings)
        .wrap_err_with(|| format!("failed to read {}", args.settings.display()))?;
    let settings: Settings =
        serde_json::from_str(&raw).wrap_err("failed to parse settings JSON")?;
    let settings = settings.migrate_healthcare();

    let options = AnalysisOptions {
        trials: args.trials,
        seed: args.seed,
        ..AnalysisOptions::default()
    };

    tracing::info!(
        portfolio = settings.portfolio_value,
        horizon_years = settings.projection_years,
        trials = options.trials,
        "running analysis"
    );

    let analysis = analyze_with(&settings, &options);

    tracing::info!(
        survives = analysis.projection.survives,
        success_rate = analysis.monte_carlo.success_rate,
        score = analysis.score.score,
        "analysis complete"
    );

    let json = serde_json::to_string_pretty(&analysis)?;
    match &args.output {
        Some(path) => fs::write(path, json)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}
