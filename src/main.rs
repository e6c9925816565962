use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use museum_cleaner::app::{CleanOutcome, CleanUseCase, ReportUseCase};
use museum_cleaner::config::Config;
use museum_cleaner::constants::DASHBOARD_FILE;
use museum_cleaner::logging;

#[derive(Parser)]
#[command(name = "museum_cleaner")]
#[command(about = "Clean a museum collection export into analysis-ready tables")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, env = "MUSEUM_CLEANER_CONFIG")]
    config: Option<PathBuf>,

    /// Debug-level logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Default)]
struct CleanArgs {
    /// Artwork export CSV
    #[arg(long, env = "MUSEUM_CLEANER_ARTWORKS")]
    artworks: Option<PathBuf>,
    /// Artist export CSV
    #[arg(long, env = "MUSEUM_CLEANER_ARTISTS")]
    artists: Option<PathBuf>,
    /// Directory for the clean tables and run manifest
    #[arg(long, env = "MUSEUM_CLEANER_OUTPUT")]
    output: Option<PathBuf>,
    /// Also load the clean tables into this SQLite database
    #[arg(long)]
    sqlite: Option<PathBuf>,
    /// Keep artworks without artist ids in the expanded table (null artist)
    #[arg(long)]
    keep_unattributed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the export, run the cleaning pipeline and write the clean tables
    Clean(CleanArgs),
    /// Aggregate the clean tables into the dashboard dataset
    Report {
        /// Directory holding the clean tables (defaults to the configured output dir)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Number of artists in the top-artists panel
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Write the JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Clean, then write the dashboard dataset next to the clean tables
    Run {
        #[command(flatten)]
        clean: CleanArgs,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn apply_overrides(config: &mut Config, args: &CleanArgs) {
    if let Some(path) = &args.artworks {
        config.input.artworks = path.clone();
    }
    if let Some(path) = &args.artists {
        config.input.artists = path.clone();
    }
    if let Some(dir) = &args.output {
        config.output.dir = dir.clone();
    }
    if let Some(db) = &args.sqlite {
        config.output.sqlite_path = Some(db.clone());
    }
    if args.keep_unattributed {
        config.pipeline.keep_unattributed = true;
    }
}

fn print_summary(outcome: &CleanOutcome) {
    let report = &outcome.result.report;
    println!("\n📊 Cleaning results (run {}):", outcome.manifest.run_id);
    println!("   Artworks kept: {}", outcome.result.artworks.len());
    println!(
        "   Invalid rows removed: {} (no title/artist: {}, no id: {}, non-integer id: {})",
        report.invalid_rows.removed,
        report.invalid_rows.missing_identity,
        report.invalid_rows.blank_identifier,
        report.invalid_rows.non_integer_identifier
    );
    println!("   Duplicates removed: {}", report.duplicates_removed);
    println!("   Expanded rows: {}", outcome.result.expanded.len());
    println!(
        "   Unparseable artist ids: {}",
        report.expansion.unparseable_artist_ids
    );
    println!("   Artists: {}", outcome.result.artists.len());
    println!(
        "   Defaults filled: nationality {}, gender {}",
        report.defaults_filled.nationality, report.defaults_filled.gender
    );

    if report.expansion.unattributed_artworks > 0 {
        let verb = if outcome.manifest.keep_unattributed {
            "kept with a null artist"
        } else {
            "missing from the expanded table"
        };
        println!(
            "\n⚠️  {} artworks have no artist ids and are {}",
            report.expansion.unattributed_artworks, verb
        );
    }
}

fn clean(config: Config) -> Result<CleanOutcome> {
    println!("🧹 Running cleaning pipeline...");
    let outcome = CleanUseCase::from_config(config)?.execute()?;
    print_summary(&outcome);
    Ok(outcome)
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let _guard = logging::init_logging(&config.logging, cli.verbose);

    let outcome = match cli.command {
        Commands::Clean(args) => {
            apply_overrides(&mut config, &args);
            clean(config).map(|_| ())
        }
        Commands::Report { dir, top, out } => {
            let dir = dir.unwrap_or_else(|| config.output.dir.clone());
            ReportUseCase::new(top)
                .dashboard_from_dir(&dir)
                .and_then(|dashboard| match out {
                    Some(path) => {
                        let written = ReportUseCase::write_json(&dashboard, &path)?;
                        eprintln!("✅ Dashboard dataset written to {}", written.display());
                        Ok(())
                    }
                    None => {
                        println!("{}", serde_json::to_string_pretty(&dashboard)?);
                        Ok(())
                    }
                })
        }
        Commands::Run { clean: args, top } => {
            apply_overrides(&mut config, &args);
            let dir = config.output.dir.clone();
            clean(config).and_then(|_| {
                println!("\n📈 Building dashboard dataset...");
                let dashboard = ReportUseCase::new(top).dashboard_from_dir(&dir)?;
                let written = ReportUseCase::write_json(&dashboard, &dir.join(DASHBOARD_FILE))?;
                println!("✅ Full run completed; dashboard at {}", written.display());
                Ok(())
            })
        }
    };

    if let Err(e) = &outcome {
        error!("Run failed: {:#}", e);
        museum_cleaner::metrics::run_finished("failure");
    }
    outcome
}
