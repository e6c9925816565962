//! Dashboard Builder Binary
//!
//! Generates the dashboard dataset JSON from a directory of clean tables.
//!
//! Usage:
//!   cargo run --bin build-dashboard                  # Uses the configured output dir
//!   cargo run --bin build-dashboard -- clean/ 25     # Explicit dir and top-artist count

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use museum_cleaner::app::ReportUseCase;
use museum_cleaner::config::Config;
use museum_cleaner::constants::DASHBOARD_FILE;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args: Vec<String> = env::args().collect();

    let dir = match args.get(1) {
        Some(dir) => PathBuf::from(dir),
        None => Config::load(None).context("loading configuration")?.output.dir,
    };
    let top = match args.get(2) {
        Some(n) => n.parse::<usize>().context("top-artist count must be a number")?,
        None => 10,
    };

    eprintln!("📋 Reading clean tables from {}", dir.display());
    let dashboard = ReportUseCase::new(top).dashboard_from_dir(&dir)?;

    // Print to stdout by default
    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    // Also save next to the tables
    let output_path = ReportUseCase::write_json(&dashboard, &dir.join(DASHBOARD_FILE))?;

    eprintln!("✅ Dashboard dataset generated successfully!");
    eprintln!("📄 Saved to: {}", output_path.display());
    Ok(())
}
