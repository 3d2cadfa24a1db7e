//! Run projections for every client plan in a directory
//!
//! Outputs one summary line per client (capital, income vs target, IHT)

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use log::warn;
use planning_engine::{
    balance::load_client_plan, calculate_iht, projection::ProjectionEngine,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "plan_batch")]
#[command(version, about = "Project every client plan in a directory")]
struct Cli {
    /// Directory of client plan JSON files
    input_dir: PathBuf,

    /// Output summary CSV
    #[arg(short, long, default_value = "plan_batch_summary.csv")]
    output: PathBuf,

    /// Valuation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

/// One line of the batch summary
#[derive(Debug, Clone, Serialize)]
struct ClientSummary {
    client: String,
    items: usize,
    years_to_retirement: Option<u32>,
    current_sum: f64,
    future_sum: f64,
    today_sum: f64,
    income_sum: f64,
    target_income_annual: f64,
    shortfall: f64,
    taxable_estate: f64,
    iht_payable: f64,
    value_to_beneficiaries: f64,
}

fn summarise(path: &Path, today: NaiveDate) -> Result<ClientSummary> {
    let plan = load_client_plan(path)?;
    let config = plan.projection_config(today);
    let result = ProjectionEngine::new(config).run(&plan.balance_sheet, &plan.overrides, plan.target_income_annual());
    let totals = result.totals.unwrap_or_default();
    let iht = calculate_iht(&plan.estate_inputs());

    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ClientSummary {
        client: plan.label(&fallback).to_string(),
        items: plan.balance_sheet.items.len(),
        years_to_retirement: config.years_to_retirement,
        current_sum: totals.current_sum,
        future_sum: totals.future_sum,
        today_sum: totals.today_sum,
        income_sum: totals.income_sum,
        target_income_annual: plan.target_income_annual(),
        shortfall: totals.shortfall(),
        taxable_estate: iht.taxable_estate,
        iht_payable: iht.iht_payable,
        value_to_beneficiaries: iht.value_to_beneficiaries_on_death,
    })
}

fn client_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Unable to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let today = cli.as_of.unwrap_or_else(|| Local::now().date_naive());

    let start = Instant::now();
    let files = client_files(&cli.input_dir)?;
    println!("Found {} client plans in {}", files.len(), cli.input_dir.display());

    // Each client is independent; failures are reported and skipped
    let summaries: Vec<ClientSummary> = files
        .par_iter()
        .filter_map(|path| match summarise(path, today) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                None
            }
        })
        .collect();

    println!("Projections complete in {:?}", start.elapsed());

    let mut writer = csv::Writer::from_path(&cli.output)
        .with_context(|| format!("Failed to create output file {}", cli.output.display()))?;
    for summary in &summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;

    println!("Output written to {}", cli.output.display());

    let total_iht: f64 = summaries.iter().map(|s| s.iht_payable).sum();
    let short: usize = summaries.iter().filter(|s| s.shortfall > 0.0).count();
    println!("\nBatch Summary:");
    println!("  Clients projected: {} of {}", summaries.len(), files.len());
    println!("  Clients short of target: {}", short);
    println!("  Total IHT payable: £{:.0}", total_iht);
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
