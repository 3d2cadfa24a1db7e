//! Planning CLI
//!
//! Projects one client plan to retirement and prints rows, totals and the IHT estimate

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use planning_engine::{
    balance::load_client_plan,
    calculate_iht,
    projection::{DisposalMode, ProjectionEngine, ProjectionRow},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "planning")]
#[command(version, about = "Project a client balance sheet to retirement and estimate inheritance tax")]
struct Cli {
    /// Client plan JSON file
    client: PathBuf,

    /// Years to retirement (overrides the file and the date of birth)
    #[arg(long)]
    years: Option<u32>,

    /// Target retirement age used with the file's date of birth
    #[arg(long)]
    retirement_age: Option<u32>,

    /// Inflation in percent
    #[arg(long)]
    inflation: Option<f64>,

    /// Withdrawal rate in percent
    #[arg(long)]
    withdrawal: Option<f64>,

    /// Valuation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Write projection rows to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

/// Flat CSV record for one projection row
#[derive(Debug, Serialize)]
struct RowRecord<'a> {
    key: &'a str,
    category: &'static str,
    item_type: &'a str,
    description: Option<&'a str>,
    current: Option<f64>,
    future: Option<f64>,
    future_today: Option<f64>,
    as_income: f64,
    mode: Option<DisposalMode>,
    rent_today: Option<f64>,
    as_income_sell: Option<f64>,
}

impl<'a> From<&'a ProjectionRow> for RowRecord<'a> {
    fn from(row: &'a ProjectionRow) -> Self {
        let capital = row.capital();
        let (mode, rent_today, as_income_sell) = match row {
            ProjectionRow::Property {
                mode,
                rent_today,
                as_income_sell,
                ..
            } => (Some(*mode), Some(*rent_today), Some(*as_income_sell)),
            _ => (None, None, None),
        };
        let description = match row {
            ProjectionRow::Income { description, .. } => description.as_deref(),
            _ => capital.and_then(|c| c.description.as_deref()),
        };
        Self {
            key: row.key(),
            category: row.category(),
            item_type: row.item_type(),
            description,
            current: capital.map(|c| c.current),
            future: capital.map(|c| c.future),
            future_today: capital.map(|c| c.future_today),
            as_income: row.income(),
            mode,
            rent_today,
            as_income_sell,
        }
    }
}

fn write_rows_csv(path: &Path, rows: &[ProjectionRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Unable to create CSV file {}", path.display()))?;
    for row in rows {
        writer.serialize(RowRecord::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut plan = load_client_plan(&cli.client)
        .with_context(|| format!("Failed to load client plan {}", cli.client.display()))?;

    if let Some(age) = cli.retirement_age {
        plan.target_retirement_age = Some(age);
    }
    if let Some(pct) = cli.inflation {
        plan.settings.inflation_pct = pct;
    }
    if let Some(pct) = cli.withdrawal {
        plan.settings.withdrawal_pct = pct;
    }
    if cli.years.is_some() {
        plan.settings.years_to_retirement = cli.years;
    }

    let today = cli.as_of.unwrap_or_else(|| Local::now().date_naive());
    let config = plan.projection_config(today);

    println!("Planning Engine v{}", env!("CARGO_PKG_VERSION"));
    println!("=======================\n");
    println!("Client: {}", plan.label(&cli.client.display().to_string()));
    println!("  Items: {}", plan.balance_sheet.items.len());
    match config.years_to_retirement {
        Some(years) => println!("  Years to retirement: {}", years),
        None => println!("  Years to retirement: not set (need date of birth and target age)"),
    }
    println!("  Inflation: {:.2}%  Withdrawal: {:.2}%", config.inflation_pct, config.withdrawal_pct);
    println!();

    let engine = ProjectionEngine::new(config);
    let result = engine.run(&plan.balance_sheet, &plan.overrides, plan.target_income_annual());

    println!(
        "{:<12} {:<10} {:<24} {:>12} {:>12} {:>12} {:>10}",
        "Key", "Category", "Type", "Current", "Future", "Today", "Income"
    );
    println!("{}", "-".repeat(98));
    for row in &result.rows {
        let capital = row.capital();
        let fmt = |v: Option<f64>| v.map(|v| format!("{:.0}", v)).unwrap_or_default();
        println!(
            "{:<12} {:<10} {:<24} {:>12} {:>12} {:>12} {:>10.0}",
            row.key(),
            row.category(),
            row.item_type(),
            fmt(capital.map(|c| c.current)),
            fmt(capital.map(|c| c.future)),
            fmt(capital.map(|c| c.future_today)),
            row.income(),
        );
    }

    if let Some(totals) = result.totals {
        println!("\nTotals:");
        println!("  Current:             £{:.0}", totals.current_sum);
        println!("  Future (nominal):    £{:.0}", totals.future_sum);
        println!("  Future (today's £):  £{:.0}", totals.today_sum);
        println!("  Retirement income:   £{:.0} p.a.", totals.income_sum);
        if totals.target_income_annual > 0.0 {
            println!("  Target income:       £{:.0} p.a.", totals.target_income_annual);
            if totals.meets_target() {
                println!("  On track");
            } else {
                println!("  Shortfall:           £{:.0} p.a.", totals.shortfall());
            }
        }
    }

    let iht = calculate_iht(&plan.estate_inputs());
    println!("\nInheritance Tax:");
    println!("  Taxable estate:      £{:.0}", iht.taxable_estate);
    println!("  Subject to IHT:      £{:.0}", iht.estate_subject_to_iht);
    println!("  Rate:                {:.0}%", iht.iht_rate * 100.0);
    println!("  IHT payable:         £{:.0}", iht.iht_payable);
    println!("  To beneficiaries:    £{:.0}", iht.value_to_beneficiaries_on_death);
    println!("  Effective rate:      {:.2}%", iht.effective_iht_rate * 100.0);

    if let Some(path) = &cli.csv {
        write_rows_csv(path, &result.rows)?;
        println!("\nRows written to: {}", path.display());
    }

    Ok(())
}
