//! Load client plans and balance sheets from JSON
//!
//! Items arrive as `{type, id, __localId, description, ite}` where `ite` holds
//! the shape-specific fields. Each item gets its `ItemRef` here, once.

use super::{
    BalanceSheet, BalanceSheetItem, Bucket, CashFlow, DebtKind, IncomeKind, ItemDetails, ItemRef,
    LoanDetails, PensionIncomeKind, PotKind, PropertyKind,
};
use crate::error::{PlanningError, Result};
use crate::estate::{summarise_estate, EstateAdjustments, EstateInputs, EstateToggles};
use crate::horizon::{annualise_target, years_to_retirement_from_iso};
use crate::projection::{ItemOverrides, ProjectionConfig};
use chrono::NaiveDate;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Raw item as stored by the balance sheet API
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default, rename = "__localId")]
    pub local_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ite: RawDetails,
}

/// Union of every shape's fields; each shape reads the ones it needs
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDetails {
    investment_value: Option<f64>,
    contribution: Option<CashFlow>,
    income: Option<CashFlow>,
    tax_sheltered: Option<bool>,
    value: Option<f64>,
    property_value: Option<f64>,
    loan: Option<LoanDetails>,
    rental_income: Option<CashFlow>,
    balance: Option<f64>,
    repayment: Option<CashFlow>,
    pension: Option<CashFlow>,
    expenditure: Option<CashFlow>,
}

fn parse_kind<T: DeserializeOwned>(item_type: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(item_type.to_string())).ok()
}

impl RawItem {
    fn source_id(&self) -> Option<String> {
        match &self.id {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => self.local_id.clone(),
        }
    }

    fn to_details(&self) -> ItemDetails {
        let t = self.item_type.as_str();
        let ite = &self.ite;

        if let Some(kind) = parse_kind::<PotKind>(t) {
            return ItemDetails::Pot {
                kind,
                investment_value: ite.investment_value,
                contribution: ite.contribution,
                income: ite.income,
                tax_sheltered: ite.tax_sheltered,
            };
        }
        if let Some(kind) = parse_kind::<PropertyKind>(t) {
            return ItemDetails::Property {
                kind,
                value: ite.value.or(ite.property_value),
                loan: ite.loan,
                rental_income: ite.rental_income,
            };
        }
        if let Some(kind) = parse_kind::<DebtKind>(t) {
            return ItemDetails::Debt {
                kind,
                balance: ite.balance,
                repayment: ite.repayment,
            };
        }
        if let Some(kind) = parse_kind::<PensionIncomeKind>(t) {
            return ItemDetails::PensionIncome {
                kind,
                pension: ite.pension,
            };
        }
        if let Some(kind) = parse_kind::<IncomeKind>(t) {
            let cashflow = match kind {
                IncomeKind::Expenses => ite.expenditure,
                _ => ite.income,
            };
            return ItemDetails::Income { kind, cashflow };
        }

        warn!("Unrecognised balance sheet item type: {}", t);
        ItemDetails::Unrecognised { kind: t.to_string() }
    }
}

/// Convert raw items, assigning each a stable reference
///
/// Items with neither `id` nor `__localId` receive a bucket-prefixed positional
/// key counted within their bucket.
pub fn build_balance_sheet(raw: Vec<RawItem>) -> BalanceSheet {
    let mut counters: HashMap<Bucket, usize> = HashMap::new();
    let items = raw
        .into_iter()
        .map(|r| {
            let details = r.to_details();
            let bucket = details.bucket();
            let index = counters.entry(bucket).or_insert(0);
            let item_ref = match r.source_id() {
                Some(id) => ItemRef::new(id),
                None => ItemRef::fallback(bucket, *index),
            };
            *index += 1;
            BalanceSheetItem::new(item_ref, r.description, details)
        })
        .collect();
    BalanceSheet::new(items)
}

/// Parse a JSON array of raw items
pub fn balance_sheet_from_json(json: &str) -> Result<BalanceSheet> {
    let raw: Vec<RawItem> = serde_json::from_str(json)?;
    Ok(build_balance_sheet(raw))
}

/// Estate section of a client file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawEstate {
    toggles: EstateToggles,
    adjustments: EstateAdjustments,
}

/// Client file as stored on disk
#[derive(Debug, Clone, Deserialize)]
struct RawClientFile {
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    date_of_birth: Option<String>,
    #[serde(default)]
    target_retirement_age: Option<u32>,
    #[serde(default)]
    target_retirement_income: Option<CashFlow>,
    #[serde(default)]
    settings: ProjectionConfig,
    #[serde(default)]
    overrides: ItemOverrides,
    #[serde(default)]
    estate: RawEstate,
    #[serde(default)]
    balance_sheet: Vec<RawItem>,
}

/// Everything needed to project one client and estimate their IHT
#[derive(Debug, Clone, PartialEq)]
pub struct ClientPlan {
    pub client_id: Option<String>,
    /// ISO date, kept as supplied
    pub date_of_birth: Option<String>,
    pub target_retirement_age: Option<u32>,
    pub target_retirement_income: Option<CashFlow>,
    /// Inflation and withdrawal settings; an explicit horizon here wins over
    /// the one derived from the date of birth
    pub settings: ProjectionConfig,
    pub overrides: ItemOverrides,
    pub estate_toggles: EstateToggles,
    pub estate_adjustments: EstateAdjustments,
    pub balance_sheet: BalanceSheet,
}

impl ClientPlan {
    /// Projection config with the horizon resolved against `today`
    pub fn projection_config(&self, today: NaiveDate) -> ProjectionConfig {
        let years_to_retirement = self.settings.years_to_retirement.or_else(|| {
            years_to_retirement_from_iso(self.date_of_birth.as_deref(), self.target_retirement_age, today)
        });
        ProjectionConfig {
            years_to_retirement,
            ..self.settings
        }
    }

    pub fn target_income_annual(&self) -> f64 {
        annualise_target(self.target_retirement_income.as_ref())
    }

    /// IHT inputs from the balance sheet plus the manual adjustments
    pub fn estate_inputs(&self) -> EstateInputs {
        let summary = summarise_estate(&self.balance_sheet, &self.estate_toggles);
        EstateInputs::from_summary(&summary, &self.estate_adjustments)
    }

    /// Label for reports: client id, else the given fallback
    pub fn label<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.client_id.as_deref().unwrap_or(fallback)
    }
}

impl From<RawClientFile> for ClientPlan {
    fn from(raw: RawClientFile) -> Self {
        Self {
            client_id: raw.client_id,
            date_of_birth: raw.date_of_birth,
            target_retirement_age: raw.target_retirement_age,
            target_retirement_income: raw.target_retirement_income,
            settings: raw.settings,
            overrides: raw.overrides,
            estate_toggles: raw.estate.toggles,
            estate_adjustments: raw.estate.adjustments,
            balance_sheet: build_balance_sheet(raw.balance_sheet),
        }
    }
}

/// Load a client plan from a JSON file
pub fn load_client_plan<P: AsRef<Path>>(path: P) -> Result<ClientPlan> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| PlanningError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let plan = load_client_plan_from_reader(BufReader::new(file))?;
    info!(
        "Loaded {} balance sheet items from {}",
        plan.balance_sheet.items.len(),
        path.display()
    );
    Ok(plan)
}

/// Load a client plan from any reader
pub fn load_client_plan_from_reader<R: Read>(reader: R) -> Result<ClientPlan> {
    let raw: RawClientFile = serde_json::from_reader(reader)?;
    Ok(raw.into())
}
