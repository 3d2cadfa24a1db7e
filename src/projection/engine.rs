//! Projection engine turning a balance sheet into rows and totals

use super::projector::ItemProjector;
use super::rows::{CapitalRow, DisposalMode, ItemOverrides, ProjectionRow, Totals};
use crate::balance::{BalanceSheet, BalanceSheetItem, Bucket, ItemDetails, PropertyKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default inflation used to deflate future values (percent)
pub const DEFAULT_INFLATION_PCT: f64 = 2.5;

/// Default sustainable withdrawal rate (percent)
pub const DEFAULT_WITHDRAWAL_PCT: f64 = 4.0;

/// Configuration for a projection run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Horizon in whole years; `None` means no projection is possible
    pub years_to_retirement: Option<u32>,

    /// Inflation used for the today's-money deflator, in percent
    pub inflation_pct: f64,

    /// Sustainable withdrawal rate applied to today's-money capital, in percent
    pub withdrawal_pct: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            years_to_retirement: None,
            inflation_pct: DEFAULT_INFLATION_PCT,
            withdrawal_pct: DEFAULT_WITHDRAWAL_PCT,
        }
    }
}

impl ProjectionConfig {
    pub fn for_years(years: u32) -> Self {
        Self {
            years_to_retirement: Some(years),
            ..Default::default()
        }
    }

    /// Factor converting nominal future money into today's money
    pub fn deflator(&self, years: u32) -> f64 {
        let inflation = if self.inflation_pct.is_finite() { self.inflation_pct } else { 0.0 };
        let d = (1.0 + inflation / 100.0).powi(years as i32);
        // An overflowing deflator is kept so today's-money values read as 0
        if d.is_nan() || d == 0.0 {
            1.0
        } else {
            d
        }
    }

    /// Withdrawal rate as a proportion
    pub fn withdrawal_rate(&self) -> f64 {
        if self.withdrawal_pct.is_finite() {
            self.withdrawal_pct / 100.0
        } else {
            0.0
        }
    }
}

/// Rows plus totals for one client under one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningResult {
    pub config: ProjectionConfig,
    pub rows: Vec<ProjectionRow>,
    pub totals: Option<Totals>,
}

/// Round half up to whole pounds, reading non-finite values as zero
pub(crate) fn to_pounds(value: f64) -> f64 {
    if value.is_finite() {
        (value + 0.5).floor()
    } else {
        0.0
    }
}

/// Main projection engine
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    /// Create a new projection engine with the given config
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Project every item of the sheet into display rows
    ///
    /// Rows are grouped assets, income-only pensions, loans, properties; each
    /// group keeps balance sheet order.
    pub fn create_projections(&self, sheet: &BalanceSheet, overrides: &ItemOverrides) -> Vec<ProjectionRow> {
        let Some(years) = self.config.years_to_retirement else {
            return Vec::new();
        };
        let d = self.config.deflator(years);
        let mut rows = Vec::with_capacity(sheet.items.len());

        for item in sheet.in_bucket(Bucket::Asset) {
            let capital = self.capital_row(item, overrides, years, d);
            let has_contribution = matches!(
                &item.details,
                ItemDetails::Pot { contribution: Some(c), .. } if c.has_amount()
            );
            rows.push(ProjectionRow::Asset { capital, has_contribution });
        }

        for item in sheet.in_bucket(Bucket::IncomeOnly) {
            let projector = ItemProjector::new(item, &overrides.assumptions_for(item.key()));
            let proj = projector.project(years as f64);
            rows.push(ProjectionRow::Income {
                key: item.key().to_string(),
                item_type: item.type_name(),
                description: item.description.clone(),
                income: to_pounds(proj.retirement_income_contribution),
            });
        }

        for item in sheet.in_bucket(Bucket::Loan) {
            let capital = self.capital_row(item, overrides, years, d);
            rows.push(ProjectionRow::Loan { capital });
        }

        for item in sheet.in_bucket(Bucket::Property) {
            rows.push(self.property_row(item, overrides, years, d));
        }

        debug!("Created {} projection rows over {} years", rows.len(), years);
        rows
    }

    /// Current/future/today figures with the withdrawal-rate income baseline
    fn capital_row(&self, item: &BalanceSheetItem, overrides: &ItemOverrides, years: u32, d: f64) -> CapitalRow {
        let projector = ItemProjector::new(item, &overrides.assumptions_for(item.key()));
        let current = to_pounds(projector.current_value());
        let future = to_pounds(projector.project(years as f64).future_capital_value);
        let future_today = to_pounds(future / d);
        let as_income = to_pounds(future_today * self.config.withdrawal_rate());

        CapitalRow {
            key: item.key().to_string(),
            item_type: item.type_name(),
            description: item.description.clone(),
            current,
            future,
            future_today,
            as_income,
        }
    }

    fn property_row(&self, item: &BalanceSheetItem, overrides: &ItemOverrides, years: u32, d: f64) -> ProjectionRow {
        let kind = match &item.details {
            ItemDetails::Property { kind, .. } => *kind,
            _ => PropertyKind::OtherValuableItem,
        };
        let projector = ItemProjector::new(item, &overrides.assumptions_for(item.key()));
        let current = to_pounds(projector.current_value());
        let proj = projector.project(years as f64);
        let future = to_pounds(proj.future_capital_value);
        let future_today = to_pounds(future / d);

        let rent_today = if kind == PropertyKind::BuyToLet {
            to_pounds(to_pounds(proj.rent_future_net()) / d)
        } else {
            0.0
        };

        // Main residence and holiday home sale income stays gross; other kinds are taxed
        let withdrawal_rate = self.config.withdrawal_rate();
        let tax_rate = projector.assumptions().tax_rate;
        let as_income_sell = if kind.sells_gross() {
            to_pounds(future_today * withdrawal_rate)
        } else {
            to_pounds(future_today * withdrawal_rate * (1.0 - tax_rate))
        };

        let default_mode = if kind == PropertyKind::BuyToLet {
            DisposalMode::Rent
        } else {
            DisposalMode::None
        };
        let mode = overrides.property_modes.get(item.key()).copied().unwrap_or(default_mode);
        let as_income = match mode {
            DisposalMode::Rent => rent_today,
            DisposalMode::Sell => as_income_sell,
            DisposalMode::None => 0.0,
        };

        ProjectionRow::Property {
            capital: CapitalRow {
                key: item.key().to_string(),
                item_type: item.type_name(),
                description: item.description.clone(),
                current,
                future,
                future_today,
                as_income,
            },
            mode,
            rent_today,
            as_income_sell,
        }
    }

    /// Totals for rows produced by this engine
    pub fn totals(&self, rows: &[ProjectionRow], overrides: &ItemOverrides, target_income_annual: f64) -> Option<Totals> {
        compute_totals(
            rows,
            &overrides.income_included,
            self.config.years_to_retirement,
            self.config.inflation_pct,
            target_income_annual,
        )
    }

    /// Rows and totals in one pass
    pub fn run(&self, sheet: &BalanceSheet, overrides: &ItemOverrides, target_income_annual: f64) -> PlanningResult {
        let rows = self.create_projections(sheet, overrides);
        let totals = self.totals(&rows, overrides, target_income_annual);
        PlanningResult {
            config: self.config,
            rows,
            totals,
        }
    }
}

/// Sum rows into totals; `None` when there is no horizon
///
/// Asset and loan income honours the inclusion toggle (default included).
/// Property income is always summed since the disposal mode already gates it.
/// `_inflation_pct` is unused: rows already carry today's-money figures.
pub fn compute_totals(
    rows: &[ProjectionRow],
    income_included: &BTreeMap<String, bool>,
    years_to_retirement: Option<u32>,
    _inflation_pct: f64,
    target_income_annual: f64,
) -> Option<Totals> {
    if years_to_retirement.is_none() {
        return None;
    }

    let mut totals = Totals {
        target_income_annual: if target_income_annual.is_finite() { target_income_annual } else { 0.0 },
        ..Default::default()
    };

    for row in rows {
        if let Some(capital) = row.capital() {
            totals.current_sum += finite(capital.current);
            totals.future_sum += finite(capital.future);
            totals.today_sum += finite(capital.future_today);
        }
        match row {
            ProjectionRow::Asset { capital, .. } | ProjectionRow::Loan { capital } => {
                if income_included.get(&capital.key).copied().unwrap_or(true) {
                    totals.income_sum += finite(capital.as_income);
                }
            }
            ProjectionRow::Property { capital, .. } => totals.income_sum += finite(capital.as_income),
            ProjectionRow::Income { income, .. } => totals.income_sum += finite(*income),
        }
    }

    Some(totals)
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::AssumptionOverrides;
    use crate::balance::{
        CashFlow, DebtKind, Frequency, IncomeKind, ItemRef, NetGross, PensionIncomeKind, PotKind,
    };

    fn test_sheet() -> BalanceSheet {
        BalanceSheet::new(vec![
            BalanceSheetItem::property("home", PropertyKind::MainResidence, 300_000.0, None, None),
            BalanceSheetItem::pot("isa", PotKind::Isa, 10_000.0),
            BalanceSheetItem::debt("cc", DebtKind::CreditCard, 2_000.0, None),
            BalanceSheetItem::pension_income(
                "state",
                PensionIncomeKind::StatePension,
                CashFlow::new(1000.0, Frequency::Monthly, NetGross::Net),
            ),
            BalanceSheetItem::new(
                ItemRef::new("salary"),
                None,
                ItemDetails::Income {
                    kind: IncomeKind::SalaryIncome,
                    cashflow: Some(CashFlow::monthly(3000.0)),
                },
            ),
        ])
    }

    #[test]
    fn test_rows_grouped_by_bucket() {
        let engine = ProjectionEngine::new(ProjectionConfig::for_years(10));
        let rows = engine.create_projections(&test_sheet(), &ItemOverrides::default());

        let categories: Vec<_> = rows.iter().map(|r| r.category()).collect();
        assert_eq!(categories, vec!["asset", "income", "loan", "property"]);
        let keys: Vec<_> = rows.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["isa", "state", "cc", "home"]);
    }

    #[test]
    fn test_no_horizon_means_no_rows_or_totals() {
        let engine = ProjectionEngine::new(ProjectionConfig::default());
        let sheet = test_sheet();
        let rows = engine.create_projections(&sheet, &ItemOverrides::default());
        assert!(rows.is_empty());

        let other_rows = ProjectionEngine::new(ProjectionConfig::for_years(5))
            .create_projections(&sheet, &ItemOverrides::default());
        assert!(compute_totals(&other_rows, &BTreeMap::new(), None, DEFAULT_INFLATION_PCT, 30_000.0).is_none());
    }

    #[test]
    fn test_asset_row_figures() {
        let engine = ProjectionEngine::new(ProjectionConfig::for_years(10));
        let rows = engine.create_projections(&test_sheet(), &ItemOverrides::default());
        let capital = rows[0].capital().unwrap();

        assert_eq!(capital.current, 10_000.0);
        assert_eq!(capital.future, 14_802.0);
        let d = 1.025f64.powi(10);
        assert_eq!(capital.future_today, (14_802.0 / d + 0.5).floor());
        assert_eq!(capital.as_income, (capital.future_today * 0.04 + 0.5).floor());
    }

    #[test]
    fn test_property_modes() {
        let engine = ProjectionEngine::new(ProjectionConfig::for_years(10));
        let sheet = test_sheet();

        let rows = engine.create_projections(&sheet, &ItemOverrides::default());
        let home = rows.last().unwrap();
        match home {
            ProjectionRow::Property { capital, mode, as_income_sell, .. } => {
                assert_eq!(*mode, DisposalMode::None);
                assert_eq!(capital.as_income, 0.0);
                // Main residence sale income is gross
                assert_eq!(*as_income_sell, (capital.future_today * 0.04 + 0.5).floor());
            }
            other => panic!("expected property row, got {:?}", other),
        }

        let mut overrides = ItemOverrides::default();
        overrides.property_modes.insert("home".into(), DisposalMode::Sell);
        let rows = engine.create_projections(&sheet, &overrides);
        match rows.last().unwrap() {
            ProjectionRow::Property { capital, as_income_sell, .. } => {
                assert!(*as_income_sell > 0.0);
                assert_eq!(capital.as_income, *as_income_sell);
            }
            other => panic!("expected property row, got {:?}", other),
        }

        // Rent mode on a non buy-to-let has no rent
        overrides.property_modes.insert("home".into(), DisposalMode::Rent);
        let rows = engine.create_projections(&sheet, &overrides);
        assert_eq!(rows.last().unwrap().income(), 0.0);
    }

    #[test]
    fn test_sell_income_taxed_for_other_property() {
        let engine = ProjectionEngine::new(ProjectionConfig::for_years(10));
        let sheet = BalanceSheet::new(vec![BalanceSheetItem::property(
            "art",
            PropertyKind::OtherValuableItem,
            50_000.0,
            None,
            None,
        )]);
        let rows = engine.create_projections(&sheet, &ItemOverrides::default());
        match &rows[0] {
            ProjectionRow::Property { capital, as_income_sell, mode, .. } => {
                assert_eq!(*mode, DisposalMode::None);
                assert_eq!(*as_income_sell, (capital.future_today * 0.04 * 0.8 + 0.5).floor());
            }
            other => panic!("expected property row, got {:?}", other),
        }
    }

    #[test]
    fn test_buy_to_let_defaults_to_rent() {
        let rent = CashFlow::new(1000.0, Frequency::Monthly, NetGross::Net);
        let sheet = BalanceSheet::new(vec![BalanceSheetItem::property(
            "btl",
            PropertyKind::BuyToLet,
            240_000.0,
            None,
            Some(rent),
        )]);
        let engine = ProjectionEngine::new(ProjectionConfig {
            years_to_retirement: Some(0),
            inflation_pct: 2.5,
            withdrawal_pct: 4.0,
        });
        let rows = engine.create_projections(&sheet, &ItemOverrides::default());
        match &rows[0] {
            ProjectionRow::Property { capital, mode, rent_today, .. } => {
                assert_eq!(*mode, DisposalMode::Rent);
                assert_eq!(*rent_today, 12_000.0);
                assert_eq!(capital.as_income, 12_000.0);
            }
            other => panic!("expected property row, got {:?}", other),
        }
    }

    #[test]
    fn test_totals_respect_income_toggle() {
        let engine = ProjectionEngine::new(ProjectionConfig::for_years(10));
        let sheet = test_sheet();
        let mut overrides = ItemOverrides::default();
        let rows = engine.create_projections(&sheet, &overrides);

        let all = engine.totals(&rows, &overrides, 0.0).unwrap();
        let expected_income: f64 = rows.iter().map(|r| r.income()).sum();
        assert_eq!(all.income_sum, expected_income);
        assert!(all.future_sum > 0.0);

        overrides.income_included.insert("isa".into(), false);
        let without_isa = engine.totals(&rows, &overrides, 0.0).unwrap();
        assert_eq!(without_isa.income_sum, expected_income - rows[0].income());
        assert_eq!(without_isa.current_sum, all.current_sum);
    }

    #[test]
    fn test_income_toggle_ignored_for_property_and_pension_rows() {
        let engine = ProjectionEngine::new(ProjectionConfig::for_years(10));
        let sheet = test_sheet();
        let mut overrides = ItemOverrides::default();
        overrides.property_modes.insert("home".into(), DisposalMode::Sell);
        let rows = engine.create_projections(&sheet, &overrides);

        let home_income = rows.iter().find(|r| r.key() == "home").unwrap().income();
        let state_income = rows.iter().find(|r| r.key() == "state").unwrap().income();
        assert!(home_income > 0.0);
        assert!(state_income > 0.0);

        let on = engine.totals(&rows, &overrides, 0.0).unwrap();
        overrides.income_included.insert("home".into(), false);
        overrides.income_included.insert("state".into(), false);
        let off = engine.totals(&rows, &overrides, 0.0).unwrap();
        assert_eq!(off.income_sum, on.income_sum);
    }

    #[test]
    fn test_overflowing_deflator_zeroes_todays_money() {
        let config = ProjectionConfig {
            inflation_pct: 1e300,
            ..ProjectionConfig::for_years(10)
        };
        assert!(config.deflator(10).is_infinite());

        let rows = ProjectionEngine::new(config).create_projections(&test_sheet(), &ItemOverrides::default());
        let isa = rows.iter().find(|r| r.key() == "isa").unwrap().capital().unwrap();
        assert!(isa.future > 0.0);
        assert_eq!(isa.future_today, 0.0);
        assert_eq!(isa.as_income, 0.0);
    }

    #[test]
    fn test_overrides_follow_stable_key() {
        let engine = ProjectionEngine::new(ProjectionConfig::for_years(10));
        let mut overrides = ItemOverrides::default();
        overrides.assumptions.insert(
            "isa".into(),
            AssumptionOverrides {
                annual_growth_rate: Some(0.0),
                ..Default::default()
            },
        );

        let mut sheet = test_sheet();
        let rows = engine.create_projections(&sheet, &overrides);
        let isa_future = rows.iter().find(|r| r.key() == "isa").unwrap().capital().unwrap().future;
        assert_eq!(isa_future, 10_000.0);

        // Reordering the sheet must not move the override to another item
        sheet.items.reverse();
        let rows = engine.create_projections(&sheet, &overrides);
        let isa_future = rows.iter().find(|r| r.key() == "isa").unwrap().capital().unwrap().future;
        assert_eq!(isa_future, 10_000.0);
    }

    #[test]
    fn test_loan_rows_never_positive() {
        let engine = ProjectionEngine::new(ProjectionConfig::for_years(25));
        let rows = engine.create_projections(&test_sheet(), &ItemOverrides::default());
        for row in rows.iter().filter(|r| r.category() == "loan") {
            let capital = row.capital().unwrap();
            assert!(capital.future <= 0.0);
            assert!(capital.as_income <= 0.0);
        }
    }

    #[test]
    fn test_run_is_deterministic() {
        let engine = ProjectionEngine::new(ProjectionConfig::for_years(12));
        let sheet = test_sheet();
        let overrides = ItemOverrides::default();
        assert_eq!(engine.run(&sheet, &overrides, 25_000.0), engine.run(&sheet, &overrides, 25_000.0));
    }

    #[test]
    fn test_to_pounds_rounds_half_up() {
        assert_eq!(to_pounds(2.5), 3.0);
        assert_eq!(to_pounds(-2.5), -2.0);
        assert_eq!(to_pounds(f64::NAN), 0.0);
    }
}
