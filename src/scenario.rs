//! Scenario runner for what-if projections
//!
//! Holds one client's per-item overrides and income target, then runs the same
//! balance sheet under several configurations (horizons, inflation, withdrawal).

use crate::balance::{BalanceSheet, ClientPlan};
use crate::projection::{ItemOverrides, PlanningResult, ProjectionConfig, ProjectionEngine};

/// Pre-configured runner for repeated projections
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::for_plan(&plan);
///
/// for pct in [3.0, 4.0, 5.0] {
///     let config = ProjectionConfig { withdrawal_pct: pct, ..base };
///     let result = runner.run(&plan.balance_sheet, config);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    overrides: ItemOverrides,
    target_income_annual: f64,
}

impl ScenarioRunner {
    /// Runner with no overrides and no income target
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: ItemOverrides, target_income_annual: f64) -> Self {
        Self {
            overrides,
            target_income_annual,
        }
    }

    /// Runner using a loaded client's overrides and target
    pub fn for_plan(plan: &ClientPlan) -> Self {
        Self::with_overrides(plan.overrides.clone(), plan.target_income_annual())
    }

    /// Run a single projection with the given config
    pub fn run(&self, sheet: &BalanceSheet, config: ProjectionConfig) -> PlanningResult {
        ProjectionEngine::new(config).run(sheet, &self.overrides, self.target_income_annual)
    }

    /// Run multiple scenarios (different configs) for one balance sheet
    pub fn run_scenarios(&self, sheet: &BalanceSheet, configs: &[ProjectionConfig]) -> Vec<PlanningResult> {
        configs.iter().map(|config| self.run(sheet, *config)).collect()
    }

    /// Project to each horizon in turn, keeping the other settings of `base`
    pub fn run_horizons(
        &self,
        sheet: &BalanceSheet,
        base: ProjectionConfig,
        horizons: impl IntoIterator<Item = u32>,
    ) -> Vec<PlanningResult> {
        horizons
            .into_iter()
            .map(|years| {
                self.run(
                    sheet,
                    ProjectionConfig {
                        years_to_retirement: Some(years),
                        ..base
                    },
                )
            })
            .collect()
    }

    pub fn overrides(&self) -> &ItemOverrides {
        &self.overrides
    }

    pub fn overrides_mut(&mut self) -> &mut ItemOverrides {
        &mut self.overrides
    }

    pub fn target_income_annual(&self) -> f64 {
        self.target_income_annual
    }
}
