//! Forward-value assumptions applied when projecting an item
//!
//! Every item is projected with the [`DEFAULT_ASSUMPTIONS`] unless the caller
//! supplies an [`AssumptionOverrides`] for its key. Overrides are merged field by
//! field; values that would poison the exponentiation (NaN, infinities, growth
//! rates at or below -100%) are discarded in favour of the default.

use crate::error::{PlanningError, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// Complete assumption set for one item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    /// Asset growth rate
    pub annual_growth_rate: f64,

    /// Escalation of contributions
    pub contribution_growth_rate: f64,

    /// Inflation / indexation
    pub inflation_rate: f64,

    /// Interest charged on debts and mortgages
    pub loan_interest_rate: f64,

    /// Flat effective tax rate
    pub tax_rate: f64,

    /// Yield / withdrawal rate applied to capital
    pub income_generation_rate: f64,

    /// Real growth of pensions quoted in today's money
    pub above_inflation_growth_rate: f64,
}

/// Assumptions used where the caller has not overridden anything
pub const DEFAULT_ASSUMPTIONS: Assumptions = Assumptions {
    annual_growth_rate: 0.04,
    contribution_growth_rate: 0.03,
    inflation_rate: 0.025,
    loan_interest_rate: 0.05,
    tax_rate: 0.20,
    income_generation_rate: 0.04,
    above_inflation_growth_rate: 0.01,
};

impl Default for Assumptions {
    fn default() -> Self {
        DEFAULT_ASSUMPTIONS
    }
}

/// Which domain check a field is subject to
#[derive(Debug, Clone, Copy)]
enum Domain {
    /// (1 + rate) must stay positive
    GrowthRate,
    /// Proportion that cannot be negative
    NonNegative,
}

impl Domain {
    fn accepts(self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            Domain::GrowthRate => value > -1.0,
            Domain::NonNegative => value >= 0.0,
        }
    }
}

/// Partial assumption set supplied per item by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionOverrides {
    pub annual_growth_rate: Option<f64>,
    pub contribution_growth_rate: Option<f64>,
    pub inflation_rate: Option<f64>,
    pub loan_interest_rate: Option<f64>,
    pub tax_rate: Option<f64>,
    pub income_generation_rate: Option<f64>,
    pub above_inflation_growth_rate: Option<f64>,
}

impl AssumptionOverrides {
    fn fields(&self) -> [(&'static str, Option<f64>, Domain); 7] {
        [
            ("annual_growth_rate", self.annual_growth_rate, Domain::GrowthRate),
            ("contribution_growth_rate", self.contribution_growth_rate, Domain::GrowthRate),
            ("inflation_rate", self.inflation_rate, Domain::GrowthRate),
            ("loan_interest_rate", self.loan_interest_rate, Domain::GrowthRate),
            ("tax_rate", self.tax_rate, Domain::NonNegative),
            ("income_generation_rate", self.income_generation_rate, Domain::NonNegative),
            ("above_inflation_growth_rate", self.above_inflation_growth_rate, Domain::GrowthRate),
        ]
    }

    /// True when no field is overridden
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value, _)| value.is_none())
    }

    /// Strict check: reject the first override outside its domain
    pub fn validate(&self) -> Result<()> {
        for (field, value, domain) in self.fields() {
            if let Some(v) = value {
                if !domain.accepts(v) {
                    return Err(PlanningError::InvalidAssumption { field, value: v });
                }
            }
        }
        Ok(())
    }
}

/// Take the override when it is usable, otherwise keep the base value
fn pick(field: &'static str, base: f64, candidate: Option<f64>, domain: Domain) -> f64 {
    match candidate {
        None => base,
        Some(v) if domain.accepts(v) => v,
        Some(v) => {
            warn!("Discarding {} override {}; using {}", field, v, base);
            base
        }
    }
}

impl Assumptions {
    /// Merge `overrides` over these assumptions field by field
    pub fn with_overrides(&self, overrides: &AssumptionOverrides) -> Self {
        Self {
            annual_growth_rate: pick(
                "annual_growth_rate",
                self.annual_growth_rate,
                overrides.annual_growth_rate,
                Domain::GrowthRate,
            ),
            contribution_growth_rate: pick(
                "contribution_growth_rate",
                self.contribution_growth_rate,
                overrides.contribution_growth_rate,
                Domain::GrowthRate,
            ),
            inflation_rate: pick(
                "inflation_rate",
                self.inflation_rate,
                overrides.inflation_rate,
                Domain::GrowthRate,
            ),
            loan_interest_rate: pick(
                "loan_interest_rate",
                self.loan_interest_rate,
                overrides.loan_interest_rate,
                Domain::GrowthRate,
            ),
            tax_rate: pick("tax_rate", self.tax_rate, overrides.tax_rate, Domain::NonNegative),
            income_generation_rate: pick(
                "income_generation_rate",
                self.income_generation_rate,
                overrides.income_generation_rate,
                Domain::NonNegative,
            ),
            above_inflation_growth_rate: pick(
                "above_inflation_growth_rate",
                self.above_inflation_growth_rate,
                overrides.above_inflation_growth_rate,
                Domain::GrowthRate,
            ),
        }
    }

    /// Defaults with `overrides` applied
    pub fn from_overrides(overrides: &AssumptionOverrides) -> Self {
        DEFAULT_ASSUMPTIONS.with_overrides(overrides)
    }

    /// Every field checked against its domain, unusable ones replaced by the default
    pub fn sanitised(&self) -> Self {
        Self::from_overrides(&AssumptionOverrides::from(*self))
    }
}

impl From<Assumptions> for AssumptionOverrides {
    fn from(a: Assumptions) -> Self {
        Self {
            annual_growth_rate: Some(a.annual_growth_rate),
            contribution_growth_rate: Some(a.contribution_growth_rate),
            inflation_rate: Some(a.inflation_rate),
            loan_interest_rate: Some(a.loan_interest_rate),
            tax_rate: Some(a.tax_rate),
            income_generation_rate: Some(a.income_generation_rate),
            above_inflation_growth_rate: Some(a.above_inflation_growth_rate),
        }
    }
}
