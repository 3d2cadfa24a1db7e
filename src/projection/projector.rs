//! Forward projection of a single balance sheet item

use super::annuity::{
    annualise_cashflow, compound, future_debt_with_repayments, future_value_of_contributions,
    grow_cashflow,
};
use crate::assumptions::{AssumptionOverrides, Assumptions};
use crate::balance::{BalanceSheetItem, CashFlow, ItemDetails, LoanDetails, NetGross, PropertyKind};
use log::debug;
use serde::{Deserialize, Serialize};

/// Intermediate figures behind a projection, per item shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionDebug {
    Pot {
        pot_from_start: f64,
        pot_from_contributions: f64,
    },
    Property {
        property_future: f64,
        debt_future: f64,
        equity: f64,
        rent_yield: f64,
        rent_future_net: f64,
        sell_income_net: f64,
    },
    Debt {
        future_debt: f64,
    },
    PensionIncome {
        annual_base: f64,
        real_rate: f64,
    },
    Note(String),
}

/// Value of an item at the projection horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardValue {
    pub item_type: String,
    pub future_capital_value: f64,
    pub retirement_income_contribution: f64,
    pub debug: ProjectionDebug,
}

impl ForwardValue {
    /// Future rent net of tax, in nominal terms (0 unless buy-to-let)
    pub fn rent_future_net(&self) -> f64 {
        match self.debug {
            ProjectionDebug::Property { rent_future_net, .. } => rent_future_net,
            _ => 0.0,
        }
    }
}

/// Projects one item using its merged assumption set
#[derive(Debug, Clone)]
pub struct ItemProjector<'a> {
    item: &'a BalanceSheetItem,
    assumptions: Assumptions,
}

impl<'a> ItemProjector<'a> {
    /// Create a projector, merging `overrides` over the default assumptions
    pub fn new(item: &'a BalanceSheetItem, overrides: &AssumptionOverrides) -> Self {
        Self {
            item,
            assumptions: Assumptions::from_overrides(overrides),
        }
    }

    /// Create a projector with a fully specified assumption set
    ///
    /// Non-finite or out-of-domain fields fall back to the defaults.
    pub fn with_assumptions(item: &'a BalanceSheetItem, assumptions: Assumptions) -> Self {
        Self {
            item,
            assumptions: assumptions.sanitised(),
        }
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Project the item `years` into the future
    pub fn project(&self, years: f64) -> ForwardValue {
        let item_type = self.item.type_name();
        let a = &self.assumptions;

        let result = match &self.item.details {
            ItemDetails::Pot {
                kind,
                investment_value,
                contribution,
                tax_sheltered,
                ..
            } => {
                let sheltered = tax_sheltered.unwrap_or_else(|| kind.is_tax_sheltered());
                self.project_pot(item_type, *investment_value, contribution.as_ref(), years, sheltered)
            }
            ItemDetails::Property {
                kind,
                value,
                loan,
                rental_income,
            } => self.project_property(item_type, *kind, *value, loan.as_ref(), rental_income.as_ref(), years),
            ItemDetails::Debt { balance, repayment, .. } => {
                let future_debt =
                    future_debt_with_repayments(*balance, repayment.as_ref(), a.loan_interest_rate, years)
                        .future_balance;
                ForwardValue {
                    item_type,
                    future_capital_value: -future_debt,
                    retirement_income_contribution: 0.0,
                    debug: ProjectionDebug::Debt { future_debt },
                }
            }
            ItemDetails::PensionIncome { pension, .. } => {
                // Quoted in today's money, so only real growth applies
                let annual_base = annualise_cashflow(pension.as_ref());
                let real_rate = a.above_inflation_growth_rate;
                ForwardValue {
                    item_type,
                    future_capital_value: 0.0,
                    retirement_income_contribution: grow_cashflow(annual_base, real_rate, years),
                    debug: ProjectionDebug::PensionIncome { annual_base, real_rate },
                }
            }
            ItemDetails::Income { .. } => ForwardValue {
                item_type,
                future_capital_value: 0.0,
                retirement_income_contribution: 0.0,
                debug: ProjectionDebug::Note("treated as non-retirement asset".into()),
            },
            ItemDetails::Unrecognised { .. } => ForwardValue {
                item_type,
                future_capital_value: 0.0,
                retirement_income_contribution: 0.0,
                debug: ProjectionDebug::Note("unhandled item type".into()),
            },
        };

        debug!(
            "Projected {} ({}) over {} years: capital={:.2} income={:.2}",
            self.item.item_ref, result.item_type, years, result.future_capital_value,
            result.retirement_income_contribution
        );
        result
    }

    fn project_pot(
        &self,
        item_type: String,
        starting_value: Option<f64>,
        contribution: Option<&CashFlow>,
        years: f64,
        tax_sheltered: bool,
    ) -> ForwardValue {
        let a = &self.assumptions;
        let pot_from_start = compound(starting_value, a.annual_growth_rate, years);
        let pot_from_contributions = future_value_of_contributions(contribution, a, years);
        let future_pot = pot_from_start + pot_from_contributions;
        let gross_income = future_pot * a.income_generation_rate;
        let income = if tax_sheltered {
            gross_income
        } else {
            gross_income * (1.0 - a.tax_rate)
        };

        ForwardValue {
            item_type,
            future_capital_value: future_pot,
            retirement_income_contribution: income,
            debug: ProjectionDebug::Pot {
                pot_from_start,
                pot_from_contributions,
            },
        }
    }

    fn project_property(
        &self,
        item_type: String,
        kind: PropertyKind,
        value: Option<f64>,
        loan: Option<&LoanDetails>,
        rental_income: Option<&CashFlow>,
        years: f64,
    ) -> ForwardValue {
        let a = &self.assumptions;
        let property_now = finite_or_zero(value).max(0.0);
        let property_future = compound(Some(property_now), a.annual_growth_rate, years);
        let debt_future = future_debt_with_repayments(
            loan.and_then(|l| l.balance),
            loan.and_then(|l| l.repayment.as_ref()),
            a.loan_interest_rate,
            years,
        )
        .future_balance;
        let equity = property_future - debt_future;

        // Rent scales with the property value at today's yield
        let mut rent_yield = 0.0;
        let mut rent_future_net = 0.0;
        if kind == PropertyKind::BuyToLet {
            if let Some(rent) = rental_income {
                let annual_rent_now = annualise_cashflow(Some(rent));
                if property_now > 0.0 && annual_rent_now > 0.0 {
                    rent_yield = annual_rent_now / property_now;
                    let rent_future = property_future * rent_yield;
                    rent_future_net = match rent.net_gross {
                        NetGross::Net => rent_future,
                        NetGross::Gross | NetGross::Unknown => rent_future * (1.0 - a.tax_rate),
                    };
                }
            }
        }

        let sell_income_net = equity * a.income_generation_rate * (1.0 - a.tax_rate);
        let income = if kind == PropertyKind::BuyToLet {
            rent_future_net
        } else {
            sell_income_net
        };

        ForwardValue {
            item_type,
            future_capital_value: equity,
            retirement_income_contribution: income,
            debug: ProjectionDebug::Property {
                property_future,
                debt_future,
                equity,
                rent_yield,
                rent_future_net,
                sell_income_net,
            },
        }
    }

    /// Capital value of the item today
    pub fn current_value(&self) -> f64 {
        match &self.item.details {
            ItemDetails::Pot { investment_value, .. } => finite_or_zero(*investment_value),
            ItemDetails::Property { value, loan, .. } => {
                finite_or_zero(*value) - finite_or_zero(loan.and_then(|l| l.balance))
            }
            ItemDetails::Debt { balance, .. } => -finite_or_zero(*balance),
            ItemDetails::PensionIncome { .. } | ItemDetails::Income { .. } | ItemDetails::Unrecognised { .. } => {
                0.0
            }
        }
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
