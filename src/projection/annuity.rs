//! Cashflow and annuity arithmetic shared by the item projectors
//!
//! All helpers degrade to zero on missing or non-finite input rather than
//! returning an error.

use crate::assumptions::Assumptions;
use crate::balance::{CashFlow, Frequency, NetGross};
use serde::{Deserialize, Serialize};

/// Annual equivalent of a periodic cashflow (0 for unknown frequency)
pub fn annualise_cashflow(cf: Option<&CashFlow>) -> f64 {
    let Some(cf) = cf else { return 0.0 };
    let amount = match cf.periodic_amount {
        Some(a) if a.is_finite() && a != 0.0 => a,
        _ => return 0.0,
    };
    match cf.frequency.payments_per_year() {
        Some(n) => amount * n as f64,
        None => 0.0,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `amount * (1 + rate)^years`, 0 for missing or non-positive amounts
///
/// A non-finite result (NaN rate, overflow) also reads as 0.
pub fn compound(amount: Option<f64>, rate: f64, years: f64) -> f64 {
    match amount {
        Some(a) if a.is_finite() && a > 0.0 => finite_or_zero(a * (1.0 + rate).powf(years)),
        _ => 0.0,
    }
}

/// Grow an annual amount at `rate` for `years`, 0 when the result is not finite
pub fn grow_cashflow(annual_amount: f64, rate: f64, years: f64) -> f64 {
    if !annual_amount.is_finite() {
        return 0.0;
    }
    finite_or_zero(annual_amount * (1.0 + rate).powf(years))
}

/// Future value of regular contributions
///
/// The current annual contribution is escalated to its year-N nominal value
/// first and the level-annuity accumulation factor is applied to that figure.
/// Not the closed-form growing annuity.
pub fn future_value_of_contributions(cf: Option<&CashFlow>, assumptions: &Assumptions, years: f64) -> f64 {
    let annual_now = annualise_cashflow(cf);
    if annual_now == 0.0 {
        return 0.0;
    }
    let escalated = annual_now * (1.0 + assumptions.contribution_growth_rate).powf(years);
    let r = assumptions.annual_growth_rate;
    let fv = if r == 0.0 {
        escalated * years
    } else {
        escalated * (((1.0 + r).powf(years) - 1.0) / r)
    };
    finite_or_zero(fv)
}

/// Apply tax to a gross annual amount according to how the cashflow was quoted
pub fn net_after_tax(annual_gross: f64, cf: Option<&CashFlow>, tax_rate: f64) -> f64 {
    match cf.map(|c| c.net_gross) {
        None => 0.0,
        Some(NetGross::Gross) => annual_gross * (1.0 - tax_rate),
        Some(NetGross::Net) | Some(NetGross::Unknown) => annual_gross,
    }
}

/// Repayment periods per year, monthly when absent or unknown
pub fn periods_per_year(freq: Option<Frequency>) -> u32 {
    freq.and_then(|f| f.payments_per_year()).unwrap_or(12)
}

/// Outcome of simulating a debt forward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtProjection {
    pub future_balance: f64,
    pub periods_applied: u32,
    pub paid_off_early: bool,
}

impl DebtProjection {
    const CLEARED: DebtProjection = DebtProjection {
        future_balance: 0.0,
        periods_applied: 0,
        paid_off_early: false,
    };
}

/// Simulate a debt period by period: accrue interest, then take the repayment
///
/// Stops as soon as the balance reaches zero. `periods_applied` is the loop
/// index at which the debt cleared, or the full period count otherwise.
pub fn future_debt_with_repayments(
    balance_now: Option<f64>,
    repayment: Option<&CashFlow>,
    annual_rate: f64,
    years: f64,
) -> DebtProjection {
    let mut balance = match balance_now {
        Some(b) if b.is_finite() && b > 0.0 => b,
        _ => return DebtProjection::CLEARED,
    };

    let n = periods_per_year(Some(repayment.map(|r| r.frequency).unwrap_or(Frequency::Monthly)));
    let periodic_rate = if annual_rate.is_finite() { annual_rate / n as f64 } else { 0.0 };
    let payment = repayment
        .and_then(|r| r.periodic_amount)
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
        .max(0.0);
    let total_periods = if years.is_finite() {
        (years * n as f64).round().max(0.0) as u32
    } else {
        0
    };

    for period in 0..total_periods {
        balance *= 1.0 + periodic_rate;
        if payment > 0.0 {
            balance -= payment;
            if balance <= 0.0 {
                return DebtProjection {
                    future_balance: 0.0,
                    periods_applied: period,
                    paid_off_early: true,
                };
            }
        }
    }

    DebtProjection {
        future_balance: balance,
        periods_applied: total_periods,
        paid_off_early: false,
    }
}
