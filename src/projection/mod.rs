//! Projection engine for balance sheet items

mod annuity;
mod engine;
mod projector;
mod rows;

pub use annuity::{
    annualise_cashflow, compound, future_debt_with_repayments, future_value_of_contributions,
    grow_cashflow, net_after_tax, periods_per_year, DebtProjection,
};
pub use engine::{
    compute_totals, PlanningResult, ProjectionConfig, ProjectionEngine, DEFAULT_INFLATION_PCT,
    DEFAULT_WITHDRAWAL_PCT,
};
pub use projector::{ForwardValue, ItemProjector, ProjectionDebug};
pub use rows::{CapitalRow, DisposalMode, ItemOverrides, ProjectionRow, Totals};
