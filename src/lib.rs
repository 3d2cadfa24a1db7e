//! Planning Engine - retirement projections and inheritance tax for personal balance sheets
//!
//! This library provides:
//! - Per-item forward projection of pots, property, debts and pension income
//! - Display rows and totals at a retirement horizon, in nominal and today's money
//! - Estate aggregation and UK inheritance tax estimation
//! - JSON client plan loading and a multi-scenario runner

pub mod assumptions;
pub mod balance;
pub mod error;
pub mod estate;
pub mod horizon;
pub mod projection;
pub mod scenario;

// Re-export commonly used types
pub use assumptions::{AssumptionOverrides, Assumptions, DEFAULT_ASSUMPTIONS};
pub use balance::{BalanceSheet, BalanceSheetItem, CashFlow, ClientPlan, ItemDetails, ItemRef};
pub use error::{PlanningError, Result};
pub use estate::{calculate_iht, EstateInputs, EstateOutputs};
pub use projection::{ItemOverrides, PlanningResult, ProjectionConfig, ProjectionEngine, ProjectionRow, Totals};
pub use scenario::ScenarioRunner;
