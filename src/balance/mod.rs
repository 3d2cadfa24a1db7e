//! Personal balance sheet data structures and client file loading

mod data;
pub mod loader;

pub use data::{
    BalanceSheet, BalanceSheetItem, Bucket, CashFlow, DebtKind, Frequency, IncomeKind, ItemDetails,
    ItemRef, LoanDetails, NetGross, PensionIncomeKind, PotKind, PropertyKind,
};
pub use loader::{
    balance_sheet_from_json, build_balance_sheet, load_client_plan, load_client_plan_from_reader,
    ClientPlan, RawItem,
};
