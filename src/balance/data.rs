//! Balance sheet data structures matching the personal balance sheet format

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment frequency of a cashflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    SixMonthly,
    Annually,
    /// Missing or unrecognised frequency
    #[default]
    #[serde(other)]
    Unknown,
}

impl Frequency {
    /// Number of payments per year, `None` when the frequency is unknown
    pub fn payments_per_year(&self) -> Option<u32> {
        match self {
            Frequency::Weekly => Some(52),
            Frequency::Monthly => Some(12),
            Frequency::Quarterly => Some(4),
            Frequency::SixMonthly => Some(2),
            Frequency::Annually => Some(1),
            Frequency::Unknown => None,
        }
    }
}

/// Whether a quoted amount is before or after tax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetGross {
    Net,
    Gross,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A periodic payment (income, contribution, repayment, rent)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CashFlow {
    #[serde(default)]
    pub periodic_amount: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frequency: Frequency,
    #[serde(default, deserialize_with = "null_as_default")]
    pub net_gross: NetGross,
}

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CashFlow {
    pub fn new(periodic_amount: f64, frequency: Frequency, net_gross: NetGross) -> Self {
        Self {
            periodic_amount: Some(periodic_amount),
            frequency,
            net_gross,
        }
    }

    /// Monthly amount with unknown tax treatment
    pub fn monthly(periodic_amount: f64) -> Self {
        Self::new(periodic_amount, Frequency::Monthly, NetGross::Unknown)
    }

    /// True when a non-zero amount is present
    pub fn has_amount(&self) -> bool {
        matches!(self.periodic_amount, Some(a) if a != 0.0 && a.is_finite())
    }
}

/// Outstanding loan secured on a property
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoanDetails {
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub repayment: Option<CashFlow>,
}

/// Present-day income or expenditure streams (never projected)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeKind {
    SalaryIncome,
    SideHustleIncome,
    SelfEmploymentIncome,
    Expenses,
}

/// Accumulating investment and pension pots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotKind {
    CurrentAccount,
    DepositAccount,
    Gia,
    Isa,
    PremiumBond,
    SavingsAccount,
    UniFeesSavingsPlan,
    Vct,
    Eis,
    #[serde(rename = "IHT_scheme", alias = "iht_scheme")]
    IhtScheme,
    LifeInsurance,
    WholeOfLifePolicy,
    WorkplacePension,
    PersonalPension,
    Sipp,
}

impl PotKind {
    /// Income drawn from the pot is paid gross
    pub fn is_tax_sheltered(&self) -> bool {
        matches!(self, PotKind::Isa)
    }

    /// Holdings that qualify for agricultural/business property relief
    pub fn qualifies_for_apr_bpr(&self) -> bool {
        matches!(self, PotKind::Eis | PotKind::IhtScheme)
    }
}

/// Property and other physical assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    MainResidence,
    HolidayHome,
    BuyToLet,
    OtherValuableItem,
    Collectable,
}

impl PropertyKind {
    /// Sale proceeds drawn as income are left gross for these kinds
    pub fn sells_gross(&self) -> bool {
        matches!(self, PropertyKind::MainResidence | PropertyKind::HolidayHome)
    }
}

/// Unsecured debts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    CreditCard,
    PersonalLoan,
    StudentLoan,
}

/// Pensions quoted as an income in today's money, with no pot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PensionIncomeKind {
    StatePension,
    DefinedBenefitPension,
    AnnuityPension,
}

/// Structural shape of a balance sheet item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ItemDetails {
    Income {
        kind: IncomeKind,
        cashflow: Option<CashFlow>,
    },
    Pot {
        kind: PotKind,
        investment_value: Option<f64>,
        contribution: Option<CashFlow>,
        income: Option<CashFlow>,
        /// Overrides the kind's default tax shelter when present
        tax_sheltered: Option<bool>,
    },
    Property {
        kind: PropertyKind,
        value: Option<f64>,
        loan: Option<LoanDetails>,
        rental_income: Option<CashFlow>,
    },
    Debt {
        kind: DebtKind,
        balance: Option<f64>,
        repayment: Option<CashFlow>,
    },
    PensionIncome {
        kind: PensionIncomeKind,
        pension: Option<CashFlow>,
    },
    /// Item type the loader did not recognise
    Unrecognised { kind: String },
}

/// Projection bucket an item falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Asset,
    IncomeOnly,
    Loan,
    Property,
    /// Items that never produce a projection row
    Unprojected,
}

impl Bucket {
    /// Prefix used for positional fallback keys
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Bucket::Asset => "a",
            Bucket::IncomeOnly => "i",
            Bucket::Loan => "l",
            Bucket::Property => "p",
            Bucket::Unprojected => "n",
        }
    }
}

impl ItemDetails {
    pub fn bucket(&self) -> Bucket {
        match self {
            ItemDetails::Pot { .. } => Bucket::Asset,
            ItemDetails::PensionIncome { .. } => Bucket::IncomeOnly,
            ItemDetails::Debt { .. } => Bucket::Loan,
            ItemDetails::Property { .. } => Bucket::Property,
            ItemDetails::Income { .. } | ItemDetails::Unrecognised { .. } => Bucket::Unprojected,
        }
    }

    /// Item type name in the balance sheet vocabulary
    pub fn type_name(&self) -> String {
        let value = match self {
            ItemDetails::Income { kind, .. } => serde_json::to_value(kind),
            ItemDetails::Pot { kind, .. } => serde_json::to_value(kind),
            ItemDetails::Property { kind, .. } => serde_json::to_value(kind),
            ItemDetails::Debt { kind, .. } => serde_json::to_value(kind),
            ItemDetails::PensionIncome { kind, .. } => serde_json::to_value(kind),
            ItemDetails::Unrecognised { kind } => return kind.clone(),
        };
        match value {
            Ok(serde_json::Value::String(s)) => s,
            _ => String::from("unknown"),
        }
    }
}

/// Stable handle correlating per-item overrides across recomputation
///
/// Assigned once when the item is created or loaded; never derived from the
/// item's current position in the list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemRef {
    pub stable_id: String,
}

impl ItemRef {
    pub fn new(stable_id: impl Into<String>) -> Self {
        Self {
            stable_id: stable_id.into(),
        }
    }

    /// Positional key for items with neither a source id nor a local id
    pub fn fallback(bucket: Bucket, index: usize) -> Self {
        Self::new(format!("{}{}", bucket.key_prefix(), index))
    }

    pub fn as_str(&self) -> &str {
        &self.stable_id
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stable_id)
    }
}

/// One line of a personal balance sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetItem {
    pub item_ref: ItemRef,
    #[serde(default)]
    pub description: Option<String>,
    pub details: ItemDetails,
}

impl BalanceSheetItem {
    pub fn new(item_ref: ItemRef, description: Option<String>, details: ItemDetails) -> Self {
        Self {
            item_ref,
            description,
            details,
        }
    }

    /// Pot holding with a starting value and no contribution
    pub fn pot(id: &str, kind: PotKind, investment_value: f64) -> Self {
        Self::new(
            ItemRef::new(id),
            None,
            ItemDetails::Pot {
                kind,
                investment_value: Some(investment_value),
                contribution: None,
                income: None,
                tax_sheltered: None,
            },
        )
    }

    /// Unsecured debt with an optional repayment
    pub fn debt(id: &str, kind: DebtKind, balance: f64, repayment: Option<CashFlow>) -> Self {
        Self::new(
            ItemRef::new(id),
            None,
            ItemDetails::Debt {
                kind,
                balance: Some(balance),
                repayment,
            },
        )
    }

    /// Property with an optional mortgage and rent
    pub fn property(
        id: &str,
        kind: PropertyKind,
        value: f64,
        loan: Option<LoanDetails>,
        rental_income: Option<CashFlow>,
    ) -> Self {
        Self::new(
            ItemRef::new(id),
            None,
            ItemDetails::Property {
                kind,
                value: Some(value),
                loan,
                rental_income,
            },
        )
    }

    /// Income-only pension paying `pension`
    pub fn pension_income(id: &str, kind: PensionIncomeKind, pension: CashFlow) -> Self {
        Self::new(
            ItemRef::new(id),
            None,
            ItemDetails::PensionIncome {
                kind,
                pension: Some(pension),
            },
        )
    }

    pub fn key(&self) -> &str {
        self.item_ref.as_str()
    }

    pub fn type_name(&self) -> String {
        self.details.type_name()
    }
}

/// The item list of a client's balance sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub items: Vec<BalanceSheetItem>,
}

impl BalanceSheet {
    pub fn new(items: Vec<BalanceSheetItem>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items falling into `bucket`, in sheet order
    pub fn in_bucket(&self, bucket: Bucket) -> impl Iterator<Item = &BalanceSheetItem> {
        self.items.iter().filter(move |it| it.details.bucket() == bucket)
    }
}
