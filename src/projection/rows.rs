//! Projection output structures

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::assumptions::AssumptionOverrides;

/// How a property contributes to retirement income
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalMode {
    /// Keep the property and live on the rent
    Rent,
    /// Sell and draw on the proceeds
    Sell,
    /// Contributes no income
    None,
}

/// Capital figures shared by asset, loan and property rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalRow {
    pub key: String,
    pub item_type: String,
    pub description: Option<String>,
    pub current: f64,
    pub future: f64,
    /// Future value deflated to today's money
    pub future_today: f64,
    /// Annual income equivalent in today's money
    pub as_income: f64,
}

/// A row of projection output for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ProjectionRow {
    Asset {
        #[serde(flatten)]
        capital: CapitalRow,
        has_contribution: bool,
    },
    Property {
        #[serde(flatten)]
        capital: CapitalRow,
        mode: DisposalMode,
        rent_today: f64,
        as_income_sell: f64,
    },
    Loan {
        #[serde(flatten)]
        capital: CapitalRow,
    },
    Income {
        key: String,
        item_type: String,
        description: Option<String>,
        /// Retirement income, already in today's terms
        income: f64,
    },
}

impl ProjectionRow {
    pub fn key(&self) -> &str {
        match self {
            ProjectionRow::Asset { capital, .. }
            | ProjectionRow::Property { capital, .. }
            | ProjectionRow::Loan { capital } => &capital.key,
            ProjectionRow::Income { key, .. } => key,
        }
    }

    pub fn item_type(&self) -> &str {
        match self {
            ProjectionRow::Asset { capital, .. }
            | ProjectionRow::Property { capital, .. }
            | ProjectionRow::Loan { capital } => &capital.item_type,
            ProjectionRow::Income { item_type, .. } => item_type,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            ProjectionRow::Asset { .. } => "asset",
            ProjectionRow::Property { .. } => "property",
            ProjectionRow::Loan { .. } => "loan",
            ProjectionRow::Income { .. } => "income",
        }
    }

    /// Capital figures, absent for income rows
    pub fn capital(&self) -> Option<&CapitalRow> {
        match self {
            ProjectionRow::Asset { capital, .. }
            | ProjectionRow::Property { capital, .. }
            | ProjectionRow::Loan { capital } => Some(capital),
            ProjectionRow::Income { .. } => None,
        }
    }

    /// Income figure the row contributes before any inclusion toggle
    pub fn income(&self) -> f64 {
        match self {
            ProjectionRow::Income { income, .. } => *income,
            _ => self.capital().map(|c| c.as_income).unwrap_or(0.0),
        }
    }
}

/// Aggregate figures across a set of rows
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub current_sum: f64,
    pub future_sum: f64,
    pub today_sum: f64,
    pub income_sum: f64,
    /// Annual retirement income the client is aiming for
    pub target_income_annual: f64,
}

impl Totals {
    /// Income still needed to reach the target (0 when met or no target)
    pub fn shortfall(&self) -> f64 {
        if self.target_income_annual > 0.0 {
            (self.target_income_annual - self.income_sum).max(0.0)
        } else {
            0.0
        }
    }

    /// False when income is negative or below a positive target
    pub fn meets_target(&self) -> bool {
        self.income_sum >= 0.0 && self.shortfall() == 0.0
    }
}

/// Caller-owned per-item settings, keyed by `ItemRef::stable_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemOverrides {
    pub assumptions: BTreeMap<String, AssumptionOverrides>,
    pub property_modes: BTreeMap<String, DisposalMode>,
    /// Whether an asset or loan row's income counts towards the total
    pub income_included: BTreeMap<String, bool>,
}

impl ItemOverrides {
    pub fn assumptions_for(&self, key: &str) -> AssumptionOverrides {
        self.assumptions.get(key).copied().unwrap_or_default()
    }

    /// Drop entries whose key no longer matches any row
    pub fn prune(&mut self, rows: &[ProjectionRow]) -> usize {
        let keys: HashSet<&str> = rows.iter().map(|r| r.key()).collect();
        let before = self.len();
        self.assumptions.retain(|k, _| keys.contains(k.as_str()));
        self.property_modes.retain(|k, _| keys.contains(k.as_str()));
        self.income_included.retain(|k, _| keys.contains(k.as_str()));
        before - self.len()
    }

    fn len(&self) -> usize {
        self.assumptions.len() + self.property_modes.len() + self.income_included.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan_row(key: &str) -> ProjectionRow {
        ProjectionRow::Loan {
            capital: CapitalRow {
                key: key.into(),
                item_type: "credit_card".into(),
                description: None,
                current: -100.0,
                future: -50.0,
                future_today: -40.0,
                as_income: -2.0,
            },
        }
    }

    #[test]
    fn test_row_serialises_with_category_tag() {
        let json = serde_json::to_value(loan_row("l0")).unwrap();
        assert_eq!(json["category"], "loan");
        assert_eq!(json["key"], "l0");
        assert_eq!(json["future_today"], -40.0);
    }

    #[test]
    fn test_shortfall() {
        let totals = Totals {
            income_sum: 20_000.0,
            target_income_annual: 30_000.0,
            ..Default::default()
        };
        assert_eq!(totals.shortfall(), 10_000.0);
        assert!(!totals.meets_target());

        let no_target = Totals {
            income_sum: 1.0,
            ..Default::default()
        };
        assert!(no_target.meets_target());

        let negative = Totals {
            income_sum: -5.0,
            ..Default::default()
        };
        assert!(!negative.meets_target());
    }

    #[test]
    fn test_prune_drops_stale_keys() {
        let mut overrides = ItemOverrides::default();
        overrides.income_included.insert("l0".into(), false);
        overrides.income_included.insert("gone".into(), true);
        overrides.property_modes.insert("p9".into(), DisposalMode::Sell);

        let removed = overrides.prune(&[loan_row("l0")]);
        assert_eq!(removed, 2);
        assert_eq!(overrides.income_included.get("l0"), Some(&false));
        assert!(overrides.property_modes.is_empty());
    }
}
