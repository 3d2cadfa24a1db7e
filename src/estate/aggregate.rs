//! Estate figures derived from the balance sheet
//!
//! Collects the holdings that count towards the estate for IHT, honouring the
//! caller's per-item "in trust" and "ignore" flags.

use crate::balance::{BalanceSheet, BalanceSheetItem, ItemDetails};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::iht::EstateInputs;

/// Nil-rate band per lifetime allowance
pub const STANDARD_NIL_RATE_BAND: f64 = 325_000.0;

/// Nil-rate band for a number of lifetime allowances
pub fn nil_rate_band(lifetime_allowances: u32) -> f64 {
    STANDARD_NIL_RATE_BAND * lifetime_allowances as f64
}

/// Per-item estate flags keyed by `ItemRef::stable_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstateToggles {
    /// Holding is written in trust
    pub trust: BTreeMap<String, bool>,
    /// Holding is left out of the estate entirely
    pub ignore: BTreeMap<String, bool>,
}

impl EstateToggles {
    fn flag(map: &BTreeMap<String, bool>, key: &str) -> bool {
        map.get(key).copied().unwrap_or(false)
    }

    pub fn in_trust(&self, key: &str) -> bool {
        Self::flag(&self.trust, key)
    }

    pub fn ignored(&self, key: &str) -> bool {
        Self::flag(&self.ignore, key)
    }
}

/// Balance-sheet derived inputs to the IHT calculation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EstateSummary {
    pub estate_net_worth: f64,
    pub trust_assets_total: f64,
    pub apr_bpr_total: f64,
}

/// Whether the item counts towards the estate
pub fn is_iht_asset(item: &BalanceSheetItem) -> bool {
    matches!(item.details, ItemDetails::Pot { .. } | ItemDetails::Property { .. })
}

/// Value an item contributes to the estate (gross of any secured loan)
pub fn iht_item_value(item: &BalanceSheetItem) -> f64 {
    let value = match &item.details {
        ItemDetails::Pot { investment_value, .. } => *investment_value,
        ItemDetails::Property { value, .. } => *value,
        _ => None,
    };
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Sum the estate holdings of `sheet`
pub fn summarise_estate(sheet: &BalanceSheet, toggles: &EstateToggles) -> EstateSummary {
    let mut summary = EstateSummary::default();

    for item in sheet.items.iter().filter(|it| is_iht_asset(it)) {
        if toggles.ignored(item.key()) {
            continue;
        }
        let value = iht_item_value(item);
        summary.estate_net_worth += value;
        if toggles.in_trust(item.key()) {
            summary.trust_assets_total += value;
        }
        if matches!(&item.details, ItemDetails::Pot { kind, .. } if kind.qualifies_for_apr_bpr()) {
            summary.apr_bpr_total += value;
        }
    }

    summary
}

/// Manually entered figures that complete the estate picture
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstateAdjustments {
    pub net_change_on_death: f64,
    pub gifts_prev_seven_years: f64,
    pub lifetime_allowance_count: u32,
    pub exempt_gifts_annual: f64,
    pub gifts_to_charity_on_death: f64,
    pub residence_nrb_applying: f64,
}

impl EstateInputs {
    /// Combine balance-sheet figures with manual adjustments
    pub fn from_summary(summary: &EstateSummary, adjustments: &EstateAdjustments) -> Self {
        Self {
            estate_net_worth: summary.estate_net_worth,
            net_change_on_death: adjustments.net_change_on_death,
            trust_assets_total: summary.trust_assets_total,
            gifts_prev_seven_years: adjustments.gifts_prev_seven_years,
            lifetime_allowance_count: adjustments.lifetime_allowance_count,
            apr_bpr_total: summary.apr_bpr_total,
            exempt_gifts_annual: adjustments.exempt_gifts_annual,
            gifts_to_charity_on_death: adjustments.gifts_to_charity_on_death,
            residence_nrb_applying: adjustments.residence_nrb_applying,
            nil_rate_band: nil_rate_band(adjustments.lifetime_allowance_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::{CashFlow, DebtKind, PotKind, PropertyKind};
    use crate::estate::calculate_iht;

    fn sheet() -> BalanceSheet {
        BalanceSheet::new(vec![
            BalanceSheetItem::property("home", PropertyKind::MainResidence, 500_000.0, None, None),
            BalanceSheetItem::pot("isa", PotKind::Isa, 100_000.0),
            BalanceSheetItem::pot("life", PotKind::LifeInsurance, 200_000.0),
            BalanceSheetItem::pot("eis", PotKind::Eis, 50_000.0),
            BalanceSheetItem::debt("cc", DebtKind::CreditCard, 3_000.0, Some(CashFlow::monthly(100.0))),
        ])
    }

    #[test]
    fn test_summary_counts_assets_only() {
        let summary = summarise_estate(&sheet(), &EstateToggles::default());
        assert_eq!(summary.estate_net_worth, 850_000.0);
        assert_eq!(summary.trust_assets_total, 0.0);
        assert_eq!(summary.apr_bpr_total, 50_000.0);
    }

    #[test]
    fn test_trust_and_ignore_flags() {
        let mut toggles = EstateToggles::default();
        toggles.trust.insert("life".into(), true);
        toggles.ignore.insert("isa".into(), true);
        toggles.ignore.insert("eis".into(), false);

        let summary = summarise_estate(&sheet(), &toggles);
        assert_eq!(summary.estate_net_worth, 750_000.0);
        assert_eq!(summary.trust_assets_total, 200_000.0);
        assert_eq!(summary.apr_bpr_total, 50_000.0);
    }

    #[test]
    fn test_nil_rate_band_scales_with_allowances() {
        assert_eq!(nil_rate_band(0), 0.0);
        assert_eq!(nil_rate_band(1), 325_000.0);
        assert_eq!(nil_rate_band(2), 650_000.0);
    }

    #[test]
    fn test_inputs_from_summary_feed_calculator() {
        let mut toggles = EstateToggles::default();
        toggles.trust.insert("life".into(), true);
        let summary = summarise_estate(&sheet(), &toggles);
        let adjustments = EstateAdjustments {
            lifetime_allowance_count: 1,
            ..Default::default()
        };
        let inputs = EstateInputs::from_summary(&summary, &adjustments);
        assert_eq!(inputs.nil_rate_band, 325_000.0);

        let out = calculate_iht(&inputs);
        // 850k - 200k trust - 325k band - 50k relief
        assert_eq!(out.estate_subject_to_iht, 275_000.0);
        assert_eq!(out.iht_payable, 110_000.0);
        assert_eq!(out.beneficiaries_including_prev_gifts, 165_000.0 + 200_000.0 + 50_000.0);
    }
}
