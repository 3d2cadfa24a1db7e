//! Inheritance tax on the estate at death
//!
//! A straight-line approximation: taxable estate plus recent gifts, less the
//! nil-rate band and the reliefs, taxed at 40% (36% with enough charitable
//! giving). Figures are kept at full precision except the tax itself, which is
//! rounded to whole pounds.

use serde::{Deserialize, Serialize};

/// Standard IHT rate
pub const IHT_RATE: f64 = 0.40;

/// Reduced rate when enough of the estate goes to charity
pub const REDUCED_IHT_RATE: f64 = 0.36;

/// Share of the chargeable estate that must go to charity for the reduced rate
pub const CHARITY_THRESHOLD: f64 = 0.10;

/// Estate figures supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstateInputs {
    pub estate_net_worth: f64,
    pub net_change_on_death: f64,
    pub trust_assets_total: f64,
    pub gifts_prev_seven_years: f64,
    /// Informational; `nil_rate_band` is expected to be scaled already
    pub lifetime_allowance_count: u32,
    pub apr_bpr_total: f64,
    pub exempt_gifts_annual: f64,
    pub gifts_to_charity_on_death: f64,
    pub residence_nrb_applying: f64,
    pub nil_rate_band: f64,
}

/// Result of the IHT calculation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EstateOutputs {
    pub taxable_estate: f64,
    pub taxable_estate_including_gifts: f64,
    pub estate_subject_to_iht: f64,
    pub iht_rate: f64,
    pub iht_payable: f64,
    pub net_estate_after_tax: f64,
    pub beneficiaries_including_prev_gifts: f64,
    pub value_to_beneficiaries_on_death: f64,
    pub value_to_charity_on_death: f64,
    pub effective_iht_rate: f64,
    /// Reference figure only
    pub baseline_amount: f64,
}

impl EstateOutputs {
    /// True when the charitable giving earned the reduced rate
    pub fn reduced_rate_applies(&self) -> bool {
        self.iht_rate == REDUCED_IHT_RATE
    }
}

fn num(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Compute the IHT liability and what passes to beneficiaries
pub fn calculate_iht(inputs: &EstateInputs) -> EstateOutputs {
    let trust = num(inputs.trust_assets_total);
    let gifts = num(inputs.gifts_prev_seven_years);
    let apr_bpr = num(inputs.apr_bpr_total);
    let exempt = num(inputs.exempt_gifts_annual);
    let nil_rate_band = num(inputs.nil_rate_band);
    let charity_deduction = num(inputs.gifts_to_charity_on_death);

    let taxable_estate = num(inputs.estate_net_worth) + num(inputs.net_change_on_death) - trust;
    let taxable_estate_including_gifts = taxable_estate + gifts;

    let estate_subject_to_iht = (taxable_estate_including_gifts
        - nil_rate_band
        - charity_deduction
        - apr_bpr
        - exempt
        - num(inputs.residence_nrb_applying))
    .max(0.0);

    let charity = charity_deduction.max(0.0);
    let iht_rate = if estate_subject_to_iht > 0.0 && charity >= CHARITY_THRESHOLD * estate_subject_to_iht {
        REDUCED_IHT_RATE
    } else {
        IHT_RATE
    };

    let iht_payable = (estate_subject_to_iht * iht_rate).round().max(0.0);
    let net_estate_after_tax = (estate_subject_to_iht - iht_payable).max(0.0);

    // Trust and relief assets passed outside the taxed estate
    let beneficiaries_including_prev_gifts = (net_estate_after_tax + trust + apr_bpr).max(0.0);
    let value_to_beneficiaries_on_death = (beneficiaries_including_prev_gifts - gifts.max(0.0)).max(0.0);

    let denominator = iht_payable + value_to_beneficiaries_on_death + charity;
    let effective_iht_rate = if denominator > 0.0 { iht_payable / denominator } else { 0.0 };

    let baseline_amount = taxable_estate_including_gifts + nil_rate_band + exempt;

    EstateOutputs {
        taxable_estate,
        taxable_estate_including_gifts,
        estate_subject_to_iht,
        iht_rate,
        iht_payable,
        net_estate_after_tax,
        beneficiaries_including_prev_gifts,
        value_to_beneficiaries_on_death,
        value_to_charity_on_death: charity,
        effective_iht_rate,
        baseline_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn millionaire() -> EstateInputs {
        EstateInputs {
            estate_net_worth: 1_000_000.0,
            nil_rate_band: 325_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_rate() {
        let out = calculate_iht(&millionaire());
        assert_eq!(out.taxable_estate, 1_000_000.0);
        assert_eq!(out.estate_subject_to_iht, 675_000.0);
        assert_eq!(out.iht_rate, 0.40);
        assert_eq!(out.iht_payable, 270_000.0);
        assert_eq!(out.net_estate_after_tax, 405_000.0);
        assert_eq!(out.value_to_beneficiaries_on_death, 405_000.0);
        assert_abs_diff_eq!(out.effective_iht_rate, 270_000.0 / 675_000.0, epsilon = 1e-12);
        assert_eq!(out.baseline_amount, 1_325_000.0);
        assert!(!out.reduced_rate_applies());
    }

    #[test]
    fn test_charity_boundary_gets_reduced_rate() {
        // Charity gift is exactly 10% of the chargeable 675,000
        let inputs = EstateInputs {
            estate_net_worth: 1_067_500.0,
            gifts_to_charity_on_death: 67_500.0,
            ..millionaire()
        };
        let out = calculate_iht(&inputs);
        assert_eq!(out.estate_subject_to_iht, 675_000.0);
        assert!(out.reduced_rate_applies());
        assert_eq!(out.iht_payable, 243_000.0);
        assert_eq!(out.value_to_charity_on_death, 67_500.0);
    }

    #[test]
    fn test_charity_just_below_threshold() {
        let inputs = EstateInputs {
            estate_net_worth: 1_067_499.0,
            gifts_to_charity_on_death: 67_499.0,
            ..millionaire()
        };
        let out = calculate_iht(&inputs);
        assert_eq!(out.estate_subject_to_iht, 675_000.0);
        assert_eq!(out.iht_rate, IHT_RATE);
    }

    #[test]
    fn test_estate_under_nil_rate_band() {
        let inputs = EstateInputs {
            estate_net_worth: 200_000.0,
            nil_rate_band: 325_000.0,
            ..Default::default()
        };
        let out = calculate_iht(&inputs);
        assert_eq!(out.estate_subject_to_iht, 0.0);
        assert_eq!(out.iht_payable, 0.0);
        assert_eq!(out.iht_rate, IHT_RATE);
        assert_eq!(out.effective_iht_rate, 0.0);
    }

    #[test]
    fn test_trust_and_reliefs_added_back() {
        let inputs = EstateInputs {
            estate_net_worth: 1_000_000.0,
            trust_assets_total: 100_000.0,
            apr_bpr_total: 50_000.0,
            gifts_prev_seven_years: 20_000.0,
            nil_rate_band: 325_000.0,
            ..Default::default()
        };
        let out = calculate_iht(&inputs);
        assert_eq!(out.taxable_estate, 900_000.0);
        assert_eq!(out.taxable_estate_including_gifts, 920_000.0);
        assert_eq!(out.estate_subject_to_iht, 545_000.0);
        assert_eq!(out.iht_payable, 218_000.0);
        assert_eq!(out.net_estate_after_tax, 327_000.0);
        assert_eq!(out.beneficiaries_including_prev_gifts, 477_000.0);
        assert_eq!(out.value_to_beneficiaries_on_death, 457_000.0);
    }

    #[test]
    fn test_negative_trust_and_relief_floor_beneficiaries() {
        let inputs = EstateInputs {
            estate_net_worth: 100_000.0,
            trust_assets_total: -200_000.0,
            apr_bpr_total: -500_000.0,
            ..Default::default()
        };
        let out = calculate_iht(&inputs);
        assert_eq!(out.beneficiaries_including_prev_gifts, 0.0);
        assert_eq!(out.value_to_beneficiaries_on_death, 0.0);
    }

    #[test]
    fn test_empty_estate_has_no_division_by_zero() {
        let out = calculate_iht(&EstateInputs::default());
        assert_eq!(out, EstateOutputs {
            iht_rate: IHT_RATE,
            ..Default::default()
        });
    }

    #[test]
    fn test_non_finite_inputs_read_as_zero() {
        let inputs = EstateInputs {
            net_change_on_death: f64::NAN,
            gifts_to_charity_on_death: f64::INFINITY,
            ..millionaire()
        };
        assert_eq!(calculate_iht(&inputs), calculate_iht(&millionaire()));
    }
}
