//! Retirement horizon and target income

use chrono::{Datelike, NaiveDate};

use crate::balance::CashFlow;
use crate::error::{PlanningError, Result};

/// Age in whole years on `today`
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

/// Whole years until `target_age`, clamped at 0
///
/// `None` when the date of birth lies in the future.
pub fn years_to_retirement(dob: NaiveDate, target_age: u32, today: NaiveDate) -> Option<u32> {
    let age = age_on(dob, today)?;
    Some(target_age.saturating_sub(age))
}

/// Parse an ISO date (`YYYY-MM-DD`, optionally followed by a time)
pub fn parse_dob(dob: &str) -> Result<NaiveDate> {
    let date_part = dob.trim().get(..10).unwrap_or(dob.trim());
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| PlanningError::InvalidDate(dob.to_string()))
}

/// Like [`years_to_retirement`] for optional string inputs
pub fn years_to_retirement_from_iso(dob: Option<&str>, target_age: Option<u32>, today: NaiveDate) -> Option<u32> {
    let dob = parse_dob(dob?).ok()?;
    years_to_retirement(dob, target_age?, today)
}

/// Annual target income; an unknown frequency is read as already annual
pub fn annualise_target(cf: Option<&CashFlow>) -> f64 {
    let Some(cf) = cf else { return 0.0 };
    let amount = cf.periodic_amount.filter(|a| a.is_finite()).unwrap_or(0.0);
    let annual = amount * cf.frequency.payments_per_year().unwrap_or(1) as f64;
    annual.round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::{Frequency, NetGross};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_years_to_retirement() {
        let today = date(2025, 1, 1);
        assert_eq!(years_to_retirement(date(1990, 1, 1), 60, today), Some(25));
        // Birthday not yet reached this year
        assert_eq!(years_to_retirement(date(1990, 6, 15), 60, today), Some(26));
    }

    #[test]
    fn test_past_target_age_clamps_to_zero() {
        assert_eq!(years_to_retirement(date(1950, 3, 1), 60, date(2025, 1, 1)), Some(0));
    }

    #[test]
    fn test_future_dob_has_no_horizon() {
        assert_eq!(years_to_retirement(date(2030, 1, 1), 60, date(2025, 1, 1)), None);
    }

    #[test]
    fn test_iso_variant() {
        let today = date(2025, 1, 1);
        assert_eq!(years_to_retirement_from_iso(Some("1990-01-01"), Some(60), today), Some(25));
        assert_eq!(years_to_retirement_from_iso(Some("1990-01-01T00:00:00Z"), Some(60), today), Some(25));
        assert_eq!(years_to_retirement_from_iso(Some("invalid-date"), Some(60), today), None);
        assert_eq!(years_to_retirement_from_iso(None, Some(60), today), None);
        assert_eq!(years_to_retirement_from_iso(Some("1990-01-01"), None, today), None);
    }

    #[test]
    fn test_annualise_target() {
        let monthly = CashFlow::new(1000.0, Frequency::Monthly, NetGross::Net);
        assert_eq!(annualise_target(Some(&monthly)), 12_000.0);

        let unknown = CashFlow::new(30_000.0, Frequency::Unknown, NetGross::Net);
        assert_eq!(annualise_target(Some(&unknown)), 30_000.0);
        assert_eq!(annualise_target(None), 0.0);
    }
}
