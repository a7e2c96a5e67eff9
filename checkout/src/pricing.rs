//! Stay pricing.
//!
//! The charge is derived from the draft on every read. Missing, malformed,
//! or reversed dates price at zero rather than failing, so the summary can
//! be rendered at any point while the guest types.

use crate::types::{Money, parse_form_date};
use chrono::NaiveDate;

/// Whole nights between two dates; negative when `check_out` comes first
#[must_use]
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

/// Charge for a stay between two known dates
#[must_use]
pub fn charge_for_stay(check_in: NaiveDate, check_out: NaiveDate, nightly_rate: Money) -> Money {
    match u64::try_from(nights_between(check_in, check_out)) {
        Ok(nights) if nights > 0 => nightly_rate.times(nights),
        _ => Money::ZERO,
    }
}

/// Charge for a stay given the raw form values
///
/// Returns zero if either date is blank or unparsable.
#[must_use]
pub fn compute_charge(check_in: &str, check_out: &str, nightly_rate: Money) -> Money {
    match (parse_form_date(check_in), parse_form_date(check_out)) {
        (Some(check_in), Some(check_out)) => charge_for_stay(check_in, check_out, nightly_rate),
        _ => Money::ZERO,
    }
}
