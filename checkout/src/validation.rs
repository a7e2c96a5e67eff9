//! Booking validation rules.
//!
//! Three checks gate the move from editing to reviewing, evaluated in order:
//!
//! 1. Field constraints: required fields, email shape, parsable dates that
//!    are not in the past. Every failing field is reported at once.
//! 2. Guest count: at least one adult.
//! 3. Date order: check-out strictly after check-in.
//!
//! The first failing category stops evaluation.

use crate::types::{FormField, ReservationDraft, StayDetails, parse_form_date};
use chrono::NaiveDate;
use thiserror::Error;

/// A form field that failed its constraint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldIssue {
    /// Offending field
    pub field: FormField,
    /// Feedback shown next to the field
    pub message: &'static str,
}

/// Why a draft cannot be reviewed
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more fields are missing or malformed
    #[error("Please fill in all required fields.")]
    FieldConstraints(Vec<FieldIssue>),

    /// Fewer than one adult
    #[error("At least one adult is required to book a room.")]
    InvalidGuestCount,

    /// Check-out is not strictly after check-in
    #[error("Check-out date must be after check-in date.")]
    InvalidDateRange,
}

impl ValidationError {
    /// Field-level issues carried by this error, if any
    #[must_use]
    pub fn field_issues(&self) -> &[FieldIssue] {
        match self {
            Self::FieldConstraints(issues) => issues,
            Self::InvalidGuestCount | Self::InvalidDateRange => &[],
        }
    }

    /// Feedback for one field, if it failed
    #[must_use]
    pub fn message_for(&self, field: FormField) -> Option<&'static str> {
        self.field_issues()
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.message)
    }
}

/// Outcome of a validation attempt, shaped for display
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the draft passed
    pub valid: bool,
    /// Message to show when it did not
    pub message: Option<String>,
}

impl ValidationResult {
    /// A passing result
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    /// A failing result with a message
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

impl<T> From<&Result<T, ValidationError>> for ValidationResult {
    fn from(result: &Result<T, ValidationError>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(error) => Self::invalid(error.to_string()),
        }
    }
}

/// Reads a guest count the way a number input does
///
/// Leading whitespace and an optional sign are accepted, then as many
/// digits as follow; anything else reads as zero. Runs too long for an
/// `i64` saturate.
#[must_use]
pub fn coerce_count(input: &str) -> i64 {
    let input = input.trim_start();
    let (negative, rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    let magnitude = rest
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0_i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
        });

    if negative { -magnitude } else { magnitude }
}

/// True iff there is at least one adult and at least one guest in total
#[must_use]
pub fn is_guest_count_valid(adults: &str, children: &str) -> bool {
    let adults = coerce_count(adults);
    let children = coerce_count(children);
    adults >= 1 && adults.saturating_add(children) >= 1
}

/// Check-out must parse and fall strictly after a parsable check-in
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDateRange`] when either date is missing
/// or unparsable, or when check-out is on or before check-in.
pub fn is_date_range_valid(check_in: &str, check_out: &str) -> Result<(), ValidationError> {
    match (parse_form_date(check_in), parse_form_date(check_out)) {
        (Some(check_in), Some(check_out)) if check_out > check_in => Ok(()),
        _ => Err(ValidationError::InvalidDateRange),
    }
}

/// Loose email shape check: one `@`, non-empty local part, dotted domain
#[must_use]
pub fn is_well_formed_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

const TOO_MANY_GUESTS: &str = "Please enter a realistic number of guests.";

/// Collects every field-level issue in the draft
///
/// Dates before `today` fail like an out-of-range date picker value.
#[must_use]
pub fn field_issues(draft: &ReservationDraft, today: NaiveDate) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    let mut flag = |field, message| issues.push(FieldIssue { field, message });

    if draft.guest_full_name().trim().is_empty() {
        flag(FormField::GuestFullName, "Please enter your full name.");
    }

    if !is_well_formed_email(draft.guest_email()) {
        flag(FormField::GuestEmail, "Please enter a valid email address.");
    }

    if !draft.check_in().is_some_and(|date| date >= today) {
        flag(FormField::CheckInDate, "Please select a check-in date.");
    }

    if !draft.check_out().is_some_and(|date| date >= today) {
        flag(FormField::CheckOutDate, "Please select a check-out date.");
    }

    let adults = draft.value(FormField::NumOfAdults);
    if adults.trim().is_empty() {
        flag(FormField::NumOfAdults, "At least 1 adult is required.");
    } else if coerce_count(adults) > i64::from(u32::MAX) {
        flag(FormField::NumOfAdults, TOO_MANY_GUESTS);
    }

    let children = coerce_count(draft.value(FormField::NumOfChildren));
    if children < 0 {
        flag(FormField::NumOfChildren, "Number of children cannot be negative.");
    } else if u32::try_from(children).is_err() {
        flag(FormField::NumOfChildren, TOO_MANY_GUESTS);
    }

    issues
}

/// Gate for moving from editing to reviewing
///
/// On success returns the typed stay details that a confirmation would
/// submit.
///
/// # Errors
///
/// Returns the first failing category: [`ValidationError::FieldConstraints`]
/// with every offending field, then [`ValidationError::InvalidGuestCount`],
/// then [`ValidationError::InvalidDateRange`].
pub fn can_advance_to_review(
    draft: &ReservationDraft,
    today: NaiveDate,
) -> Result<StayDetails, ValidationError> {
    let issues = field_issues(draft, today);
    if !issues.is_empty() {
        return Err(ValidationError::FieldConstraints(issues));
    }

    let adults = draft.value(FormField::NumOfAdults);
    let children = draft.value(FormField::NumOfChildren);
    if !is_guest_count_valid(adults, children) {
        return Err(ValidationError::InvalidGuestCount);
    }

    is_date_range_valid(
        draft.value(FormField::CheckInDate),
        draft.value(FormField::CheckOutDate),
    )?;

    let (Some(check_in_date), Some(check_out_date)) = (draft.check_in(), draft.check_out()) else {
        return Err(ValidationError::InvalidDateRange);
    };

    let count = |field: FormField, raw: &str| {
        u32::try_from(coerce_count(raw)).map_err(|_| {
            ValidationError::FieldConstraints(vec![FieldIssue {
                field,
                message: TOO_MANY_GUESTS,
            }])
        })
    };
    let num_of_adults = count(FormField::NumOfAdults, adults)?;
    let num_of_children = count(FormField::NumOfChildren, children)?;

    Ok(StayDetails {
        guest_full_name: draft.guest_full_name().trim().to_string(),
        guest_email: draft.guest_email().to_string(),
        check_in_date,
        check_out_date,
        num_of_adults,
        num_of_children,
    })
}
