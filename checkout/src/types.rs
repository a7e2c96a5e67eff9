//! Domain types for the reservation checkout.
//!
//! A checkout session reads one [`RoomReference`] from the room service,
//! collects a [`ReservationDraft`] from the guest, and walks the draft
//! through the [`ReservationPhase`] state machine until a booking settles.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Wire format for calendar dates (`YYYY-MM-DD`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a date as typed into a form field
///
/// Blank or malformed input yields `None`; callers decide whether that is
/// an error.
#[must_use]
pub fn parse_form_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

/// Identifier of a bookable room
///
/// The room service may send ids as JSON numbers or strings; both are kept
/// as text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a `RoomId` from its textual form
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Self(n.to_string()),
            Repr::Text(s) => Self(s),
        })
    }
}

/// Non-negative amount of money, stored in cents
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole currency units, saturating on overflow
    #[must_use]
    pub const fn from_major(units: u64) -> Self {
        Self(units.saturating_mul(100))
    }

    /// Parses a decimal amount such as `"120"` or `"99.5"`
    ///
    /// Digits past the second decimal place are truncated. Negative,
    /// empty, or non-numeric input yields `None`.
    #[must_use]
    pub fn parse_decimal(input: &str) -> Option<Self> {
        let input = input.trim();
        let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));

        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let units: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let cents = match fraction.as_bytes() {
            [] => 0,
            [tens] => u64::from(tens - b'0') * 10,
            [tens, ones, ..] => u64::from(tens - b'0') * 10 + u64::from(ones - b'0'),
        };

        units.checked_mul(100)?.checked_add(cents).map(Self)
    }

    /// Converts a floating point amount, rounding to the nearest cent
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn from_f64(amount: f64) -> Option<Self> {
        let cents = (amount * 100.0).round();
        // u64::MAX as f64 rounds up to 2^64, which is already out of range
        if !cents.is_finite() || cents < 0.0 || cents >= u64::MAX as f64 {
            return None;
        }
        Some(Self(cents as u64))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a count, saturating on overflow
    #[must_use]
    pub const fn times(self, count: u64) -> Self {
        Self(self.0.saturating_mul(count))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
            Missing(()),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Self::from_f64(n),
            Repr::Text(s) if s.trim().is_empty() => Some(Self::ZERO),
            Repr::Text(s) => Self::parse_decimal(&s),
            Repr::Missing(()) => Some(Self::ZERO),
        }
        .ok_or_else(|| serde::de::Error::custom("amount must be a non-negative decimal"))
    }
}

/// Room details as served by `GET /rooms/{id}`
///
/// Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomReference {
    /// Room identifier
    pub id: RoomId,
    /// Room category shown to the guest
    #[serde(default)]
    pub room_type: String,
    /// Price of one night
    #[serde(rename = "roomPrice", default)]
    pub nightly_rate: Money,
    /// Base64 encoded photo, if any
    #[serde(default)]
    pub photo: Option<String>,
}

impl RoomReference {
    /// Room type label, or "Not specified"
    #[must_use]
    pub fn type_label(&self) -> &str {
        if self.room_type.trim().is_empty() {
            "Not specified"
        } else {
            &self.room_type
        }
    }

    /// Price label, or "N/A" when the room has no price
    #[must_use]
    pub fn price_label(&self) -> String {
        if self.nightly_rate.is_zero() {
            "N/A".to_string()
        } else {
            self.nightly_rate.to_string()
        }
    }

    /// Whether a non-empty photo was supplied
    #[must_use]
    pub fn has_photo(&self) -> bool {
        self.photo.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// Draft fields the guest may edit
///
/// There is no email variant: the email is a projection of the guest
/// session and cannot be edited through the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DraftField {
    /// Guest's full name
    GuestFullName,
    /// Check-in date (`YYYY-MM-DD`)
    CheckInDate,
    /// Check-out date (`YYYY-MM-DD`)
    CheckOutDate,
    /// Number of adults
    NumOfAdults,
    /// Number of children
    NumOfChildren,
}

/// Every field shown on the reservation form, for validation feedback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    /// Guest's full name
    GuestFullName,
    /// Guest's email (read-only)
    GuestEmail,
    /// Check-in date
    CheckInDate,
    /// Check-out date
    CheckOutDate,
    /// Number of adults
    NumOfAdults,
    /// Number of children
    NumOfChildren,
}

impl From<DraftField> for FormField {
    fn from(field: DraftField) -> Self {
        match field {
            DraftField::GuestFullName => Self::GuestFullName,
            DraftField::CheckInDate => Self::CheckInDate,
            DraftField::CheckOutDate => Self::CheckOutDate,
            DraftField::NumOfAdults => Self::NumOfAdults,
            DraftField::NumOfChildren => Self::NumOfChildren,
        }
    }
}

/// In-progress reservation as typed by the guest
///
/// Values are kept as entered so the form can show exactly what the guest
/// typed; typed accessors parse on demand. Each edit produces a new draft
/// via [`ReservationDraft::with_field`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationDraft {
    guest_full_name: String,
    guest_email: String,
    check_in_date: String,
    check_out_date: String,
    num_of_adults: String,
    num_of_children: String,
}

impl ReservationDraft {
    /// Creates an empty draft with the email pre-filled from the session
    ///
    /// Starts with one adult and no children.
    #[must_use]
    pub fn new(guest_email: impl Into<String>) -> Self {
        Self {
            guest_full_name: String::new(),
            guest_email: guest_email.into(),
            check_in_date: String::new(),
            check_out_date: String::new(),
            num_of_adults: "1".to_string(),
            num_of_children: "0".to_string(),
        }
    }

    /// Returns a copy of this draft with one field replaced
    #[must_use]
    pub fn with_field(&self, field: DraftField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let value = value.into();
        match field {
            DraftField::GuestFullName => next.guest_full_name = value,
            DraftField::CheckInDate => next.check_in_date = value,
            DraftField::CheckOutDate => next.check_out_date = value,
            DraftField::NumOfAdults => next.num_of_adults = value,
            DraftField::NumOfChildren => next.num_of_children = value,
        }
        next
    }

    /// Raw value of a form field
    #[must_use]
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::GuestFullName => &self.guest_full_name,
            FormField::GuestEmail => &self.guest_email,
            FormField::CheckInDate => &self.check_in_date,
            FormField::CheckOutDate => &self.check_out_date,
            FormField::NumOfAdults => &self.num_of_adults,
            FormField::NumOfChildren => &self.num_of_children,
        }
    }

    /// Guest's full name as typed
    #[must_use]
    pub fn guest_full_name(&self) -> &str {
        &self.guest_full_name
    }

    /// Guest's email, taken from the session
    #[must_use]
    pub fn guest_email(&self) -> &str {
        &self.guest_email
    }

    /// Check-in date, if it parses
    #[must_use]
    pub fn check_in(&self) -> Option<NaiveDate> {
        parse_form_date(&self.check_in_date)
    }

    /// Check-out date, if it parses
    #[must_use]
    pub fn check_out(&self) -> Option<NaiveDate> {
        parse_form_date(&self.check_out_date)
    }
}

/// Validated stay details, typed for submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StayDetails {
    /// Guest's full name, trimmed
    pub guest_full_name: String,
    /// Guest's email
    pub guest_email: String,
    /// Check-in date
    pub check_in_date: NaiveDate,
    /// Check-out date, strictly after check-in
    pub check_out_date: NaiveDate,
    /// Number of adults, at least one
    pub num_of_adults: u32,
    /// Number of children
    pub num_of_children: u32,
}

/// Body of `POST /bookings`
///
/// A frozen copy of the draft taken when the guest confirms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    /// Room being booked
    pub room_id: RoomId,
    /// Guest and stay details
    #[serde(flatten)]
    pub stay: StayDetails,
}

/// Terminal result of a booking attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The room service accepted the booking
    Success {
        /// Code the guest uses to find the booking later
        confirmation_code: String,
    },
    /// The booking was rejected or could not be sent
    Failure {
        /// Message shown to the guest
        reason: String,
    },
}

/// Stage of the checkout state machine
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReservationPhase {
    /// Guest is filling in the form
    #[default]
    Editing,
    /// Guest is looking at the booking summary
    Reviewing,
    /// Booking request is in flight
    Submitting,
    /// Booking attempt finished
    Settled(Settlement),
}

impl ReservationPhase {
    /// Whether the draft may be edited in this phase
    #[must_use]
    pub const fn accepts_edits(&self) -> bool {
        matches!(self, Self::Editing | Self::Reviewing)
    }

    /// Whether the booking attempt has finished
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(_))
    }
}

impl fmt::Display for ReservationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editing => write!(f, "editing"),
            Self::Reviewing => write!(f, "reviewing"),
            Self::Submitting => write!(f, "submitting"),
            Self::Settled(Settlement::Success { confirmation_code }) => {
                write!(f, "settled (confirmed {confirmation_code})")
            },
            Self::Settled(Settlement::Failure { reason }) => write!(f, "settled (failed: {reason})"),
        }
    }
}
