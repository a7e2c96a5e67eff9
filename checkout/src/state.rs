//! Checkout state and actions.

use crate::gateway::GatewayError;
use crate::pricing::compute_charge;
use crate::types::{
    BookingRequest, DraftField, FormField, Money, ReservationDraft, ReservationPhase,
    RoomId, RoomReference, Settlement,
};
use crate::validation::{ValidationError, ValidationResult};
use std::fmt;

/// Tag attached to every asynchronous request
///
/// Bumped whenever the form is mounted, switched to another room, or
/// unmounted. Results carrying an older generation are ignored.
pub type Generation = u64;

/// Inputs to the checkout reducer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutAction {
    // Commands
    /// The checkout view appeared for a room
    Mount {
        /// Room from the route, if one was given
        room_id: Option<RoomId>,
    },
    /// The guest switched to another room
    SelectRoom {
        /// Newly selected room
        room_id: RoomId,
    },
    /// The checkout view went away
    Unmount,
    /// The guest changed one form field
    Edit {
        /// Field being edited
        field: DraftField,
        /// New raw value
        value: String,
    },
    /// The guest pressed "Continue"
    RequestReview,
    /// The guest confirmed the booking summary
    Confirm,
    /// The guest chose to fix a failed booking and try again
    ReturnToEditing,
    /// A form notice expired
    DismissNotice {
        /// Notice to dismiss
        id: u64,
    },

    // Feedback
    /// Room details arrived
    RoomLoaded {
        /// Generation that issued the fetch
        generation: Generation,
        /// Fetched room
        room: RoomReference,
    },
    /// Room lookup failed
    RoomLoadFailed {
        /// Generation that issued the fetch
        generation: Generation,
        /// Gateway failure
        error: GatewayError,
    },
    /// The room service accepted the booking
    BookingConfirmed {
        /// Generation that issued the submission
        generation: Generation,
        /// Code returned by the service
        confirmation_code: String,
    },
    /// The booking was rejected or could not be sent
    BookingFailed {
        /// Generation that issued the submission
        generation: Generation,
        /// Message for the guest
        reason: String,
    },
}

/// Room information panel beside the form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RoomPanel {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Lookup in flight
    Loading,
    /// Room details available
    Loaded(RoomReference),
    /// Lookup failed or the room id was missing
    Failed {
        /// Message shown in place of the room
        message: String,
    },
}

impl RoomPanel {
    /// Loaded room, if any
    #[must_use]
    pub const fn room(&self) -> Option<&RoomReference> {
        match self {
            Self::Loaded(room) => Some(room),
            Self::Idle | Self::Loading | Self::Failed { .. } => None,
        }
    }
}

impl fmt::Display for RoomPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::Loading => write!(f, "Loading room information..."),
            Self::Loaded(room) => {
                write!(
                    f,
                    "Room Type: {} | Price per night: {}",
                    room.type_label(),
                    room.price_label()
                )?;
                if !room.has_photo() {
                    write!(f, " | No Image Available")?;
                }
                Ok(())
            },
            Self::Failed { message } => write!(f, "Error: {message}"),
        }
    }
}

/// Transient message shown above the form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormNotice {
    /// Identifier matched by [`CheckoutAction::DismissNotice`]
    pub id: u64,
    /// Text shown to the guest
    pub message: String,
}

/// What the outcome view shows once a booking settles
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingOutcome {
    /// Booking went through
    Confirmed {
        /// Code to show the guest
        confirmation_code: String,
    },
    /// Booking failed
    Failed {
        /// Why it failed
        reason: String,
    },
}

impl BookingOutcome {
    /// Page heading for the outcome
    #[must_use]
    pub const fn headline(&self) -> &'static str {
        match self {
            Self::Confirmed { .. } => "Booking Success!",
            Self::Failed { .. } => "Error Booking Room!",
        }
    }
}

/// State of one checkout session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutState {
    /// Room this session books
    pub room_id: Option<RoomId>,
    /// Room lookup as shown in the side panel
    pub room: RoomPanel,
    /// Nightly rate once known; read-only afterwards
    pub nightly_rate: Option<Money>,
    /// Values typed by the guest
    pub draft: ReservationDraft,
    /// Where the session is in the checkout flow
    pub phase: ReservationPhase,
    /// Last failed review attempt, cleared on edit
    pub validation_error: Option<ValidationError>,
    /// Transient form notice
    pub notice: Option<FormNotice>,
    /// Frozen request sent on confirmation
    pub submission: Option<BookingRequest>,
    /// Current request generation
    pub generation: Generation,
    /// Whether the view is mounted
    pub mounted: bool,
    /// Next notice identifier
    pub next_notice_id: u64,
}

impl Default for CheckoutState {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutState {
    /// Unmounted session with an empty draft
    #[must_use]
    pub fn new() -> Self {
        Self {
            room_id: None,
            room: RoomPanel::Idle,
            nightly_rate: None,
            draft: ReservationDraft::new(""),
            phase: ReservationPhase::Editing,
            validation_error: None,
            notice: None,
            submission: None,
            generation: 0,
            mounted: false,
            next_notice_id: 0,
        }
    }

    /// Rate used for pricing; zero until the room arrives
    #[must_use]
    pub fn nightly_rate(&self) -> Money {
        self.nightly_rate.unwrap_or(Money::ZERO)
    }

    /// Charge for the dates currently in the draft
    #[must_use]
    pub fn total_charge(&self) -> Money {
        compute_charge(
            self.draft.value(FormField::CheckInDate),
            self.draft.value(FormField::CheckOutDate),
            self.nightly_rate(),
        )
    }

    /// Result of the last review attempt
    #[must_use]
    pub fn validation_result(&self) -> ValidationResult {
        match &self.validation_error {
            Some(error) => ValidationResult::invalid(error.to_string()),
            None => ValidationResult::ok(),
        }
    }

    /// Outcome view, once the booking has settled
    #[must_use]
    pub fn outcome(&self) -> Option<BookingOutcome> {
        match &self.phase {
            ReservationPhase::Settled(Settlement::Success { confirmation_code }) => {
                Some(BookingOutcome::Confirmed {
                    confirmation_code: confirmation_code.clone(),
                })
            },
            ReservationPhase::Settled(Settlement::Failure { reason }) => {
                Some(BookingOutcome::Failed {
                    reason: reason.clone(),
                })
            },
            ReservationPhase::Editing
            | ReservationPhase::Reviewing
            | ReservationPhase::Submitting => None,
        }
    }

    /// Whether feedback tagged with `generation` still applies
    #[must_use]
    pub const fn is_current(&self, generation: Generation) -> bool {
        self.mounted && self.generation == generation
    }
}
