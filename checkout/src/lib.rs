//! Hotel room reservation checkout.
//!
//! A guest opens the checkout for one room, fills in a reservation form,
//! reviews a priced summary, and confirms. The flow is a single reducer
//! driven by a [`roomkeep_runtime::Store`]:
//!
//! ```text
//!                ┌──────────────────────┐
//!   view ──────▶ │   CheckoutReducer    │ ──── Future effects ───┐
//!  (actions)     │  draft · phase · fee │                        ▼
//!                └──────────────────────┘            ┌────────────────────────┐
//!                          ▲                         │ RoomAvailabilityGateway│
//!                          └──── feedback actions ── │  GET /rooms/{id}       │
//!                                                    │  POST /bookings        │
//!                                                    └────────────────────────┘
//! ```
//!
//! - [`pricing`]: nights × nightly rate
//! - [`validation`]: field constraints, guest count, date order
//! - [`reducer`]: the Editing → Reviewing → Submitting → Settled machine
//! - [`gateway`] / [`http`]: the room service boundary
//!
//! # Example
//!
//! ```ignore
//! let store = Store::new(CheckoutState::new(), CheckoutReducer::new(), env);
//! store.send(CheckoutAction::Mount { room_id: Some(RoomId::new("7")) }).await?;
//! ```

pub mod config;
pub mod gateway;
pub mod http;
pub mod pricing;
pub mod reducer;
pub mod session;
pub mod state;
pub mod types;
pub mod validation;

pub use config::{CheckoutConfig, ConfigError};
pub use gateway::{GatewayError, GatewayResult, InMemoryRoomGateway, RoomAvailabilityGateway};
pub use http::HttpRoomGateway;
pub use reducer::{CheckoutEnvironment, CheckoutReducer};
pub use session::{GuestSession, StaticSession};
pub use state::{BookingOutcome, CheckoutAction, CheckoutState, FormNotice, Generation, RoomPanel};
pub use types::{
    BookingRequest, DraftField, FormField, Money, ReservationDraft, ReservationPhase, RoomId,
    RoomReference, Settlement, StayDetails,
};
pub use validation::{ValidationError, ValidationResult};
