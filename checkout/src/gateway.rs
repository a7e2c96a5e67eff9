//! Room availability gateway.
//!
//! The checkout talks to the room service through [`RoomAvailabilityGateway`].
//! Every call is treated as at-most-once: no retry, caching, or idempotency
//! is assumed, and both outcomes are handled by the caller.
//!
//! [`InMemoryRoomGateway`] is a scriptable implementation for development
//! and tests. The HTTP implementation lives in [`crate::http`].

use crate::types::{BookingRequest, RoomId, RoomReference};
use futures::future::BoxFuture;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure reported by the room service boundary
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The room does not exist or came back empty
    #[error("Room data not found.")]
    NotFound,

    /// The service refused the booking
    #[error("{reason}")]
    Rejected {
        /// Server-provided message or a generic fallback
        reason: String,
    },

    /// Network failure, timeout, or unexpected response
    #[error("{0}")]
    Transport(String),
}

/// Room service operations used by the checkout
pub trait RoomAvailabilityGateway: Send + Sync {
    /// Fetch one room's details
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for an unknown room and
    /// [`GatewayError::Transport`] when the service cannot be reached.
    fn fetch_room(&self, room_id: RoomId) -> BoxFuture<'static, GatewayResult<RoomReference>>;

    /// Submit a booking and return its confirmation code
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Rejected`] when the service declines the
    /// booking and [`GatewayError::Transport`] when it cannot be reached.
    fn submit_booking(&self, request: BookingRequest) -> BoxFuture<'static, GatewayResult<String>>;
}

#[derive(Debug, Default)]
struct InMemoryInner {
    rooms: HashMap<RoomId, RoomReference>,
    fetch_delays: HashMap<RoomId, Duration>,
    booking_delay: Duration,
    scripted_bookings: VecDeque<GatewayResult<String>>,
    submissions: Vec<BookingRequest>,
    fetch_calls: usize,
    next_code: u32,
}

/// In-memory gateway with scripted outcomes
///
/// Clones share the same rooms and call log. Booking submissions succeed
/// with generated codes (`BK-0001`, `BK-0002`, ...) unless an outcome was
/// queued with [`InMemoryRoomGateway::script_booking`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryRoomGateway {
    inner: Arc<Mutex<InMemoryInner>>,
}

impl InMemoryRoomGateway {
    /// Creates an empty gateway
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(self) -> Arc<dyn RoomAvailabilityGateway> {
        Arc::new(self)
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds or replaces a room
    #[must_use]
    pub fn with_room(self, room: RoomReference) -> Self {
        self.lock().rooms.insert(room.id.clone(), room);
        self
    }

    /// Delays every fetch of one room
    #[must_use]
    pub fn with_fetch_delay(self, room_id: RoomId, delay: Duration) -> Self {
        self.lock().fetch_delays.insert(room_id, delay);
        self
    }

    /// Delays every booking submission
    #[must_use]
    pub fn with_booking_delay(self, delay: Duration) -> Self {
        self.lock().booking_delay = delay;
        self
    }

    /// Queues the outcome of the next unscripted booking submission
    pub fn script_booking(&self, outcome: GatewayResult<String>) {
        self.lock().scripted_bookings.push_back(outcome);
    }

    /// Number of room fetches so far
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    /// Booking requests received so far, in order
    #[must_use]
    pub fn submissions(&self) -> Vec<BookingRequest> {
        self.lock().submissions.clone()
    }
}

impl RoomAvailabilityGateway for InMemoryRoomGateway {
    fn fetch_room(&self, room_id: RoomId) -> BoxFuture<'static, GatewayResult<RoomReference>> {
        let (room, delay) = {
            let mut inner = self.lock();
            inner.fetch_calls += 1;
            (
                inner.rooms.get(&room_id).cloned(),
                inner.fetch_delays.get(&room_id).copied(),
            )
        };

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            tracing::debug!(room_id = %room_id, found = room.is_some(), "In-memory room fetch");
            room.ok_or(GatewayError::NotFound)
        })
    }

    fn submit_booking(&self, request: BookingRequest) -> BoxFuture<'static, GatewayResult<String>> {
        let (outcome, delay) = {
            let mut inner = self.lock();
            inner.submissions.push(request.clone());
            let outcome = inner.scripted_bookings.pop_front().unwrap_or_else(|| {
                inner.next_code += 1;
                Ok(format!("BK-{:04}", inner.next_code))
            });
            (outcome, inner.booking_delay)
        };

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            tracing::debug!(
                room_id = %request.room_id,
                accepted = outcome.is_ok(),
                "In-memory booking submission"
            );
            outcome
        })
    }
}
