//! Reservation form controller.
//!
//! The whole checkout flow is one reducer. Commands from the view and
//! results from the room service arrive as [`CheckoutAction`]s; the reducer
//! updates [`CheckoutState`] and describes any remote call as an effect.
//!
//! ```text
//! Editing ──RequestReview──▶ Reviewing ──Confirm──▶ Submitting ──▶ Settled
//!    ▲                           │                                   │
//!    └────────── Edit ───────────┘                                   │
//!    └──────────────────── ReturnToEditing (failure only) ───────────┘
//! ```
//!
//! Review is allowed while the room price is still loading; the charge
//! reads as zero until it arrives.

use crate::gateway::{GatewayError, RoomAvailabilityGateway};
use crate::session::GuestSession;
use crate::state::{CheckoutAction, CheckoutState, FormNotice, Generation, RoomPanel};
use crate::types::{BookingRequest, ReservationDraft, ReservationPhase, RoomId, Settlement};
use crate::validation::can_advance_to_review;
use roomkeep_core::{
    SmallVec, async_effect, delay, effect::Effect, environment::Clock, reducer::Reducer, smallvec,
};
use std::sync::Arc;
use std::time::Duration;

/// Shown in the room panel when the route carried no room id
pub const INVALID_ROOM_MESSAGE: &str = "Invalid room ID. Please go back and try again.";

/// Shown above the form when the room price could not be loaded
pub const ROOM_LOAD_NOTICE: &str = "Could not load room details.";

/// Default lifetime of a form notice
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);

/// Environment dependencies for the checkout reducer
#[derive(Clone)]
pub struct CheckoutEnvironment {
    /// Room service
    pub gateway: Arc<dyn RoomAvailabilityGateway>,
    /// Signed-in guest, used to pre-fill the email
    pub session: Arc<dyn GuestSession>,
    /// Source of "today" for date constraints
    pub clock: Arc<dyn Clock>,
    /// How long form notices stay visible
    pub notice_ttl: Duration,
}

impl CheckoutEnvironment {
    /// Creates a new `CheckoutEnvironment`
    #[must_use]
    pub fn new(
        gateway: Arc<dyn RoomAvailabilityGateway>,
        session: Arc<dyn GuestSession>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            session,
            clock,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    /// Overrides the notice lifetime
    #[must_use]
    pub const fn with_notice_ttl(mut self, notice_ttl: Duration) -> Self {
        self.notice_ttl = notice_ttl;
        self
    }
}

/// Reducer for the checkout flow
#[derive(Clone, Debug)]
pub struct CheckoutReducer;

impl CheckoutReducer {
    /// Creates a new `CheckoutReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Starts a fresh session for a room, discarding any previous draft
    fn start_session(
        state: &mut CheckoutState,
        room_id: Option<RoomId>,
        env: &CheckoutEnvironment,
    ) -> SmallVec<[Effect<CheckoutAction>; 4]> {
        state.generation += 1;
        state.mounted = true;
        state.room_id.clone_from(&room_id);
        state.nightly_rate = None;
        state.draft = ReservationDraft::new(env.session.guest_id().unwrap_or_default());
        state.phase = ReservationPhase::Editing;
        state.validation_error = None;
        state.notice = None;
        state.submission = None;

        let Some(room_id) = room_id else {
            tracing::warn!("Checkout mounted without a room id");
            state.room = RoomPanel::Failed {
                message: INVALID_ROOM_MESSAGE.to_string(),
            };
            return SmallVec::new();
        };

        tracing::debug!(room_id = %room_id, generation = state.generation, "Loading room");
        state.room = RoomPanel::Loading;

        smallvec![Self::fetch_room(env, room_id, state.generation)]
    }

    fn fetch_room(
        env: &CheckoutEnvironment,
        room_id: RoomId,
        generation: Generation,
    ) -> Effect<CheckoutAction> {
        let gateway = Arc::clone(&env.gateway);
        async_effect! {
            Some(match gateway.fetch_room(room_id).await {
                Ok(room) => CheckoutAction::RoomLoaded { generation, room },
                Err(error) => CheckoutAction::RoomLoadFailed { generation, error },
            })
        }
    }

    fn submit_booking(
        env: &CheckoutEnvironment,
        request: BookingRequest,
        generation: Generation,
    ) -> Effect<CheckoutAction> {
        let gateway = Arc::clone(&env.gateway);
        async_effect! {
            Some(match gateway.submit_booking(request).await {
                Ok(confirmation_code) => CheckoutAction::BookingConfirmed {
                    generation,
                    confirmation_code,
                },
                Err(error) => CheckoutAction::BookingFailed {
                    generation,
                    reason: error.to_string(),
                },
            })
        }
    }

    /// Message for the room panel after a failed lookup
    fn panel_message(error: &GatewayError) -> String {
        match error {
            GatewayError::Transport(message) if message.trim().is_empty() => {
                "Failed to fetch room details.".to_string()
            },
            GatewayError::NotFound
            | GatewayError::Rejected { .. }
            | GatewayError::Transport(_) => error.to_string(),
        }
    }

    fn show_notice(
        state: &mut CheckoutState,
        message: &str,
        env: &CheckoutEnvironment,
    ) -> Effect<CheckoutAction> {
        state.next_notice_id += 1;
        let id = state.next_notice_id;
        state.notice = Some(FormNotice {
            id,
            message: message.to_string(),
        });

        delay! {
            duration: env.notice_ttl,
            action: CheckoutAction::DismissNotice { id }
        }
    }

    fn settle(state: &mut CheckoutState, settlement: Settlement) {
        let outcome = match &settlement {
            Settlement::Success { confirmation_code } => {
                tracing::info!(%confirmation_code, "Booking confirmed");
                "success"
            },
            Settlement::Failure { reason } => {
                tracing::warn!(%reason, "Booking failed");
                "failure"
            },
        };

        metrics::counter!("checkout.booking.settled", "outcome" => outcome).increment(1);
        state.phase = ReservationPhase::Settled(settlement);
    }
}

impl Default for CheckoutReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = CheckoutEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Lifecycle ==========
            CheckoutAction::Mount { room_id } => Self::start_session(state, room_id, env),

            CheckoutAction::SelectRoom { room_id } => {
                if !state.mounted {
                    tracing::warn!(room_id = %room_id, "Room selected while unmounted, ignoring");
                    return SmallVec::new();
                }
                if state.room_id.as_ref() == Some(&room_id) {
                    tracing::debug!(room_id = %room_id, "Same room selected, keeping session");
                    return SmallVec::new();
                }
                Self::start_session(state, Some(room_id), env)
            },

            CheckoutAction::Unmount => {
                state.generation += 1;
                state.mounted = false;
                state.notice = None;
                tracing::debug!(generation = state.generation, "Checkout unmounted");
                SmallVec::new()
            },

            // ========== Form ==========
            CheckoutAction::Edit { field, value } => {
                if !state.mounted || !state.phase.accepts_edits() {
                    tracing::warn!(?field, phase = %state.phase, "Edit ignored");
                    return SmallVec::new();
                }

                state.draft = state.draft.with_field(field, value);
                state.validation_error = None;
                state.notice = None;
                if state.phase == ReservationPhase::Reviewing {
                    tracing::debug!(?field, "Edit during review, back to editing");
                }
                state.phase = ReservationPhase::Editing;
                SmallVec::new()
            },

            CheckoutAction::RequestReview => {
                if !state.mounted {
                    tracing::warn!("Review requested while unmounted, ignoring");
                    return SmallVec::new();
                }
                match state.phase {
                    ReservationPhase::Editing => {},
                    ReservationPhase::Reviewing => {
                        tracing::debug!("Already reviewing");
                        return SmallVec::new();
                    },
                    ReservationPhase::Submitting | ReservationPhase::Settled(_) => {
                        tracing::warn!(phase = %state.phase, "Review requested out of order, ignoring");
                        return SmallVec::new();
                    },
                }

                match can_advance_to_review(&state.draft, env.clock.today()) {
                    Ok(_) => {
                        tracing::debug!(
                            charge = %state.total_charge(),
                            price_known = state.nightly_rate.is_some(),
                            "Reviewing booking"
                        );
                        state.validation_error = None;
                        state.phase = ReservationPhase::Reviewing;
                    },
                    Err(error) => {
                        tracing::debug!(%error, "Review blocked");
                        state.validation_error = Some(error);
                    },
                }
                SmallVec::new()
            },

            CheckoutAction::Confirm => {
                if !state.mounted || state.phase != ReservationPhase::Reviewing {
                    tracing::warn!(phase = %state.phase, "Confirm outside review, ignoring");
                    return SmallVec::new();
                }

                let stay = match can_advance_to_review(&state.draft, env.clock.today()) {
                    Ok(stay) => stay,
                    Err(error) => {
                        tracing::debug!(%error, "Draft no longer valid at confirmation");
                        state.validation_error = Some(error);
                        state.phase = ReservationPhase::Editing;
                        return SmallVec::new();
                    },
                };

                let Some(room_id) = state.room_id.clone() else {
                    Self::settle(
                        state,
                        Settlement::Failure {
                            reason: INVALID_ROOM_MESSAGE.to_string(),
                        },
                    );
                    return SmallVec::new();
                };

                let request = BookingRequest { room_id, stay };
                tracing::debug!(room_id = %request.room_id, "Submitting booking");
                state.submission = Some(request.clone());
                state.phase = ReservationPhase::Submitting;

                smallvec![Self::submit_booking(env, request, state.generation)]
            },

            CheckoutAction::ReturnToEditing => {
                if matches!(
                    state.phase,
                    ReservationPhase::Settled(Settlement::Failure { .. })
                ) {
                    tracing::debug!("Returning to editing after failed booking");
                    state.phase = ReservationPhase::Editing;
                    state.submission = None;
                } else {
                    tracing::warn!(phase = %state.phase, "Nothing to retry, ignoring");
                }
                SmallVec::new()
            },

            CheckoutAction::DismissNotice { id } => {
                if state.notice.as_ref().is_some_and(|notice| notice.id == id) {
                    state.notice = None;
                }
                SmallVec::new()
            },

            // ========== Feedback ==========
            CheckoutAction::RoomLoaded { generation, room } => {
                if !state.is_current(generation) {
                    tracing::debug!(generation, current = state.generation, "Discarding stale room");
                    return SmallVec::new();
                }
                if state.nightly_rate.is_some() {
                    tracing::debug!("Nightly rate already recorded, ignoring");
                    return SmallVec::new();
                }

                tracing::debug!(room_id = %room.id, rate = %room.nightly_rate, "Room loaded");
                state.nightly_rate = Some(room.nightly_rate);
                state.room = RoomPanel::Loaded(room);
                SmallVec::new()
            },

            CheckoutAction::RoomLoadFailed { generation, error } => {
                if !state.is_current(generation) {
                    tracing::debug!(generation, current = state.generation, "Discarding stale room failure");
                    return SmallVec::new();
                }

                tracing::warn!(%error, "Room lookup failed");
                state.room = RoomPanel::Failed {
                    message: Self::panel_message(&error),
                };
                smallvec![Self::show_notice(state, ROOM_LOAD_NOTICE, env)]
            },

            CheckoutAction::BookingConfirmed {
                generation,
                confirmation_code,
            } => {
                if !state.is_current(generation) || state.phase != ReservationPhase::Submitting {
                    tracing::debug!(generation, "Discarding stale booking confirmation");
                    return SmallVec::new();
                }
                Self::settle(state, Settlement::Success { confirmation_code });
                SmallVec::new()
            },

            CheckoutAction::BookingFailed { generation, reason } => {
                if !state.is_current(generation) || state.phase != ReservationPhase::Submitting {
                    tracing::debug!(generation, "Discarding stale booking failure");
                    return SmallVec::new();
                }
                Self::settle(state, Settlement::Failure { reason });
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryRoomGateway;
    use crate::session::StaticSession;
    use crate::types::{DraftField, FormField, Money, RoomReference};
    use crate::validation::ValidationError;
    use chrono::NaiveDate;
    use roomkeep_testing::{FixedClock, ReducerTest, assertions, test_clock};

    fn room(id: &str, rate: u64) -> RoomReference {
        RoomReference {
            id: RoomId::new(id),
            room_type: "Deluxe".to_string(),
            nightly_rate: Money::from_major(rate),
            photo: None,
        }
    }

    fn test_env(gateway: InMemoryRoomGateway) -> CheckoutEnvironment {
        CheckoutEnvironment::new(
            gateway.shared(),
            Arc::new(StaticSession::new("ada@example.com")),
            Arc::new(test_clock()),
        )
    }

    fn env() -> CheckoutEnvironment {
        test_env(InMemoryRoomGateway::new().with_room(room("7", 100)))
    }

    fn edit(field: DraftField, value: &str) -> CheckoutAction {
        CheckoutAction::Edit {
            field,
            value: value.to_string(),
        }
    }

    fn fill_form() -> Vec<CheckoutAction> {
        vec![
            edit(DraftField::GuestFullName, "Ada Lovelace"),
            edit(DraftField::CheckInDate, "2025-01-10"),
            edit(DraftField::CheckOutDate, "2025-01-13"),
        ]
    }

    /// Mounted on room 7 with the price loaded, generation 1
    fn loaded_state() -> CheckoutState {
        let mut state = CheckoutState::new();
        let reducer = CheckoutReducer::new();
        let env = env();
        let _ = reducer.reduce(
            &mut state,
            CheckoutAction::Mount {
                room_id: Some(RoomId::new("7")),
            },
            &env,
        );
        let _ = reducer.reduce(
            &mut state,
            CheckoutAction::RoomLoaded {
                generation: 1,
                room: room("7", 100),
            },
            &env,
        );
        state
    }

    fn reviewing_state() -> CheckoutState {
        let mut state = loaded_state();
        let reducer = CheckoutReducer::new();
        let env = env();
        for action in fill_form() {
            let _ = reducer.reduce(&mut state, action, &env);
        }
        let _ = reducer.reduce(&mut state, CheckoutAction::RequestReview, &env);
        assert_eq!(state.phase, ReservationPhase::Reviewing);
        state
    }

    fn submitting_state() -> CheckoutState {
        let mut state = reviewing_state();
        let _ = CheckoutReducer::new().reduce(&mut state, CheckoutAction::Confirm, &env());
        state
    }

    async fn run_future(effects: SmallVec<[Effect<CheckoutAction>; 4]>) -> Option<CheckoutAction> {
        for effect in effects {
            if let Effect::Future(fut) = effect {
                return fut.await;
            }
        }
        panic!("expected a Future effect");
    }

    #[test]
    fn test_mount_prefills_email_and_fetches_room() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(CheckoutState::new())
            .when_action(CheckoutAction::Mount {
                room_id: Some(RoomId::new("7")),
            })
            .then_state(|state| {
                assert!(state.mounted);
                assert_eq!(state.generation, 1);
                assert_eq!(state.room, RoomPanel::Loading);
                assert_eq!(state.draft.guest_email(), "ada@example.com");
                assert_eq!(state.draft.value(FormField::NumOfAdults), "1");
                assert_eq!(state.draft.value(FormField::NumOfChildren), "0");
                assert_eq!(state.phase, ReservationPhase::Editing);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_mount_without_room_id_fails_without_fetch() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(CheckoutState::new())
            .when_action(CheckoutAction::Mount { room_id: None })
            .then_state(|state| {
                assert_eq!(
                    state.room,
                    RoomPanel::Failed {
                        message: INVALID_ROOM_MESSAGE.to_string()
                    }
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_fetch_effect_reports_room_with_generation() {
        let gateway = InMemoryRoomGateway::new().with_room(room("7", 100));
        let env = test_env(gateway.clone());
        let mut state = CheckoutState::new();

        let effects = CheckoutReducer::new().reduce(
            &mut state,
            CheckoutAction::Mount {
                room_id: Some(RoomId::new("7")),
            },
            &env,
        );

        assert_eq!(
            run_future(effects).await,
            Some(CheckoutAction::RoomLoaded {
                generation: 1,
                room: room("7", 100),
            })
        );
        assert_eq!(gateway.fetch_calls(), 1);
    }

    #[test]
    fn test_room_loaded_records_rate_once() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(loaded_state())
            .when_action(CheckoutAction::RoomLoaded {
                generation: 1,
                room: room("7", 250),
            })
            .then_state(|state| {
                assert_eq!(state.nightly_rate, Some(Money::from_major(100)));
                assert_eq!(state.room.room().unwrap().nightly_rate, Money::from_major(100));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_three_nights_at_one_hundred_reviews_with_three_hundred() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(loaded_state())
            .when_actions(fill_form())
            .when_action(CheckoutAction::RequestReview)
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Reviewing);
                assert_eq!(state.total_charge(), Money::from_major(300));
                assert!(state.validation_result().valid);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_same_day_stay_stays_in_editing() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(loaded_state())
            .when_actions(fill_form())
            .when_action(edit(DraftField::CheckOutDate, "2025-01-10"))
            .when_action(CheckoutAction::RequestReview)
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Editing);
                assert_eq!(state.validation_error, Some(ValidationError::InvalidDateRange));
                assert_eq!(
                    state.validation_result().message.as_deref(),
                    Some("Check-out date must be after check-in date.")
                );
                assert_eq!(state.draft.value(FormField::CheckOutDate), "2025-01-10");
            })
            .run();
    }

    #[test]
    fn test_no_adults_blocks_review() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(loaded_state())
            .when_actions(fill_form())
            .when_action(edit(DraftField::NumOfAdults, "0"))
            .when_action(edit(DraftField::NumOfChildren, "2"))
            .when_action(CheckoutAction::RequestReview)
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Editing);
                assert_eq!(state.validation_error, Some(ValidationError::InvalidGuestCount));
            })
            .run();
    }

    #[test]
    fn test_review_is_idempotent() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(reviewing_state())
            .when_actions([CheckoutAction::RequestReview, CheckoutAction::RequestReview])
            .then_state(|state| assert_eq!(state.phase, ReservationPhase::Reviewing))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_edit_while_reviewing_returns_to_editing() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(reviewing_state())
            .when_action(edit(DraftField::NumOfChildren, "2"))
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Editing);
                assert_eq!(state.draft.value(FormField::NumOfChildren), "2");
            })
            .run();
    }

    #[test]
    fn test_edit_clears_validation_error() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(loaded_state())
            .when_action(CheckoutAction::RequestReview)
            .when_action(edit(DraftField::GuestFullName, "A"))
            .then_state(|state| {
                assert_eq!(state.validation_error, None);
                assert!(state.validation_result().valid);
            })
            .run();
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(loaded_state())
            .when_action(CheckoutAction::RequestReview)
            .then_state(|state| {
                let error = state.validation_error.as_ref().unwrap();
                assert_eq!(error.field_issues().len(), 3);
                assert!(error.message_for(FormField::GuestFullName).is_some());
                assert!(error.message_for(FormField::CheckInDate).is_some());
                assert!(error.message_for(FormField::CheckOutDate).is_some());
            })
            .run();
    }

    #[test]
    fn test_review_allowed_before_price_arrives() {
        let mut state = CheckoutState::new();
        let _ = CheckoutReducer::new().reduce(
            &mut state,
            CheckoutAction::Mount {
                room_id: Some(RoomId::new("7")),
            },
            &env(),
        );

        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(state)
            .when_actions(fill_form())
            .when_action(CheckoutAction::RequestReview)
            .when_action(CheckoutAction::RoomLoaded {
                generation: 1,
                room: room("7", 100),
            })
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Reviewing);
                assert_eq!(state.total_charge(), Money::from_major(300));
            })
            .run();
    }

    #[test]
    fn test_edit_is_ignored_while_submitting() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(submitting_state())
            .when_action(edit(DraftField::GuestFullName, "Someone Else"))
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Submitting);
                assert_eq!(state.draft.guest_full_name(), "Ada Lovelace");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_confirm_snapshots_draft_and_submits() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(reviewing_state())
            .when_action(CheckoutAction::Confirm)
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Submitting);
                let request = state.submission.as_ref().unwrap();
                assert_eq!(request.room_id, RoomId::new("7"));
                assert_eq!(request.stay.guest_full_name, "Ada Lovelace");
                assert_eq!(request.stay.guest_email, "ada@example.com");
                assert_eq!(request.stay.num_of_adults, 1);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_confirm_requires_review() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(loaded_state())
            .when_actions(fill_form())
            .when_action(CheckoutAction::Confirm)
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Editing);
                assert!(state.submission.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_confirm_revalidates_dates_that_slipped_into_the_past() {
        let later = CheckoutEnvironment::new(
            InMemoryRoomGateway::new().with_room(room("7", 100)).shared(),
            Arc::new(StaticSession::new("ada@example.com")),
            Arc::new(FixedClock::on_date(
                NaiveDate::from_ymd_opt(2025, 1, 11).unwrap(),
            )),
        );

        ReducerTest::new(CheckoutReducer::new())
            .with_env(later)
            .given_state(reviewing_state())
            .when_action(CheckoutAction::Confirm)
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Editing);
                assert!(state.submission.is_none());
                let error = state.validation_error.as_ref().unwrap();
                assert!(matches!(error, ValidationError::FieldConstraints(_)));
                assert!(error.message_for(FormField::CheckInDate).is_some());
                assert!(error.message_for(FormField::CheckOutDate).is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_confirm_without_room_settles_failure_without_submitting() {
        let gateway = InMemoryRoomGateway::new().with_room(room("7", 100));
        let mut actions = vec![CheckoutAction::Mount { room_id: None }];
        actions.extend(fill_form());
        actions.push(CheckoutAction::RequestReview);
        actions.push(CheckoutAction::Confirm);

        ReducerTest::new(CheckoutReducer::new())
            .with_env(test_env(gateway.clone()))
            .given_state(CheckoutState::new())
            .when_actions(actions)
            .then_state(|state| {
                assert_eq!(
                    state.phase,
                    ReservationPhase::Settled(Settlement::Failure {
                        reason: INVALID_ROOM_MESSAGE.to_string()
                    })
                );
                assert!(state.submission.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        assert!(gateway.submissions().is_empty());
        assert_eq!(gateway.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_confirm_effect_returns_scripted_code() {
        let gateway = InMemoryRoomGateway::new().with_room(room("7", 100));
        gateway.script_booking(Ok("ABC123".to_string()));
        let env = test_env(gateway.clone());
        let mut state = reviewing_state();

        let effects = CheckoutReducer::new().reduce(&mut state, CheckoutAction::Confirm, &env);

        assert_eq!(
            run_future(effects).await,
            Some(CheckoutAction::BookingConfirmed {
                generation: 1,
                confirmation_code: "ABC123".to_string(),
            })
        );
        assert_eq!(gateway.submissions().len(), 1);
    }

    #[test]
    fn test_booking_confirmed_settles_success() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(submitting_state())
            .when_action(CheckoutAction::BookingConfirmed {
                generation: 1,
                confirmation_code: "ABC123".to_string(),
            })
            .then_state(|state| {
                assert_eq!(
                    state.phase,
                    ReservationPhase::Settled(Settlement::Success {
                        confirmation_code: "ABC123".to_string()
                    })
                );
                assert_eq!(state.outcome().unwrap().headline(), "Booking Success!");
            })
            .run();
    }

    #[test]
    fn test_timeout_settles_failure_and_keeps_draft_for_retry() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(submitting_state())
            .when_action(CheckoutAction::BookingFailed {
                generation: 1,
                reason: "Request timed out".to_string(),
            })
            .when_action(CheckoutAction::ReturnToEditing)
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Editing);
                assert_eq!(state.draft.guest_full_name(), "Ada Lovelace");
                assert_eq!(state.draft.value(FormField::CheckInDate), "2025-01-10");
                assert!(state.submission.is_none());
            })
            .run();
    }

    #[test]
    fn test_return_to_editing_not_allowed_after_success() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(submitting_state())
            .when_action(CheckoutAction::BookingConfirmed {
                generation: 1,
                confirmation_code: "ABC123".to_string(),
            })
            .when_action(CheckoutAction::ReturnToEditing)
            .then_state(|state| assert!(state.phase.is_settled()))
            .run();
    }

    #[test]
    fn test_second_booking_result_is_ignored() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(submitting_state())
            .when_action(CheckoutAction::BookingConfirmed {
                generation: 1,
                confirmation_code: "ABC123".to_string(),
            })
            .when_action(CheckoutAction::BookingFailed {
                generation: 1,
                reason: "late".to_string(),
            })
            .then_state(|state| {
                assert_eq!(
                    state.outcome(),
                    Some(crate::state::BookingOutcome::Confirmed {
                        confirmation_code: "ABC123".to_string()
                    })
                );
            })
            .run();
    }

    #[test]
    fn test_stale_room_after_switch_is_discarded() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(CheckoutState::new())
            .when_action(CheckoutAction::Mount {
                room_id: Some(RoomId::new("7")),
            })
            .when_action(CheckoutAction::SelectRoom {
                room_id: RoomId::new("8"),
            })
            .when_action(CheckoutAction::RoomLoaded {
                generation: 1,
                room: room("7", 100),
            })
            .then_state(|state| {
                assert_eq!(state.generation, 2);
                assert_eq!(state.room_id, Some(RoomId::new("8")));
                assert_eq!(state.room, RoomPanel::Loading);
                assert_eq!(state.nightly_rate, None);
            })
            .run();
    }

    #[test]
    fn test_selecting_other_room_discards_draft() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(reviewing_state())
            .when_action(CheckoutAction::SelectRoom {
                room_id: RoomId::new("8"),
            })
            .then_state(|state| {
                assert_eq!(state.phase, ReservationPhase::Editing);
                assert_eq!(state.draft.guest_full_name(), "");
                assert_eq!(state.draft.guest_email(), "ada@example.com");
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_selecting_same_room_keeps_price_and_draft() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(reviewing_state())
            .when_action(CheckoutAction::SelectRoom {
                room_id: RoomId::new("7"),
            })
            .then_state(|state| {
                assert_eq!(state.generation, 1);
                assert_eq!(state.phase, ReservationPhase::Reviewing);
                assert_eq!(state.nightly_rate, Some(Money::from_major(100)));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_results_after_unmount_are_discarded() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(submitting_state())
            .when_action(CheckoutAction::Unmount)
            .when_action(CheckoutAction::BookingConfirmed {
                generation: 1,
                confirmation_code: "ABC123".to_string(),
            })
            .then_state(|state| {
                assert!(!state.mounted);
                assert_eq!(state.phase, ReservationPhase::Submitting);
            })
            .run();
    }

    #[test]
    fn test_room_failure_shows_notice_that_expires() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env().with_notice_ttl(Duration::from_secs(5)))
            .given_state(loaded_state())
            .when_action(CheckoutAction::RoomLoadFailed {
                generation: 1,
                error: GatewayError::NotFound,
            })
            .then_state(|state| {
                assert_eq!(
                    state.room,
                    RoomPanel::Failed {
                        message: "Room data not found.".to_string()
                    }
                );
                let notice = state.notice.as_ref().unwrap();
                assert_eq!(notice.message, ROOM_LOAD_NOTICE);
            })
            .then_effects(|effects| {
                assertions::assert_has_delay_effect(effects);
                assert!(matches!(
                    effects[0],
                    Effect::Delay { duration, .. } if duration == Duration::from_secs(5)
                ));
                assert_eq!(
                    assertions::delayed_action(effects),
                    Some(&CheckoutAction::DismissNotice { id: 1 })
                );
            })
            .run();
    }

    #[test]
    fn test_dismiss_only_clears_matching_notice() {
        let mut state = loaded_state();
        state.notice = Some(FormNotice {
            id: 2,
            message: ROOM_LOAD_NOTICE.to_string(),
        });

        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(CheckoutAction::DismissNotice { id: 1 })
            .then_state(|state| assert!(state.notice.is_some()))
            .run();
    }

    #[test]
    fn test_edit_clears_notice() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(env())
            .given_state(loaded_state())
            .when_action(CheckoutAction::RoomLoadFailed {
                generation: 1,
                error: GatewayError::Transport(String::new()),
            })
            .when_action(edit(DraftField::GuestFullName, "Ada"))
            .then_state(|state| {
                assert!(state.notice.is_none());
                assert_eq!(
                    state.room,
                    RoomPanel::Failed {
                        message: "Failed to fetch room details.".to_string()
                    }
                );
            })
            .run();
    }
}
