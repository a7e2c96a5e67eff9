//! Checkout demo binary
//!
//! Walks one reservation through the checkout against a running room
//! service:
//!
//! ```text
//! roomkeep-checkout <room-id> [full-name check-in check-out [adults [children]]]
//! ```
//!
//! Without guest details the room panel is printed and the program stops.

use roomkeep_checkout::{
    CheckoutAction, CheckoutConfig, CheckoutEnvironment, CheckoutReducer, CheckoutState,
    DraftField, HttpRoomGateway, ReservationPhase, RoomId, StaticSession,
};
use roomkeep_core::environment::SystemClock;
use roomkeep_runtime::Store;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CheckoutStore = Store<CheckoutState, CheckoutAction, CheckoutEnvironment, CheckoutReducer>;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = CheckoutConfig::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(error) = config.validate() {
        eprintln!("Configuration error: {error}");
        return ExitCode::FAILURE;
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(room_id) = args.first() else {
        eprintln!(
            "usage: roomkeep-checkout <room-id> [full-name check-in check-out [adults [children]]]"
        );
        return ExitCode::FAILURE;
    };

    let gateway = match HttpRoomGateway::new(&config.api_url, config.request_timeout()) {
        Ok(gateway) => gateway,
        Err(error) => {
            eprintln!("Could not create HTTP client: {error}");
            return ExitCode::FAILURE;
        },
    };

    let env = CheckoutEnvironment::new(
        Arc::new(gateway),
        Arc::new(StaticSession::new(config.guest_id.clone())),
        Arc::new(SystemClock),
    )
    .with_notice_ttl(config.notice_ttl());

    let store = Store::new(CheckoutState::new(), CheckoutReducer::new(), env);
    let wait = config.request_timeout() + Duration::from_secs(1);

    match run(&store, RoomId::new(room_id.as_str()), &args[1..], wait).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Checkout stopped: {error}");
            ExitCode::FAILURE
        },
    }
}

async fn run(
    store: &CheckoutStore,
    room_id: RoomId,
    guest: &[String],
    wait: Duration,
) -> Result<bool, roomkeep_runtime::StoreError> {
    println!("=== Checkout for room {room_id} ===\n");

    let mut handle = store
        .send(CheckoutAction::Mount {
            room_id: Some(room_id),
        })
        .await?;
    handle.wait_with_timeout(wait).await?;
    print_step(store, "Mount").await;

    let [name, check_in, check_out, counts @ ..] = guest else {
        return Ok(store.state(|s| s.room.room().is_some()).await);
    };

    let mut edits = vec![
        (DraftField::GuestFullName, name),
        (DraftField::CheckInDate, check_in),
        (DraftField::CheckOutDate, check_out),
    ];
    if let Some(adults) = counts.first() {
        edits.push((DraftField::NumOfAdults, adults));
    }
    if let Some(children) = counts.get(1) {
        edits.push((DraftField::NumOfChildren, children));
    }
    for (field, value) in edits {
        store
            .send(CheckoutAction::Edit {
                field,
                value: value.clone(),
            })
            .await?;
    }

    store.send(CheckoutAction::RequestReview).await?;
    print_step(store, "Continue").await;

    if store.state(|s| s.phase != ReservationPhase::Reviewing).await {
        if let Some(message) = store.state(|s| s.validation_result().message).await {
            println!("  {message}");
        }
        return Ok(false);
    }

    let mut handle = store.send(CheckoutAction::Confirm).await?;
    handle.wait_with_timeout(wait).await?;
    print_step(store, "Confirm").await;

    let outcome = store.state(CheckoutState::outcome).await;
    match outcome {
        Some(outcome) => {
            println!("\n{}", outcome.headline());
            match &outcome {
                roomkeep_checkout::BookingOutcome::Confirmed { confirmation_code } => {
                    println!("Confirmation code: {confirmation_code}");
                    Ok(true)
                },
                roomkeep_checkout::BookingOutcome::Failed { reason } => {
                    println!("{reason}");
                    Ok(false)
                },
            }
        },
        None => Ok(false),
    }
}

async fn print_step(store: &CheckoutStore, step: &str) {
    let (panel, phase, charge, notice) = store
        .state(|s| {
            (
                s.room.to_string(),
                s.phase.to_string(),
                s.total_charge(),
                s.notice.as_ref().map(|n| n.message.clone()),
            )
        })
        .await;

    println!(">>> {step}");
    println!("  room:   {panel}");
    println!("  phase:  {phase}");
    println!("  charge: {charge}");
    if let Some(notice) = notice {
        println!("  notice: {notice}");
    }
}
