//! HTTP implementation of the room availability gateway.
//!
//! - `GET {base}/rooms/{id}` returns room details. A 404, an empty body,
//!   `null`, or `{}` mean the room does not exist.
//! - `POST {base}/bookings` takes a camelCase [`BookingRequest`] and answers
//!   with `{ "confirmationCode": "..." }` or a bare string.

use crate::gateway::{GatewayError, GatewayResult, RoomAvailabilityGateway};
use crate::types::{BookingRequest, RoomId, RoomReference};
use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::Instrument;

/// Message used when a rejected booking carries no explanation
pub const BOOKING_FALLBACK_MESSAGE: &str = "Error booking room";

/// Room service client over HTTP
#[derive(Clone, Debug)]
pub struct HttpRoomGateway {
    client: Client,
    base_url: String,
}

impl HttpRoomGateway {
    /// Create a client for the service at `base_url`
    ///
    /// Every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport_error(error: &reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Transport("Request timed out".to_string())
    } else {
        GatewayError::Transport(error.to_string())
    }
}

/// Interpret a successful room lookup body
fn parse_room(body: &str) -> GatewayResult<RoomReference> {
    if body.trim().is_empty() {
        return Err(GatewayError::NotFound);
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::Transport(format!("Invalid room data: {e}")))?;

    match &value {
        Value::Null => Err(GatewayError::NotFound),
        Value::Object(fields) if fields.is_empty() => Err(GatewayError::NotFound),
        _ => serde_json::from_value(value)
            .map_err(|e| GatewayError::Transport(format!("Invalid room data: {e}"))),
    }
}

/// Pull a confirmation code out of a successful booking body
fn parse_confirmation(body: &str) -> GatewayResult<String> {
    let code = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => fields
            .get("confirmationCode")
            .and_then(Value::as_str)
            .map(str::to_string),
        Ok(Value::String(code)) => Some(code),
        Ok(_) => None,
        Err(_) => Some(body.to_string()),
    };

    code.map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            GatewayError::Transport("Booking response carried no confirmation code".to_string())
        })
}

/// Message to show for a rejected booking
fn rejection_reason(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| match value {
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::String(message) => Some(message),
        _ => None,
    });

    let reason = from_json.unwrap_or_else(|| body.to_string());
    let reason = reason.trim();

    if reason.is_empty() {
        BOOKING_FALLBACK_MESSAGE.to_string()
    } else {
        reason.to_string()
    }
}

impl RoomAvailabilityGateway for HttpRoomGateway {
    fn fetch_room(&self, room_id: RoomId) -> BoxFuture<'static, GatewayResult<RoomReference>> {
        let client = self.client.clone();
        let url = self.url(&format!("/rooms/{room_id}"));
        let span = tracing::info_span!("fetch_room", room_id = %room_id);

        Box::pin(
            async move {
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| transport_error(&e))?;

                match response.status() {
                    StatusCode::NOT_FOUND => {
                        tracing::debug!("Room service answered 404");
                        Err(GatewayError::NotFound)
                    },
                    status if status.is_success() => {
                        let body = response.text().await.map_err(|e| transport_error(&e))?;
                        parse_room(&body)
                    },
                    status => {
                        let body = response.text().await.unwrap_or_default();
                        tracing::warn!(status = status.as_u16(), body = %body, "Room lookup failed");
                        Err(GatewayError::Transport(format!(
                            "Room service returned {}",
                            status.as_u16()
                        )))
                    },
                }
            }
            .instrument(span),
        )
    }

    fn submit_booking(&self, request: BookingRequest) -> BoxFuture<'static, GatewayResult<String>> {
        let client = self.client.clone();
        let url = self.url("/bookings");
        let span = tracing::info_span!("submit_booking", room_id = %request.room_id);

        Box::pin(
            async move {
                let response = client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| transport_error(&e))?;

                let status = response.status();
                let body = response.text().await.map_err(|e| transport_error(&e))?;

                if status.is_success() {
                    parse_confirmation(&body)
                } else {
                    let reason = rejection_reason(&body);
                    tracing::warn!(status = status.as_u16(), reason = %reason, "Booking rejected");
                    Err(GatewayError::Rejected { reason })
                }
            }
            .instrument(span),
        )
    }
}
