//! HTTP ingress for events forwarded by the gateway relay.
//!
//! The relay POSTs each platform event as JSON to `/events`, signed with an
//! HMAC-SHA256 of the raw body, and renders the returned acknowledgement
//! back to whoever triggered the event.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Json, Response},
    routing::post,
    Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, error};

use crate::dispatcher::Dispatcher;
use crate::event::{Acknowledgement, InboundEvent};

pub const SIGNATURE_HEADER: &str = "x-relay-signature";

/// Largest event body read before the signature is checked.
const MAX_EVENT_BODY_SIZE: usize = 1024 * 1024;

type HmacSha256 = Hmac<Sha256>;

/// Check a `sha256=<hex>` signature of `payload` in constant time.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Some(signature_hex) = signature.strip_prefix("sha256=") else {
        return false;
    };

    let signature_bytes = match hex::decode(signature_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };

    mac.update(payload);
    mac.verify_slice(&signature_bytes).is_ok()
}

async fn verify_relay_signature(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_EVENT_BODY_SIZE)
        .await
        .map_err(|_| {
            error!("Event body too large or read error");
            StatusCode::PAYLOAD_TOO_LARGE
        })?;

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !verify_signature(&dispatcher.app().config.relay_secret, &bytes, signature) {
        error!("Invalid relay signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let request = Request::from_parts(parts, axum::body::Body::from(bytes));
    Ok(next.run(request).await)
}

async fn events_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(event): Json<InboundEvent>,
) -> Json<Acknowledgement> {
    debug!("Received {} event", event.kind());
    Json(dispatcher.dispatch(event).await)
}

pub fn event_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/events", post(events_handler))
        .route_layer(middleware::from_fn_with_state(
            dispatcher.clone(),
            verify_relay_signature,
        ))
        .with_state(dispatcher)
}
