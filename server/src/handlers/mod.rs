use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Event;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod accounts;
pub mod archive;
pub mod events;
pub mod people;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "anthill",
    };

    success(payload, "Health check successful").into_response()
}

pub async fn root() -> Redirect {
    Redirect::to("/events/search")
}

/// Looks an event up by its id as it appears in the URL. Ids that are not
/// UUIDs are simply not found.
pub(crate) async fn load_event(state: &AppState, raw_id: &str) -> Result<Event, AppError> {
    let not_found = || AppError::NotFound(format!("Event '{raw_id}' was not found"));
    let id = Uuid::parse_str(raw_id).map_err(|_| not_found())?;
    state.events.find_by_id(id).await?.ok_or_else(not_found)
}
