//! API handlers for Roombook REST endpoints

pub mod assistant;
pub mod availability;
pub mod bookings;
pub mod devices;
pub mod health;
pub mod openapi;
pub mod rooms;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts},
    http::request::Parts,
    Json,
};

use crate::{error::AppError, models::timestamp, scheduling::TimeWindow, AppState};

/// Header carrying the acting employee id, set by the upstream gateway
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Extractor for the acting employee
pub struct Actor(pub i32);

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing X-Actor-Id header".to_string()))?;

        value
            .trim()
            .parse::<i32>()
            .map(Actor)
            .map_err(|_| AppError::Authentication(format!("Invalid X-Actor-Id header: '{}'", value)))
    }
}

/// Unwrap a JSON body, reporting malformed payloads as `BAD_REQUEST`
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Parse a required `[from, to)` pair of `YYYY-MM-DD HH:MM:SS` timestamps
pub(crate) fn parse_window(from: Option<&str>, to: Option<&str>) -> Result<TimeWindow, AppError> {
    let start = timestamp::parse_required("from", from)?;
    let end = timestamp::parse_required("to", to)?;
    TimeWindow::new(start, end).map_err(|e| AppError::BadRequest(e.to_string()))
}
