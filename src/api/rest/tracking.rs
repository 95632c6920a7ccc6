use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::patch;
use axum::Json;
use axum::Router;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/services/:code/location", patch(update_location))
}

// Position report from the driver's device. Coordinates ride as JSON
// numbers, unlike the string-typed decimals in the creation payload.
#[derive(Deserialize)]
pub struct PositionReport {
    #[serde(with = "rust_decimal::serde::float")]
    pub latitude: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub longitude: Decimal,
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(payload): Json<PositionReport>,
) -> Result<StatusCode, AppError> {
    state
        .relay
        .publish_position(&code, payload.latitude, payload.longitude)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
