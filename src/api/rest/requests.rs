use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, ValidationError};
use crate::geo::GeoPoint;
use crate::models::request::{RequestDraft, ServiceRequest, ServiceTier};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/quote", post(quote))
        .route("/api/services", post(create_service))
        .route("/api/services/:code", get(get_service))
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub service_tier: String,
    #[serde(default)]
    pub pickup_latitude: Option<String>,
    #[serde(default)]
    pub pickup_longitude: Option<String>,
    #[serde(default)]
    pub dropoff_latitude: Option<String>,
    #[serde(default)]
    pub dropoff_longitude: Option<String>,
}

#[derive(Serialize)]
pub struct QuoteResponse {
    pub service_tier: ServiceTier,
    pub distance_km: Option<f64>,
    pub estimated_price: Decimal,
}

#[derive(Serialize)]
pub struct CreateServiceResponse {
    pub tracking_code: String,
    pub message: &'static str,
}

async fn quote(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let tier = payload.service_tier.parse::<ServiceTier>()?;

    let distance_km = match route_points(&payload)? {
        Some((pickup, dropoff)) => Some(state.distance.route_distance_km(pickup, dropoff).await?),
        None => None,
    };

    Ok(Json(QuoteResponse {
        service_tier: tier,
        distance_km,
        estimated_price: state.prices.estimate(tier, distance_km),
    }))
}

// Coordinates are optional only as a whole group; a quote without them
// prices a single base bracket.
fn route_points(payload: &QuoteRequest) -> Result<Option<(GeoPoint, GeoPoint)>, AppError> {
    let fields = [
        ("pickup_latitude", &payload.pickup_latitude),
        ("pickup_longitude", &payload.pickup_longitude),
        ("dropoff_latitude", &payload.dropoff_latitude),
        ("dropoff_longitude", &payload.dropoff_longitude),
    ];

    if fields.iter().all(|(_, value)| value.is_none()) {
        return Ok(None);
    }

    let mut parsed = [Decimal::ZERO; 4];
    for (slot, (field, value)) in parsed.iter_mut().zip(fields) {
        let Some(raw) = value else {
            return Err(ValidationError::new(
                field,
                "pickup and dropoff coordinates must be provided together",
            )
            .into());
        };

        *slot = raw
            .trim()
            .parse::<Decimal>()
            .map_err(|_| ValidationError::new(field, "must be a decimal number"))?;
    }

    Ok(Some((
        GeoPoint::from_decimal(parsed[0], parsed[1]),
        GeoPoint::from_decimal(parsed[2], parsed[3]),
    )))
}

async fn create_service(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RequestDraft>,
) -> Result<Json<CreateServiceResponse>, AppError> {
    match state.store.create(payload).await {
        Ok(request) => {
            state
                .metrics
                .requests_created_total
                .with_label_values(&["success"])
                .inc();
            info!(
                code = %request.tracking_code,
                tier = %request.service_tier,
                "service request created"
            );

            Ok(Json(CreateServiceResponse {
                tracking_code: request.tracking_code,
                message: "service request created",
            }))
        }
        Err(err) => {
            state
                .metrics
                .requests_created_total
                .with_label_values(&["error"])
                .inc();
            Err(err.into())
        }
    }
}

async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<ServiceRequest>, AppError> {
    let request = state.store.find_by_code(&code).await?;
    Ok(Json(request))
}
