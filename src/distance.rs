use async_trait::async_trait;
use thiserror::Error;

use crate::geo::{haversine_km, GeoPoint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistanceError {
    #[error("distance unavailable: {0}")]
    Unavailable(String),
}

// Resolves the route distance between the endpoints of a delivery. A routing
// integration and the deterministic test double both live behind this trait
// so the quote path never depends on a live network.
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    async fn route_distance_km(
        &self,
        pickup: GeoPoint,
        dropoff: GeoPoint,
    ) -> Result<f64, DistanceError>;
}

pub struct GreatCircle;

#[async_trait]
impl DistanceProvider for GreatCircle {
    async fn route_distance_km(
        &self,
        pickup: GeoPoint,
        dropoff: GeoPoint,
    ) -> Result<f64, DistanceError> {
        if !pickup.is_finite() || !dropoff.is_finite() {
            return Err(DistanceError::Unavailable(
                "coordinates are not finite".to_string(),
            ));
        }

        Ok(haversine_km(&pickup, &dropoff))
    }
}

pub struct FixedDistance(pub f64);

#[async_trait]
impl DistanceProvider for FixedDistance {
    async fn route_distance_km(
        &self,
        _pickup: GeoPoint,
        _dropoff: GeoPoint,
    ) -> Result<f64, DistanceError> {
        Ok(self.0)
    }
}
