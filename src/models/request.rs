use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;

pub const COORD_DECIMALS: u32 = 6;
pub const PRICE_DECIMALS: u32 = 2;

const MIN_NAME_LEN: usize = 2;
const MIN_PHONE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTier {
    ShortHaul,
    VanParcel,
    PickupFreight,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown service tier: {0}, expected short_haul/van_parcel/pickup_freight")]
pub struct UnknownTier(pub String);

impl FromStr for ServiceTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_haul" => Ok(ServiceTier::ShortHaul),
            "van_parcel" => Ok(ServiceTier::VanParcel),
            "pickup_freight" => Ok(ServiceTier::PickupFreight),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceTier::ShortHaul => "short_haul",
            ServiceTier::VanParcel => "van_parcel",
            ServiceTier::PickupFreight => "pickup_freight",
        };
        f.write_str(name)
    }
}

// Only Pending is ever assigned today; the later states exist so advancing
// a request stays an additive change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InTransit,
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub tracking_code: String,
    pub service_tier: ServiceTier,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub notes: Option<String>,
    pub pickup_latitude: Decimal,
    pub pickup_longitude: Decimal,
    pub dropoff_latitude: Decimal,
    pub dropoff_longitude: Decimal,
    pub estimated_price: Decimal,
    pub status: RequestStatus,
    pub current_latitude: Option<Decimal>,
    pub current_longitude: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub position_updated_at: Option<DateTime<Utc>>,
}

// Creation payload as the request form submits it. Decimal-valued fields
// arrive as strings and are checked server-side regardless of any client
// pre-validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestDraft {
    pub service_tier: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub pickup_address: String,
    pub dropoff_address: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub pickup_latitude: String,
    pub pickup_longitude: String,
    pub dropoff_latitude: String,
    pub dropoff_longitude: String,
    pub estimated_price: String,
}

#[derive(Debug, Clone)]
pub struct ValidatedDraft {
    pub service_tier: ServiceTier,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub notes: Option<String>,
    pub pickup_latitude: Decimal,
    pub pickup_longitude: Decimal,
    pub dropoff_latitude: Decimal,
    pub dropoff_longitude: Decimal,
    pub estimated_price: Decimal,
}

impl RequestDraft {
    pub fn validate(&self) -> Result<ValidatedDraft, ValidationError> {
        let service_tier = self
            .service_tier
            .parse::<ServiceTier>()
            .map_err(|err| ValidationError::new("service_tier", err.to_string()))?;

        let first_name = required_name(&self.first_name, "first_name")?;
        let last_name = required_name(&self.last_name, "last_name")?;

        let phone = self.phone.trim();
        if phone.chars().count() < MIN_PHONE_LEN {
            return Err(ValidationError::new(
                "phone",
                format!("must have at least {MIN_PHONE_LEN} characters"),
            ));
        }

        let pickup_address = required_text(&self.pickup_address, "pickup_address")?;
        let dropoff_address = required_text(&self.dropoff_address, "dropoff_address")?;

        let pickup_latitude = parse_decimal(&self.pickup_latitude, "pickup_latitude")?;
        let pickup_longitude = parse_decimal(&self.pickup_longitude, "pickup_longitude")?;
        let dropoff_latitude = parse_decimal(&self.dropoff_latitude, "dropoff_latitude")?;
        let dropoff_longitude = parse_decimal(&self.dropoff_longitude, "dropoff_longitude")?;
        let estimated_price = parse_decimal(&self.estimated_price, "estimated_price")?;

        Ok(ValidatedDraft {
            service_tier,
            first_name,
            last_name,
            phone: phone.to_string(),
            pickup_address,
            dropoff_address,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_string),
            pickup_latitude: pickup_latitude.round_dp(COORD_DECIMALS),
            pickup_longitude: pickup_longitude.round_dp(COORD_DECIMALS),
            dropoff_latitude: dropoff_latitude.round_dp(COORD_DECIMALS),
            dropoff_longitude: dropoff_longitude.round_dp(COORD_DECIMALS),
            estimated_price: estimated_price.round_dp(PRICE_DECIMALS),
        })
    }
}

impl ValidatedDraft {
    pub fn into_request(self, id: i64, tracking_code: String) -> ServiceRequest {
        ServiceRequest {
            id,
            tracking_code,
            service_tier: self.service_tier,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            pickup_address: self.pickup_address,
            dropoff_address: self.dropoff_address,
            notes: self.notes,
            pickup_latitude: self.pickup_latitude,
            pickup_longitude: self.pickup_longitude,
            dropoff_latitude: self.dropoff_latitude,
            dropoff_longitude: self.dropoff_longitude,
            estimated_price: self.estimated_price,
            status: RequestStatus::Pending,
            current_latitude: None,
            current_longitude: None,
            created_at: Utc::now(),
            position_updated_at: None,
        }
    }
}

fn required_name(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::new(
            field,
            format!("must have at least {MIN_NAME_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn required_text(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn parse_decimal(value: &str, field: &'static str) -> Result<Decimal, ValidationError> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| ValidationError::new(field, "must be a decimal number"))
}
