pub mod memory;
pub mod sled;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::ValidationError;
use crate::models::request::{RequestDraft, ServiceRequest};

pub const TRACKING_CODE_LEN: usize = 10;

// Collisions in a 62^10 space are vanishingly rare, so a handful of retries
// is already more than a backend should ever need.
pub(crate) const CODE_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no service request matches tracking code {0}")]
    NotFound(String),

    #[error("could not allocate a unique tracking code after {0} attempts")]
    CodeSpaceExhausted(u32),

    #[error("storage unavailable: {0}")]
    Persistence(String),
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    // Validates the draft, allocates an id and a unique tracking code, and
    // persists the new request atomically.
    async fn create(&self, draft: RequestDraft) -> Result<ServiceRequest, StoreError>;

    async fn find_by_code(&self, tracking_code: &str) -> Result<ServiceRequest, StoreError>;

    async fn update_position(
        &self,
        tracking_code: &str,
        latitude: Decimal,
        longitude: Decimal,
    ) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

pub fn generate_tracking_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TRACKING_CODE_LEN)
        .map(char::from)
        .collect()
}
