use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::models::request::{RequestDraft, ServiceRequest, COORD_DECIMALS};
use crate::store::{generate_tracking_code, RequestStore, StoreError, CODE_ATTEMPTS};

const REQUESTS_TREE: &str = "service_requests";

// Embedded on-disk store. Requests live in a tree keyed by tracking code,
// serialized as JSON, so a lookup is a single point read.
pub struct SledStore {
    db: sled::Db,
    requests: sled::Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)
            .map_err(|err| StoreError::Persistence(format!("failed to open database: {err}")))?;
        let requests = db
            .open_tree(REQUESTS_TREE)
            .map_err(|err| StoreError::Persistence(format!("failed to open requests tree: {err}")))?;

        Ok(Self { db, requests })
    }

    fn encode(request: &ServiceRequest) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(request)
            .map_err(|err| StoreError::Persistence(format!("failed to encode request: {err}")))
    }

    fn decode(bytes: &[u8]) -> Result<ServiceRequest, StoreError> {
        serde_json::from_slice(bytes)
            .map_err(|err| StoreError::Persistence(format!("failed to decode request: {err}")))
    }
}

#[async_trait]
impl RequestStore for SledStore {
    async fn create(&self, draft: RequestDraft) -> Result<ServiceRequest, StoreError> {
        let validated = draft.validate()?;
        let id = self
            .db
            .generate_id()
            .map_err(|err| StoreError::Persistence(format!("failed to allocate id: {err}")))?
            as i64;

        for _ in 0..CODE_ATTEMPTS {
            let code = generate_tracking_code();
            let request = validated.clone().into_request(id, code.clone());
            let bytes = Self::encode(&request)?;

            // Insert-if-absent; a concurrent create that wins the same code
            // sends us around for a fresh one.
            let swap = self
                .requests
                .compare_and_swap(code.as_bytes(), None::<&[u8]>, Some(bytes))
                .map_err(|err| StoreError::Persistence(format!("failed to insert request: {err}")))?;

            if swap.is_ok() {
                self.requests.flush_async().await.map_err(|err| {
                    StoreError::Persistence(format!("failed to flush request: {err}"))
                })?;
                return Ok(request);
            }
        }

        Err(StoreError::CodeSpaceExhausted(CODE_ATTEMPTS))
    }

    async fn find_by_code(&self, tracking_code: &str) -> Result<ServiceRequest, StoreError> {
        let bytes = self
            .requests
            .get(tracking_code)
            .map_err(|err| StoreError::Persistence(format!("failed to read request: {err}")))?
            .ok_or_else(|| StoreError::NotFound(tracking_code.to_string()))?;

        Self::decode(&bytes)
    }

    async fn update_position(
        &self,
        tracking_code: &str,
        latitude: Decimal,
        longitude: Decimal,
    ) -> Result<(), StoreError> {
        loop {
            let current = self
                .requests
                .get(tracking_code)
                .map_err(|err| StoreError::Persistence(format!("failed to read request: {err}")))?
                .ok_or_else(|| StoreError::NotFound(tracking_code.to_string()))?;

            let mut request = Self::decode(&current)?;
            request.current_latitude = Some(latitude.round_dp(COORD_DECIMALS));
            request.current_longitude = Some(longitude.round_dp(COORD_DECIMALS));
            request.position_updated_at = Some(Utc::now());
            let bytes = Self::encode(&request)?;

            let swap = self
                .requests
                .compare_and_swap(tracking_code.as_bytes(), Some(&current), Some(bytes))
                .map_err(|err| StoreError::Persistence(format!("failed to update request: {err}")))?;

            if swap.is_ok() {
                return Ok(());
            }
            // Lost the race against another writer for this record; reread
            // and try again.
        }
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.requests.len() as u64)
    }
}
