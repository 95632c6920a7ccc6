use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::models::request::{RequestDraft, ServiceRequest, COORD_DECIMALS};
use crate::store::{generate_tracking_code, RequestStore, StoreError, CODE_ATTEMPTS};

// Keeps everything in a tracking-code keyed map. Used by the test harness
// and for running without a data directory.
pub struct MemoryStore {
    requests: DashMap<String, ServiceRequest>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create(&self, draft: RequestDraft) -> Result<ServiceRequest, StoreError> {
        let validated = draft.validate()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        for _ in 0..CODE_ATTEMPTS {
            let code = generate_tracking_code();
            let request = validated.clone().into_request(id, code.clone());

            // The entry guard keeps check-and-insert atomic under
            // concurrent creates.
            match self.requests.entry(code) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(request.clone());
                    return Ok(request);
                }
            }
        }

        Err(StoreError::CodeSpaceExhausted(CODE_ATTEMPTS))
    }

    async fn find_by_code(&self, tracking_code: &str) -> Result<ServiceRequest, StoreError> {
        self.requests
            .get(tracking_code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(tracking_code.to_string()))
    }

    async fn update_position(
        &self,
        tracking_code: &str,
        latitude: Decimal,
        longitude: Decimal,
    ) -> Result<(), StoreError> {
        let mut request = self
            .requests
            .get_mut(tracking_code)
            .ok_or_else(|| StoreError::NotFound(tracking_code.to_string()))?;

        request.current_latitude = Some(latitude.round_dp(COORD_DECIMALS));
        request.current_longitude = Some(longitude.round_dp(COORD_DECIMALS));
        request.position_updated_at = Some(Utc::now());

        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.requests.len() as u64)
    }
}
