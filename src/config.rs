use std::env;

use crate::error::AppError;
use crate::pricing::PriceTable;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub store_backend: String,
    pub data_dir: String,
    pub watcher_buffer_size: usize,
    pub prices: PriceTable,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = PriceTable::default();
        let prices = PriceTable {
            short_haul: parse_or_default("PRICE_BASE_SHORT_HAUL", defaults.short_haul)?,
            van_parcel: parse_or_default("PRICE_BASE_VAN_PARCEL", defaults.van_parcel)?,
            pickup_freight: parse_or_default("PRICE_BASE_PICKUP_FREIGHT", defaults.pickup_freight)?,
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            store_backend: env::var("STORE_BACKEND").unwrap_or_else(|_| "sled".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            watcher_buffer_size: parse_or_default("WATCHER_BUFFER_SIZE", 32)?,
            prices,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
