pub mod api;
pub mod config;
pub mod distance;
pub mod error;
pub mod geo;
pub mod models;
pub mod observability;
pub mod pricing;
pub mod relay;
pub mod state;
pub mod store;
