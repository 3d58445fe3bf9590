pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod headers;
pub mod layers;
pub mod logger;
pub mod models;
pub mod record;
pub mod sinks;
pub mod utils;
