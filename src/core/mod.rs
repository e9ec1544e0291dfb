//! Configuration, secrets and request/response models

pub mod config;
pub mod models;
pub mod secrets;

pub use config::AppConfig;
