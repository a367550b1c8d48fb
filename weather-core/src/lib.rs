//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - The `TemperatureProvider` abstraction and its HTTP-backed implementations
//! - `MultiProvider`, which queries providers concurrently and averages their readings
//! - Configuration & credentials handling
//! - Shared domain models and error types
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod combine;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use aggregate::{AggregationPolicy, MultiProvider};
pub use config::{AggregationConfig, Config, ProviderConfig};
pub use error::{AggregateError, ProviderError, ProviderErrorKind};
pub use model::{Kelvin, TemperatureReport};
pub use provider::{ProviderId, TemperatureProvider};
