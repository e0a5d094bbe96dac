//! tributary-core: Shared plumbing for the tributary reader crates.
//!
//! - `config/` - YAML loading with environment variable interpolation
//! - `metrics/` - `InternalEvent` trait and the `emit!` macro
//! - `tracing` - Subscriber initialization for binaries and tests
//! - `error` - Configuration error types

pub mod config;
pub mod error;
pub mod metrics;
pub mod tracing;

pub use config::{InterpolationResult, interpolate, interpolate_with, load_yaml_file, parse_yaml};
pub use error::ConfigError;
pub use metrics::events::InternalEvent;
pub use tracing::init_tracing;
