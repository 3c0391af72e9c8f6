//! Portal Common Library
//!
//! Shared code for the academic portal backend including:
//! - Name normalization used to join the unkeyed JSON exports
//! - Source ingestion and the reconciled in-memory dataset
//! - The owned data store with guarded, atomically persisted writes
//! - Profile, ranking, dashboard and collaboration views
//! - Error types, configuration, and metrics

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod errors;
pub mod metrics;
pub mod network;
pub mod normalize;
pub mod profile;
pub mod ranking;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use dataset::Dataset;
pub use errors::{AppError, Result};
pub use store::DataStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of projects returned by the top-projects ranking
pub const DEFAULT_TOP_PROJECTS: usize = 50;

/// Default length of the objective preview shown on profile cards
pub const DEFAULT_OBJECTIVE_PREVIEW: usize = 300;
