//! Feature store for the recommendation pipeline.
//!
//! Raw interactions and products are aggregated into a per-(user, item)
//! feature table, every feature column is described in a metadata registry,
//! and training runs are recorded once each. The orchestrator drives two
//! operations: [`refresh::FeatureJob::refresh`] and
//! [`runs::ModelRegistry::record_run`].

pub mod config;
pub mod demo;
pub mod entity;
pub mod error;
pub mod features;
pub mod lookup;
pub mod metadata;
pub mod quality;
pub mod raw;
pub mod refresh;
pub mod runs;

pub use error::{StoreError, StoreResult};
