//! Reliability and cost analytics service for maintenance management
//!
//! Computes MTBF/MTTR, Pareto 80/20 classifications, failure-mode breakdowns,
//! cost summaries with budget variance and next-failure predictions from
//! maintenance event records, and serves them over HTTP.

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod state;

pub use error::{AppError, Result};
