//! E-invoicing readiness analysis and the report service built around it.

pub mod analysis;
pub mod config;
pub mod error;
pub mod reports;
pub mod telemetry;
