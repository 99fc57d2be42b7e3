//! Concrete implementations of the port traits plus the persistence
//! adapters (artifacts, reports, prediction log).

pub mod artifact_store;
pub mod bybit_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod prediction_log;
pub mod report_adapter;

#[cfg(feature = "web")]
pub mod web;
