//! Concrete adapter implementations for ports.

pub mod cached_data;
pub mod csv_adapter;
pub mod csv_report;
pub mod file_config_adapter;
