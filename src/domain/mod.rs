//! Core domain types and pipeline logic.

pub mod ohlcv;
pub mod position;
pub mod indicator;
pub mod strategy;
pub mod signal;
pub mod sizing;
pub mod exit;
pub mod backtest;
pub mod metrics;
pub mod batch;
pub mod config_validation;
pub mod error;
