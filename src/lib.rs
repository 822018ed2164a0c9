//! voltrader: single-instrument signal, sizing and exit backtester.
//!
//! Hexagonal architecture: pure pipeline logic in [`domain`], collaborator
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
