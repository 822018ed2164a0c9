//! Technical indicator implementations.
//!
//! Every indicator is a stateless transform of a bar sequence into an
//! [`IndicatorSeries`] aligned 1:1 with the input bars. Points inside the
//! warm-up window carry `valid = false` and must not be read as zero.

pub mod sma;
pub mod rsi;
pub mod atr;
pub mod ewm_vol;

use chrono::NaiveDate;
use std::fmt;

pub use atr::calculate_atr;
pub use ewm_vol::calculate_ewm_vol;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Atr(usize),
    /// Annualized exponentially weighted volatility of returns, keyed by span.
    EwmVol(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at bar `i`, or `None` while warming up or out of range.
    pub fn get(&self, i: usize) -> Option<f64> {
        self.values
            .get(i)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }

    pub(crate) fn invalid_point(date: NaiveDate) -> IndicatorPoint {
        IndicatorPoint {
            date,
            valid: false,
            value: 0.0,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::EwmVol(span) => write!(f, "EWMVOL({})", span),
        }
    }
}
