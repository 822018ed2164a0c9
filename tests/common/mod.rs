#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use voltrader::domain::backtest::BacktestConfig;
use voltrader::domain::error::VoltraderError;
pub use voltrader::domain::ohlcv::PriceBar;
use voltrader::domain::strategy::{StrategyConfig, StrategyKind};
use voltrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, VoltraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(VoltraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start.is_none_or(|s| b.date >= s))
                    .filter(|b| end.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, VoltraderError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bars on consecutive days with the given closes and a ±1 intraday range.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = date(2020, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            PriceBar::new(
                start + chrono::Duration::days(i as i64),
                c,
                c + 1.0,
                c - 1.0,
                c,
                1000,
            )
        })
        .collect()
}

/// Bars with an explicit intraday half-range around each close.
pub fn bars_with_range(closes: &[f64], half_range: f64) -> Vec<PriceBar> {
    let start = date(2020, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            PriceBar::new(
                start + chrono::Duration::days(i as i64),
                c,
                c + half_range,
                c - half_range,
                c,
                1000,
            )
        })
        .collect()
}

/// Strictly increasing closes with a little alternating wiggle in the step size.
pub fn rising_closes(count: usize, start: f64) -> Vec<f64> {
    let mut price = start;
    (0..count)
        .map(|i| {
            let current = price;
            price += if i % 2 == 0 { 1.0 } else { 0.5 };
            current
        })
        .collect()
}

pub fn trend_config(fast: usize, slow: usize, long_only: bool) -> BacktestConfig {
    BacktestConfig {
        strategy: StrategyConfig {
            fast,
            slow,
            long_only,
            ..StrategyConfig::new(StrategyKind::TrendFollowing)
        },
        ..BacktestConfig::default()
    }
}
