//! Multi-ticker batch runs.
//!
//! Bars are fetched sequentially through the data port, then each ticker's
//! backtest runs on the rayon pool. Runs share no state; a provider failure
//! skips that ticker and the rest of the batch continues.

use chrono::NaiveDate;
use log::{info, warn};
use rayon::prelude::*;

use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::error::VoltraderError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone)]
pub struct TickerRun {
    pub ticker: String,
    pub result: BacktestResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Completed runs, in input order.
    pub runs: Vec<TickerRun>,
    pub skipped: Vec<SkippedTicker>,
}

impl BatchResult {
    pub fn get(&self, ticker: &str) -> Option<&BacktestResult> {
        self.runs
            .iter()
            .find(|r| r.ticker == ticker)
            .map(|r| &r.result)
    }
}

/// Backtest every ticker under one configuration.
///
/// The configuration is validated once up front; an invalid configuration
/// fails the whole batch before any fetch. A ticker whose history is empty
/// still produces the neutral result rather than being skipped.
pub fn run_batch(
    data: &dyn DataPort,
    tickers: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    config: &BacktestConfig,
) -> Result<BatchResult, VoltraderError> {
    config.validate()?;

    let mut fetched: Vec<(String, Vec<PriceBar>)> = Vec::with_capacity(tickers.len());
    let mut skipped = Vec::new();

    for ticker in tickers {
        match data.fetch_bars(ticker, start, end) {
            Ok(bars) => {
                if bars.is_empty() {
                    warn!("{}: no bars in range", ticker);
                } else {
                    info!("{}: {} bars", ticker, bars.len());
                }
                fetched.push((ticker.clone(), bars));
            }
            Err(e) => {
                warn!("skipping {} ({})", ticker, e);
                skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let runs = fetched
        .par_iter()
        .map(|(ticker, bars)| {
            run_backtest(bars, config).map(|result| TickerRun {
                ticker: ticker.clone(),
                result,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !skipped.is_empty() {
        info!(
            "backtested {} of {} tickers",
            runs.len(),
            runs.len() + skipped.len()
        );
    }

    Ok(BatchResult { runs, skipped })
}
