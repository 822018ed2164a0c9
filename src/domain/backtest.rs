//! Backtest engine: signal → size → exit → P&L for one instrument.
//!
//! The run is a pure function of (bars, config). Signals use data through
//! bar `t`, the sizer shifts them one bar, and the exit machine runs over the
//! shifted positions, so nothing after bar `t` can affect the position held
//! at `t`.

use chrono::NaiveDate;
use log::debug;

use crate::domain::error::VoltraderError;
use crate::domain::exit::{apply_exits, ExitEvent, ExitRule};
use crate::domain::indicator::ewm_vol::simple_returns;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::{is_normalized, normalize_bars, PriceBar};
use crate::domain::position::Direction;
use crate::domain::signal::generate_signals;
use crate::domain::sizing::{lagged_positions, leverage_series, SizingConfig};
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub strategy: StrategyConfig,
    pub sizing: SizingConfig,
    pub exits: ExitRule,
    /// Equity before the first bar; 1.0 reports the curve as growth of one unit.
    pub initial_equity: f64,
    /// Annual rate subtracted from returns in Sharpe and Sortino.
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            strategy: StrategyConfig::default(),
            sizing: SizingConfig::default(),
            exits: ExitRule::default(),
            initial_equity: 1.0,
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    /// Reject out-of-range numeric parameters before any computation.
    pub fn validate(&self) -> Result<(), VoltraderError> {
        let s = &self.strategy;
        if s.uses_trend() {
            if s.fast == 0 {
                return Err(VoltraderError::invalid("fast", "window must be positive"));
            }
            if s.slow == 0 {
                return Err(VoltraderError::invalid("slow", "window must be positive"));
            }
            if s.fast >= s.slow {
                return Err(VoltraderError::invalid(
                    "fast",
                    format!("fast window {} must be shorter than slow window {}", s.fast, s.slow),
                ));
            }
        }
        if s.uses_oscillator() {
            if s.oscillator_lookback == 0 {
                return Err(VoltraderError::invalid(
                    "oscillator_lookback",
                    "lookback must be positive",
                ));
            }
            for (name, value) in [
                ("buy_threshold", s.buy_threshold),
                ("sell_threshold", s.sell_threshold),
            ] {
                if !(0.0..=100.0).contains(&value) {
                    return Err(VoltraderError::invalid(name, "must be between 0 and 100"));
                }
            }
            if s.buy_threshold >= s.sell_threshold {
                return Err(VoltraderError::invalid(
                    "buy_threshold",
                    "must be below sell_threshold",
                ));
            }
        }

        let z = &self.sizing;
        if !(z.vol_target.is_finite() && z.vol_target > 0.0) {
            return Err(VoltraderError::invalid("vol_target", "must be positive"));
        }
        if z.vol_span == 0 {
            return Err(VoltraderError::invalid("vol_span", "span must be positive"));
        }
        if !(z.leverage_cap.is_finite() && z.leverage_cap > 0.0) {
            return Err(VoltraderError::invalid("leverage_cap", "must be positive"));
        }

        let e = &self.exits;
        if e.atr_lookback == 0 {
            return Err(VoltraderError::invalid("atr_lookback", "lookback must be positive"));
        }
        for (name, multiple) in [
            ("stop_multiple", e.stop_multiple),
            ("take_profit_multiple", e.take_profit_multiple),
        ] {
            if let Some(m) = multiple {
                if !(m.is_finite() && m > 0.0) {
                    return Err(VoltraderError::invalid(name, "must be positive"));
                }
            }
        }

        if !(self.initial_equity.is_finite() && self.initial_equity > 0.0) {
            return Err(VoltraderError::invalid("initial_equity", "must be positive"));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(VoltraderError::invalid("risk_free_rate", "must be finite"));
        }
        Ok(())
    }

    /// Parameter/value pairs describing this run, for reports.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let s = &self.strategy;
        let mut params = vec![("strategy", s.kind.to_string())];
        if s.uses_trend() {
            params.push(("fast", s.fast.to_string()));
            params.push(("slow", s.slow.to_string()));
        }
        if s.uses_oscillator() {
            params.push(("oscillator_lookback", s.oscillator_lookback.to_string()));
            params.push(("buy_threshold", s.buy_threshold.to_string()));
            params.push(("sell_threshold", s.sell_threshold.to_string()));
        }
        params.push(("long_only", s.long_only.to_string()));
        params.push(("vol_target", self.sizing.vol_target.to_string()));
        params.push(("vol_span", self.sizing.vol_span.to_string()));
        params.push(("leverage_cap", self.sizing.leverage_cap.to_string()));
        params.push(("atr_lookback", self.exits.atr_lookback.to_string()));
        let optional = |m: Option<f64>| m.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string());
        params.push(("stop_multiple", optional(self.exits.stop_multiple)));
        params.push(("take_profit_multiple", optional(self.exits.take_profit_multiple)));
        params.push(("initial_equity", self.initial_equity.to_string()));
        params.push(("risk_free_rate", self.risk_free_rate.to_string()));
        params
    }
}

/// One row of the per-bar result table.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRecord {
    pub date: NaiveDate,
    pub underlying_return: f64,
    /// Annualized realized volatility; `None` during warm-up.
    pub realized_vol: Option<f64>,
    pub leverage: f64,
    /// Direction decided with data through this bar.
    pub signal: Direction,
    /// Lagged, leverage-scaled position before the exit overlay.
    pub desired_position: f64,
    pub position: f64,
    pub event: ExitEvent,
    /// position × underlying return.
    pub strategy_return: f64,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub rows: Vec<BarRecord>,
    pub metrics: Metrics,
    pub signal_label: String,
    pub initial_equity: f64,
}

impl BacktestResult {
    /// Equity per bar; a run over no bars reports the initial equity alone.
    pub fn equity_curve(&self) -> Vec<f64> {
        if self.rows.is_empty() {
            vec![self.initial_equity]
        } else {
            self.rows.iter().map(|r| r.equity).collect()
        }
    }

    pub fn positions(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.position).collect()
    }

    pub fn signals(&self) -> Vec<Direction> {
        self.rows.iter().map(|r| r.signal).collect()
    }
}

/// Run one backtest. Configuration errors fail before any computation;
/// empty or one-bar input yields a neutral result rather than an error.
pub fn run_backtest(bars: &[PriceBar], config: &BacktestConfig) -> Result<BacktestResult, VoltraderError> {
    config.validate()?;

    let owned;
    let bars = if is_normalized(bars) {
        bars
    } else {
        owned = normalize_bars(bars.to_vec());
        &owned[..]
    };

    debug!(
        "running {} over {} bars",
        config.strategy.label(),
        bars.len()
    );

    let returns = simple_returns(bars);
    let signals = generate_signals(bars, &config.strategy);
    let (vol, leverage) = leverage_series(bars, &config.sizing);
    let desired = lagged_positions(&signals, &leverage);
    let (positions, events) = apply_exits(bars, &desired, &config.exits);

    let mut rows = Vec::with_capacity(bars.len());
    let mut equity = config.initial_equity;
    for (t, bar) in bars.iter().enumerate() {
        let strategy_return = positions[t] * returns[t];
        equity *= 1.0 + strategy_return;
        rows.push(BarRecord {
            date: bar.date,
            underlying_return: returns[t],
            realized_vol: vol.get(t),
            leverage: leverage[t],
            signal: signals[t],
            desired_position: desired[t],
            position: positions[t],
            event: events[t],
            strategy_return,
            equity,
        });
    }

    let strategy_returns: Vec<f64> = rows.iter().map(|r| r.strategy_return).collect();
    let equity_curve: Vec<f64> = rows.iter().map(|r| r.equity).collect();
    let metrics = Metrics::compute(
        &strategy_returns,
        &equity_curve,
        &positions,
        config.initial_equity,
        config.risk_free_rate,
    );

    debug!(
        "finished {}: final equity {:.4}, {} trades",
        config.strategy.label(),
        metrics.final_equity,
        metrics.trade_count
    );

    Ok(BacktestResult {
        rows,
        metrics,
        signal_label: config.strategy.label(),
        initial_equity: config.initial_equity,
    })
}
