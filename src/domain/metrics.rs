//! Performance metrics over a completed run.

use crate::domain::indicator::ewm_vol::TRADING_DAYS_PER_YEAR;

/// Position changes smaller than this are not counted as trades.
pub const TRADE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metrics {
    pub bars: usize,
    pub total_return: f64,
    pub final_equity: f64,
    pub cagr: f64,
    /// Annualized; 0 when fewer than two bars or zero dispersion.
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub annualized_volatility: f64,
    /// Largest peak-to-trough decline as a negative fraction (0 if none).
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub exposure: f64,
    pub trade_count: usize,
}

impl Metrics {
    /// `returns`, `equity` and `positions` are aligned per bar.
    /// `risk_free_rate` is annual; Sharpe and Sortino use returns in excess of it.
    pub fn compute(
        returns: &[f64],
        equity: &[f64],
        positions: &[f64],
        initial_equity: f64,
        risk_free_rate: f64,
    ) -> Self {
        let n = returns.len();
        let final_equity = equity.last().copied().unwrap_or(initial_equity);

        if n == 0 {
            return Metrics {
                final_equity,
                ..Metrics::default()
            };
        }

        let total_return = if initial_equity > 0.0 {
            final_equity / initial_equity - 1.0
        } else {
            0.0
        };

        let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
        let cagr = if growth > 0.0 && growth.is_finite() {
            growth.powf(TRADING_DAYS_PER_YEAR / n as f64) - 1.0
        } else if growth <= 0.0 {
            -1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity);
        let (sharpe_ratio, sortino_ratio, annualized_volatility) =
            compute_risk_adjusted(returns, risk_free_rate);

        let exposed = positions.iter().filter(|p| **p != 0.0).count();
        let exposure = exposed as f64 / n as f64;

        let trade_count = positions
            .windows(2)
            .filter(|w| (w[1] - w[0]).abs() > TRADE_EPSILON)
            .count();

        Metrics {
            bars: n,
            total_return,
            final_equity,
            cagr,
            sharpe_ratio,
            sortino_ratio,
            annualized_volatility,
            max_drawdown,
            max_drawdown_duration,
            exposure,
            trade_count,
        }
    }
}

fn compute_drawdown(equity: &[f64]) -> (f64, usize) {
    let Some(&first) = equity.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for &value in equity {
        if value >= peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = value / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

/// (sharpe, sortino, annualized volatility) using sample dispersion.
fn compute_risk_adjusted(returns: &[f64], risk_free_rate: f64) -> (f64, f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0, 0.0);
    }

    let rf_daily = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - rf_daily).collect();

    let n = excess.len() as f64;
    let mean: f64 = excess.iter().sum::<f64>() / n;
    let variance: f64 = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

    let sharpe = if stddev > 0.0 {
        (mean * TRADING_DAYS_PER_YEAR) / (stddev * annualizer)
    } else {
        0.0
    };

    let downside: f64 = excess
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r.powi(2))
        .sum::<f64>()
        / n;
    let downside_stddev = downside.sqrt();

    let sortino = if downside_stddev > 0.0 {
        (mean / downside_stddev) * annualizer
    } else {
        0.0
    };

    (sharpe, sortino, stddev * annualizer)
}
