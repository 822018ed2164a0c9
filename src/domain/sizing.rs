//! Volatility-targeting position sizing.
//!
//! leverage[t] = min(vol_target / (realized_vol[t] + eps), cap), or 0 while
//! realized volatility is undefined. The desired position for bar `t` is the
//! signal decided at `t-1` scaled by the leverage known at `t-1`. This is the
//! single bar of execution lag in the whole pipeline.

use crate::domain::indicator::{calculate_ewm_vol, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;
use crate::domain::position::Direction;

/// Guards the leverage division as realized volatility approaches zero.
pub const VOL_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct SizingConfig {
    /// Annualized volatility target, e.g. 0.15 for 15%.
    pub vol_target: f64,
    /// EWMA span for realized volatility.
    pub vol_span: usize,
    pub leverage_cap: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        SizingConfig {
            vol_target: 0.15,
            vol_span: 20,
            leverage_cap: 5.0,
        }
    }
}

/// Leverage for one bar's realized volatility.
pub fn leverage_for(realized_vol: Option<f64>, config: &SizingConfig) -> f64 {
    match realized_vol {
        Some(vol) if vol.is_finite() && vol >= 0.0 => {
            let raw = config.vol_target / (vol + VOL_EPSILON);
            if raw.is_finite() {
                raw.min(config.leverage_cap).max(0.0)
            } else {
                config.leverage_cap.max(0.0)
            }
        }
        _ => 0.0,
    }
}

/// Realized volatility series and the leverage derived from it, per bar.
pub fn leverage_series(bars: &[PriceBar], config: &SizingConfig) -> (IndicatorSeries, Vec<f64>) {
    let vol = calculate_ewm_vol(bars, config.vol_span);
    let leverage = (0..vol.len())
        .map(|i| leverage_for(vol.get(i), config))
        .collect();
    (vol, leverage)
}

/// desired[t] = signal[t-1] × leverage[t-1]; desired[0] = 0.
pub fn lagged_positions(signals: &[Direction], leverage: &[f64]) -> Vec<f64> {
    let n = signals.len().min(leverage.len());
    let mut out = Vec::with_capacity(n);
    for t in 0..n {
        if t == 0 {
            out.push(0.0);
        } else {
            out.push(signals[t - 1].sign() * leverage[t - 1]);
        }
    }
    out
}
