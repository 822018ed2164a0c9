//! Average True Range over raw high/low/close.
//!
//! TR[0] = high - low, TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR is Wilder-smoothed (alpha = 1/n) and seeded with TR[0].
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: bars
                .iter()
                .map(|b| IndicatorSeries::invalid_point(b.date))
                .collect(),
        };
    }

    let alpha = 1.0 / period as f64;
    let mut results: Vec<IndicatorPoint> = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };

        atr = if i == 0 { tr } else { atr + alpha * (tr - atr) };

        if i + 1 < period {
            results.push(IndicatorSeries::invalid_point(bar.date));
        } else {
            results.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: atr,
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: results,
    }
}
