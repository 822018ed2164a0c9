//! Simple Moving Average over adjusted closes.
//!
//! SMA(n)[i] = sum(AdjC[i-j] for j in 0..n) / n
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values: bars
                .iter()
                .map(|b| IndicatorSeries::invalid_point(b.date))
                .collect(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        sum += bar.adj_close;
        if i >= period {
            sum -= bars[i - period].adj_close;
        }

        if i + 1 < period {
            values.push(IndicatorSeries::invalid_point(bar.date));
        } else {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: sum / period as f64,
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
