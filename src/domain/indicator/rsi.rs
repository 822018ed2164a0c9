//! RSI (Relative Strength Index) over adjusted closes.
//!
//! Uses Wilder's smoothing, an exponential average with alpha = 1/n seeded
//! with the first price change:
//! - avg = prev_avg + (current - prev_avg) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 (this includes a flat series).
//!
//! Warmup: first n bars are invalid (need n price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: bars
                .iter()
                .map(|b| IndicatorSeries::invalid_point(b.date))
                .collect(),
        };
    }

    let alpha = 1.0 / period as f64;
    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorSeries::invalid_point(bars[0].date));

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..bars.len() {
        let change = bars[i].adj_close - bars[i - 1].adj_close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i == 1 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain += alpha * (gain - avg_gain);
            avg_loss += alpha * (loss - avg_loss);
        }

        if i < period {
            values.push(IndicatorSeries::invalid_point(bars[i].date));
            continue;
        }

        values.push(IndicatorPoint {
            date: bars[i].date,
            valid: true,
            value: oscillator(avg_gain, avg_loss),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn oscillator(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
