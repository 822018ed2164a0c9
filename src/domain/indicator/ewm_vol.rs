//! Exponentially weighted realized volatility of adjusted-close returns.
//!
//! Returns: r[0] = 0, r[i] = AdjC[i] / AdjC[i-1] - 1.
//! alpha = 2 / (span + 1), recursive (non-adjusted) weighting. The variance
//! carries the unbiased correction for exponential weights:
//! var = cov * W^2 / (W^2 - W2), W = sum of weights, W2 = sum of squares.
//! Output is annualized by sqrt(252).
//! Warmup: bar 0 is invalid (a single observation has no spread).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Simple returns on adjusted close; the first bar has return 0.
pub fn simple_returns(bars: &[PriceBar]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let r = if i == 0 {
            0.0
        } else {
            let prev = bars[i - 1].adj_close;
            if prev != 0.0 {
                bar.adj_close / prev - 1.0
            } else {
                0.0
            }
        };
        out.push(r);
    }
    out
}

pub fn calculate_ewm_vol(bars: &[PriceBar], span: usize) -> IndicatorSeries {
    let returns = simple_returns(bars);
    let mut values = Vec::with_capacity(bars.len());

    if span == 0 || bars.is_empty() {
        values.extend(bars.iter().map(|b| IndicatorSeries::invalid_point(b.date)));
        return IndicatorSeries {
            indicator_type: IndicatorType::EwmVol(span),
            values,
        };
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut mean = returns[0];
    let mut cov = 0.0;
    let mut sum_wt = 1.0;
    let mut sum_wt2 = 1.0;
    values.push(IndicatorSeries::invalid_point(bars[0].date));

    for (i, &r) in returns.iter().enumerate().skip(1) {
        sum_wt *= decay;
        sum_wt2 *= decay * decay;
        let old_wt = decay;

        let old_mean = mean;
        mean = (old_wt * old_mean + alpha * r) / (old_wt + alpha);
        cov = (old_wt * (cov + (old_mean - mean) * (old_mean - mean))
            + alpha * (r - mean) * (r - mean))
            / (old_wt + alpha);

        sum_wt += alpha;
        sum_wt2 += alpha * alpha;

        let numerator = sum_wt * sum_wt;
        let denominator = numerator - sum_wt2;
        if denominator > 0.0 {
            let variance = (numerator / denominator) * cov;
            values.push(IndicatorPoint {
                date: bars[i].date,
                valid: true,
                value: variance.max(0.0).sqrt() * TRADING_DAYS_PER_YEAR.sqrt(),
            });
        } else {
            values.push(IndicatorSeries::invalid_point(bars[i].date));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::EwmVol(span),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                PriceBar::new(
                    base + chrono::Duration::days(i as i64),
                    close,
                    close,
                    close,
                    close,
                    1000,
                )
            })
            .collect()
    }

    #[test]
    fn returns_first_bar_zero() {
        let r = simple_returns(&make_bars(&[100.0, 110.0, 99.0]));
        assert_eq!(r[0], 0.0);
        assert!((r[1] - 0.10).abs() < 1e-12);
        assert!((r[2] - (-0.10)).abs() < 1e-12);
    }

    #[test]
    fn vol_first_bar_invalid() {
        let series = calculate_ewm_vol(&make_bars(&[100.0, 101.0, 102.0]), 20);
        assert!(!series.values[0].valid);
        assert!(series.values[1].valid);
        assert!(series.values[2].valid);
    }

    #[test]
    fn vol_two_observations_matches_sample_std() {
        // returns [0, 0.1]; with two points the bias-corrected EW variance
        // reduces to the plain sample variance: 0.005
        let series = calculate_ewm_vol(&make_bars(&[100.0, 110.0]), 20);
        let expected = 0.005_f64.sqrt() * 252.0_f64.sqrt();
        assert!((series.get(1).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn vol_constant_prices_is_zero() {
        let series = calculate_ewm_vol(&make_bars(&[100.0; 10]), 5);
        for i in 1..10 {
            assert!(series.get(i).unwrap().abs() < 1e-15);
        }
    }

    #[test]
    fn vol_non_negative() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        let series = calculate_ewm_vol(&make_bars(&prices), 10);
        assert_eq!(series.len(), 60);
        assert_eq!(series.values.iter().filter(|p| p.valid).count(), 59);
        assert!(series.values.iter().filter(|p| p.valid).all(|p| p.value >= 0.0));
    }

    #[test]
    fn vol_empty_and_zero_span() {
        assert!(calculate_ewm_vol(&[], 20).is_empty());
        let series = calculate_ewm_vol(&make_bars(&[1.0, 2.0]), 0);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
