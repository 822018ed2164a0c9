//! Signal policy: indicator values to a decided direction per bar.
//!
//! The signal at bar `t` reads indicator values at `t` and earlier only.
//! It is the *decided* exposure for `t`; the one-bar execution lag is
//! applied by the sizer, never here.

use crate::domain::indicator::{calculate_rsi, calculate_sma, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;
use crate::domain::position::Direction;
use crate::domain::strategy::{StrategyConfig, StrategyKind};

/// Decided direction for every bar of `bars` under `config`.
pub fn generate_signals(bars: &[PriceBar], config: &StrategyConfig) -> Vec<Direction> {
    match config.kind {
        StrategyKind::TrendFollowing => {
            let fast = calculate_sma(bars, config.fast);
            let slow = calculate_sma(bars, config.slow);
            trend_signals(&fast, &slow, config.long_only)
        }
        StrategyKind::MeanReversion => {
            let rsi = calculate_rsi(bars, config.oscillator_lookback);
            let osc: Vec<Option<f64>> = (0..rsi.len()).map(|i| rsi.get(i)).collect();
            latch_signals(
                &osc,
                config.buy_threshold,
                config.sell_threshold,
                config.long_only,
            )
        }
        StrategyKind::Composite => {
            let fast = calculate_sma(bars, config.fast);
            let slow = calculate_sma(bars, config.slow);
            let rsi = calculate_rsi(bars, config.oscillator_lookback);
            composite_signals(
                &fast,
                &slow,
                &rsi,
                config.buy_threshold,
                config.sell_threshold,
            )
        }
    }
}

/// Bullish regime flag per bar; `None` while either average is warming up.
fn regime(fast: &IndicatorSeries, slow: &IndicatorSeries, i: usize) -> Option<bool> {
    match (fast.get(i), slow.get(i)) {
        (Some(f), Some(s)) => Some(f > s),
        _ => None,
    }
}

/// Long while fast > slow, otherwise short (flat when long-only).
/// Flat while either average is undefined.
pub fn trend_signals(
    fast: &IndicatorSeries,
    slow: &IndicatorSeries,
    long_only: bool,
) -> Vec<Direction> {
    let bearish = if long_only {
        Direction::Flat
    } else {
        Direction::Short
    };

    (0..fast.len().min(slow.len()))
        .map(|i| match regime(fast, slow, i) {
            Some(true) => Direction::Long,
            Some(false) => bearish,
            None => Direction::Flat,
        })
        .collect()
}

/// Two-threshold hysteresis over an oscillator.
///
/// Below `buy` latches long; above `sell` latches short (flat when
/// long-only); anything between, or an undefined value, holds the last
/// decision. Starts flat.
pub fn latch_signals(osc: &[Option<f64>], buy: f64, sell: f64, long_only: bool) -> Vec<Direction> {
    let exit_to = if long_only {
        Direction::Flat
    } else {
        Direction::Short
    };

    let mut held = Direction::Flat;
    osc.iter()
        .map(|value| {
            match value {
                Some(v) if *v < buy => held = Direction::Long,
                Some(v) if *v > sell => held = exit_to,
                _ => {}
            }
            held
        })
        .collect()
}

/// Long only while the trend regime is bullish and the oscillator is below
/// `buy`; exits when the regime turns bearish or the oscillator rises above
/// `sell`. Latches between triggers. Never short.
pub fn composite_signals(
    fast: &IndicatorSeries,
    slow: &IndicatorSeries,
    osc: &IndicatorSeries,
    buy: f64,
    sell: f64,
) -> Vec<Direction> {
    let n = fast.len().min(slow.len()).min(osc.len());
    let mut held = Direction::Flat;

    (0..n)
        .map(|i| {
            let bullish = regime(fast, slow, i);
            let value = osc.get(i);

            if held == Direction::Long {
                let bearish = bullish == Some(false);
                let overbought = value.is_some_and(|v| v > sell);
                if bearish || overbought {
                    held = Direction::Flat;
                }
            } else if bullish == Some(true) && value.is_some_and(|v| v < buy) {
                held = Direction::Long;
            }
            held
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{IndicatorPoint, IndicatorType};
    use chrono::NaiveDate;

    fn series(values: &[Option<f64>]) -> IndicatorSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        IndicatorSeries {
            indicator_type: IndicatorType::Sma(1),
            values: values
                .iter()
                .enumerate()
                .map(|(i, v)| IndicatorPoint {
                    date: base + chrono::Duration::days(i as i64),
                    valid: v.is_some(),
                    value: v.unwrap_or(0.0),
                })
                .collect(),
        }
    }

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(base + chrono::Duration::days(i as i64), c, c, c, c, 1))
            .collect()
    }

    use Direction::{Flat, Long, Short};

    #[test]
    fn trend_long_when_fast_above_slow() {
        let fast = series(&[None, Some(11.0), Some(9.0), Some(12.0)]);
        let slow = series(&[None, Some(10.0), Some(10.0), Some(10.0)]);
        assert_eq!(trend_signals(&fast, &slow, false), vec![Flat, Long, Short, Long]);
        assert_eq!(trend_signals(&fast, &slow, true), vec![Flat, Long, Flat, Long]);
    }

    #[test]
    fn trend_equal_averages_are_bearish() {
        let fast = series(&[Some(10.0)]);
        let slow = series(&[Some(10.0)]);
        assert_eq!(trend_signals(&fast, &slow, false), vec![Short]);
    }

    #[test]
    fn latch_holds_between_thresholds() {
        let osc = [
            None,
            Some(50.0),
            Some(25.0),
            Some(45.0),
            Some(65.0),
            Some(75.0),
            Some(50.0),
            Some(35.0),
            Some(29.0),
        ];
        assert_eq!(
            latch_signals(&osc, 30.0, 70.0, true),
            vec![Flat, Flat, Long, Long, Long, Flat, Flat, Flat, Long]
        );
        assert_eq!(
            latch_signals(&osc, 30.0, 70.0, false),
            vec![Flat, Flat, Long, Long, Long, Short, Short, Short, Long]
        );
    }

    #[test]
    fn latch_thresholds_are_strict() {
        let osc = [Some(30.0), Some(70.0), Some(29.999)];
        assert_eq!(latch_signals(&osc, 30.0, 70.0, true), vec![Flat, Flat, Long]);
    }

    #[test]
    fn latch_undefined_holds() {
        let osc = [Some(10.0), None, None];
        assert_eq!(latch_signals(&osc, 30.0, 70.0, true), vec![Long, Long, Long]);
    }

    #[test]
    fn composite_requires_both_conditions() {
        let fast = series(&[Some(9.0), Some(11.0), Some(11.0), Some(11.0), Some(11.0), Some(9.0)]);
        let slow = series(&[Some(10.0); 6]);
        let osc = series(&[Some(20.0), Some(50.0), Some(20.0), Some(50.0), Some(50.0), Some(50.0)]);
        // bar 0: bearish; bar 1: bullish but neutral osc; bar 2: entry;
        // bars 3-4 latch; bar 5 regime turns bearish → exit
        assert_eq!(
            composite_signals(&fast, &slow, &osc, 30.0, 70.0),
            vec![Flat, Flat, Long, Long, Long, Flat]
        );
    }

    #[test]
    fn composite_exits_on_overbought() {
        let fast = series(&[Some(11.0); 4]);
        let slow = series(&[Some(10.0); 4]);
        let osc = series(&[Some(20.0), Some(75.0), Some(50.0), Some(20.0)]);
        assert_eq!(
            composite_signals(&fast, &slow, &osc, 30.0, 70.0),
            vec![Long, Flat, Flat, Long]
        );
    }

    #[test]
    fn generate_trend_on_rising_prices() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let config = StrategyConfig {
            fast: 5,
            slow: 20,
            ..StrategyConfig::new(StrategyKind::TrendFollowing)
        };
        let signals = generate_signals(&make_bars(&prices), &config);
        assert_eq!(signals.len(), 30);
        assert!(signals[..19].iter().all(|d| *d == Flat));
        assert!(signals[19..].iter().all(|d| *d == Long));
    }

    #[test]
    fn generate_is_prefix_stable() {
        let prices: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i * 13) % 17) as f64 - 8.0)
            .collect();
        let bars = make_bars(&prices);
        let config = StrategyConfig {
            oscillator_lookback: 5,
            ..StrategyConfig::new(StrategyKind::MeanReversion)
        };
        let full = generate_signals(&bars, &config);
        let head = generate_signals(&bars[..40], &config);
        assert_eq!(&full[..40], &head[..]);
    }
}
