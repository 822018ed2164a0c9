//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Determinism: identical inputs give identical results
//! 2. No lookahead: changing bars after T never changes positions up to T
//! 3. Leverage bound: leverage and position magnitude never exceed the cap
//! 4. Exit latching: after a stop or target the position stays flat until
//!    the desired direction changes

mod common;

use common::*;
use proptest::prelude::*;
use voltrader::domain::backtest::{run_backtest, BacktestConfig};
use voltrader::domain::exit::{ExitEvent, ExitRule};
use voltrader::domain::position::Direction;
use voltrader::domain::strategy::{StrategyConfig, StrategyKind};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Closes from a multiplicative random walk starting at 100.
fn arb_closes(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.04..0.04_f64, min_len..max_len).prop_map(|steps| {
        let mut price = 100.0;
        steps
            .into_iter()
            .map(|r| {
                price *= 1.0 + r;
                price
            })
            .collect()
    })
}

fn arb_kind() -> impl Strategy<Value = StrategyKind> {
    prop_oneof![
        Just(StrategyKind::TrendFollowing),
        Just(StrategyKind::MeanReversion),
        Just(StrategyKind::Composite),
    ]
}

fn arb_config() -> impl Strategy<Value = BacktestConfig> {
    (
        arb_kind(),
        2usize..8,
        10usize..25,
        3usize..15,
        any::<bool>(),
        0.5..6.0_f64,
        prop::option::of(0.5..4.0_f64),
        prop::option::of(0.5..4.0_f64),
    )
        .prop_map(|(kind, fast, slow, lookback, long_only, cap, stop, target)| {
            let mut config = BacktestConfig {
                strategy: StrategyConfig {
                    fast,
                    slow,
                    oscillator_lookback: lookback,
                    long_only,
                    ..StrategyConfig::new(kind)
                },
                exits: ExitRule {
                    atr_lookback: 5,
                    stop_multiple: stop,
                    take_profit_multiple: target,
                },
                ..BacktestConfig::default()
            };
            config.sizing.leverage_cap = cap;
            config
        })
}

proptest! {
    #[test]
    fn identical_inputs_identical_results(closes in arb_closes(2, 120), config in arb_config()) {
        let bars = bars_from_closes(&closes);
        let a = run_backtest(&bars, &config).unwrap();
        let b = run_backtest(&bars, &config).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn future_bars_do_not_change_past_positions(
        closes in arb_closes(30, 120),
        cut in 0.0..1.0_f64,
        shock in prop::collection::vec(0.5..1.5_f64, 120),
        config in arb_config(),
    ) {
        let t = ((closes.len() - 1) as f64 * cut) as usize;
        let original = bars_from_closes(&closes);

        let mut perturbed_closes = closes.clone();
        for (i, c) in perturbed_closes.iter_mut().enumerate().skip(t + 1) {
            *c *= shock[i];
        }
        let perturbed = bars_from_closes(&perturbed_closes);

        let a = run_backtest(&original, &config).unwrap();
        let b = run_backtest(&perturbed, &config).unwrap();
        for i in 0..=t {
            prop_assert_eq!(a.rows[i].position, b.rows[i].position);
            prop_assert_eq!(a.rows[i].equity, b.rows[i].equity);
        }
    }

    #[test]
    fn leverage_never_exceeds_cap(closes in arb_closes(2, 150), config in arb_config()) {
        let cap = config.sizing.leverage_cap;
        let result = run_backtest(&bars_from_closes(&closes), &config).unwrap();
        for row in &result.rows {
            prop_assert!(row.leverage >= 0.0 && row.leverage <= cap);
            prop_assert!(row.position.abs() <= cap);
        }
    }

    #[test]
    fn constant_prices_hit_cap_without_overflow(len in 2usize..60, cap in 0.5..10.0_f64) {
        let mut config = BacktestConfig::default();
        config.sizing.leverage_cap = cap;
        let result = run_backtest(&bars_from_closes(&vec![50.0; len]), &config).unwrap();
        for row in &result.rows[1..] {
            prop_assert_eq!(row.leverage, cap);
        }
    }

    #[test]
    fn exits_latch_until_desired_direction_changes(
        closes in arb_closes(30, 150),
        config in arb_config(),
    ) {
        let result = run_backtest(&bars_from_closes(&closes), &config).unwrap();
        let rows = &result.rows;

        for (i, row) in rows.iter().enumerate() {
            if !matches!(row.event, ExitEvent::StopLoss | ExitEvent::TakeProfit) {
                continue;
            }
            prop_assert_eq!(row.position, 0.0);
            let left = Direction::of(row.desired_position);
            prop_assert!(!left.is_flat());
            for later in &rows[i + 1..] {
                if Direction::of(later.desired_position) != left {
                    break;
                }
                prop_assert_eq!(later.position, 0.0);
            }
        }
    }

    #[test]
    fn positions_follow_desired_direction_or_flat(
        closes in arb_closes(2, 120),
        config in arb_config(),
    ) {
        let result = run_backtest(&bars_from_closes(&closes), &config).unwrap();
        for row in &result.rows {
            prop_assert!(row.position == 0.0 || row.position == row.desired_position);
        }
    }
}
