//! ATR stop-loss / take-profit overlay.
//!
//! A pure per-bar transition over [`TradeState`], evaluated in fixed order:
//! 1. desired direction differs from the held one: re-enter (or go flat)
//!    at this bar's close. Always wins over the stop checks.
//! 2. holding with an entry price: a stop (`stop_multiple × ATR` adverse) or
//!    target (`take_profit_multiple × ATR` favorable) breach forces flat.
//! 3. otherwise hold.
//!
//! After a stop or target the machine stays flat until the desired direction
//! changes; it never re-enters the direction it just left.

use crate::domain::indicator::calculate_atr;
use crate::domain::ohlcv::PriceBar;
use crate::domain::position::{Direction, TradeState};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ExitRule {
    pub atr_lookback: usize,
    pub stop_multiple: Option<f64>,
    pub take_profit_multiple: Option<f64>,
}

impl ExitRule {
    pub fn is_pass_through(&self) -> bool {
        self.stop_multiple.is_none() && self.take_profit_multiple.is_none()
    }
}

impl Default for ExitRule {
    fn default() -> Self {
        ExitRule {
            atr_lookback: 14,
            stop_multiple: None,
            take_profit_multiple: None,
        }
    }
}

/// What happened to the held position on a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitEvent {
    #[default]
    Hold,
    /// Desired direction changed and the machine followed it.
    Rebalanced,
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitEvent::Hold => "",
            ExitEvent::Rebalanced => "rebalance",
            ExitEvent::StopLoss => "stop_loss",
            ExitEvent::TakeProfit => "take_profit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub state: TradeState,
    pub position: f64,
    pub event: ExitEvent,
}

fn held_position(state: TradeState, desired: f64) -> f64 {
    if state.direction().is_flat() {
        0.0
    } else {
        desired
    }
}

/// One bar of the exit machine. `atr` is `None` while the ATR is warming up,
/// in which case no threshold is evaluated.
pub fn step(
    state: TradeState,
    desired: f64,
    close: f64,
    atr: Option<f64>,
    rule: &ExitRule,
) -> StepOutcome {
    let want = Direction::of(desired);

    let changed = match state {
        TradeState::Exited { from } => want != from,
        _ => want != state.direction(),
    };
    if changed {
        let next = TradeState::enter(want, close);
        return StepOutcome {
            state: next,
            position: held_position(next, desired),
            event: ExitEvent::Rebalanced,
        };
    }

    if let Some(atr) = atr.filter(|a| a.is_finite()) {
        let stop_hit = rule
            .stop_multiple
            .is_some_and(|m| state.should_stop_loss(close, m * atr));
        let target_hit = rule
            .take_profit_multiple
            .is_some_and(|m| state.should_take_profit(close, m * atr));

        if stop_hit || target_hit {
            return StepOutcome {
                state: TradeState::Exited {
                    from: state.direction(),
                },
                position: 0.0,
                event: if stop_hit {
                    ExitEvent::StopLoss
                } else {
                    ExitEvent::TakeProfit
                },
            };
        }
    }

    StepOutcome {
        state,
        position: held_position(state, desired),
        event: ExitEvent::Hold,
    }
}

/// Run the exit machine over a whole series of desired positions.
///
/// Returns the executed position and event per bar. With no multiples
/// configured the desired positions pass through unchanged.
pub fn apply_exits(bars: &[PriceBar], desired: &[f64], rule: &ExitRule) -> (Vec<f64>, Vec<ExitEvent>) {
    let n = bars.len().min(desired.len());

    if rule.is_pass_through() {
        let events = (0..n)
            .map(|t| {
                let prev = if t == 0 { 0.0 } else { desired[t - 1] };
                if Direction::of(desired[t]) != Direction::of(prev) {
                    ExitEvent::Rebalanced
                } else {
                    ExitEvent::Hold
                }
            })
            .collect();
        return (desired[..n].to_vec(), events);
    }

    let atr = calculate_atr(bars, rule.atr_lookback);
    let mut state = TradeState::Flat;
    let mut positions = Vec::with_capacity(n);
    let mut events = Vec::with_capacity(n);

    for t in 0..n {
        let outcome = step(state, desired[t], bars[t].close, atr.get(t), rule);
        state = outcome.state;
        positions.push(outcome.position);
        events.push(outcome.event);
    }

    (positions, events)
}
