//! Direction and per-bar trade state.

use std::fmt;

/// Discrete exposure direction. Also the value space of a decided signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    Short,
    #[default]
    Flat,
    Long,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Short => -1.0,
            Direction::Flat => 0.0,
            Direction::Long => 1.0,
        }
    }

    /// Direction of a real-valued exposure. NaN is Flat.
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Direction::Long
        } else if value < 0.0 {
            Direction::Short
        } else {
            Direction::Flat
        }
    }

    pub fn is_flat(self) -> bool {
        self == Direction::Flat
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Short => write!(f, "-1"),
            Direction::Flat => write!(f, "0"),
            Direction::Long => write!(f, "+1"),
        }
    }
}

/// State carried bar-to-bar by the exit machine. Never escapes a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TradeState {
    #[default]
    Flat,
    Long { entry_price: f64 },
    Short { entry_price: f64 },
    /// Flat after a stop or target fired. `from` is the direction that was
    /// closed; re-entry waits for the desired direction to change.
    Exited { from: Direction },
}

impl TradeState {
    /// Open in `direction` at `price`; `Flat` yields the flat state.
    pub fn enter(direction: Direction, price: f64) -> Self {
        match direction {
            Direction::Long => TradeState::Long { entry_price: price },
            Direction::Short => TradeState::Short { entry_price: price },
            Direction::Flat => TradeState::Flat,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            TradeState::Long { .. } => Direction::Long,
            TradeState::Short { .. } => Direction::Short,
            TradeState::Flat | TradeState::Exited { .. } => Direction::Flat,
        }
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self {
            TradeState::Long { entry_price } | TradeState::Short { entry_price } => {
                Some(*entry_price).filter(|p| p.is_finite())
            }
            TradeState::Flat | TradeState::Exited { .. } => None,
        }
    }

    /// Adverse move of at least `distance` from entry.
    pub fn should_stop_loss(&self, price: f64, distance: f64) -> bool {
        match (self, self.entry_price()) {
            (TradeState::Long { .. }, Some(entry)) => price <= entry - distance,
            (TradeState::Short { .. }, Some(entry)) => price >= entry + distance,
            _ => false,
        }
    }

    /// Favorable move of at least `distance` from entry.
    pub fn should_take_profit(&self, price: f64, distance: f64) -> bool {
        match (self, self.entry_price()) {
            (TradeState::Long { .. }, Some(entry)) => price >= entry + distance,
            (TradeState::Short { .. }, Some(entry)) => price <= entry - distance,
            _ => false,
        }
    }
}
