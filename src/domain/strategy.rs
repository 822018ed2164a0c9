//! Strategy selection and parameters.

use crate::domain::error::VoltraderError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    TrendFollowing,
    MeanReversion,
    Composite,
}

impl FromStr for StrategyKind {
    type Err = VoltraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "trendfollowing" | "trend" | "sma" | "smacrossover" => Ok(StrategyKind::TrendFollowing),
            "meanreversion" | "rsi" | "rsimeanreversion" => Ok(StrategyKind::MeanReversion),
            "composite" | "trendrsi" => Ok(StrategyKind::Composite),
            _ => Err(VoltraderError::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::TrendFollowing => write!(f, "TrendFollowing"),
            StrategyKind::MeanReversion => write!(f, "MeanReversion"),
            StrategyKind::Composite => write!(f, "Composite"),
        }
    }
}

/// Signal policy parameters. Windows unused by the selected kind are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub fast: usize,
    pub slow: usize,
    pub oscillator_lookback: usize,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub long_only: bool,
}

impl StrategyConfig {
    pub fn new(kind: StrategyKind) -> Self {
        StrategyConfig {
            kind,
            ..StrategyConfig::default()
        }
    }

    pub fn uses_trend(&self) -> bool {
        matches!(
            self.kind,
            StrategyKind::TrendFollowing | StrategyKind::Composite
        )
    }

    pub fn uses_oscillator(&self) -> bool {
        matches!(
            self.kind,
            StrategyKind::MeanReversion | StrategyKind::Composite
        )
    }

    /// Short human-readable description of the signal, e.g. `SMA[20>100]`.
    pub fn label(&self) -> String {
        let trend = format!("SMA[{}>{}]", self.fast, self.slow);
        let osc = format!(
            "RSI[{}] {}/{}",
            self.oscillator_lookback, self.buy_threshold, self.sell_threshold
        );
        match self.kind {
            StrategyKind::TrendFollowing => trend,
            StrategyKind::MeanReversion => osc,
            StrategyKind::Composite => format!("{} & {}", trend, osc),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            kind: StrategyKind::TrendFollowing,
            fast: 20,
            slow: 100,
            oscillator_lookback: 14,
            buy_threshold: 30.0,
            sell_threshold: 70.0,
            long_only: true,
        }
    }
}
