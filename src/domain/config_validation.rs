//! Configuration validation and typed config construction.
//!
//! Raw INI values are checked here, section by section, before the typed
//! [`BacktestConfig`] is built. Range checks that only make sense on typed
//! values live in [`BacktestConfig::validate`].

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::VoltraderError;
use crate::domain::exit::ExitRule;
use crate::domain::sizing::SizingConfig;
use crate::domain::strategy::{StrategyConfig, StrategyKind};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Where and what to run, from the `[backtest]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub tickers: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub data_dir: String,
}

pub fn validate_backtest_section(config: &dyn ConfigPort) -> Result<(), VoltraderError> {
    validate_initial_equity(config)?;
    validate_number(config, "backtest", "risk_free_rate")?;
    validate_dates(config)?;
    validate_tickers(config)?;
    Ok(())
}

pub fn validate_strategy_section(config: &dyn ConfigPort) -> Result<(), VoltraderError> {
    configured_strategy(config)?;
    validate_strategy_params(config)
}

fn configured_strategy(config: &dyn ConfigPort) -> Result<StrategyKind, VoltraderError> {
    match config.get_string("strategy", "name") {
        Some(name) if !name.trim().is_empty() => name.parse::<StrategyKind>(),
        _ => Err(VoltraderError::ConfigMissing {
            section: "strategy".to_string(),
            key: "name".to_string(),
        }),
    }
}

fn validate_strategy_params(config: &dyn ConfigPort) -> Result<(), VoltraderError> {
    for key in ["fast", "slow", "oscillator_lookback"] {
        validate_positive_int(config, "strategy", key)?;
    }
    for key in ["buy_threshold", "sell_threshold"] {
        validate_number(config, "strategy", key)?;
    }
    Ok(())
}

pub fn validate_sizing_section(config: &dyn ConfigPort) -> Result<(), VoltraderError> {
    validate_positive_int(config, "sizing", "vol_span")?;
    for key in ["vol_target", "leverage_cap"] {
        validate_number(config, "sizing", key)?;
        if config.get_string("sizing", key).is_some() && config.get_double("sizing", key, 0.0) <= 0.0 {
            return Err(invalid_value("sizing", key, format!("{} must be positive", key)));
        }
    }
    Ok(())
}

pub fn validate_exits_section(config: &dyn ConfigPort) -> Result<(), VoltraderError> {
    validate_positive_int(config, "exits", "atr_lookback")?;
    for key in ["stop_multiple", "take_profit_multiple"] {
        validate_number(config, "exits", key)?;
        if config.get_string("exits", key).is_some() && config.get_double("exits", key, 0.0) <= 0.0 {
            return Err(invalid_value("exits", key, format!("{} must be positive", key)));
        }
    }
    Ok(())
}

/// Validate every section, then build the typed engine configuration.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, VoltraderError> {
    build_backtest_config_with_strategy(config, None)
}

/// Like [`build_backtest_config`], but a given strategy name replaces
/// `[strategy] name`, which then need not be present or valid.
pub fn build_backtest_config_with_strategy(
    config: &dyn ConfigPort,
    strategy_override: Option<&str>,
) -> Result<BacktestConfig, VoltraderError> {
    validate_backtest_section(config)?;
    let kind = match strategy_override {
        Some(name) => name.parse::<StrategyKind>()?,
        None => configured_strategy(config)?,
    };
    validate_strategy_params(config)?;
    validate_sizing_section(config)?;
    validate_exits_section(config)?;

    let defaults = StrategyConfig::default();

    let strategy = StrategyConfig {
        kind,
        fast: get_usize(config, "strategy", "fast", defaults.fast),
        slow: get_usize(config, "strategy", "slow", defaults.slow),
        oscillator_lookback: get_usize(
            config,
            "strategy",
            "oscillator_lookback",
            defaults.oscillator_lookback,
        ),
        buy_threshold: config.get_double("strategy", "buy_threshold", defaults.buy_threshold),
        sell_threshold: config.get_double("strategy", "sell_threshold", defaults.sell_threshold),
        long_only: config.get_bool("strategy", "long_only", defaults.long_only),
    };

    let sizing_defaults = SizingConfig::default();
    let sizing = SizingConfig {
        vol_target: config.get_double("sizing", "vol_target", sizing_defaults.vol_target),
        vol_span: get_usize(config, "sizing", "vol_span", sizing_defaults.vol_span),
        leverage_cap: config.get_double("sizing", "leverage_cap", sizing_defaults.leverage_cap),
    };

    let exits = ExitRule {
        atr_lookback: get_usize(config, "exits", "atr_lookback", ExitRule::default().atr_lookback),
        stop_multiple: get_optional_double(config, "exits", "stop_multiple"),
        take_profit_multiple: get_optional_double(config, "exits", "take_profit_multiple"),
    };

    let built = BacktestConfig {
        strategy,
        sizing,
        exits,
        initial_equity: config.get_double("backtest", "initial_equity", 1.0),
        risk_free_rate: config.get_double("backtest", "risk_free_rate", 0.0),
    };
    built.validate()?;
    Ok(built)
}

/// Ticker list, date filters and data directory from `[backtest]`.
pub fn build_run_plan(config: &dyn ConfigPort) -> Result<RunPlan, VoltraderError> {
    validate_backtest_section(config)?;

    let raw = config
        .get_string("backtest", "tickers")
        .filter(|s| !s.trim().is_empty())
        .or_else(|| config.get_string("backtest", "ticker"))
        .unwrap_or_default();
    let tickers = parse_tickers(&raw)?;

    Ok(RunPlan {
        tickers,
        start_date: optional_date(config, "start_date")?,
        end_date: optional_date(config, "end_date")?,
        data_dir: config
            .get_string("backtest", "data_dir")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "data".to_string()),
    })
}

/// Split a comma-separated ticker list, trimming and upper-casing each entry.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, VoltraderError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(invalid_value("backtest", "tickers", "empty entry in ticker list"));
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(invalid_value(
                "backtest",
                "tickers",
                format!("duplicate ticker {}", ticker),
            ));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

fn invalid_value(section: &str, key: &str, reason: impl Into<String>) -> VoltraderError {
    VoltraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_initial_equity(config: &dyn ConfigPort) -> Result<(), VoltraderError> {
    validate_number(config, "backtest", "initial_equity")?;
    let value = config.get_double("backtest", "initial_equity", 1.0);
    if value <= 0.0 {
        return Err(invalid_value(
            "backtest",
            "initial_equity",
            "initial_equity must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), VoltraderError> {
    let start = optional_date(config, "start_date")?;
    let end = optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid_value(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

fn optional_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, VoltraderError> {
    match config.get_string("backtest", field) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid_value(
                    "backtest",
                    field,
                    format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
    }
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), VoltraderError> {
    let tickers = config.get_string("backtest", "tickers");
    let ticker = config.get_string("backtest", "ticker");

    match (tickers, ticker) {
        (Some(t), _) if !t.trim().is_empty() => Ok(()),
        (_, Some(t)) if !t.trim().is_empty() => Ok(()),
        _ => Err(VoltraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "ticker".to_string(),
        }),
    }
}

/// A present key must parse as a number; an absent key falls back to its default.
fn validate_number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), VoltraderError> {
    match config.get_string(section, key) {
        Some(s) if s.trim().parse::<f64>().is_err() => Err(invalid_value(
            section,
            key,
            format!("{} must be a number", key),
        )),
        _ => Ok(()),
    }
}

fn validate_positive_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), VoltraderError> {
    match config.get_string(section, key) {
        Some(s) => match s.trim().parse::<i64>() {
            Ok(v) if v >= 1 => Ok(()),
            _ => Err(invalid_value(
                section,
                key,
                format!("{} must be a positive integer", key),
            )),
        },
        None => Ok(()),
    }
}

fn get_usize(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value).unwrap_or(default)
}

fn get_optional_double(config: &dyn ConfigPort, section: &str, key: &str) -> Option<f64> {
    config
        .get_string(section, key)
        .and_then(|s| s.trim().parse::<f64>().ok())
}
