//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::cached_data::CachedDataPort;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report::{summary_rows, CsvReportAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::batch::{run_batch, BatchResult};
use crate::domain::config_validation::{
    build_backtest_config_with_strategy, build_run_plan, parse_tickers, RunPlan,
};
use crate::domain::error::VoltraderError;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "voltrader", about = "Volatility-targeted single-instrument backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one ticker
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Ticker to run instead of the first configured one
        #[arg(long)]
        ticker: Option<String>,
        /// Strategy name overriding [strategy] name
        #[arg(short, long)]
        strategy: Option<String>,
        /// Directory for CSV reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest every configured ticker in parallel
    Batch {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers overriding [backtest] tickers
        #[arg(long)]
        tickers: Option<String>,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in the data directory
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            ticker,
            strategy,
            output,
        } => run_backtest_command(&config, ticker.as_deref(), strategy.as_deref(), output.as_deref()),
        Command::Batch {
            config,
            tickers,
            strategy,
            output,
        } => run_batch_command(&config, tickers.as_deref(), strategy.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { config } => run_list_tickers(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, VoltraderError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Typed config and run plan from a config file, with CLI overrides applied.
pub fn resolve(
    adapter: &FileConfigAdapter,
    strategy_override: Option<&str>,
) -> Result<(BacktestConfig, RunPlan), VoltraderError> {
    let config = build_backtest_config_with_strategy(adapter, strategy_override)?;
    let plan = build_run_plan(adapter)?;
    Ok((config, plan))
}

/// Fetch and backtest one ticker, optionally writing CSV reports.
pub fn run_backtest_pipeline(
    data: &dyn DataPort,
    ticker: &str,
    plan: &RunPlan,
    config: &BacktestConfig,
    output_dir: Option<&Path>,
) -> Result<BacktestResult, VoltraderError> {
    let bars = data.fetch_bars(ticker, plan.start_date, plan.end_date)?;
    if bars.len() < 2 {
        warn!("{}: only {} bars, result is neutral", ticker, bars.len());
    }
    let result = run_backtest(&bars, config)?;

    if let Some(dir) = output_dir {
        write_report(dir, ticker, &result, config)?;
    }
    Ok(result)
}

/// Batch-backtest `plan.tickers`, optionally writing one report set per ticker.
pub fn run_batch_pipeline(
    data: &dyn DataPort,
    plan: &RunPlan,
    config: &BacktestConfig,
    output_dir: Option<&Path>,
) -> Result<BatchResult, VoltraderError> {
    let cached = CachedDataPort::new(data);
    let batch = run_batch(&cached, &plan.tickers, plan.start_date, plan.end_date, config)?;

    if let Some(dir) = output_dir {
        for run in &batch.runs {
            write_report(dir, &run.ticker, &run.result, config)?;
        }
    }
    Ok(batch)
}

fn write_report(
    dir: &Path,
    ticker: &str,
    result: &BacktestResult,
    config: &BacktestConfig,
) -> Result<(), VoltraderError> {
    let prefix = dir.join(ticker.to_lowercase());
    CsvReportAdapter::new().write(ticker, result, config, &prefix.to_string_lossy())
}

fn run_backtest_command(
    config_path: &Path,
    ticker: Option<&str>,
    strategy: Option<&str>,
    output: Option<&Path>,
) -> Result<(), VoltraderError> {
    let adapter = load_config(config_path)?;
    let (config, plan) = resolve(&adapter, strategy)?;

    let ticker = match ticker {
        Some(t) => t.trim().to_uppercase(),
        None => plan
            .tickers
            .first()
            .cloned()
            .ok_or_else(|| VoltraderError::ConfigMissing {
                section: "backtest".to_string(),
                key: "ticker".to_string(),
            })?,
    };

    info!("backtesting {} with {}", ticker, config.strategy.label());
    let data = CsvAdapter::new(PathBuf::from(&plan.data_dir));
    let result = run_backtest_pipeline(&data, &ticker, &plan, &config, output)?;

    print_summary(&ticker, &result);
    Ok(())
}

fn run_batch_command(
    config_path: &Path,
    tickers: Option<&str>,
    strategy: Option<&str>,
    output: Option<&Path>,
) -> Result<(), VoltraderError> {
    let adapter = load_config(config_path)?;
    let (config, mut plan) = resolve(&adapter, strategy)?;
    if let Some(list) = tickers {
        plan.tickers = parse_tickers(list)?;
    }

    info!(
        "batch of {} tickers with {}",
        plan.tickers.len(),
        config.strategy.label()
    );
    let data = CsvAdapter::new(PathBuf::from(&plan.data_dir));
    let batch = run_batch_pipeline(&data, &plan, &config, output)?;

    println!(
        "{:<8} {:>10} {:>8} {:>8} {:>9} {:>8} {:>7}",
        "ticker", "total", "cagr", "sharpe", "max_dd", "expo", "trades"
    );
    for run in &batch.runs {
        let m = &run.result.metrics;
        println!(
            "{:<8} {:>9.2}% {:>7.2}% {:>8.2} {:>8.2}% {:>7.1}% {:>7}",
            run.ticker,
            m.total_return * 100.0,
            m.cagr * 100.0,
            m.sharpe_ratio,
            m.max_drawdown * 100.0,
            m.exposure * 100.0,
            m.trade_count
        );
    }
    for skipped in &batch.skipped {
        println!("{:<8} skipped: {}", skipped.ticker, skipped.reason);
    }

    if batch.runs.is_empty() {
        return Err(VoltraderError::NoData {
            ticker: plan.tickers.join(","),
        });
    }
    Ok(())
}

fn print_summary(ticker: &str, result: &BacktestResult) {
    println!("=== {} ===", ticker);
    for (metric, value) in summary_rows(ticker, result).iter().skip(1) {
        println!("{:<24}{}", metric, value);
    }
}

fn run_validate(config_path: &Path) -> Result<(), VoltraderError> {
    let adapter = load_config(config_path)?;
    let (config, plan) = resolve(&adapter, None)?;

    println!("tickers: {}", plan.tickers.join(", "));
    println!(
        "range: {} to {}",
        plan.start_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "start".to_string()),
        plan.end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "end".to_string())
    );
    println!("data_dir: {}", plan.data_dir);
    println!("signal: {}", config.strategy.label());
    for (key, value) in config.parameters() {
        println!("  {:<22}{}", key, value);
    }
    println!("configuration is valid");
    Ok(())
}

fn run_list_tickers(config_path: &Path) -> Result<(), VoltraderError> {
    let adapter = load_config(config_path)?;
    let plan = build_run_plan(&adapter)?;
    let tickers = CsvAdapter::new(PathBuf::from(&plan.data_dir)).list_tickers()?;

    if tickers.is_empty() {
        warn!("no tickers found in {}", plan.data_dir);
    }
    for ticker in &tickers {
        println!("{}", ticker);
    }
    Ok(())
}
