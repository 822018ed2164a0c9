//! CSV report adapter implementing [`ReportPort`].
//!
//! Writes three files per run: `<prefix>_bars.csv` (per-bar table),
//! `<prefix>_summary.csv` (metric/value) and `<prefix>_inputs.csv`
//! (parameter/value).

use std::path::{Path, PathBuf};

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::VoltraderError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::ReportPort;
use log::info;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

fn csv_err(path: &Path, e: csv::Error) -> VoltraderError {
    VoltraderError::Io(std::io::Error::other(format!(
        "failed writing {}: {}",
        path.display(),
        e
    )))
}

fn with_suffix(prefix: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}_{}.csv", prefix, suffix))
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

/// Metric/value rows for the summary sheet.
pub fn summary_rows(ticker: &str, result: &BacktestResult) -> Vec<(&'static str, String)> {
    let m: &Metrics = &result.metrics;
    vec![
        ("ticker", ticker.to_string()),
        ("signal", result.signal_label.clone()),
        ("bars", m.bars.to_string()),
        ("total_return", format!("{:.6}", m.total_return)),
        ("final_equity", format!("{:.6}", m.final_equity)),
        ("cagr", format!("{:.6}", m.cagr)),
        ("sharpe", format!("{:.6}", m.sharpe_ratio)),
        ("sortino", format!("{:.6}", m.sortino_ratio)),
        ("annualized_volatility", format!("{:.6}", m.annualized_volatility)),
        ("max_drawdown", format!("{:.6}", m.max_drawdown)),
        ("max_drawdown_duration", m.max_drawdown_duration.to_string()),
        ("exposure", format!("{:.6}", m.exposure)),
        ("trades", m.trade_count.to_string()),
    ]
}

fn write_pairs(path: &Path, header: [&str; 2], rows: &[(&str, String)]) -> Result<(), VoltraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_err(path, e))?;
    wtr.write_record(header).map_err(|e| csv_err(path, e))?;
    for (key, value) in rows {
        wtr.write_record([*key, value.as_str()])
            .map_err(|e| csv_err(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_bars(path: &Path, result: &BacktestResult) -> Result<(), VoltraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_err(path, e))?;
    wtr.write_record([
        "date",
        "return",
        "realized_vol",
        "leverage",
        "signal",
        "desired_position",
        "position",
        "event",
        "pnl",
        "equity",
    ])
    .map_err(|e| csv_err(path, e))?;

    for row in &result.rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            format!("{:.8}", row.underlying_return),
            fmt_opt(row.realized_vol),
            format!("{:.6}", row.leverage),
            row.signal.to_string(),
            format!("{:.6}", row.desired_position),
            format!("{:.6}", row.position),
            row.event.to_string(),
            format!("{:.8}", row.strategy_return),
            format!("{:.8}", row.equity),
        ])
        .map_err(|e| csv_err(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        ticker: &str,
        result: &BacktestResult,
        config: &BacktestConfig,
        output_prefix: &str,
    ) -> Result<(), VoltraderError> {
        if let Some(parent) = Path::new(output_prefix).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let bars_path = with_suffix(output_prefix, "bars");
        write_bars(&bars_path, result)?;

        let summary_path = with_suffix(output_prefix, "summary");
        write_pairs(&summary_path, ["metric", "value"], &summary_rows(ticker, result))?;

        let inputs_path = with_suffix(output_prefix, "inputs");
        write_pairs(&inputs_path, ["parameter", "value"], &config.parameters())?;

        info!("wrote report for {} to {}_*.csv", ticker, output_prefix);
        Ok(())
    }
}
