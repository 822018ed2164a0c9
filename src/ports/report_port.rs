//! Result export port.

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::VoltraderError;

/// Port for writing a finished backtest somewhere durable.
pub trait ReportPort {
    fn write(
        &self,
        ticker: &str,
        result: &BacktestResult,
        config: &BacktestConfig,
        output_prefix: &str,
    ) -> Result<(), VoltraderError>;
}
