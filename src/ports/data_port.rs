//! Price history provider port.

use crate::domain::error::VoltraderError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `ticker`, optionally limited to `[start, end]`.
    ///
    /// Implementations return bars ascending by date. An unknown ticker is an
    /// error; a known ticker with no bars in range is an empty vector.
    fn fetch_bars(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, VoltraderError>;

    fn list_tickers(&self) -> Result<Vec<String>, VoltraderError>;
}
