//! CSV file data adapter.
//!
//! Reads `<TICKER>.csv` from a base directory. Columns are matched by header
//! name: `date`, `open`, `high`, `low`, `close`, `volume` are required and
//! `adj_close` (or `adj close`) is optional.

use crate::domain::error::VoltraderError;
use crate::domain::ohlcv::{normalize_bars, PriceBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: Option<usize>,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, VoltraderError> {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim().to_lowercase();
                names.iter().any(|n| h == *n)
            })
        };
        let require = |name: &str| {
            find(&[name]).ok_or_else(|| VoltraderError::Data {
                reason: format!("missing {} column", name),
            })
        };

        Ok(Columns {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            adj_close: find(&["adj_close", "adj close", "adjclose"]),
            volume: require("volume")?,
        })
    }
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize, name: &str) -> Result<&'a str, VoltraderError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| VoltraderError::Data {
            reason: format!("missing {} value", name),
        })
}

fn parse_price(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, VoltraderError> {
    field(record, idx, name)?
        .parse()
        .map_err(|e| VoltraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<TICKER>.csv`, falling back to a file whose stem matches ignoring case.
    fn csv_path(&self, ticker: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", ticker));
        if exact.is_file() {
            return exact;
        }
        fs::read_dir(&self.base_path)
            .into_iter()
            .flatten()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.extension().is_some_and(|ext| ext == "csv")
                    && path
                        .file_stem()
                        .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case(ticker))
            })
            .unwrap_or(exact)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, VoltraderError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| VoltraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| VoltraderError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let cols = Columns::from_headers(headers)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| VoltraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = field(&record, cols.date, "date")?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                VoltraderError::Data {
                    reason: format!("invalid date {}: {}", date_str, e),
                }
            })?;

            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }

            let adj_close = match cols.adj_close {
                Some(idx) => field(&record, idx, "adj_close")?.parse::<f64>().ok(),
                None => None,
            };
            let volume = field(&record, cols.volume, "volume")?
                .parse::<f64>()
                .map(|v| v as i64)
                .unwrap_or(0);

            bars.push(
                PriceBar::new(
                    date,
                    parse_price(&record, cols.open, "open")?,
                    parse_price(&record, cols.high, "high")?,
                    parse_price(&record, cols.low, "low")?,
                    parse_price(&record, cols.close, "close")?,
                    volume,
                )
                .with_adj_close(adj_close),
            );
        }

        let raw_len = bars.len();
        let bars = normalize_bars(bars);
        if bars.len() < raw_len {
            warn!(
                "{}: dropped {} duplicate dated rows",
                ticker,
                raw_len - bars.len()
            );
        }
        debug!("{}: loaded {} bars from {}", ticker, bars.len(), path.display());
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, VoltraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| VoltraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().to_uppercase());
                }
            }
        }

        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "Date,Open,High,Low,Close,Adj Close,Volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,114.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,104.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,109.0,60000\n";
        fs::write(path.join("SPY.csv"), csv_content).unwrap();

        fs::write(
            path.join("QQQ.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,2,0.5,1.5,100\n",
        )
        .unwrap();
        fs::write(path.join("notes.txt"), "not a price file").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_sorts_and_reads_adjusted_close() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("SPY", None, None).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].adj_close, 104.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
    }

    #[test]
    fn missing_adjusted_close_falls_back_to_close() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("QQQ", None, None).unwrap();
        assert_eq!(bars[0].adj_close, 1.5);
    }

    #[test]
    fn fetch_bars_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16);
        let bars = adapter.fetch_bars("SPY", day, day).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day.unwrap());
    }

    #[test]
    fn range_without_bars_is_empty() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2030, 1, 1);
        let bars = adapter.fetch_bars("SPY", start, None).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let result = adapter.fetch_bars("XYZ", None, None);
        assert!(matches!(result, Err(VoltraderError::Data { .. })));
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("BAD.csv"), "date,open,high,low\n2024-01-01,1,2,0\n").unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("BAD", None, None).unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn list_tickers_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_tickers().unwrap(), vec!["QQQ", "SPY"]);
    }

    #[test]
    fn lowercase_file_is_listed_and_fetched_by_ticker() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("iwm.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,2,0.5,1.5,100\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let listed = adapter.list_tickers().unwrap();
        assert_eq!(listed, vec!["IWM"]);
        let parsed = crate::domain::config_validation::parse_tickers(&listed.join(",")).unwrap();
        let bars = adapter.fetch_bars(&parsed[0], None, None).unwrap();
        assert_eq!(bars.len(), 1);
    }
}
