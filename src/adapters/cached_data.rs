//! Request-scoped memoizing wrapper around a [`DataPort`].
//!
//! The cache lives exactly as long as the wrapper. Successful fetches are
//! kept per (ticker, start, end); failures are not cached.

use crate::domain::error::VoltraderError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;

type FetchKey = (String, Option<NaiveDate>, Option<NaiveDate>);

pub struct CachedDataPort<'a> {
    inner: &'a dyn DataPort,
    cache: RefCell<HashMap<FetchKey, Vec<PriceBar>>>,
}

impl<'a> CachedDataPort<'a> {
    pub fn new(inner: &'a dyn DataPort) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl DataPort for CachedDataPort<'_> {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, VoltraderError> {
        let key = (ticker.to_string(), start, end);
        if let Some(bars) = self.cache.borrow().get(&key) {
            debug!("cache hit for {}", ticker);
            return Ok(bars.clone());
        }

        let bars = self.inner.fetch_bars(ticker, start, end)?;
        self.cache.borrow_mut().insert(key, bars.clone());
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, VoltraderError> {
        self.inner.list_tickers()
    }
}
