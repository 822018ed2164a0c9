//! Daily price bar representation and normalization.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// Bar without a separate adjusted close; `adj_close` falls back to `close`.
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: i64) -> Self {
        PriceBar {
            date,
            open,
            high,
            low,
            close,
            adj_close: close,
            volume,
        }
    }

    pub fn with_adj_close(mut self, adj_close: Option<f64>) -> Self {
        self.adj_close = adj_close.filter(|v| v.is_finite()).unwrap_or(self.close);
        self
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Sort bars by date, keep the last bar seen for a repeated date, and
/// repair a non-finite adjusted close from the raw close.
pub fn normalize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    // stable sort keeps arrival order within a date, so the later duplicate wins
    bars.sort_by_key(|b| b.date);

    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for mut bar in bars {
        if !bar.adj_close.is_finite() {
            bar.adj_close = bar.close;
        }
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

/// True when dates are strictly increasing and every adjusted close is finite.
pub fn is_normalized(bars: &[PriceBar]) -> bool {
    bars.windows(2).all(|w| w[0].date < w[1].date) && bars.iter().all(|b| b.adj_close.is_finite())
}
