use crate::models::{Candle, Quote};

/// Reduce a non-empty, ordered quote window into one OHLC bar.
///
/// Bars chart the ask side only: open and close come from the first and last
/// quote, high and low scan the whole window, and the bar is stamped with
/// the last quote's time. An empty window has no bar.
pub fn reduce(window: &[Quote]) -> Option<Candle> {
    let first = window.first()?;
    let last = window.last()?;

    let mut high = first.ask;
    let mut low = first.ask;
    for quote in window {
        high = high.max(quote.ask);
        low = low.min(quote.ask);
    }

    Some(Candle {
        time: last.timestamp,
        open: first.ask,
        high,
        low,
        close: last.ask,
    })
}

/// Buffers ticks into the current wall-clock window and keeps the
/// append-only bar series.
///
/// The window clock itself lives with the caller (the session controller
/// flushes on its schedule); this type only owns the data.
#[derive(Default)]
pub struct BarAggregator {
    window: Vec<Quote>,
    bars: Vec<Candle>,
}

impl BarAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tick to the current window.
    pub fn push(&mut self, quote: Quote) {
        self.window.push(quote);
    }

    /// Number of ticks buffered in the current window.
    pub fn pending(&self) -> usize {
        self.window.len()
    }

    /// Close the current window into a bar.
    ///
    /// Returns `None` when no tick arrived during the window; the window
    /// simply restarts in that case.
    pub fn flush(&mut self) -> Option<Candle> {
        let bar = reduce(&self.window)?;
        self.window.clear();
        self.bars.push(bar.clone());
        Some(bar)
    }

    /// All bars flushed so far, oldest first.
    pub fn bars(&self) -> &[Candle] {
        &self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn window(asks: &[f64]) -> Vec<Quote> {
        let start = Utc::now();
        asks.iter()
            .enumerate()
            .map(|(i, &ask)| Quote {
                bid: ask - 0.0005,
                ask,
                timestamp: start + Duration::seconds(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_reduce_uses_ask_prices_only() {
        let quotes = window(&[1.1000, 1.1040, 1.0990, 1.1020]);
        let bar = reduce(&quotes).unwrap();

        assert_eq!(bar.open, 1.1000);
        assert_eq!(bar.close, 1.1020);
        assert_eq!(bar.high, 1.1040);
        assert_eq!(bar.low, 1.0990);
        assert_eq!(bar.time, quotes.last().unwrap().timestamp);
    }

    #[test]
    fn test_reduce_single_quote_window() {
        let quotes = window(&[1.0500]);
        let bar = reduce(&quotes).unwrap();

        assert_eq!(bar.open, 1.0500);
        assert_eq!(bar.close, 1.0500);
        assert_eq!(bar.high, 1.0500);
        assert_eq!(bar.low, 1.0500);
    }

    #[test]
    fn test_reduce_empty_window_has_no_bar() {
        assert!(reduce(&[]).is_none());
    }

    #[test]
    fn test_high_and_low_bound_open_and_close() {
        let mut generator = crate::feed::QuoteGenerator::new(Some(13));
        let quotes: Vec<Quote> = (0..50).map(|_| generator.next_quote()).collect();

        for len in 1..quotes.len() {
            let bar = reduce(&quotes[..len]).unwrap();
            assert!(bar.high >= bar.open);
            assert!(bar.high >= bar.close);
            assert!(bar.low <= bar.open);
            assert!(bar.low <= bar.close);
        }
    }

    #[test]
    fn test_flush_appends_to_the_bar_series() {
        let mut aggregator = BarAggregator::new();
        for quote in window(&[1.10, 1.12, 1.11]) {
            aggregator.push(quote);
        }
        assert_eq!(aggregator.pending(), 3);

        let bar = aggregator.flush().unwrap();
        assert_eq!(bar.open, 1.10);
        assert_eq!(bar.close, 1.11);
        assert_eq!(aggregator.pending(), 0);
        assert_eq!(aggregator.bars().len(), 1);

        for quote in window(&[1.09, 1.08]) {
            aggregator.push(quote);
        }
        aggregator.flush().unwrap();
        assert_eq!(aggregator.bars().len(), 2);
        assert_eq!(aggregator.bars()[1].close, 1.08);
    }

    #[test]
    fn test_flush_on_empty_window_is_a_no_op() {
        let mut aggregator = BarAggregator::new();
        assert!(aggregator.flush().is_none());
        assert!(aggregator.bars().is_empty());
    }
}
