use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};

use crate::aggregator::BarAggregator;
use crate::config::SimConfig;
use crate::engine::{TradeEngine, TradeError};
use crate::models::{format_usd, Candle, Direction, Quote, ValuationSnapshot};
use crate::risk::MarginStatus;

use super::Command;

/// Everything the presentation layer hears from a running session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Latest bid/ask, one per received quote
    Tick {
        bid: f64,
        ask: f64,
        time: DateTime<Utc>,
    },
    /// New trade-history row (one per tick while a position is open, plus
    /// the final row on close)
    Valuation(ValuationSnapshot),
    /// One OHLC bar per flushed window
    Bar(Candle),
    /// Human-readable status line
    Message(String),
    /// The session is over; no further events follow
    Closed,
}

/// Summary returned once the session winds down
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub quotes_processed: u64,
    pub bars: Vec<Candle>,
    pub history: Vec<ValuationSnapshot>,
    pub final_balance: f64,
}

/// Single-threaded actor driving the tick-to-metric pipeline.
///
/// Owns the engine, the aggregator and the last-known quote; every mutation
/// happens inside this task, so no locks are needed beyond the channels.
/// The loop never blocks on the quote channel: each scheduler tick drains
/// whatever is pending and moves on.
pub struct SessionController {
    cfg: SimConfig,
    engine: TradeEngine,
    aggregator: BarAggregator,
    quotes: mpsc::Receiver<Quote>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
    stop: watch::Sender<bool>,
    producer: JoinHandle<()>,
    last_quote: Option<Quote>,
    quotes_processed: u64,
}

impl SessionController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cfg: SimConfig,
        engine: TradeEngine,
        quotes: mpsc::Receiver<Quote>,
        commands: mpsc::UnboundedReceiver<Command>,
        events: mpsc::UnboundedSender<SessionEvent>,
        stop: watch::Sender<bool>,
        producer: JoinHandle<()>,
    ) -> Self {
        Self {
            cfg,
            engine,
            aggregator: BarAggregator::new(),
            quotes,
            commands,
            events,
            stop,
            producer,
            last_quote: None,
            quotes_processed: 0,
        }
    }

    /// Run the session to completion: until the lifetime ceiling elapses or
    /// a quit command arrives.
    pub async fn run(mut self) -> SessionReport {
        let started = Instant::now();
        let mut window_started = Instant::now();
        let mut ticker = interval(self.cfg.scheduler_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;

        tracing::info!(
            session_secs = self.cfg.session_limit.as_secs(),
            bar_secs = self.cfg.bar_window.as_secs(),
            "session started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.drain_quotes();

                    if window_started.elapsed() >= self.cfg.bar_window {
                        self.flush_window();
                        window_started = Instant::now();
                    }

                    if started.elapsed() >= self.cfg.session_limit {
                        self.send_message("Market closed, closing active trades ...".to_string());
                        break;
                    }
                }
                command = self.commands.recv(), if commands_open => {
                    match command {
                        Some(Command::Quit) => {
                            self.send_message("Session shutdown requested".to_string());
                            break;
                        }
                        Some(command) => self.handle_command(command),
                        None => commands_open = false,
                    }
                }
            }
        }

        self.shutdown().await
    }

    /// Drain every pending quote without waiting for more.
    fn drain_quotes(&mut self) {
        while let Ok(quote) = self.quotes.try_recv() {
            self.quotes_processed += 1;
            self.last_quote = Some(quote);
            tracing::debug!(bid = quote.bid, ask = quote.ask, "tick received");
            self.send(SessionEvent::Tick {
                bid: quote.bid,
                ask: quote.ask,
                time: quote.timestamp,
            });

            if self.engine.is_open() {
                self.mark_position(quote);
            }

            self.aggregator.push(quote);
        }
    }

    fn mark_position(&mut self, quote: Quote) {
        let mark = match self.engine.mark_to_market(quote.bid, quote.ask) {
            Ok(mark) => mark,
            Err(err) => {
                // Only reachable if the position vanished mid-drain
                tracing::warn!(%err, "mark-to-market skipped");
                return;
            }
        };

        self.send(SessionEvent::Valuation(mark.snapshot.clone()));

        match mark.status {
            MarginStatus::Healthy => {}
            MarginStatus::MarginCall => {
                self.send_message(format!(
                    "WARNING: margin call, margin level {:.2}% is below {:.0}%",
                    mark.snapshot.margin_level_pct, self.cfg.margin_call_level_pct
                ));
            }
            MarginStatus::StopOut => {
                self.send_message(format!(
                    "STOP OUT: margin level {:.2}% is below {:.0}%, position liquidated",
                    mark.snapshot.margin_level_pct, self.cfg.stop_out_level_pct
                ));
                if let Some(closed) = mark.stop_out {
                    self.announce_close(&closed);
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Deposit(amount) => match self.engine.deposit(amount) {
                Ok(balance) => {
                    self.send_message(format!("Depositing {}", format_usd(balance)));
                }
                Err(err) => self.send_message(format!("Deposit rejected: {}", err)),
            },
            Command::Open { direction, units } => {
                match self.engine.open_trade(direction, units, self.last_quote.as_ref()) {
                    Ok(position) => {
                        let (verb, side, price) = match direction {
                            Direction::Long => ("buying", "ASK", position.entry_ask),
                            Direction::Short => ("selling", "BID", position.entry_bid),
                        };
                        self.send_message(format!(
                            "New trade opens: {} {:.2} units at {} price {}",
                            verb,
                            units,
                            side,
                            format_usd(price)
                        ));
                    }
                    Err(err) => self.send_message(format!("Trade rejected: {}", err)),
                }
            }
            Command::Close => match self.engine.close_trade() {
                Ok(closed) => self.announce_close(&closed),
                Err(err) => self.send_message(format!("Close rejected: {}", err)),
            },
            // Quit is intercepted by the run loop
            Command::Quit => {}
        }
    }

    /// Emit the final history row and the closing status line.
    fn announce_close(&mut self, closed: &crate::engine::ClosedTrade) {
        if let Some(row) = self.engine.history().last() {
            self.send(SessionEvent::Valuation(row.clone()));
        }
        let exit_side = match (closed.direction, self.last_quote) {
            (Direction::Long, Some(q)) => format!(" at BID price {}", format_usd(q.bid)),
            (Direction::Short, Some(q)) => format!(" at ASK price {}", format_usd(q.ask)),
            _ => String::new(),
        };
        self.send_message(format!(
            "Closing the trade{}: realized P&L {}, balance {}",
            exit_side,
            format_usd(closed.realized_pl),
            format_usd(closed.balance)
        ));
    }

    fn flush_window(&mut self) {
        if let Some(bar) = self.aggregator.flush() {
            tracing::info!(
                open = bar.open,
                high = bar.high,
                low = bar.low,
                close = bar.close,
                "bar closed"
            );
            self.send(SessionEvent::Bar(bar));
        }
    }

    /// Teardown: force-close, stop the producer and report.
    async fn shutdown(mut self) -> SessionReport {
        if self.engine.is_open() {
            match self.engine.close_trade() {
                Ok(closed) => self.announce_close(&closed),
                Err(err) => tracing::warn!(%err, "force-close failed"),
            }
        }

        // Don't lose a partially filled window at teardown
        self.flush_window();

        let _ = self.stop.send(true);

        // The producer's wait is interruptible, so one quote interval (plus
        // slack) bounds the join.
        let deadline = self.cfg.quote_interval + Duration::from_secs(1);
        if timeout(deadline, &mut self.producer).await.is_err() {
            tracing::warn!("quote stream ignored the stop signal, aborting it");
            self.producer.abort();
        }

        self.send(SessionEvent::Closed);
        tracing::info!(
            quotes = self.quotes_processed,
            bars = self.aggregator.bars().len(),
            balance = self.engine.balance(),
            "session ended"
        );

        SessionReport {
            quotes_processed: self.quotes_processed,
            bars: self.aggregator.bars().to_vec(),
            history: self.engine.history().to_vec(),
            final_balance: self.engine.balance(),
        }
    }

    fn send(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }

    fn send_message(&self, message: String) {
        tracing::info!("{}", message);
        self.send(SessionEvent::Message(message));
    }
}
