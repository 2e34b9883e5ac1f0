use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::models::Quote;

use super::QuoteGenerator;

/// Spawn the quote producer task.
///
/// Emits one quote per `interval` onto `tx` until the stop signal flips.
/// The first generated quote only seeds the walk and is never published.
/// The interval wait is interruptible, so shutdown latency is bounded by a
/// single interval at worst.
pub fn spawn_quote_stream(
    interval: Duration,
    seed: Option<u64>,
    tx: mpsc::Sender<Quote>,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut generator = QuoteGenerator::new(seed);

        // Warm-up: primes the walk, never reaches the channel
        let seed_quote = generator.next_quote();
        tracing::debug!(
            bid = seed_quote.bid,
            ask = seed_quote.ask,
            "quote walk seeded"
        );

        loop {
            if *stop.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let quote = generator.next_quote();
            tracing::debug!(bid = quote.bid, ask = quote.ask, "tick generated");
            if tx.send(quote).await.is_err() {
                // Consumer is gone, nothing left to feed
                break;
            }
        }

        tracing::info!("quote stream stopped");
    })
}
