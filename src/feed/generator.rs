use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{round_dp, Quote};

/// Prices never fall below this floor, keeping the walk strictly positive
pub const PRICE_FLOOR: f64 = 0.0001;

/// Bounded random walk over bid/ask quotes
///
/// The first call seeds a fresh price level; every later call nudges both
/// sides by one shared offset drawn from +/-10% of the current mid, so the
/// spread only drifts through the 4-decimal rounding. `ask >= bid` is not
/// enforced beyond that construction.
pub struct QuoteGenerator {
    rng: StdRng,
    last: Option<(f64, f64)>,
}

impl QuoteGenerator {
    /// Create a generator, seeded for reproducibility when `seed` is given.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, last: None }
    }

    /// Produce the next quote of the walk.
    pub fn next_quote(&mut self) -> Quote {
        let (bid, ask) = match self.last {
            None => {
                let bid = self.rng.gen_range(0.9..1.2);
                let ask = bid + self.rng.gen_range(0.0001..0.01);
                (bid, ask)
            }
            Some((prev_bid, prev_ask)) => {
                let step = (prev_bid * 0.1 + prev_ask * 0.1) / 2.0;
                let offset = self.rng.gen_range(-step..step);
                (round_dp(prev_bid + offset, 4), round_dp(prev_ask + offset, 4))
            }
        };

        let bid = bid.max(PRICE_FLOOR);
        let ask = ask.max(PRICE_FLOOR);
        self.last = Some((bid, ask));

        Quote {
            bid,
            ask,
            timestamp: Utc::now(),
        }
    }
}
