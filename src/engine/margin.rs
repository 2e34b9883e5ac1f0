use crate::models::{round_dp, Direction};

/// Standard quoted increment for the pair
pub const PIP: f64 = 0.0001;

/// Fixed-fraction margin model for a single currency pair
///
/// Position value converts through the entry-side exchange rate only when
/// the quote currency is not USD; for the fixed EUR/USD pair the position
/// value is simply the traded units.
#[derive(Debug, Clone)]
pub struct MarginModel {
    pub base_currency: String,
    pub quote_currency: String,
    /// 0.2 = 20% margin, i.e. 5x leverage
    pub margin_rate: f64,
}

impl Default for MarginModel {
    fn default() -> Self {
        Self {
            base_currency: "EUR".to_string(),
            quote_currency: "USD".to_string(),
            margin_rate: 0.2,
        }
    }
}

impl MarginModel {
    /// Required margin and position value for a prospective or open trade.
    ///
    /// Longs are priced at the ask, shorts at the bid.
    pub fn required(&self, direction: Direction, units: f64, bid: f64, ask: f64) -> (f64, f64) {
        let exchange_rate = match direction {
            Direction::Long => ask,
            Direction::Short => bid,
        };
        let position_value = if self.quote_currency.eq_ignore_ascii_case("usd") {
            units
        } else {
            exchange_rate * units
        };
        (self.margin_rate * position_value, position_value)
    }
}

/// Signed price difference driving the P&L of an open position.
///
/// A long exits at the bid, a short at the ask, so the difference is taken
/// against the opposite side of the entry quote.
pub fn price_difference(
    direction: Direction,
    entry_bid: f64,
    entry_ask: f64,
    bid: f64,
    ask: f64,
) -> f64 {
    match direction {
        Direction::Long => bid - entry_ask,
        Direction::Short => entry_bid - ask,
    }
}

/// Floating P&L for an open position against the latest quote.
///
/// The pip difference is rounded to 4 decimals before being priced, and the
/// sign is attached explicitly rather than carried through the magnitude.
pub fn floating_pl(
    direction: Direction,
    units: f64,
    entry_bid: f64,
    entry_ask: f64,
    bid: f64,
    ask: f64,
) -> f64 {
    let diff = price_difference(direction, entry_bid, entry_ask, bid, ask);
    // With both differences taken exit-side minus entry-side, a positive
    // value favors the trader on either direction; zero prices as a flat
    // loss of zero pips.
    let profit_sign = if diff > 0.0 { 1.0 } else { -1.0 };
    let diff_pips = round_dp(diff * 10_000.0, 4);
    profit_sign * diff_pips.abs() * PIP * units
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_margin_is_fixed_fraction_of_units() {
        let model = MarginModel::default();

        let (margin, value) = model.required(Direction::Long, 1000.0, 1.1000, 1.1005);
        assert_eq!(value, 1000.0);
        assert!(approx(margin, 200.0));

        let (margin, value) = model.required(Direction::Short, 500.0, 1.2000, 1.2005);
        assert_eq!(value, 500.0);
        assert!(approx(margin, 100.0));
    }

    #[test]
    fn test_margin_positive_for_positive_units() {
        let model = MarginModel::default();
        for units in [0.001, 1.0, 250.0, 1_000_000.0] {
            let (margin, _) = model.required(Direction::Long, units, 0.95, 0.9505);
            assert!(margin > 0.0, "margin must be positive for {} units", units);
        }
    }

    #[test]
    fn test_non_usd_quote_currency_converts_through_rate() {
        let model = MarginModel {
            base_currency: "EUR".to_string(),
            quote_currency: "JPY".to_string(),
            margin_rate: 0.2,
        };

        let (margin, value) = model.required(Direction::Long, 1000.0, 157.10, 157.15);
        assert!(approx(value, 157_150.0));
        assert!(approx(margin, 31_430.0));

        let (margin, value) = model.required(Direction::Short, 1000.0, 157.10, 157.15);
        assert!(approx(value, 157_100.0));
        assert!(approx(margin, 31_420.0));
    }

    #[test]
    fn test_long_profits_when_bid_rises_above_entry_ask() {
        // Worked example: 5 favorable pips on 1000 units is $0.50
        let pl = floating_pl(Direction::Long, 1000.0, 1.1000, 1.1005, 1.1010, 1.1015);
        assert!(approx(pl, 0.5), "got {}", pl);
    }

    #[test]
    fn test_long_loses_the_spread_immediately() {
        // Marked against its own entry quote a long is down the spread
        let pl = floating_pl(Direction::Long, 500.0, 1.1000, 1.1005, 1.1000, 1.1005);
        assert!(approx(pl, -0.25), "got {}", pl);
    }

    #[test]
    fn test_zero_spread_entry_marks_flat() {
        let pl = floating_pl(Direction::Long, 1000.0, 1.1000, 1.1000, 1.1000, 1.1000);
        assert_eq!(pl, 0.0);
        let pl = floating_pl(Direction::Short, 1000.0, 1.1000, 1.1000, 1.1000, 1.1000);
        assert_eq!(pl, 0.0);
    }

    #[test]
    fn test_short_profits_when_ask_falls_below_entry_bid() {
        let pl = floating_pl(Direction::Short, 500.0, 1.2000, 1.2005, 1.1000, 1.1005);
        // diff = 1.2000 - 1.1005 = 0.0995 favorable -> 995 pips * 0.0001 * 500
        assert!(approx(pl, 49.75), "got {}", pl);
    }

    #[test]
    fn test_short_loses_when_ask_rises() {
        let pl = floating_pl(Direction::Short, 500.0, 1.2000, 1.2005, 1.2100, 1.2105);
        assert!(pl < 0.0);
        // diff = 1.2000 - 1.2105 = -0.0105 -> 105 pips against, $5.25 down
        assert!(approx(pl, -5.25), "got {}", pl);
    }

    #[test]
    fn test_pip_difference_is_rounded_to_four_decimals() {
        // 1.1010 - 1.1005 carries binary noise; the rounding step lands it
        // on exactly 5 pips.
        let diff = price_difference(Direction::Long, 1.1000, 1.1005, 1.1010, 1.1015);
        let pips = crate::models::round_dp(diff * 10_000.0, 4);
        assert_eq!(pips, 5.0);
    }
}
