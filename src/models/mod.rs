use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// A single bid/ask quote for the simulated pair
///
/// Immutable once produced. The generator clamps both sides to a positive
/// floor but does not enforce `ask >= bid`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// The single open position (at most one at a time)
///
/// Owned exclusively by the trade engine; created on open, dropped on close
/// or liquidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub direction: Direction,
    pub units: f64,
    pub entry_bid: f64,
    pub entry_ask: f64,
    pub opened_at: DateTime<Utc>,
}

/// One row of the trade history table
///
/// Derived data, recomputed from account + position + latest quote on every
/// tick while a position is open. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub balance: f64,
    pub equity: f64,
    pub floating_pl: f64,
    pub used_margin: f64,
    pub free_margin: f64,
    pub margin_level_pct: f64,
    pub realized_pl: f64,
    pub time: DateTime<Utc>,
}

/// OHLC bar reduced from one window of quotes (ask prices only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Round to `decimals` decimal places, the way the quote walk and pip math
/// quantize prices.
pub fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Format a dollar amount with thousands separators, e.g. `$1,234.56`
pub fn format_usd(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("long".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!("BUY".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!("short".parse::<Direction>().unwrap(), Direction::Short);
        assert_eq!("sell".parse::<Direction>().unwrap(), Direction::Short);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_quote_spread() {
        let quote = Quote {
            bid: 1.1000,
            ask: 1.1005,
            timestamp: Utc::now(),
        };
        assert!((quote.spread() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(1.23456, 4), 1.2346);
        assert_eq!(round_dp(1.23454, 4), 1.2345);
        assert_eq!(round_dp(-0.00005, 4), -0.0001);
        assert_eq!(round_dp(2500.0, 4), 2500.0);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(5.5), "$5.50");
        assert_eq!(format_usd(1234.56), "$1,234.56");
        assert_eq!(format_usd(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_usd(-1234.5), "$-1,234.50");
    }
}
