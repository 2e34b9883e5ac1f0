use chrono::Utc;
use uuid::Uuid;

use crate::models::{round_dp, Direction, Position, Quote, ValuationSnapshot};
use crate::risk::{MarginPolicy, MarginStatus};

use super::margin::{self, MarginModel};
use super::TradeError;

/// Result of one mark-to-market pass
#[derive(Debug, Clone)]
pub struct MarkToMarket {
    pub snapshot: ValuationSnapshot,
    pub status: MarginStatus,
    /// Present when the pass breached the stop-out level and the position
    /// was liquidated.
    pub stop_out: Option<ClosedTrade>,
}

/// Record of a position leaving the book, voluntarily or by liquidation
#[derive(Debug, Clone)]
pub struct ClosedTrade {
    pub direction: Direction,
    pub units: f64,
    pub realized_pl: f64,
    pub balance: f64,
}

/// The position & margin engine: account balance, the single open position
/// and every derived metric.
///
/// State machine is Flat -> Open -> Flat, re-entrant, at most one position.
/// All mutation happens on the session controller's task; the engine itself
/// is plain single-threaded state.
pub struct TradeEngine {
    margin_model: MarginModel,
    policy: MarginPolicy,
    balance: f64,
    position: Option<Position>,
    floating_pl: f64,
    equity: f64,
    used_margin: f64,
    free_margin: f64,
    margin_level_pct: f64,
    realized_pl: f64,
    history: Vec<ValuationSnapshot>,
}

impl TradeEngine {
    pub fn new(margin_model: MarginModel, policy: MarginPolicy) -> Self {
        Self {
            margin_model,
            policy,
            balance: 0.0,
            position: None,
            floating_pl: 0.0,
            equity: 0.0,
            used_margin: 0.0,
            free_margin: 0.0,
            margin_level_pct: 0.0,
            realized_pl: 0.0,
            history: Vec::new(),
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.position.is_some()
    }

    /// Trade history: one row per tick while a position is open plus a final
    /// row on close. Append-only.
    pub fn history(&self) -> &[ValuationSnapshot] {
        &self.history
    }

    /// Set the account balance to `amount`.
    ///
    /// An absolute set, not additive: a new deposit replaces the balance.
    /// Deposits are locked while a trade is running.
    pub fn deposit(&mut self, amount: f64) -> Result<f64, TradeError> {
        if self.position.is_some() {
            return Err(TradeError::InvalidAmount);
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(TradeError::InvalidAmount);
        }
        self.balance = amount;
        tracing::info!(balance = self.balance, "deposit accepted");
        Ok(self.balance)
    }

    /// Open a position at the latest quote.
    ///
    /// Entry bid and ask are both recorded: the opposite side prices the
    /// exit, so floating P&L starts at minus the spread.
    pub fn open_trade(
        &mut self,
        direction: Direction,
        units: f64,
        latest: Option<&Quote>,
    ) -> Result<&Position, TradeError> {
        let quote = latest.ok_or(TradeError::NoQuoteYet)?;
        if !units.is_finite() || units <= 0.0 {
            return Err(TradeError::InvalidUnits);
        }
        if self.position.is_some() {
            return Err(TradeError::AlreadyOpen);
        }

        let (required, _) = self
            .margin_model
            .required(direction, units, quote.bid, quote.ask);
        if self.balance < required {
            return Err(TradeError::InsufficientFunds { required });
        }

        let position = Position {
            id: Uuid::new_v4(),
            direction,
            units,
            entry_bid: quote.bid,
            entry_ask: quote.ask,
            opened_at: Utc::now(),
        };

        // Valuation starts from the entry itself so a close before the first
        // tick settles at the deposited balance.
        self.floating_pl = 0.0;
        self.equity = self.balance;
        self.used_margin = required;
        self.free_margin = self.balance - required;
        self.margin_level_pct = round_dp(self.equity / required * 100.0, 2).abs();
        self.realized_pl = 0.0;

        tracing::info!(
            direction = direction.as_str(),
            units,
            entry_bid = position.entry_bid,
            entry_ask = position.entry_ask,
            margin = required,
            "trade opened"
        );

        Ok(self.position.insert(position))
    }

    /// Revalue the open position against the latest quote.
    ///
    /// Appends a history row and enforces the margin protocol: below the
    /// call level a warning status is returned, below the stop-out level the
    /// position is liquidated on the spot.
    pub fn mark_to_market(&mut self, bid: f64, ask: f64) -> Result<MarkToMarket, TradeError> {
        let position = self.position.as_ref().ok_or(TradeError::NoOpenPosition)?;
        let direction = position.direction;
        let units = position.units;
        let entry_bid = position.entry_bid;
        let entry_ask = position.entry_ask;

        self.floating_pl = margin::floating_pl(direction, units, entry_bid, entry_ask, bid, ask);
        self.equity = self.balance + self.floating_pl;
        // Used margin follows the current quote, not the entry one.
        let (used, _) = self.margin_model.required(direction, units, bid, ask);
        self.used_margin = used;
        self.margin_level_pct = round_dp(self.equity / used * 100.0, 2).abs();
        self.free_margin = self.equity - self.used_margin;
        self.realized_pl = 0.0;

        let snapshot = self.snapshot();
        self.history.push(snapshot.clone());

        let status = self.policy.assess(self.margin_level_pct);
        let stop_out = match status {
            MarginStatus::StopOut => {
                tracing::warn!(
                    margin_level_pct = self.margin_level_pct,
                    "stop-out level breached, liquidating"
                );
                Some(self.close_trade()?)
            }
            MarginStatus::MarginCall => {
                tracing::warn!(
                    margin_level_pct = self.margin_level_pct,
                    "margin call, level below call threshold"
                );
                None
            }
            MarginStatus::Healthy => None,
        };

        Ok(MarkToMarket {
            snapshot,
            status,
            stop_out,
        })
    }

    /// Close the open position: equity becomes the new balance, the floating
    /// P&L is realized, and a final history row is appended.
    pub fn close_trade(&mut self) -> Result<ClosedTrade, TradeError> {
        let position = self.position.take().ok_or(TradeError::NoOpenPosition)?;

        self.balance = self.equity;
        self.realized_pl = self.floating_pl;
        self.free_margin = self.equity;
        self.used_margin = 0.0;
        self.floating_pl = 0.0;
        self.margin_level_pct = 0.0;

        let snapshot = self.snapshot();
        self.history.push(snapshot);

        tracing::info!(
            direction = position.direction.as_str(),
            units = position.units,
            realized_pl = self.realized_pl,
            balance = self.balance,
            "trade closed"
        );

        Ok(ClosedTrade {
            direction: position.direction,
            units: position.units,
            realized_pl: self.realized_pl,
            balance: self.balance,
        })
    }

    fn snapshot(&self) -> ValuationSnapshot {
        ValuationSnapshot {
            balance: self.balance,
            equity: self.equity,
            floating_pl: self.floating_pl,
            used_margin: self.used_margin,
            free_margin: self.free_margin,
            margin_level_pct: self.margin_level_pct,
            realized_pl: self.realized_pl,
            time: Utc::now(),
        }
    }
}
