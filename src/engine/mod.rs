// Position & margin engine
pub mod margin;
pub mod trade_engine;

pub use margin::{MarginModel, PIP};
pub use trade_engine::{ClosedTrade, MarkToMarket, TradeEngine};

use thiserror::Error;

/// Recoverable trading faults, surfaced to the user as status messages.
/// None of these are fatal; state is never mutated on the error path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeError {
    #[error("wrong number, deposits must be a positive amount while no trade is running")]
    InvalidAmount,

    #[error("wrong number, units must be a positive amount")]
    InvalidUnits,

    #[error("waiting for the first price")]
    NoQuoteYet,

    #[error("a trade is already in progress")]
    AlreadyOpen,

    #[error("no trade in progress")]
    NoOpenPosition,

    #[error("not enough funds, increase balance to at least ${required:.2}")]
    InsufficientFunds { required: f64 },
}
