// Core modules
pub mod aggregator;
pub mod config;
pub mod engine;
pub mod feed;
pub mod models;
pub mod risk;
pub mod session;

// Re-export commonly used types
pub use engine::{TradeEngine, TradeError};
pub use models::*;
pub use session::{Command, SessionController, SessionEvent, SessionReport};
