// Synthetic quote feed
pub mod generator;
pub mod stream;

pub use generator::{QuoteGenerator, PRICE_FLOOR};
pub use stream::spawn_quote_stream;
