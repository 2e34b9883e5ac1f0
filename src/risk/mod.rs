// Risk management module
pub mod margin_policy;

pub use margin_policy::{MarginPolicy, MarginStatus};
