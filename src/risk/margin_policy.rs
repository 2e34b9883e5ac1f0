use serde::{Deserialize, Serialize};

/// Margin supervision thresholds, in percent of used margin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginPolicy {
    pub margin_call_level_pct: f64,
    pub stop_out_level_pct: f64,
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self {
            margin_call_level_pct: 100.0, // warning only
            stop_out_level_pct: 50.0,     // forced liquidation
        }
    }
}

/// Outcome of checking a margin level against the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginStatus {
    Healthy,
    /// Below the call level: warn, keep the position open
    MarginCall,
    /// Below the stop-out level: the position must be liquidated
    StopOut,
}

impl MarginPolicy {
    /// Classify a margin level. Stop-out wins when both thresholds are
    /// breached.
    pub fn assess(&self, margin_level_pct: f64) -> MarginStatus {
        if margin_level_pct < self.stop_out_level_pct {
            MarginStatus::StopOut
        } else if margin_level_pct < self.margin_call_level_pct {
            MarginStatus::MarginCall
        } else {
            MarginStatus::Healthy
        }
    }
}
