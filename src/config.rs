use std::time::Duration;

use crate::engine::MarginModel;
use crate::risk::MarginPolicy;

/// Runtime knobs for one simulated trading session.
///
/// Defaults: a quote every 5 seconds, a 1-second scheduler, 30-second OHLC
/// windows and a 500-second session ceiling. Every knob can be overridden
/// from the environment (see [`SimConfig::from_env`]).
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Seconds between generated quotes
    pub quote_interval: Duration,
    /// Fixed period of the session controller loop
    pub scheduler_interval: Duration,
    /// Wall-clock duration of one OHLC bar window
    pub bar_window: Duration,
    /// Total session lifetime; the market "closes" once it elapses
    pub session_limit: Duration,
    /// Fraction of position value reserved as margin (0.2 = 5x leverage)
    pub margin_rate: f64,
    /// Margin level below which a margin-call warning fires
    pub margin_call_level_pct: f64,
    /// Margin level below which the position is liquidated
    pub stop_out_level_pct: f64,
    /// Seed for the price walk; None draws from entropy
    pub rng_seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            quote_interval: Duration::from_secs(5),
            scheduler_interval: Duration::from_secs(1),
            bar_window: Duration::from_secs(30),
            session_limit: Duration::from_secs(500),
            margin_rate: 0.2,
            margin_call_level_pct: 100.0,
            stop_out_level_pct: 50.0,
            rng_seed: None,
        }
    }
}

impl SimConfig {
    /// Build a config from defaults plus environment overrides.
    ///
    /// Unparseable values fall back to the default rather than aborting the
    /// session.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(secs) = env_u64("FXSIM_QUOTE_SECS") {
            cfg.quote_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("FXSIM_SCHEDULER_SECS") {
            cfg.scheduler_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("FXSIM_BAR_SECS") {
            cfg.bar_window = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("FXSIM_SESSION_SECS") {
            cfg.session_limit = Duration::from_secs(secs);
        }
        if let Some(rate) = env_f64("FXSIM_MARGIN_RATE") {
            cfg.margin_rate = rate;
        }
        if let Some(seed) = env_u64("FXSIM_SEED") {
            cfg.rng_seed = Some(seed);
        }
        cfg
    }

    /// Margin model for the fixed EUR/USD pair at this config's margin rate.
    pub fn margin_model(&self) -> MarginModel {
        MarginModel {
            margin_rate: self.margin_rate,
            ..MarginModel::default()
        }
    }

    pub fn margin_policy(&self) -> MarginPolicy {
        MarginPolicy {
            margin_call_level_pct: self.margin_call_level_pct,
            stop_out_level_pct: self.stop_out_level_pct,
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.quote_interval, Duration::from_secs(5));
        assert_eq!(cfg.scheduler_interval, Duration::from_secs(1));
        assert_eq!(cfg.bar_window, Duration::from_secs(30));
        assert_eq!(cfg.session_limit, Duration::from_secs(500));
        assert_eq!(cfg.margin_rate, 0.2);
        assert_eq!(cfg.margin_call_level_pct, 100.0);
        assert_eq!(cfg.stop_out_level_pct, 50.0);
        assert!(cfg.rng_seed.is_none());
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("FXSIM_BAR_SECS", "10");
        std::env::set_var("FXSIM_SEED", "42");
        std::env::set_var("FXSIM_MARGIN_RATE", "not-a-number");

        let cfg = SimConfig::from_env();
        assert_eq!(cfg.bar_window, Duration::from_secs(10));
        assert_eq!(cfg.rng_seed, Some(42));
        // Bad values fall back to the default
        assert_eq!(cfg.margin_rate, 0.2);

        std::env::remove_var("FXSIM_BAR_SECS");
        std::env::remove_var("FXSIM_SEED");
        std::env::remove_var("FXSIM_MARGIN_RATE");
    }

    #[test]
    fn test_margin_model_uses_configured_rate() {
        let cfg = SimConfig {
            margin_rate: 0.1,
            ..Default::default()
        };
        assert_eq!(cfg.margin_model().margin_rate, 0.1);
    }
}
