use std::time::Duration;

use crate::packet::PAYLOAD_LEN;

/// Protocol parameters from §6, collected so tests (and, in principle,
/// deployments with different link characteristics) can override them
/// without touching global state.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub segment_len: usize,
    pub max_segments_per_send: usize,
    pub min_window: u8,
    pub max_window: u8,
    pub timeout: Duration,
    pub timeouts_to_broken: u32,
    pub loss_prob: f64,
    pub corr_prob: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            segment_len: PAYLOAD_LEN,
            max_segments_per_send: 1024,
            min_window: 1,
            max_window: 4,
            timeout: Duration::from_secs(1),
            timeouts_to_broken: 5,
            loss_prob: 0.09,
            corr_prob: 0.001,
        }
    }
}

impl Config {
    /// Read overrides from the environment, falling back to the spec
    /// defaults. The CLI binaries use this; the library default stays
    /// pure (`Config::default()`, no environment access).
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(v) = std::env::var("GBN_LOSS_PROB") {
            if let Ok(v) = v.parse() {
                config.loss_prob = v;
            }
        }
        if let Ok(v) = std::env::var("GBN_CORR_PROB") {
            if let Ok(v) = v.parse() {
                config.corr_prob = v;
            }
        }
        if let Ok(v) = std::env::var("GBN_TIMEOUT_MS") {
            if let Ok(v) = v.parse() {
                config.timeout = Duration::from_millis(v);
            }
        }
        config
    }
}
