//! Logging setup on top of `tracing`.
//!
//! Library code only emits events; installing a subscriber is left to the
//! binary (or to tests that want output).

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

use crate::common::config::AppCfg;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns `false` when a subscriber was already installed.
pub fn init(cfg: &AppCfg) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("netsec_core={},warn", cfg.log_level)));

    if cfg.log_json {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false)
            .with_writer(std::io::stderr);
        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    } else {
        let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let cfg = AppCfg::default();
        let _ = init(&cfg);
        assert!(!init(&cfg));
    }
}
