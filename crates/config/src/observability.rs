//! §4.15 (ambient): process-wide tracing initialization, driven by
//! [`crate::ObservabilityConfig`].

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::ObservabilityConfig;

/// Installs a global `tracing` subscriber. `RUST_LOG` overrides
/// `config.log_level` when set. Call once at process start; a second call
/// is a no-op (the global subscriber is already set).
pub fn init_tracing(config: &ObservabilityConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("hr_rag={}", config.log_level).into());

    let fmt_layer =
        if config.log_json { tracing_subscriber::fmt::layer().json().boxed() } else { tracing_subscriber::fmt::layer().boxed() };

    let _ = tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init();
}
