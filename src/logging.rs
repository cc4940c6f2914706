use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Registry,
};
use tracing_error::ErrorLayer;

/// Initializes the logging and tracing system.
///
/// `app_env` selects the output format:
/// - `development` (default): pretty-printed, colored logs for the console.
/// - `production`: JSON-formatted logs for aggregation.
pub fn init_logging(app_env: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("param_cleaner=info,tower_http=info"));

    let registry = Registry::default()
        .with(env_filter)
        .with(ErrorLayer::default());

    if app_env == "production" {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);

        registry.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(std::io::stderr);

        registry.with(fmt_layer).init();
    }

    tracing::debug!(env = %app_env, "Logging system initialized");
}

/// Logs how long a block took, at debug level, when dropped.
pub struct Timer {
    label: &'static str,
    start: std::time::Instant,
}

impl Timer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        tracing::debug!(
            label = %self.label,
            duration_ms = %duration.as_millis(),
            "Operation completed"
        );
    }
}
