//! Console logging backend.

use super::{MetricLogger, Metrics};

/// Reports metrics as `tracing` events at info level.
#[derive(Default)]
pub struct ConsoleLogger {
    prefix: Option<String>,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label every line, e.g. with the agent name.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn format_line(&self, metrics: &Metrics, step: u64) -> String {
        let body = metrics
            .iter()
            .map(|(name, value)| format!("{}={:.4}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        match &self.prefix {
            Some(prefix) => format!("[{}] episode {}: {}", prefix, step, body),
            None => format!("episode {}: {}", step, body),
        }
    }
}

impl MetricLogger for ConsoleLogger {
    fn log_scalar(&self, name: &str, value: f32, step: u64) {
        let mut metrics = Metrics::new();
        metrics.insert(name.to_string(), value);
        tracing::info!("{}", self.format_line(&metrics, step));
    }

    fn log_metrics(&self, metrics: &Metrics, step: u64) {
        // One line per step.
        tracing::info!("{}", self.format_line(metrics, step));
    }
}
