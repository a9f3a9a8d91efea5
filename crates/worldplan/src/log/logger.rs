//! Metric logger trait and composites.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Named scalar metrics, ordered by name.
pub type Metrics = BTreeMap<String, f32>;

/// Sink for metrics indexed by a step (episode number, planning call, ...).
pub trait MetricLogger: Send + Sync {
    fn log_scalar(&self, name: &str, value: f32, step: u64);

    fn log_metrics(&self, metrics: &Metrics, step: u64) {
        for (name, value) in metrics {
            self.log_scalar(name, *value, step);
        }
    }

    /// Flush pending writes.
    fn close(&self) {}
}

/// Discards everything.
pub struct NoOpLogger;

impl MetricLogger for NoOpLogger {
    fn log_scalar(&self, _name: &str, _value: f32, _step: u64) {}
    fn log_metrics(&self, _metrics: &Metrics, _step: u64) {}
}

/// Keeps every scalar in memory as `(step, name, value)`.
#[derive(Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<(u64, String, f32)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(u64, String, f32)> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Values logged under `name`, in logging order.
    pub fn values(&self, name: &str) -> Vec<f32> {
        self.records()
            .into_iter()
            .filter(|(_, n, _)| n == name)
            .map(|(_, _, v)| v)
            .collect()
    }
}

impl MetricLogger for MemoryLogger {
    fn log_scalar(&self, name: &str, value: f32, step: u64) {
        if let Ok(mut records) = self.records.lock() {
            records.push((step, name.to_string(), value));
        }
    }
}

/// Dispatches to several backends in order.
#[derive(Default)]
pub struct CompositeLogger {
    loggers: Vec<Box<dyn MetricLogger>>,
}

impl CompositeLogger {
    pub fn new(loggers: Vec<Box<dyn MetricLogger>>) -> Self {
        Self { loggers }
    }

    pub fn add(&mut self, logger: Box<dyn MetricLogger>) {
        self.loggers.push(logger);
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl MetricLogger for CompositeLogger {
    fn log_scalar(&self, name: &str, value: f32, step: u64) {
        for logger in &self.loggers {
            logger.log_scalar(name, value, step);
        }
    }

    fn log_metrics(&self, metrics: &Metrics, step: u64) {
        for logger in &self.loggers {
            logger.log_metrics(metrics, step);
        }
    }

    fn close(&self) {
        for logger in &self.loggers {
            logger.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Shared(Arc<MemoryLogger>);

    impl MetricLogger for Shared {
        fn log_scalar(&self, name: &str, value: f32, step: u64) {
            self.0.log_scalar(name, value, step);
        }
    }

    #[test]
    fn test_composite_fans_out() {
        let a = Arc::new(MemoryLogger::new());
        let b = Arc::new(MemoryLogger::new());
        let mut composite = CompositeLogger::default();
        composite.add(Box::new(Shared(a.clone())));
        composite.add(Box::new(Shared(b.clone())));
        composite.add(Box::new(NoOpLogger));
        assert_eq!(composite.len(), 3);

        let mut metrics = Metrics::new();
        metrics.insert("success".into(), 1.0);
        metrics.insert("return".into(), 2.5);
        composite.log_metrics(&metrics, 4);

        // Metrics arrive sorted by name.
        let expected = vec![
            (4, "return".to_string(), 2.5),
            (4, "success".to_string(), 1.0),
        ];
        assert_eq!(a.records(), expected);
        assert_eq!(b.records(), expected);
    }

    #[test]
    fn test_memory_logger_values() {
        let logger = MemoryLogger::new();
        logger.log_scalar("x", 1.0, 0);
        logger.log_scalar("y", 5.0, 0);
        logger.log_scalar("x", 2.0, 1);
        assert_eq!(logger.values("x"), vec![1.0, 2.0]);
    }
}
