//! Metric sinks for episode and evaluation summaries.
//!
//! Provides:
//! - `MetricLogger` trait for composable backends
//! - `ConsoleLogger` that reports through `tracing`
//! - `MemoryLogger` that keeps records for later inspection
//! - `CompositeLogger` for fanning out to several backends

mod console;
mod logger;

pub use console::ConsoleLogger;
pub use logger::{CompositeLogger, MemoryLogger, MetricLogger, Metrics, NoOpLogger};
