//! Streaming summary statistics over named metrics.

use crate::log::Metrics;
use crate::{PlanError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Running mean, variance and standard deviation of a fixed set of metrics.
///
/// Every update must provide all keys. With a CSV sink each update is also
/// appended as one row, below a header of the key names.
pub struct Statistics {
    keys: Vec<String>,
    count: u64,
    means: Vec<f64>,
    mean_squares: Vec<f64>,
    sink: Option<BufWriter<File>>,
}

impl Statistics {
    pub fn new<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let n = keys.len();
        Self {
            keys,
            count: 0,
            means: vec![0.0; n],
            mean_squares: vec![0.0; n],
            sink: None,
        }
    }

    /// Also write every update to a CSV file at `path` (truncated).
    pub fn with_csv(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let mut sink = BufWriter::new(File::create(path)?);
        writeln!(sink, "{}", self.keys.join(","))?;
        self.sink = Some(sink);
        Ok(self)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn update(&mut self, metrics: &Metrics) -> Result<()> {
        let row = self
            .keys
            .iter()
            .map(|k| {
                metrics
                    .get(k)
                    .map(|&v| v as f64)
                    .ok_or_else(|| PlanError::invalid(format!("missing metric '{}'", k)))
            })
            .collect::<Result<Vec<f64>>>()?;

        if let Some(sink) = self.sink.as_mut() {
            let line = row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
            writeln!(sink, "{}", line)?;
            sink.flush()?;
        }

        let keep = self.count as f64 / (self.count + 1) as f64;
        for ((mean, square), value) in self.means.iter_mut().zip(&mut self.mean_squares).zip(row) {
            *mean = *mean * keep + value * (1.0 - keep);
            *square = *square * keep + value * value * (1.0 - keep);
        }
        self.count += 1;
        Ok(())
    }

    pub fn mean(&self) -> Metrics {
        self.to_metrics(self.means.iter().copied())
    }

    pub fn variance(&self) -> Metrics {
        self.to_metrics(self.variances())
    }

    pub fn stddev(&self) -> Metrics {
        self.to_metrics(self.variances().map(f64::sqrt))
    }

    /// Table with one row each for mean, variance and standard deviation.
    pub fn render(&self) -> String {
        let width = self.keys.iter().map(String::len).max().unwrap_or(0).max(10);
        let mut out = format!("{:<8}", "");
        for key in &self.keys {
            out.push_str(&format!(" {:>width$}", key, width = width));
        }
        out.push('\n');
        for (label, values) in [
            ("mean", self.mean()),
            ("var", self.variance()),
            ("stddev", self.stddev()),
        ] {
            out.push_str(&format!("{:<8}", label));
            for key in &self.keys {
                out.push_str(&format!(" {:>width$.4}", values[key], width = width));
            }
            out.push('\n');
        }
        out
    }

    // Rounding can push the difference slightly below zero.
    fn variances(&self) -> impl Iterator<Item = f64> + '_ {
        self.means
            .iter()
            .zip(&self.mean_squares)
            .map(|(m, s)| (s - m * m).max(0.0))
    }

    fn to_metrics(&self, values: impl Iterator<Item = f64>) -> Metrics {
        self.keys
            .iter()
            .cloned()
            .zip(values.map(|v| v as f32))
            .collect()
    }
}
