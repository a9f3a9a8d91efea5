//! Per-iteration diagnostics for the CEM optimizer.

use super::simulate::simulate_plan;
use crate::{PlanError, Result};
use crossbeam_channel::{unbounded, Sender};
use ndarray::{Array1, Array3, Axis};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::thread::{spawn, JoinHandle};
use std::{fs, io};

/// Elites of one CEM iteration, copied out of the optimizer.
#[derive(Clone, Debug)]
pub struct IterationSnapshot {
    pub iteration: usize,
    /// `[top_k, horizon, action_dim]`
    pub elite_actions: Array3<f32>,
    pub elite_scores: Array1<f32>,
}

/// Receives a snapshot after every refit.
pub trait CemObserver: Send + Sync {
    fn on_iteration(&self, snapshot: &IterationSnapshot);
}

struct Frame {
    iteration: usize,
    positions: Array3<f32>,
    values: Array1<f32>,
}

enum Command {
    Draw(Frame),
    Flush(Sender<Option<io::Error>>),
}

/// Draws the elite trajectories of 1-D steering plans as SVG files.
///
/// Positions come from [`simulate_plan`]; each line is colored from blue
/// (worst elite) to red (best). Rendering happens on a background thread, so
/// the optimizer never waits on disk. Files are named `cem_step_NNN.svg`
/// after the iteration index and overwritten by later planning calls.
pub struct TrajectoryPlotter {
    dir: PathBuf,
    goal: [f32; 2],
    cmd_tx: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl TrajectoryPlotter {
    /// Start a plotter writing into `dir` (created if missing). `goal` is the
    /// goal position relative to the agent.
    pub fn new(dir: impl AsRef<Path>, goal: [f32; 2]) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let (cmd_tx, cmd_rx) = unbounded::<Command>();
        let out = dir.clone();
        let worker = spawn(move || {
            let mut failure: Option<io::Error> = None;
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Draw(frame) => {
                        let path = out.join(frame_name(frame.iteration));
                        let svg = render_svg(&frame.positions, &frame.values, goal);
                        if let Err(e) = fs::write(&path, svg) {
                            tracing::warn!(path = %path.display(), error = %e, "failed to write plot");
                            failure.get_or_insert(e);
                        }
                    }
                    Command::Flush(ack) => {
                        let _ = ack.send(failure.take());
                    }
                }
            }
        });

        Ok(Self {
            dir,
            goal,
            cmd_tx: Some(cmd_tx),
            worker: Some(worker),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn goal(&self) -> [f32; 2] {
        self.goal
    }

    /// Wait until every queued frame is on disk. Reports the first write
    /// failure since the previous flush.
    pub fn flush(&self) -> Result<()> {
        let stopped = || PlanError::IoError(io::Error::new(io::ErrorKind::Other, "plot writer stopped"));
        let cmd_tx = self.cmd_tx.as_ref().ok_or_else(stopped)?;
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        cmd_tx.send(Command::Flush(ack_tx)).map_err(|_| stopped())?;
        match ack_rx.recv().map_err(|_| stopped())? {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl CemObserver for TrajectoryPlotter {
    fn on_iteration(&self, snapshot: &IterationSnapshot) {
        let positions = match simulate_plan(snapshot.elite_actions.view()) {
            Ok(positions) => positions,
            Err(e) => {
                tracing::warn!(error = %e, "skipping plot");
                return;
            }
        };
        let frame = Frame {
            iteration: snapshot.iteration,
            positions,
            values: normalize_scores(&snapshot.elite_scores),
        };
        if let Some(cmd_tx) = &self.cmd_tx {
            if cmd_tx.send(Command::Draw(frame)).is_err() {
                tracing::warn!("plot writer stopped, dropping frame");
            }
        }
    }
}

impl Drop for TrajectoryPlotter {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the queue drains.
        self.cmd_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// File name of the plot for `iteration`.
pub fn frame_name(iteration: usize) -> String {
    format!("cem_step_{:03}.svg", iteration)
}

/// Rescale scores to `[0, 1]`. When all scores are equal every value is 1.
pub fn normalize_scores(scores: &Array1<f32>) -> Array1<f32> {
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return Array1::ones(scores.len());
    }
    scores.mapv(|s| ((s - min) / range).clamp(0.0, 1.0))
}

const SIZE: f32 = 480.0;

/// Render trajectories `[batch, steps, 2]` colored by `values` in `[0, 1]`.
///
/// The view is square with equal axis scales, spans the origin and the goal
/// plus a margin of 20% of the goal distance, and grows to fit every
/// trajectory. `+y` points up.
pub fn render_svg(positions: &Array3<f32>, values: &Array1<f32>, goal: [f32; 2]) -> String {
    let margin = (goal[0].hypot(goal[1]) * 0.2).max(0.25);
    let (mut x0, mut x1) = (goal[0].min(0.0) - margin, goal[0].max(0.0) + margin);
    let (mut y0, mut y1) = (goal[1].min(0.0) - margin, goal[1].max(0.0) + margin);
    for point in positions.lanes(Axis(2)) {
        x0 = x0.min(point[0]);
        x1 = x1.max(point[0]);
        y0 = y0.min(point[1]);
        y1 = y1.max(point[1]);
    }
    let extent = (x1 - x0).max(y1 - y0);
    let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
    let scale = SIZE / extent;
    let to_px = |x: f32, y: f32| {
        (
            (x - cx) * scale + SIZE / 2.0,
            SIZE / 2.0 - (y - cy) * scale,
        )
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{0}" height="{0}" viewBox="0 0 {0} {0}">"#,
        SIZE
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    for (trajectory, &value) in positions.axis_iter(Axis(0)).zip(values.iter()) {
        let points: Vec<String> = trajectory
            .lanes(Axis(1))
            .into_iter()
            .map(|p| {
                let (px, py) = to_px(p[0], p[1]);
                format!("{:.2},{:.2}", px, py)
            })
            .collect();
        let _ = writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-opacity="0.3"/>"#,
            points.join(" "),
            blue_red(value)
        );
    }

    let (ox, oy) = to_px(0.0, 0.0);
    let (gx, gy) = to_px(goal[0], goal[1]);
    let _ = writeln!(svg, r#"<circle cx="{:.2}" cy="{:.2}" r="5" fill="black"/>"#, ox, oy);
    let _ = writeln!(svg, r#"<circle cx="{:.2}" cy="{:.2}" r="5" fill="green"/>"#, gx, gy);
    svg.push_str("</svg>\n");
    svg
}

fn blue_red(value: f32) -> String {
    let v = value.clamp(0.0, 1.0);
    let red = (255.0 * v).round() as u8;
    let blue = (255.0 * (1.0 - v)).round() as u8;
    format!("#{:02x}00{:02x}", red, blue)
}
