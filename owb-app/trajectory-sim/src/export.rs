//! Pose history exporters.
//!
//! Exporters only read a recorder; they never touch model or recorder state.

use std::io::Write;

use clap::ValueEnum;
use owb_sim::utils::{Pose, TrajectoryRecorder};
use serde::Serialize;

/// Output encodings for a recorded trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// `x<TAB>y<TAB>theta`, one sample per line.
    #[default]
    Tsv,
    /// One JSON object per line with the sample time.
    Json,
}

#[derive(Serialize)]
struct Sample {
    t: f64,
    x: f64,
    y: f64,
    theta: f64,
}

/// Write every recorded sample in time order.
pub fn write_history<W: Write>(
    mut out: W,
    recorder: &TrajectoryRecorder,
    format: Format,
) -> anyhow::Result<()> {
    match format {
        Format::Tsv => write_tsv(&mut out, recorder.history())?,
        Format::Json => {
            for (t, Pose { x, y, theta }) in recorder.samples() {
                serde_json::to_writer(&mut out, &Sample { t, x, y, theta })?;
                out.write_all(b"\n")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn write_tsv<W: Write>(
    out: &mut W,
    history: &[Pose],
) -> std::io::Result<()> {
    for pose in history {
        writeln!(out, "{}\t{}\t{}", pose.x, pose.y, pose.theta)?;
    }
    Ok(())
}
