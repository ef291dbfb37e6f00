mod export;
mod paths;

use std::{
    fs::{self, File},
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use owb_sim::utils::{SimConfig, TrajectoryRecorder, WheelSpeeds};
use tracing::info;

use crate::{
    export::{write_history, Format},
    paths::{Circle, Line, PathGenerator, Spiral},
};

#[derive(Parser)]
#[clap(version = "1.0", about = "Simulate an omni-wheel robot and export its trajectory")]
struct Opts {
    /// TOML file with [robot], [simulation] and [initial_pose] tables
    #[clap(long)]
    config: Option<PathBuf>,
    /// override the integration time step (s)
    #[clap(long)]
    dt: Option<f64>,
    /// override the wheel radius (m)
    #[clap(long)]
    wheel_radius: Option<f64>,
    /// override the centre-to-wheel distance (m)
    #[clap(long)]
    wheel_distance: Option<f64>,
    /// simulated duration (s)
    #[clap(long, default_value_t = 10.0)]
    duration: f64,
    /// write samples here instead of stdout
    #[clap(long, short)]
    output: Option<PathBuf>,
    #[clap(long, value_enum, default_value_t = Format::Tsv)]
    format: Format,
    #[clap(subcommand)]
    drive: Option<Drive>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Drive {
    /// constant wheel speeds
    Wheels {
        #[clap(long, default_value_t = 1.0, allow_hyphen_values = true)]
        v: f64,
        #[clap(long, default_value_t = -1.0, allow_hyphen_values = true)]
        w: f64,
        #[clap(long, default_value_t = 1.0, allow_hyphen_values = true)]
        z: f64,
    },
    /// constant body velocity
    Line {
        #[clap(long, default_value_t = 1.0, allow_hyphen_values = true)]
        vx: f64,
        #[clap(long, default_value_t = 0.0, allow_hyphen_values = true)]
        vy: f64,
        #[clap(long, default_value_t = 0.0, allow_hyphen_values = true)]
        omega: f64,
    },
    /// circle at constant speed
    Circle {
        #[clap(long, default_value_t = 1.0)]
        radius: f64,
        #[clap(long, default_value_t = 0.5, allow_hyphen_values = true)]
        speed: f64,
    },
    /// expanding spiral
    Spiral {
        #[clap(long, default_value_t = 0.1)]
        start_radius: f64,
        #[clap(long, default_value_t = 0.05, allow_hyphen_values = true)]
        growth: f64,
        #[clap(long, default_value_t = 1.0, allow_hyphen_values = true)]
        angular_rate: f64,
    },
}

impl Default for Drive {
    fn default() -> Self {
        Drive::Wheels {
            v: 1.0,
            w: -1.0,
            z: 1.0,
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    info!("Loading configuration from {}", path.display());
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse config file {}", path.display()))
}

fn apply_overrides(
    cfg: &mut SimConfig,
    opts: &Opts,
) {
    if let Some(dt) = opts.dt {
        cfg.simulation.dt = dt;
    }
    if let Some(r) = opts.wheel_radius {
        cfg.robot.wheel_radius = r;
    }
    if let Some(d) = opts.wheel_distance {
        cfg.robot.wheel_distance = d;
    }
}

fn follow<G: PathGenerator>(
    rec: &mut TrajectoryRecorder,
    generator: G,
    duration: f64,
) -> anyhow::Result<usize> {
    Ok(rec.run_with(duration, |t| generator.velocity(t))?)
}

fn simulate(
    rec: &mut TrajectoryRecorder,
    drive: Drive,
    duration: f64,
) -> anyhow::Result<usize> {
    info!(?drive, duration, "Starting simulation");
    match drive {
        Drive::Wheels { v, w, z } => Ok(rec.run(WheelSpeeds::new(v, w, z), duration)?),
        Drive::Line { vx, vy, omega } => follow(rec, Line::new(vx, vy, omega), duration),
        Drive::Circle { radius, speed } => follow(rec, Circle::new(radius, speed)?, duration),
        Drive::Spiral {
            start_radius,
            growth,
            angular_rate,
        } => follow(rec, Spiral::new(start_radius, growth, angular_rate)?, duration),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let opts: Opts = Opts::parse();
    let mut cfg = load_config(opts.config.as_deref())?;
    apply_overrides(&mut cfg, &opts);
    let mut rec = cfg.build().context("invalid simulation parameters")?;
    info!(geometry = %rec.model().geometry(), dt = rec.dt(), "Robot ready");

    let steps = simulate(&mut rec, opts.drive.unwrap_or_default(), opts.duration)
        .context("simulation failed")?;
    info!(steps, time = rec.time(), pose = %rec.pose(), "Simulation complete");

    match &opts.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_history(BufWriter::new(file), &rec, opts.format)?;
            info!("Wrote {} samples to {}", rec.len(), path.display());
        }
        None => write_history(BufWriter::new(io::stdout().lock()), &rec, opts.format)?,
    }
    Ok(())
}
