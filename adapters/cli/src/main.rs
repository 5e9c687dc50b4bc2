#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays an outbreak session headlessly.

mod host;
mod report;
mod script;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use outbreak_world::{World, WorldConfig};

use crate::{
    host::{FramePacing, Pilot},
    report::{seed_from_phrase, Summary},
    script::Script,
};

const HOST_GRACE_SECONDS: f64 = 60.0;

#[derive(Parser, Debug)]
#[command(
    name = "outbreak",
    version,
    about = "Plays a network outbreak containment session without a window"
)]
struct Cli {
    /// Seed used to build the topology and the infection stream.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Phrase hashed into the seed; overrides `--seed`.
    #[arg(long)]
    seed_phrase: Option<String>,
    /// Canvas width in pixels.
    #[arg(long, default_value_t = 960.0)]
    width: f32,
    /// Canvas height in pixels.
    #[arg(long, default_value_t = 640.0)]
    height: f32,
    /// Mean host frame rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
    /// Standard deviation of a frame's length, in seconds.
    #[arg(long, default_value_t = 0.004)]
    frame_jitter: f64,
    /// Overrides the run length, in seconds.
    #[arg(long)]
    duration: Option<f64>,
    /// Who plays the session.
    #[arg(long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,
    /// Inputs replayed in script mode, e.g. `0.5@@120,80;0.6@p;3@s`.
    #[arg(long)]
    script: Option<String>,
    /// Host seconds after which an unfinished run is abandoned.
    #[arg(long)]
    max_host_seconds: Option<f64>,
    /// Prints the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Idle,
    Auto,
    Script,
}

/// Entry point for the outbreak command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();

    let cli = Cli::parse();
    let seed = match &cli.seed_phrase {
        Some(phrase) => seed_from_phrase(phrase),
        None => cli.seed,
    };

    let mut config = WorldConfig {
        width: cli.width,
        height: cli.height,
        ..WorldConfig::default()
    };
    if let Some(duration) = cli.duration {
        if !(duration.is_finite() && duration > 0.0) {
            bail!("--duration must be a positive number of seconds, got {duration}");
        }
        config.tuning.clock.total_time = duration;
    }

    let mut pilot = match (cli.mode, cli.script.as_deref()) {
        (Mode::Script, Some(script)) => {
            Pilot::Script(Script::parse(script).context("failed to parse --script")?)
        }
        (Mode::Script, None) => bail!("--mode script needs --script"),
        (mode, Some(_)) => bail!("--script is only used with --mode script, not {mode:?}"),
        (Mode::Idle, None) => Pilot::Idle,
        (Mode::Auto, None) => Pilot::Auto,
    };

    let pacing = FramePacing {
        fps: cli.fps,
        jitter: cli.frame_jitter,
        max_host_seconds: cli
            .max_host_seconds
            .unwrap_or(config.tuning.clock.total_time + HOST_GRACE_SECONDS),
    };

    log::info!("starting {:?} session with seed {seed:#x}", cli.mode);
    let mut world = World::new(config, seed);
    let observed = host::run(&mut world, &mut pilot, pacing, seed)?;
    let summary = Summary::collect(&world, &observed);

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{json}");
    } else {
        println!("{summary}");
    }
    Ok(())
}
