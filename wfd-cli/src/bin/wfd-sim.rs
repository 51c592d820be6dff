//! WFD Sim - replay a scenario against the rate controller
//!
//! Builds a simulated sink from a TOML scenario, starts a session on it and
//! feeds the scenario's timed events in, then prints the final statistics.
//!
//! Examples:
//!   wfd-sim --example > scenario.toml
//!   wfd-sim --scenario scenario.toml --speed 10

use clap::Parser;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use wfd::RateController;
use wfd_cli::{
    apply_action, display_compact_stats, display_session_stats, format_bandwidth, Scenario,
    SimConnection, SimEstimator, SimListener,
};

#[derive(Parser, Debug)]
#[command(name = "wfd-sim")]
#[command(about = "Wireless display rate control simulator", long_about = None)]
struct Args {
    /// Scenario file (TOML)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Print an example scenario and exit
    #[arg(long)]
    example: bool,

    /// Time compression factor applied to events and session timers
    #[arg(long, default_value = "1")]
    speed: u32,

    /// Print a status line after every event
    #[arg(long)]
    progress: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.example {
        print!("{}", Scenario::example().to_toml()?);
        return Ok(());
    }

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    let Some(path) = args.scenario else {
        anyhow::bail!("A scenario is required (use --scenario, or --example for a template)");
    };
    let scenario = Scenario::from_file(&path)?;
    let speed = args.speed.max(1);
    tracing::info!(
        "Loaded {} events from {} (speed x{})",
        scenario.events.len(),
        path.display(),
        speed
    );

    let peer = SimConnection::from_scenario(&scenario);
    let reported = Arc::new(Mutex::new(None));
    let disconnect = Arc::new(Mutex::new(None));

    let mut controller = RateController::new(scenario.scaled_session(speed))?;
    tracing::info!(
        "Default format: {}",
        controller.default_video_format(scenario.game_mode)
    );
    controller.configure(peer.clone(), Box::new(SimEstimator::new(reported.clone())));
    controller.start(
        Box::new(SimListener::new(peer.clone(), disconnect.clone())),
        scenario.game_mode,
    )?;

    let started = Instant::now();
    let scale = |ms: u64| Duration::from_millis(ms / u64::from(speed));

    for event in &scenario.events {
        let due = scale(event.at_ms);
        let elapsed = started.elapsed();
        if due > elapsed {
            thread::sleep(due - elapsed);
        }

        if !controller.is_running() {
            tracing::warn!("Session ended before the scenario finished");
            break;
        }

        tracing::debug!("t={}ms {:?}", event.at_ms, event.action);
        if let Err(e) = apply_action(&event.action, &controller, &peer) {
            tracing::warn!("Could not deliver {:?}: {}", event.action, e);
        }

        if args.progress {
            display_compact_stats(&controller.stats(), started.elapsed());
        }
    }

    thread::sleep(scale(scenario.settle_ms));
    let elapsed = started.elapsed();
    let stats = controller.stats();

    if controller.is_running() {
        controller.stop()?;
    }

    display_session_stats(&stats, elapsed);

    let (accepted, refused) = peer.renegotiation_counts();
    println!(
        "Peer: {} accepted / {} refused renegotiations, {} key frames, {}{}",
        accepted,
        refused,
        peer.idr_requests(),
        if peer.is_connected() { "connected" } else { "disconnected" },
        if peer.is_paused() { ", paused" } else { "" }
    );
    if let Some(mbps) = *reported.lock() {
        println!(
            "Last rate reported to estimator: {}",
            format_bandwidth(u64::from(mbps) * 1000)
        );
    }
    if let Some(reason) = *disconnect.lock() {
        println!("Session requested disconnect: {:?}", reason);
    }

    Ok(())
}
