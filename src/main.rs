//! Headless driver: rolls dice and prints the settled faces.
//!
//! Usage: `dice_roller_3d [count] [config.json]`
//!
//! Stands in for the render loop of a real frontend: ticks the engine at a
//! nominal 60 Hz with the measured frame delta and polls the roll's receiver
//! until it completes.

use std::env;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use roller_core::{DiceEngine, DieSpec, EngineConfig, EngineEvent};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = env::args().skip(1);
    let count: i32 = match args.next().map(|a| a.parse()).transpose() {
        Ok(count) => count.unwrap_or(5),
        Err(err) => {
            error!("roll count must be an integer: {err}");
            return ExitCode::FAILURE;
        }
    };
    let config = match args.next() {
        Some(path) => match EngineConfig::load_json(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("failed to load {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    let mut engine = DiceEngine::new(config);
    engine.load_die(DieSpec::default());

    let mut receiver = match engine.start_roll(count) {
        Ok(receiver) => receiver,
        Err(err) => {
            error!("roll rejected: {err}");
            return ExitCode::FAILURE;
        }
    };

    let frame = Duration::from_millis(16);
    let mut last_tick = Instant::now();
    loop {
        thread::sleep(frame);
        let now = Instant::now();
        engine.update(now.duration_since(last_tick).as_secs_f64());
        last_tick = now;

        for event in engine.drain_events() {
            if let EngineEvent::RollSettled { session, .. } = event {
                info!(session, "settled after {:.1} s", engine.clock());
            }
        }

        match receiver.try_recv() {
            Ok(None) => continue,
            Ok(Some(Ok(values))) => {
                let total: u32 = values.iter().map(|&v| u32::from(v)).sum();
                println!(
                    "rolled {}: {:?} (total {total})",
                    values.len(),
                    values
                );
                return ExitCode::SUCCESS;
            }
            Ok(Some(Err(err))) => {
                error!("roll failed: {err}");
                return ExitCode::FAILURE;
            }
            Err(_) => {
                error!("roll was cancelled");
                return ExitCode::FAILURE;
            }
        }
    }
}
