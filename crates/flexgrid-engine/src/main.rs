//! Headless runner for the FlexGrid game.
//!
//! Loads the game configuration, starts the tick timer, and follows the
//! published snapshots until the game ends. With the autopilot enabled the
//! runner also plays the game, steering the tools after every tick.
//!
//! # Startup Sequence
//!
//! 1. Read runner settings from the environment
//! 2. Load configuration from `flexgrid-config.yaml`
//! 3. Initialize structured logging (tracing)
//! 4. Build the engine and subscribe to its snapshots
//! 5. Start the timer and follow snapshots until a stop condition
//! 6. Log the result and the final snapshot

mod autopilot;
mod error;
mod settings;

use flexgrid_core::catalog::{ALL_TOOLS, events_for};
use flexgrid_core::{GameConfig, GameEngine, ToolWrite};
use flexgrid_types::{EngineStatus, GameOverReason, GameSnapshot, Impact};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::settings::RunSettings;

/// Why the runner stopped following the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunEndReason {
    /// The third warning fired.
    GameOver(GameOverReason),
    /// The configured wall-clock limit elapsed.
    TimeLimit,
    /// Ctrl+C was received.
    Interrupted,
    /// The engine dropped its broadcast sender.
    ChannelClosed,
}

/// Application entry point for the FlexGrid runner.
///
/// # Errors
///
/// Returns an error if settings, configuration, or engine construction
/// fail.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1-2. Settings and configuration come first: the config names the
    //      default log level.
    let settings = RunSettings::from_env()?;
    let config = load_config(&settings)?;

    // 3. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("flexgrid-engine starting");
    info!(
        config_path = %settings.config_path.display(),
        initial_population = config.population.initial_population,
        target_years = config.time.target_years,
        target_real_minutes = config.time.target_real_minutes,
        base_interval_ms = config.ticks.base_interval_ms,
        seed = ?config.engine.seed,
        autopilot = settings.autopilot,
        max_real_time_seconds = settings.max_real_time.map(|limit| limit.as_secs()),
        "Configuration loaded"
    );

    info!(
        demand_events = events_for(Impact::Demand).count(),
        supply_events = events_for(Impact::Supply).count(),
        tools = ALL_TOOLS.len(),
        "Catalogs loaded"
    );

    // 4. Build the engine.
    let engine = GameEngine::new(config).map_err(EngineError::from)?;
    let mut rx = engine.subscribe();
    info!(
        tick_interval_ms = engine.state().tick_interval_ms,
        "Engine initialized"
    );

    // 5. Follow the game.
    if engine.status() != EngineStatus::Running {
        engine.start();
    }
    let reason = follow(&engine, &mut rx, &settings).await;
    engine.stop();

    // 6. Log results.
    let final_snapshot = engine.state();
    log_run_end(reason, &final_snapshot);
    let json = serde_json::to_string(&final_snapshot).map_err(EngineError::from)?;
    info!(snapshot = %json, "Final snapshot");

    info!(
        end_reason = ?reason,
        total_ticks = final_snapshot.tick_count,
        "flexgrid-engine shutdown complete"
    );
    Ok(())
}

/// Load the game configuration, falling back to defaults when the file
/// does not exist.
fn load_config(settings: &RunSettings) -> Result<GameConfig, EngineError> {
    if settings.config_path.exists() {
        Ok(GameConfig::from_file(&settings.config_path)?)
    } else {
        // Logging is not initialized yet.
        eprintln!(
            "config file {} not found, using defaults",
            settings.config_path.display()
        );
        Ok(GameConfig::default())
    }
}

/// Consume snapshots until the game ends or the runner is told to stop.
async fn follow(
    engine: &GameEngine,
    rx: &mut tokio::sync::broadcast::Receiver<GameSnapshot>,
    settings: &RunSettings,
) -> RunEndReason {
    let deadline = settings
        .max_real_time
        .and_then(|limit| Instant::now().checked_add(limit));
    let time_limit = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(time_limit);

    let mut last_tick = engine.state().tick_count;
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(snapshot) => {
                    if let Some(reason) = snapshot.game_over_reason {
                        log_tick(&snapshot);
                        return RunEndReason::GameOver(reason);
                    }
                    // Tool writes republish the current tick; only react
                    // to fresh ticks.
                    if snapshot.tick_count == last_tick {
                        continue;
                    }
                    last_tick = snapshot.tick_count;
                    log_tick(&snapshot);
                    if settings.autopilot {
                        steer(engine, &snapshot);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Runner fell behind the snapshot stream");
                }
                Err(RecvError::Closed) => return RunEndReason::ChannelClosed,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                return RunEndReason::Interrupted;
            }
            () = &mut time_limit => return RunEndReason::TimeLimit,
        }
    }
}

/// Apply the autopilot's plan for one snapshot.
fn steer(engine: &GameEngine, snapshot: &GameSnapshot) {
    for adjustment in autopilot::plan(snapshot) {
        match engine.set_tool_value(adjustment.tool_id, adjustment.value) {
            ToolWrite::Applied { value } | ToolWrite::Clamped { value, .. } => {
                debug!(
                    tick = snapshot.tick_count,
                    tool = adjustment.tool_id,
                    value,
                    "Autopilot adjusted tool"
                );
            }
            other => {
                warn!(
                    tool = adjustment.tool_id,
                    result = ?other,
                    "Autopilot write was not applied"
                );
            }
        }
    }
}

fn log_tick(snapshot: &GameSnapshot) {
    info!(
        tick = snapshot.tick_count,
        year = snapshot.current_time,
        population = snapshot.current_population,
        capacity_factor = snapshot.capacity_factor,
        band = ?snapshot.grid_band,
        tier = snapshot.infrastructure_tier.as_str(),
        active_events = snapshot.active_events.len(),
        next_event_expiry = soonest_expiry(snapshot),
        ticks_in_red_zone = snapshot.ticks_in_red_zone,
        warnings = snapshot.warning_count,
        next_interval_ms = snapshot.tick_interval_ms,
        "Tick"
    );
}

/// Ticks until the first active event expires.
fn soonest_expiry(snapshot: &GameSnapshot) -> Option<u64> {
    snapshot
        .active_events
        .iter()
        .map(|event| event.ticks_remaining(snapshot.tick_count))
        .min()
}

/// Log a summary of the finished run.
fn log_run_end(reason: RunEndReason, snapshot: &GameSnapshot) {
    info!(
        reason = ?reason,
        total_ticks = snapshot.tick_count,
        final_year = snapshot.current_time,
        final_population = snapshot.current_population,
        final_tier = snapshot.infrastructure_tier.as_str(),
        warnings = snapshot.warning_count,
        "Run ended"
    );
    if let RunEndReason::GameOver(cause) = reason {
        info!(message = %cause, "Game over");
    }
    if snapshot.tick_count == 0 {
        warn!("Run ended without executing any ticks");
    }
}
