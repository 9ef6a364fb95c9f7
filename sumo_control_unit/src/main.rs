//! # Sumo Control Unit
//!
//! Runs the sumo control loop on the EV3 (`ev3dev` driver) or against the
//! built-in ring simulator (`--simulate`).
//!
//! Configuration comes from one TOML file (`--config`); every value has a
//! default, so the binary also runs without one. Ctrl+C ends the loop after
//! the current tick and stops the motors.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use sumo_common::config::{ConfigLoader, LogLevel, SumoConfig};
use sumo_common::control_unit::config::TickLogFormat;
use sumo_control_unit::config::{LoadedConfig, load_config, render_config};
use sumo_control_unit::cycle::BoxedCycleRunner;
use sumo_control_unit::tick_log::open_tick_logger;
use sumo_hal::DriverRegistry;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

/// Tick log format accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TickLogArg {
    Csv,
    Jsonl,
    None,
}

impl From<TickLogArg> for TickLogFormat {
    fn from(arg: TickLogArg) -> Self {
        match arg {
            TickLogArg::Csv => TickLogFormat::Csv,
            TickLogArg::Jsonl => TickLogFormat::Jsonl,
            TickLogArg::None => TickLogFormat::None,
        }
    }
}

/// Sumo Control Unit: autonomous mini-sumo control loop
#[derive(Parser, Debug)]
#[command(name = "sumo_control_unit")]
#[command(version)]
#[command(about = "Autonomous mini-sumo control loop")]
struct Args {
    /// Path to the robot configuration TOML. Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run against the ring simulator (same as --driver simulation).
    #[arg(short, long)]
    simulate: bool,

    /// Driver backend, overriding hal.driver.
    #[arg(long, value_name = "NAME", conflicts_with = "simulate")]
    driver: Option<String>,

    /// Tick log path, overriding tick_log.path.
    #[arg(long, value_name = "PATH")]
    tick_log: Option<String>,

    /// Tick log format, overriding tick_log.format.
    #[arg(long, value_enum)]
    tick_log_format: Option<TickLogArg>,

    /// Stop after this many ticks.
    #[arg(long, value_name = "N")]
    max_ticks: Option<u64>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args, configured_log_level(&args));

    info!("Sumo Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Sumo Control Unit shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = apply_overrides(load_config(args.config.as_deref())?, args)?;

    if args.print_config {
        print!("{}", render_config(&loaded.config)?);
        return Ok(());
    }

    let config = &loaded.config;
    info!(
        "Config OK: service={}, driver={}, tick={} ms",
        config.shared.service_name,
        config.hal.driver,
        loaded.params.tick_interval.as_millis()
    );

    let registry = DriverRegistry::with_builtin_drivers();
    let drivers = registry.create(&config.hal.driver, &config.hal)?;
    let logger = open_tick_logger(&config.tick_log);
    let mut runner = BoxedCycleRunner::from_drivers(drivers, logger, &loaded.params);

    // Setup signal handler for graceful shutdown.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let result = runner.run(&running, args.max_ticks);

    let stats = runner.stats();
    info!(
        "Ran {} ticks (avg {} µs, max {} µs, {} overruns)",
        stats.ticks,
        stats.avg_tick_ns() / 1000,
        stats.max_tick_ns / 1000,
        stats.overruns
    );
    info!("Stats: {}", serde_json::to_string(stats)?);
    let faults = runner.perception_faults();
    info!(
        "Sensor faults: distance={}, reflectance={}, contact={}",
        faults.distance_errors, faults.reflectance_errors, faults.contact_errors
    );

    result.map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}

/// Apply command-line overrides and re-validate.
fn apply_overrides(
    mut loaded: LoadedConfig,
    args: &Args,
) -> Result<LoadedConfig, Box<dyn std::error::Error>> {
    let mut changed = false;
    if args.simulate {
        loaded.config.hal.driver = "simulation".to_string();
        changed = true;
    } else if let Some(driver) = &args.driver {
        loaded.config.hal.driver = driver.clone();
        changed = true;
    }
    if let Some(path) = &args.tick_log {
        loaded.config.tick_log.path = path.clone();
        changed = true;
    }
    if let Some(format) = args.tick_log_format {
        loaded.config.tick_log.format = format.into();
        changed = true;
    }
    if changed {
        loaded = loaded.revalidate()?;
    }
    Ok(loaded)
}

/// `shared.log_level` from the config file, read before logging is up.
///
/// Errors are ignored here; `run()` loads the file again and reports them.
fn configured_log_level(args: &Args) -> LogLevel {
    args.config
        .as_deref()
        .and_then(|path| SumoConfig::load(path).ok())
        .map(|config| config.shared.log_level)
        .unwrap_or_default()
}

/// Setup tracing subscriber based on CLI arguments.
///
/// `-v` wins over the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let directive = if args.verbose {
        Level::DEBUG.into()
    } else {
        configured
            .as_directive()
            .parse::<Directive>()
            .unwrap_or_else(|_| Level::INFO.into())
    };

    let filter = EnvFilter::from_default_env().add_directive(directive);

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
