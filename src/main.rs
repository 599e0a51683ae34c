use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use netcanvas::catalog::{CatalogError, DeviceCatalog, DeviceType};
use netcanvas::config::CanvasConfig;
use netcanvas::connections::Unconnected;
use netcanvas::consts::{FRAME_INTERVAL_MS, MAX_IDLE_FRAMES};
use netcanvas::doc::Device;
use netcanvas::engine::{Action, CanvasController};
use netcanvas::input::InputEvent;
use netcanvas::state::SharedState;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("catalog load failed: {0}")]
    Catalog(#[from] CatalogError),
    #[error("invalid device list in {path}: {source}")]
    Devices { path: PathBuf, source: serde_json::Error },
    #[error("invalid event on line {line}: {source}")]
    Event { line: usize, source: serde_json::Error },
    #[error("output encoding failed: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "netcanvas", about = "Headless driver for the network canvas engine")]
struct Cli {
    /// Extra device types, as a JSON map of key to type definition.
    #[arg(long, env = "NETCANVAS_CATALOG")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the device type catalog as JSON.
    Catalog,
    /// Feed recorded input events through a controller and print the outcome.
    Replay(ReplayCommand),
}

#[derive(Args, Debug)]
struct ReplayCommand {
    /// Input events, one JSON object per line. Blank lines and `#` comments are skipped.
    events: PathBuf,

    /// Devices to import before the first event (a JSON array, as produced by export).
    #[arg(long)]
    devices: Option<PathBuf>,

    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    #[arg(long, default_value_t = 800.0)]
    height: f64,

    /// Minimap surface width; 0 runs without a minimap.
    #[arg(long, default_value_t = 200.0)]
    minimap_width: f64,

    #[arg(long, default_value_t = 200.0)]
    minimap_height: f64,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

/// Actions produced by one input event, plus any frames it needed.
#[derive(Debug, Serialize)]
struct Step {
    line: usize,
    actions: Vec<Action>,
    frames: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    steps: Vec<Step>,
    state: SharedState,
    devices: Vec<Device>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Command::Catalog => run_catalog(&catalog),
        Command::Replay(replay) => run_replay(catalog, replay).await,
    }
}

fn load_catalog(path: Option<&Path>) -> Result<DeviceCatalog, CliError> {
    let mut catalog = DeviceCatalog::builtin();
    if let Some(path) = path {
        let json = read_to_string(path)?;
        let added = catalog.extend_from_json(&json)?;
        info!(path = %path.display(), added, "catalog extended");
    }
    Ok(catalog)
}

fn run_catalog(catalog: &DeviceCatalog) -> Result<(), CliError> {
    let entries: BTreeMap<&str, &DeviceType> =
        catalog.keys().filter_map(|key| catalog.get(key).map(|ty| (key, ty))).collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

async fn run_replay(catalog: DeviceCatalog, cmd: ReplayCommand) -> Result<(), CliError> {
    let config = CanvasConfig::from_env();
    let mut controller = CanvasController::new(catalog, Unconnected, config);
    let mut steps = Vec::new();

    let setup = controller.dispatch(InputEvent::Resize { left: 0.0, top: 0.0, width: cmd.width, height: cmd.height });
    steps.push(Step { line: 0, actions: setup, frames: 0 });
    if cmd.minimap_width > 0.0 && cmd.minimap_height > 0.0 {
        let actions =
            controller.dispatch(InputEvent::MinimapResize { width: cmd.minimap_width, height: cmd.minimap_height });
        steps.push(Step { line: 0, actions, frames: 0 });
    }

    if let Some(path) = cmd.devices.as_deref() {
        let json = read_to_string(path)?;
        let devices: Vec<Device> =
            serde_json::from_str(&json).map_err(|source| CliError::Devices { path: path.to_path_buf(), source })?;
        steps.push(Step { line: 0, actions: controller.import(devices), frames: 0 });
    }

    let file = File::open(&cmd.events).map_err(|source| CliError::Io { path: cmd.events.clone(), source })?;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| CliError::Io { path: cmd.events.clone(), source })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: InputEvent =
            serde_json::from_str(trimmed).map_err(|source| CliError::Event { line: line_no, source })?;
        let mut actions = controller.dispatch(event);
        let frames = drive_frames(&mut controller, &mut actions).await;
        steps.push(Step { line: line_no, actions, frames });
    }

    let report = Report { steps, state: controller.state, devices: controller.export() };
    let out = if cmd.pretty { serde_json::to_string_pretty(&report)? } else { serde_json::to_string(&report)? };
    println!("{out}");
    info!(devices = report.devices.len(), zoom = report.state.current_zoom, "replay finished");
    Ok(())
}

/// Step host frames on a fixed interval until the controller stops asking for them.
async fn drive_frames(controller: &mut CanvasController<Unconnected>, actions: &mut Vec<Action>) -> usize {
    let period = Duration::from_millis(FRAME_INTERVAL_MS);
    let step_ms = period.as_secs_f64() * 1000.0;
    let mut ticker = tokio::time::interval(period);
    let mut frames = 0;

    while controller.transform.needs_frame() {
        if frames >= MAX_IDLE_FRAMES {
            warn!(frames, "animation still running; giving up");
            break;
        }
        ticker.tick().await;
        frames += 1;
        let now_ms = controller.clock_ms() + step_ms;
        actions.extend(controller.dispatch(InputEvent::Frame { now_ms }));
    }
    frames
}

fn read_to_string(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}
