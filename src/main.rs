// src/main.rs
//! Map Viewport - pan/zoom/rotate a tiled Web Mercator map in the terminal
//! and watch the tile cache work

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use glam::DVec2;
use map_viewport::{
    config::ViewerConfig,
    display::{terminal::TerminalDisplay, ViewSnapshot},
    map::TexturePool,
    MapViewer,
};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const REDRAW_EVERY: u64 = 10;
const PAN_STEP: f64 = 64.0;
const ZOOM_STEP: f64 = 0.5;
const ROTATE_STEP: f64 = 10.0;

#[derive(Parser, Debug)]
#[command(name = "map-viewport", version, about = "Viewport-driven raster tile cache demo")]
struct Args {
    /// Tile source: synthetic or http
    #[arg(long)]
    source: Option<String>,

    /// URL template with {z}, {x} and {y} placeholders (implies --source http)
    #[arg(long)]
    url_template: Option<String>,

    /// Maximum concurrent tile fetches
    #[arg(long)]
    max_parallel: Option<usize>,

    /// Soft cap on resident tiles
    #[arg(long)]
    max_cache: Option<usize>,

    #[arg(long)]
    zoom: Option<f64>,

    /// Initial center as lng,lat
    #[arg(long, value_parser = parse_center, allow_hyphen_values = true)]
    center: Option<(f64, f64)>,

    /// Bearing in degrees
    #[arg(long, allow_hyphen_values = true)]
    bearing: Option<f64>,

    #[arg(long)]
    no_world_copies: bool,

    /// Run a scripted flight for N frames without the terminal UI
    #[arg(long)]
    frames: Option<u64>,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    save_config: bool,

    /// Log file (interactive runs default to map-viewport.log in the temp dir)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Where log output goes for this run
#[derive(Debug, PartialEq)]
enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn parse_center(value: &str) -> std::result::Result<(f64, f64), String> {
    let (lng, lat) = value
        .split_once(',')
        .ok_or_else(|| "expected lng,lat".to_string())?;
    let lng = lng.trim().parse::<f64>().map_err(|e| format!("bad longitude: {}", e))?;
    let lat = lat.trim().parse::<f64>().map_err(|e| format!("bad latitude: {}", e))?;
    Ok((lng, lat))
}

impl Args {
    /// The interactive readout owns the terminal, so its logs go to a file
    fn log_target(&self) -> LogTarget {
        match (&self.log_file, self.frames) {
            (Some(path), _) => LogTarget::File(path.clone()),
            (None, Some(_)) => LogTarget::Stderr,
            (None, None) => LogTarget::File(std::env::temp_dir().join("map-viewport.log")),
        }
    }

    fn apply(&self, config: &mut ViewerConfig) {
        if let Some(source) = &self.source {
            config.source_type = source.clone();
        }
        if let Some(template) = &self.url_template {
            config.update_http(template.clone(), None);
        }
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = max_parallel;
        }
        if let Some(max_cache) = self.max_cache {
            config.max_cache = max_cache;
        }
        if let Some(zoom) = self.zoom {
            config.zoom = zoom;
        }
        if let Some((lng, lat)) = self.center {
            config.center_lng = lng;
            config.center_lat = lat;
        }
        if let Some(bearing) = self.bearing {
            config.bearing = bearing;
        }
        if self.no_world_copies {
            config.render_world_copies = false;
        }
    }
}

fn init_logging(target: &LogTarget) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("map_viewport=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        LogTarget::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_target())?;
    let mut config = ViewerConfig::load().context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if args.save_config {
        config.save().context("Failed to save configuration")?;
        info!("Configuration saved");
    }

    let mut viewer = MapViewer::from_config(&config, TexturePool::new())
        .context("Failed to create map viewer")?;

    info!(
        "Starting at ({:.4}, {:.4}) zoom {:.2}, {} parallel fetches, cache {}",
        config.center_lng, config.center_lat, config.zoom, config.max_parallel, config.max_cache
    );

    match args.frames {
        Some(frames) => run_headless(&mut viewer, frames).await,
        None => run_interactive(&mut viewer).await,
    }
}

/// Render one frame and report what it showed
fn step(viewer: &mut MapViewer<TexturePool>) -> ViewSnapshot {
    let (visible, drawn) = {
        let frame = viewer.frame();
        (frame.tiles.len(), frame.drawable().count())
    };
    ViewSnapshot::capture(viewer, visible, drawn)
}

async fn run_headless(viewer: &mut MapViewer<TexturePool>, frames: u64) -> Result<()> {
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let mut snapshot = ViewSnapshot::default();

    for n in 0..frames {
        ticker.tick().await;

        // drift east, breathe the zoom in and out, turn slowly
        let transform = viewer.transform_mut();
        transform.pan_by_pixels(-6.0, 0.0);
        let center = DVec2::new(transform.width() / 2.0, transform.height() / 2.0);
        let wheel = if (n / 120) % 2 == 0 { -20.0 } else { 20.0 };
        transform.zoom_by_delta(wheel, center);
        let bearing = transform.bearing();
        transform.set_bearing(bearing + 0.25);

        snapshot = step(viewer);
        if snapshot.frame_id % 60 == 0 {
            info!("{}", snapshot.summary());
        }
    }

    // let outstanding fetches land before the final report
    while viewer.cache_mut().wait_for_completion().await {}
    snapshot = ViewSnapshot::capture(viewer, snapshot.visible, snapshot.drawn);

    info!("Flight finished: {}", snapshot.summary());
    let pool = viewer.cache().uploader();
    info!(
        "Textures: {} live ({} bytes), {} uploads, {} releases; {} fetches, {} failed, {} stale",
        pool.live_textures(),
        pool.live_bytes(),
        pool.upload_count(),
        pool.release_count(),
        snapshot.stats.fetches_started,
        snapshot.stats.fetch_failures,
        snapshot.stats.stale_completions
    );
    Ok(())
}

async fn run_interactive(viewer: &mut MapViewer<TexturePool>) -> Result<()> {
    let display = TerminalDisplay::new();
    display.enter().context("Failed to set up terminal")?;

    let outcome = interactive_loop(viewer, &display).await;

    display.leave().context("Failed to restore terminal")?;
    outcome
}

async fn interactive_loop(viewer: &mut MapViewer<TexturePool>, display: &TerminalDisplay) -> Result<()> {
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);

    loop {
        ticker.tick().await;

        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                if !handle_key(viewer, key) {
                    return Ok(());
                }
            }
        }

        let snapshot = step(viewer);
        if snapshot.frame_id % REDRAW_EVERY == 1 {
            display.draw(&snapshot)?;
        }
    }
}

/// Apply a key press. Returns false when the user asked to quit.
fn handle_key(viewer: &mut MapViewer<TexturePool>, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && !key.modifiers.contains(KeyModifiers::CONTROL) {
        viewer.cache_mut().clear();
        info!("Tile cache cleared");
        return true;
    }

    let transform = viewer.transform_mut();
    let center = DVec2::new(transform.width() / 2.0, transform.height() / 2.0);

    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
        KeyCode::Left => transform.pan_by_pixels(PAN_STEP, 0.0),
        KeyCode::Right => transform.pan_by_pixels(-PAN_STEP, 0.0),
        KeyCode::Up => transform.pan_by_pixels(0.0, PAN_STEP),
        KeyCode::Down => transform.pan_by_pixels(0.0, -PAN_STEP),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let zoom = transform.zoom() + ZOOM_STEP;
            transform.set_zoom(zoom, Some(center));
        }
        KeyCode::Char('-') => {
            let zoom = transform.zoom() - ZOOM_STEP;
            transform.set_zoom(zoom, Some(center));
        }
        KeyCode::Char('q') => {
            let bearing = transform.bearing();
            transform.set_bearing(bearing - ROTATE_STEP);
        }
        KeyCode::Char('e') => {
            let bearing = transform.bearing();
            transform.set_bearing(bearing + ROTATE_STEP);
        }
        KeyCode::Char('w') => {
            let enabled = transform.render_world_copies();
            transform.set_render_world_copies(!enabled);
        }
        _ => {}
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_center() {
        assert_eq!(parse_center("-71.1, 42.3"), Ok((-71.1, 42.3)));
        assert!(parse_center("42.3").is_err());
        assert!(parse_center("a,b").is_err());
    }

    #[test]
    fn test_interactive_logs_stay_off_the_terminal() {
        let interactive = Args::parse_from(["map-viewport"]);
        assert!(matches!(interactive.log_target(), LogTarget::File(_)));

        let headless = Args::parse_from(["map-viewport", "--frames", "100"]);
        assert_eq!(headless.log_target(), LogTarget::Stderr);

        let explicit = Args::parse_from(["map-viewport", "--frames", "100", "--log-file", "/tmp/viewport.log"]);
        assert_eq!(explicit.log_target(), LogTarget::File(PathBuf::from("/tmp/viewport.log")));
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "map-viewport",
            "--max-parallel",
            "2",
            "--center",
            "-71.1,42.3",
            "--no-world-copies",
            "--url-template",
            "https://tiles.example/{z}/{x}/{y}.png",
        ]);
        let mut config = ViewerConfig::default();
        args.apply(&mut config);
        assert_eq!(config.max_parallel, 2);
        assert_eq!((config.center_lng, config.center_lat), (-71.1, 42.3));
        assert!(!config.render_world_copies);
        assert_eq!(config.source_type, "http");
    }
}
