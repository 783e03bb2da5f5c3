use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foundation::math::LatLng;
use foundation::time::Time;
use tour::sim::{SimDriver, SimViewport, TimelineStrip};
use tour::{PlaybackController, PlaybackState, TourConfig, TourEvent, Viewport, WaypointSequencer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless virtual-tour playback against a simulated map")]
struct Args {
    /// Waypoint dataset: JSON array of {name, year, location: [lat, lon]}
    #[arg(long, default_value = "demos/waypoints.json")]
    data: PathBuf,

    /// Optional JSON file overriding playback tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated frame interval in milliseconds
    #[arg(long, default_value_t = 16.0)]
    step_ms: f64,

    /// Stop after this much simulated time
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the whole tour from the first waypoint (default)
    Play,

    /// Seek to the first waypoint of a year, then play on from there
    FromYear {
        year: String,
    },

    /// Fly out to show every waypoint at once, then exit
    GlobalView,

    /// Print the playback order and exit
    List,

    /// Print the effective configuration as JSON and exit
    ShowConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => TourConfig::from_json_file(path)?,
        None => TourConfig::default(),
    }
    .with_env_overrides()?;

    let command = args.command.unwrap_or(Command::Play);
    if let Command::ShowConfig = command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let raw = tour::load_dataset(&args.data)?;
    let sequencer = WaypointSequencer::load(Some(raw.as_slice()));
    info!(path = %args.data.display(), waypoints = sequencer.len(), "dataset loaded");

    if let Command::List = command {
        for (index, wp) in sequencer.iter().enumerate() {
            let year = wp.year.as_deref().unwrap_or("-");
            println!(
                "{index:>3}  {year:>6}  {:>10.6} {:>11.6}  {}",
                wp.location.lat, wp.location.lon, wp.name
            );
        }
        return Ok(());
    }

    let start_center = sequencer
        .get(0)
        .map(|wp| wp.location)
        .unwrap_or(LatLng::new(0.0, 0.0));
    let viewport =
        SimViewport::with_markers(start_center, config.long_distance_zoom_out, &sequencer);
    let timeline = TimelineStrip::from_sequencer(&sequencer);
    let mut controller = PlaybackController::new(config, sequencer, viewport, timeline)?;
    let mut driver = SimDriver::new(Time::ZERO, args.step_ms);

    match &command {
        Command::FromYear { year } => {
            controller.play_from_year(year, driver.now());
            driver.run_until(&mut controller, 10_000.0, |c| !c.engine().is_animating());
            report(&mut controller, driver.now());
        }
        Command::GlobalView => {
            controller.global_view(driver.now());
            driver.run_until(&mut controller, 10_000.0, |c| !c.engine().is_animating());
            report(&mut controller, driver.now());
            let center = controller.viewport().center();
            println!(
                "view: ({:.6}, {:.6}) zoom {:.1}",
                center.lat,
                center.lon,
                controller.viewport().zoom()
            );
            return Ok(());
        }
        _ => {}
    }
    controller.start(driver.now());

    let max_ms = args.max_seconds * 1000.0;
    let mut elapsed = 0.0;
    while elapsed < max_ms {
        driver.step(&mut controller);
        elapsed += args.step_ms;
        report(&mut controller, driver.now());
        if controller.state() != PlaybackState::Playing {
            break;
        }
    }

    if controller.is_playing() {
        warn!(max_seconds = args.max_seconds, "time limit reached; stopping playback");
        controller.pause(driver.now());
    }
    info!(
        cursor = controller.cursor(),
        seconds = driver.now().as_ms() / 1000.0,
        "tour ended"
    );
    Ok(())
}

fn report(controller: &mut PlaybackController<SimViewport, TimelineStrip>, now: Time) {
    let secs = now.as_ms() / 1000.0;
    for event in controller.drain_events() {
        match event {
            TourEvent::WaypointEntered { index, year } => {
                let name = controller
                    .sequencer()
                    .get(index)
                    .map(|wp| wp.name.clone())
                    .unwrap_or_default();
                println!(
                    "[{secs:>7.2}s] -> #{index} {name} ({})",
                    year.as_deref().unwrap_or("undated")
                );
            }
            TourEvent::StageStarted { stage, .. } => println!("[{secs:>7.2}s]    {stage:?}"),
            TourEvent::Arrived { index, popup } => {
                println!("[{secs:>7.2}s]    arrived at #{index} (popup: {popup})")
            }
            TourEvent::Seeked { index, flew } => {
                println!("[{secs:>7.2}s] seek to #{index} (flight: {flew})")
            }
            TourEvent::Paused { reason } => println!("[{secs:>7.2}s] paused ({reason:?})"),
            TourEvent::Finished => println!("[{secs:>7.2}s] finished"),
            other => println!("[{secs:>7.2}s] {other:?}"),
        }
    }
}
