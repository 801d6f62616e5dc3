use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use clap::{Parser, Subcommand, arg};
use log::{error, info, warn};
use trackmap::{
    AppConfig, CaptureEngine, FileTrackStore, TrackMapError, TrackStore, TrackSummary,
    capture::LoggingListener,
    telemetry::{CaptureOutcome, RecordedTelemetryProducer, run_capture},
    writer,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Directory holding the stored track maps
    #[arg(short, long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Trace a track map from a recorded telemetry session
    Trace {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        refresh_rate_ms: Option<u64>,
    },
    /// Print a summary of a stored track map
    Show {
        #[arg(short, long)]
        track: String,
    },
    /// List stored track maps
    List,
    /// Export a stored track map as JSON Lines
    Export {
        #[arg(short, long)]
        track: String,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// Delete a stored track map
    Delete {
        #[arg(short, long)]
        track: String,
    },
}

fn trace(
    config: &AppConfig,
    store: FileTrackStore,
    input: &Path,
    refresh_rate_ms: Option<u64>,
) -> Result<(), TrackMapError> {
    let producer = RecordedTelemetryProducer::from_file(&input.to_string_lossy())?;
    let listener = LoggingListener::new(config.log_progress);
    let mut engine = CaptureEngine::new(producer, store, listener);

    let keep_running = Arc::new(AtomicBool::new(true));
    let handler_flag = keep_running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        handler_flag.store(false, Ordering::SeqCst);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    let refresh_rate = Duration::from_millis(refresh_rate_ms.unwrap_or(config.refresh_rate_ms));
    match run_capture(&mut engine, refresh_rate, keep_running)? {
        CaptureOutcome::Completed => {
            if let Some(points) = engine.listener().completed() {
                print_summary(&TrackSummary::from_points(points));
            }
        }
        CaptureOutcome::TelemetryExhausted => {
            warn!("Recording ended before a full clean lap was traced")
        }
        CaptureOutcome::Stopped => info!("Tracing cancelled, nothing was stored"),
    }
    Ok(())
}

fn show(store: &FileTrackStore, track: &str) -> Result<(), TrackMapError> {
    match store.load(track)? {
        Some(points) => print_summary(&TrackSummary::from_points(&points)),
        None => println!("No track map stored for {}", track),
    }
    Ok(())
}

fn list(store: &FileTrackStore) -> Result<(), TrackMapError> {
    let tracks = store.list_tracks()?;
    if tracks.is_empty() {
        println!("No track maps stored in {:?}", store.storage_path());
    }
    for track in tracks {
        println!("{}", track);
    }
    Ok(())
}

fn export(store: &FileTrackStore, track: &str, output: &Path) -> Result<(), TrackMapError> {
    match store.load(track)? {
        Some(points) => {
            writer::write_track_points(output, &points)?;
            println!("Exported {} points to {:?}", points.len(), output);
        }
        None => println!("No track map stored for {}", track),
    }
    Ok(())
}

fn print_summary(summary: &TrackSummary) {
    println!("Points:      {}", summary.point_count);
    println!("Lap time:    {:.3}s", summary.lap_time_ms / 1000.);
    println!("Top speed:   {:.1} km/h", summary.top_speed_kmh);
    if let Some(bounds) = summary.bounds {
        println!("Extent:      {:.1} x {:.1}", bounds.width(), bounds.height());
    }
    if summary.spline_regressions > 0 {
        println!(
            "Warning:     {} samples go backwards along the lap",
            summary.spline_regressions
        );
    }
}

fn run(cli: &Args) -> Result<(), TrackMapError> {
    let config = AppConfig::from_local_file()
        .unwrap_or_else(|e| {
            warn!("Ignoring config file: {}", e);
            None
        })
        .unwrap_or_default();

    let storage_path = match &cli.storage {
        Some(path) => path.clone(),
        None => config.storage_path()?,
    };
    let store = FileTrackStore::new(storage_path);

    match &cli.command {
        Commands::Trace {
            input,
            refresh_rate_ms,
        } => trace(&config, store, input, *refresh_rate_ms),
        Commands::Show { track } => show(&store, track),
        Commands::List => list(&store),
        Commands::Export { track, output } => export(&store, track, output),
        Commands::Delete { track } => store.delete(track),
    }
}

fn main() {
    colog::init();

    let cli = Args::parse();
    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
