use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use stormtrack_core::synthetic::{SyntheticSource, SyntheticStorm, WarmCoreProfile};
use stormtrack_core::{
    write_track_file, CycloneType, DirectoryStore, GeoGrid, GeoPoint, Result, Tracker,
    TrackerConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Headless cyclone tracking over a synthetic drifting storm
#[derive(Parser, Debug)]
#[command(name = "stormtrack-demo")]
#[command(about = "Detect and track a synthetic cyclone", long_about = None)]
struct Args {
    /// JSON configuration file; overrides the archetype defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cyclone archetype (TC, EC, MC, TLC, SC) when no file is given
    #[arg(short = 't', long, default_value = "TC")]
    cyclone_type: String,

    /// Region preset for the search box
    #[arg(short, long, default_value = "AL")]
    region: String,

    /// Number of 6-hourly timesteps
    #[arg(short, long, default_value_t = 12)]
    steps: u32,

    /// Detection worker threads
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Initial storm latitude
    #[arg(long, allow_negative_numbers = true, default_value_t = 15.0)]
    lat: f64,

    /// Initial storm longitude
    #[arg(long, allow_negative_numbers = true, default_value_t = -45.0)]
    lon: f64,

    /// Northward drift per timestep in degrees
    #[arg(long, allow_negative_numbers = true, default_value_t = 0.3)]
    drift_lat: f64,

    /// Eastward drift per timestep in degrees
    #[arg(long, allow_negative_numbers = true, default_value_t = -0.6)]
    drift_lon: f64,

    /// Provide warm-core geopotential heights and classify thermal structure
    #[arg(short, long)]
    upper_air: bool,

    /// Directory for per-timestep records and the track file
    #[arg(short, long, default_value = "stormtrack-out")]
    output: PathBuf,
}

fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 9, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn build_config(args: &Args) -> Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path)?,
        None => {
            let cyclone_type: CycloneType = args.cyclone_type.parse()?;
            TrackerConfig::for_cyclone_type(cyclone_type).with_region(&args.region)?
        }
    };
    let start = start_time();
    config.start = Some(start);
    config.end = Some(start + Duration::hours(6 * i64::from(args.steps.max(1) - 1)));
    config.workers = args.workers;
    config.upper_air |= args.upper_air;
    Ok(config.normalize())
}

fn build_source(args: &Args, config: &TrackerConfig) -> SyntheticSource {
    // 40° square around the start position at 0.25° spacing
    let grid = GeoGrid::regular(args.lat - 20.0, args.lon - 20.0, 0.25, 0.25, 161, 161);
    let mut source = SyntheticSource::new(grid);
    let start = start_time();
    for k in 0..args.steps {
        let center = GeoPoint::new(
            args.lat + args.drift_lat * f64::from(k),
            args.lon + args.drift_lon * f64::from(k),
        );
        let time = start + Duration::hours(6 * i64::from(k));
        source = source.with_storm(time, SyntheticStorm::tropical(center));
    }
    if config.upper_air {
        source = source.with_warm_core(WarmCoreProfile::deep_warm());
    }
    source
}

fn run(args: &Args) -> Result<()> {
    let config = build_config(args)?;
    let source = build_source(args, &config);
    let store = DirectoryStore::new(args.output.join("records"))?;

    println!("=== Cyclone Tracking Demo ===\n");
    println!(
        "Archetype {} in region {}, {} timesteps, {} workers",
        config.cyclone_type, config.region, args.steps, config.workers
    );

    let run = Tracker::new(&config, &source, &store).run()?;
    let path = write_track_file(&args.output, &config, &run.timeline, &run.report.tracks)?;
    info!(path = %path.display(), "track file written");

    println!(
        "\nDetected {} centres over {} timesteps",
        run.detection.centers, run.detection.timesteps
    );
    println!(
        "Accepted {} tracks, rejected {}",
        run.report.tracks.len(),
        run.report.rejected
    );
    for track in &run.report.tracks {
        let first = track.points.first();
        let last = track.points.last();
        if let (Some(a), Some(b)) = (first, last) {
            println!(
                "  #{:<3} {} points  ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                track.id,
                track.points.len(),
                a.center.position.lat,
                a.center.position.lon,
                b.center.position.lat,
                b.center.position.lon
            );
        }
    }
    println!("\nTracks written to {}", path.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.report_block());
            ExitCode::FAILURE
        }
    }
}
