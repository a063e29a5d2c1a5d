//! # terreng-cli
//!
//! Command-line surface for fetching Norwegian terrain data from hoydedata.no.
//!
//! Subcommands:
//! - `fetch` - area centered on a WGS84 point, sized in meters
//! - `fetch-bbox` - area between two WGS84 corners
//! - `info` - summary of an already downloaded GeoTIFF

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use terreng_dtm::{with_client, BoundingBox, ClientConfig, RasterInfo, Result, DTM_ENDPOINT};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Fetch Norwegian terrain data from hoydedata.no.
#[derive(Debug, Parser)]
#[command(name = "terrenghenter", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch terrain data centered on a point.
    ///
    /// Example: terrenghenter fetch --lat 59.9639 --lon 10.6683 --width 1000 --height 1000 -o terrain.tif
    #[command(visible_alias = "fetch-by-center")]
    Fetch(FetchArgs),

    /// Fetch terrain data for a bounding box.
    ///
    /// Example: terrenghenter fetch-bbox --min-lat 59.9 --min-lon 10.6 --max-lat 60.0 --max-lon 10.8 -o area.tif
    #[command(visible_alias = "fetch-by-box")]
    FetchBbox(FetchBboxArgs),

    /// Show information about a terrain GeoTIFF file.
    ///
    /// Example: terrenghenter info terrain.tif
    #[command(visible_alias = "inspect")]
    Info(InfoArgs),
}

/// Options shared by both fetch commands.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Resolution in meters/pixel
    #[arg(long, default_value_t = 1.0)]
    pub resolution: f64,

    /// Output file path
    #[arg(short, long, default_value = "terrain.tif")]
    pub output: PathBuf,

    /// Export endpoint URL
    #[arg(long, default_value = DTM_ENDPOINT, hide = true)]
    pub endpoint: String,
}

impl OutputArgs {
    fn client_config(&self) -> ClientConfig {
        ClientConfig::with_resolution(self.resolution).endpoint(self.endpoint.clone())
    }
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Center latitude (WGS84)
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Center longitude (WGS84)
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Width in meters
    #[arg(long, default_value_t = 1000.0)]
    pub width: f64,

    /// Height in meters
    #[arg(long, default_value_t = 1000.0)]
    pub height: f64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct FetchBboxArgs {
    /// Min latitude (SW corner)
    #[arg(long, allow_negative_numbers = true)]
    pub min_lat: f64,

    /// Min longitude (SW corner)
    #[arg(long, allow_negative_numbers = true)]
    pub min_lon: f64,

    /// Max latitude (NE corner)
    #[arg(long, allow_negative_numbers = true)]
    pub max_lat: f64,

    /// Max longitude (NE corner)
    #[arg(long, allow_negative_numbers = true)]
    pub max_lon: f64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// GeoTIFF file to inspect
    pub tiff_file: PathBuf,
}

/// Install the stderr log subscriber.
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute a parsed command, printing progress to stdout.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Fetch(args) => fetch(args),
        Command::FetchBbox(args) => fetch_bbox(args),
        Command::Info(args) => show_info(args),
    }
}

fn fetch(args: FetchArgs) -> Result<()> {
    let bbox = BoundingBox::from_center_and_size(args.lon, args.lat, args.width, args.height)?;

    for line in fetch_summary(&args, &bbox) {
        println!("{}", line);
    }

    let output_path = with_client(args.output.client_config(), |client| {
        client.fetch(&bbox, &args.output.output)
    })?;

    println!("Saved to: {}", output_path.display());
    Ok(())
}

fn fetch_bbox(args: FetchBboxArgs) -> Result<()> {
    let bbox = BoundingBox::from_wgs84(args.min_lon, args.min_lat, args.max_lon, args.max_lat)?;

    for line in fetch_bbox_summary(&args, &bbox) {
        println!("{}", line);
    }

    let output_path = with_client(args.output.client_config(), |client| {
        client.fetch(&bbox, &args.output.output)
    })?;

    println!("Saved to: {}", output_path.display());
    Ok(())
}

// Floats print with `{:?}` so whole numbers keep their `.0`
fn fetch_summary(args: &FetchArgs, bbox: &BoundingBox) -> Vec<String> {
    vec![
        format!(
            "Fetching {:?}x{:?}m area centered at ({:?}, {:?})",
            args.width, args.height, args.lat, args.lon
        ),
        format!("Resolution: {:?}m/pixel", args.output.resolution),
        format!("UTM33 bbox: {}", bbox),
    ]
}

fn fetch_bbox_summary(args: &FetchBboxArgs, bbox: &BoundingBox) -> Vec<String> {
    vec![
        format!(
            "Fetching area from ({:?}, {:?}) to ({:?}, {:?})",
            args.min_lat, args.min_lon, args.max_lat, args.max_lon
        ),
        format!("Resolution: {:?}m/pixel", args.output.resolution),
        format!("Area: {:.0}x{:.0}m", bbox.width(), bbox.height()),
        format!("UTM33 bbox: {}", bbox),
    ]
}

fn show_info(args: InfoArgs) -> Result<()> {
    info!(path = %args.tiff_file.display(), "inspecting raster");
    let raster = RasterInfo::from_file(&args.tiff_file)?;
    let (width, height) = raster.dimensions();

    println!("File: {}", args.tiff_file.display());
    println!("Size: {}x{} pixels", width, height);
    println!("CRS: {}", raster.crs());
    match raster.bounds() {
        Some(bounds) => println!("Bounds: {}", bounds),
        None => println!("Bounds: unknown"),
    }
    match raster.resolution() {
        Some((x, y)) => println!("Resolution: {:.2}x{:.2}m", x, y),
        None => println!("Resolution: unknown"),
    }
    match raster.elevation_range() {
        Some((min, max)) => println!("Elevation range: {:.1}m to {:.1}m", min, max),
        None => println!("Elevation range: no data"),
    }
    Ok(())
}
