//! Example: Show the export request for an area without sending it.
//!
//! Usage: cargo run --example plan_export -- <lat> <lon> [size_m] [resolution]

use std::env;
use terreng_dtm::{BoundingBox, ClientConfig, DtmClient};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <lat> <lon> [size_m] [resolution]", args[0]);
        eprintln!("Example: {} 59.9639 10.6683 2000 0.5", args[0]);
        std::process::exit(1);
    }

    let lat: f64 = args[1].parse().expect("Invalid latitude");
    let lon: f64 = args[2].parse().expect("Invalid longitude");
    let size: f64 = args.get(3).map(|s| s.parse().expect("Invalid size")).unwrap_or(1000.0);
    let resolution: f64 = args
        .get(4)
        .map(|s| s.parse().expect("Invalid resolution"))
        .unwrap_or(1.0);

    let bbox = match BoundingBox::from_center_and_size(lon, lat, size, size) {
        Ok(bbox) => bbox,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let client = DtmClient::new(ClientConfig::with_resolution(resolution)).expect("Invalid configuration");
    let image = client.image_size(&bbox);

    println!("Area: {:.0}x{:.0}m centered at ({}, {})", bbox.width(), bbox.height(), lat, lon);
    println!("Image: {}x{} pixels at {}m/pixel", image.width, image.height, resolution);
    println!("\nGET {}", client.config().endpoint);
    for (key, value) in client.export_params(&bbox) {
        println!("  {}={}", key, value);
    }
}
