use clap::{Parser, Subcommand};
use serde::Serialize;

use osmtilestream::config::ViewerConfig;
use osmtilestream::datasource::{OsmFileDataSource, OsmTileDataSource, TileDataSource};
use osmtilestream::defaultlogger::register_messenger_default;
use osmtilestream::elements::{LonLat, LonLatRect, TileRect};
use osmtilestream::geometry::{lonlat_bounds_from_tile, lonlat_to_tile_index};
use osmtilestream::logging::messenger;
use osmtilestream::message;
use osmtilestream::osmxml::{collect_features, read_osm_xml};
use osmtilestream::streaming::{PlayerState, TileStreamer};
use osmtilestream::utils::{Error, Result, Timer};

use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "osmtilestream", version, about = "streams OpenStreetMap tiles into 3D geometry")]
struct Cli {
    /// JSON configuration file (see dump-config)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// prints the tile containing a location, and its bounds
    TileIndex {
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(short, long)]
        zoom: Option<u32>,
    },
    /// downloads the tiles around a location into the cache directory
    Prefetch {
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        /// tiles either side of the centre tile
        #[arg(short, long, default_value_t = 2)]
        radius: i32,
        #[arg(short, long)]
        zoom: Option<u32>,
    },
    /// reads an OSM XML file and reports the features found
    Info {
        input: String,
        /// print the summary as json
        #[arg(long)]
        json: bool,
    },
    /// streams the tiles around a location and builds the vertex buffer
    Mesh {
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        /// serve tiles from a local OSM XML extract instead of the network
        #[arg(short, long)]
        input: Option<String>,
        /// write the vertex buffer to this file
        #[arg(short, long)]
        output: Option<String>,
        /// give up waiting for tiles after this many seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },
    /// writes the configuration, defaults filled in, as json
    DumpConfig { output: Option<String> },
}

fn load_config(fname: &Option<String>) -> Result<ViewerConfig> {
    match fname {
        Some(f) => ViewerConfig::from_file(f),
        None => Ok(ViewerConfig::default()),
    }
}

fn with_location(mut cfg: ViewerConfig, lon: Option<f64>, lat: Option<f64>) -> Result<ViewerConfig> {
    if let Some(lon) = lon {
        cfg.start_lon = lon;
    }
    if let Some(lat) = lat {
        cfg.start_lat = lat;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run_tile_index(lon: f64, lat: f64, zoom: u32) -> Result<()> {
    if zoom > osmtilestream::elements::MAX_ZOOM {
        return Err(Error::InvalidInputError(format!("zoom {} too large", zoom)));
    }
    let idx = lonlat_to_tile_index(&LonLat::new(lon, lat), zoom);
    println!("{} zoom {}: {}", idx, zoom, lonlat_bounds_from_tile(idx, zoom));
    Ok(())
}

fn run_prefetch(cfg: &ViewerConfig, radius: i32, zoom: u32) -> Result<()> {
    if zoom > osmtilestream::elements::MAX_ZOOM {
        return Err(Error::InvalidInputError(format!("zoom {} too large", zoom)));
    }
    let source =
        OsmTileDataSource::with_overpass(&cfg.cache_dir, &cfg.endpoint_url, cfg.request_timeout_secs);
    let centre = lonlat_to_tile_index(&cfg.start_location(), zoom);
    let tiles: Vec<_> = TileRect::from_center_radius(centre, radius)
        .iter()
        .filter(|i| i.is_valid(zoom))
        .collect();

    let tx = Timer::new();
    let pb = messenger().start_progress_count(&format!("prefetch around {}", centre), tiles.len() as u64);
    let (mut fetched, mut cached, mut failed) = (0, 0, 0);
    for (i, idx) in tiles.iter().enumerate() {
        match source.prefetch(*idx, zoom) {
            Ok(true) => fetched += 1,
            Ok(false) => cached += 1,
            Err(e) => {
                failed += 1;
                pb.change_message(&format!("{} failed: {}", idx, e));
            }
        }
        pb.progress((i + 1) as u64);
    }
    pb.finish();
    message!(
        "{} tiles in {}: {} fetched, {} already cached, {} failed in {:0.1}s",
        tiles.len(),
        source.cache().dir().display(),
        fetched,
        cached,
        failed,
        tx.since()
    );
    Ok(())
}

#[derive(Serialize)]
struct InfoSummary {
    bounds: Option<LonLatRect>,
    num_nodes: usize,
    num_ways: usize,
    buildings: usize,
    highways: usize,
    water_features: usize,
}

fn run_info(input: &str, json: bool) -> Result<()> {
    let tx = Timer::new();
    let data = std::fs::read(input)?;
    let doc = read_osm_xml(&data)?;
    let features = collect_features(&doc);
    let summary = InfoSummary {
        bounds: doc.bounds,
        num_nodes: doc.nodes.len(),
        num_ways: doc.ways.len(),
        buildings: features.buildings.len(),
        highways: features.highways.len(),
        water_features: features.water_features.len(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    match &summary.bounds {
        Some(b) => println!("{}: bounds {}", input, b),
        None => println!("{}: no bounds", input),
    }
    println!(
        "{} nodes, {} ways: {} buildings, {} highways, {} water features [{:0.1}s]",
        summary.num_nodes,
        summary.num_ways,
        summary.buildings,
        summary.highways,
        summary.water_features,
        tx.since()
    );
    Ok(())
}

fn run_mesh(cfg: ViewerConfig, input: Option<String>, output: Option<String>, timeout: u64) -> Result<()> {
    let source: Arc<dyn TileDataSource> = match input {
        Some(f) => Arc::new(OsmFileDataSource::from_file(f)?),
        None => Arc::new(OsmTileDataSource::with_overpass(
            &cfg.cache_dir,
            &cfg.endpoint_url,
            cfg.request_timeout_secs,
        )),
    };

    let mut streamer = TileStreamer::new(cfg, source)?;
    let mut player = PlayerState::default();
    streamer.tick(&mut player);
    streamer.start()?;

    let tx = Timer::new();
    let mut vertices = Vec::new();
    loop {
        if let Some(v) = streamer.take_geometry() {
            vertices = v;
            message!(
                "{} active tiles, {} vertices [{:0.1}s]",
                streamer.active_tiles().len(),
                vertices.len(),
                tx.since()
            );
        }
        if streamer.is_idle() {
            break;
        }
        if tx.since() > timeout as f64 {
            message!("timed out with {} jobs queued", streamer.queued_jobs().len());
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    streamer.shutdown()?;
    if let Some(v) = streamer.take_geometry() {
        vertices = v;
    }

    message!(
        "origin {}, {} tiles, {} vertices",
        streamer.origin(),
        streamer.active_tiles().len(),
        vertices.len()
    );
    if let Some(out) = output {
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        std::fs::write(&out, bytes)?;
        message!("wrote {} bytes to {}", bytes.len(), out);
    }
    Ok(())
}

fn run_dump_config(cfg: &ViewerConfig, output: Option<String>) -> Result<()> {
    match output {
        Some(out) => cfg.write(out),
        None => {
            println!("{}", serde_json::to_string_pretty(cfg)?);
            Ok(())
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    match cli.command {
        Commands::TileIndex { lon, lat, zoom } => run_tile_index(lon, lat, zoom.unwrap_or(cfg.zoom_level)),
        Commands::Prefetch { lon, lat, radius, zoom } => {
            let cfg = with_location(cfg, lon, lat)?;
            let zoom = zoom.unwrap_or(cfg.zoom_level);
            run_prefetch(&cfg, radius, zoom)
        }
        Commands::Info { input, json } => run_info(&input, json),
        Commands::Mesh {
            lon,
            lat,
            input,
            output,
            timeout,
        } => run_mesh(with_location(cfg, lon, lat)?, input, output, timeout),
        Commands::DumpConfig { output } => run_dump_config(&cfg, output),
    }
}

fn main() {
    if let Err(e) = register_messenger_default() {
        eprintln!("{}", e);
    }
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("osmtilestream: {}", e);
        std::process::exit(1);
    }
}
