//! Dispatch simulation binary
//!
//! Generates a seeded synthetic grid, fleet, and disturbance schedule,
//! runs the engine for a number of ticks, and writes the final published
//! snapshot to disk.

use clap::Parser;
use geo_types::Point;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use firebreak::core::config::EngineConfig;
use firebreak::core::types::{AssetId, CellId, GridCoord, ZoneId};
use firebreak::dispatch::asset::{Asset, AssetKind};
use firebreak::grid::cell::{Cell, CellSample};
use firebreak::sim::{DisturbanceEvent, DisturbanceKind, Engine, EngineEvent};
use firebreak::telemetry::LogSink;

/// Run a grid priority and dispatch simulation
#[derive(Parser, Debug)]
#[command(name = "dispatch_sim")]
#[command(about = "Run the wildfire risk and dispatch engine on a synthetic scenario")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 48)]
    ticks: u64,

    /// Grid rows
    #[arg(long, default_value_t = 20)]
    rows: u32,

    /// Grid columns
    #[arg(long, default_value_t = 20)]
    cols: u32,

    /// Number of zones (row bands)
    #[arg(long, default_value_t = 8)]
    zones: u32,

    /// Optional TOML config path
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Print every engine event
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

/// Phoenix-area origin for the synthetic grid
const ORIGIN_LON: f64 = -112.0742;
const ORIGIN_LAT: f64 = 33.4484;

/// Roughly 10 m in degrees at this latitude
const CELL_STEP_DEG: f64 = 0.0001;

fn build_engine(args: &Args, config: EngineConfig, rng: &mut ChaCha8Rng) -> Engine {
    let mut engine = Engine::new(config).expect("config rejected");

    // Grid of cells with random field observations
    for row in 0..args.rows {
        for col in 0..args.cols {
            let id = CellId(row * args.cols + col);
            let center = Point::new(
                ORIGIN_LON + f64::from(col) * CELL_STEP_DEG,
                ORIGIN_LAT + f64::from(row) * CELL_STEP_DEG,
            );
            let cell = Cell::new(id, GridCoord::new(row, col), center)
                .with_structure_distance(rng.gen_range(0.5..60.0))
                .with_grass_height(rng.gen_range(0.0..35.0));
            engine.store.insert_cell(cell);
        }
    }

    let samples: Vec<CellSample> = (0..args.rows * args.cols)
        .map(|i| {
            CellSample::from_field_units(
                CellId(i),
                rng.gen_range(0.0..900.0),
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..45.0),
            )
            .with_grass_height(rng.gen_range(0.0..35.0))
        })
        .collect();
    engine.store.ingest(&samples);

    // Zones as horizontal bands of the grid
    let rows_per_zone = (args.rows / args.zones).max(1);
    for z in 0..args.zones {
        let zone_id = engine.store.create_zone(format!("band-{z}"));
        let first_row = z * rows_per_zone;
        let last_row = if z == args.zones - 1 {
            args.rows
        } else {
            (z + 1) * rows_per_zone
        };
        for row in first_row..last_row.min(args.rows) {
            for col in 0..args.cols {
                engine.store.assign_cell(zone_id, CellId(row * args.cols + col));
            }
        }
        if let Some(zone) = engine.store.zones.get_mut(&zone_id) {
            zone.deficit_mm = rng.gen_range(20.0..120.0);
            zone.wildlife_count = rng.gen_range(0..150);
        }
    }

    // Mixed fleet at two depots
    let depot_a = Point::new(ORIGIN_LON - 0.01, ORIGIN_LAT);
    let depot_b = Point::new(ORIGIN_LON + 0.01, ORIGIN_LAT + 0.01);
    engine
        .pool
        .register(Asset::new(AssetId(1), AssetKind::Truck, 2000.0, depot_a));
    engine
        .pool
        .register(Asset::new(AssetId(2), AssetKind::Truck, 2000.0, depot_b));
    engine
        .pool
        .register(Asset::new(AssetId(3), AssetKind::Drone, 200.0, depot_a));
    engine
        .pool
        .register(Asset::new(AssetId(4), AssetKind::Drone, 200.0, depot_b));
    engine
        .pool
        .register(Asset::new(AssetId(5), AssetKind::Nanobot, 40.0, depot_a));

    engine
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_toml(path).expect("failed to load config"),
        None => EngineConfig::default(),
    };

    println!("Starting dispatch simulation");
    println!("============================");
    println!("Grid: {}x{} cells, {} zones", args.rows, args.cols, args.zones);
    println!("Seed: {}, ticks: {}", args.seed, args.ticks);
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut engine = build_engine(&args, config, &mut rng).with_telemetry(Box::new(LogSink));

    let start = std::time::Instant::now();
    let mut total_delivered = 0.0_f64;
    let mut total_unmet_rows = 0usize;

    for tick in 0..args.ticks {
        // A wildfire roughly once a day, somewhere
        let disturbances: Vec<DisturbanceEvent> = if tick > 0 && tick % 24 == 0 {
            vec![DisturbanceEvent {
                zone: ZoneId(rng.gen_range(1..=args.zones)),
                kind: DisturbanceKind::Fire,
                tick,
            }]
        } else {
            Vec::new()
        };

        let events = engine.run_tick(&disturbances).expect("tick failed");
        for event in &events {
            match event {
                EngineEvent::ZoneServiced {
                    delivered_liters, ..
                } => total_delivered += delivered_liters,
                EngineEvent::ZoneUnmet { .. } => total_unmet_rows += 1,
                _ => {}
            }
            if args.verbose {
                println!("  [{tick}] {event:?}");
            }
        }
    }
    let elapsed = start.elapsed();

    let snapshot = engine.snapshot();
    println!("Simulated {} ticks in {:.2}ms", args.ticks, elapsed.as_secs_f64() * 1000.0);
    println!();
    println!("--- Final ranking (top 5) ---");
    for rank in snapshot.rankings.iter().take(5) {
        println!("  {:?}  score {:.3}", rank.zone, rank.score);
    }
    println!();
    println!("Total delivered: {total_delivered:.0} L");
    println!("Backlogged demand rows: {total_unmet_rows}");
    let non_compliant = snapshot.compliance.iter().filter(|c| !c.compliant).count();
    println!(
        "Defensible-space compliance: {}/{} cells in violation",
        non_compliant,
        snapshot.compliance.len()
    );

    let json = snapshot.to_json().expect("snapshot serialization failed");
    std::fs::write("dispatch_output.json", &json).expect("failed to write output");
    println!("\nFull snapshot written to dispatch_output.json");
}
