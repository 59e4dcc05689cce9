use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use city_traffic::simulation::{SimConfig, SimWorld, DEFAULT_CARS_PER_SPAWN, DEFAULT_SEED};

#[derive(Parser)]
#[command(name = "city_traffic")]
#[command(about = "Grid city traffic simulation")]
struct Cli {
    /// Map text file; the built-in demo city is used when omitted
    #[arg(long, requires = "dictionary")]
    map: Option<PathBuf>,

    /// JSON symbol dictionary for --map
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Cars added per spawn cycle
    #[arg(long, default_value_t = DEFAULT_CARS_PER_SPAWN)]
    cars_per_spawn: usize,

    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "100")]
    ticks: u64,

    /// Log progress every N ticks (0 = only at the end)
    #[arg(long, default_value = "0")]
    report_every: u64,

    /// Print the map as text with each report
    #[arg(long)]
    draw: bool,

    /// Print the final snapshot as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = SimConfig::default()
        .with_seed(cli.seed)
        .with_cars_per_spawn(cli.cars_per_spawn);

    let mut world = match (&cli.map, &cli.dictionary) {
        (Some(map), Some(dictionary)) => SimWorld::load(map, dictionary, config)?,
        _ => SimWorld::demo(config).context("failed to build demo city")?,
    };

    info!(
        "Running {} ticks (seed {}, {} cars per spawn)",
        cli.ticks, cli.seed, cli.cars_per_spawn
    );

    for _ in 0..cli.ticks {
        let report = world
            .tick()
            .with_context(|| format!("simulation failed at tick {}", world.tick_count()))?;

        if cli.report_every > 0 && report.tick % cli.report_every == 0 {
            info!(
                "--- tick {}: {} active, {} moved, {} blocked, {} arrived ---",
                report.tick,
                world.active_car_count(),
                report.moved,
                report.blocked,
                report.arrived
            );
            if cli.draw {
                println!("{}", world.render_ascii());
            }
        }
    }

    world.print_summary();

    if cli.draw {
        println!("=== Final Map ===");
        println!("Legend: C=Car, B=Blocked car, A=Arrived car, D=Destination, #=Obstacle, R/G=Light");
        println!("{}", world.render_ascii());
    }

    if cli.json {
        println!("{}", world.snapshot().to_json()?);
    }

    Ok(())
}
