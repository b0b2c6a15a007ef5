//! CLI entry point for the grotto simulator

use clap::{Parser, ValueEnum};
use grotto_sim::{
    logging,
    simulation::{run_and_aggregate, RunOptions, Scenario},
    SimConfig,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    /// Only the estimate
    Plain,
}

#[derive(Parser, Debug)]
#[command(name = "grotto-sim")]
#[command(version = "1.0")]
#[command(
    about = "Monte Carlo estimate of the time needed to clear every grotto",
    long_about = None
)]
struct Args {
    /// Path to a scenario file (YAML or JSON); the reference map when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulations to run
    #[arg(short, long, default_value = "50000")]
    num_sims: usize,

    /// Use parallel processing
    #[arg(short, long, default_value = "false")]
    parallel: bool,

    /// Worker threads for parallel runs (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Base seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Skip a location for the whole run (repeatable)
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Show timing information
    #[arg(short, long, default_value = "false")]
    timing: bool,

    /// Log per-location progress to stderr
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Debug: print the initialized location table and exit
    #[arg(long, default_value = "false")]
    debug_nodes: bool,
}

fn main() {
    let args = Args::parse();
    logging::init(if args.verbose { "debug" } else { "warn" });

    // Load config
    let config = match &args.config {
        Some(path) => match SimConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    let mut scenario = match Scenario::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = scenario.exclude(&args.exclude) {
        eprintln!("Invalid exclusion: {}", e);
        std::process::exit(1);
    }

    // Debug: print the location table
    if args.debug_nodes {
        let config = scenario.config();
        println!("============================================================");
        println!(
            "LOCATIONS (start {}, station {})",
            config.start_location(),
            config.station_location()
        );
        println!("============================================================");
        for (idx, location) in scenario.fresh_locations().iter().enumerate() {
            println!(
                "{:>2} {:<12} thresholds {:?}  outstanding {:#b}  testable {}  skip {}",
                idx,
                config.location_name(idx),
                location.thresholds,
                location.outstanding,
                location.testable,
                location.skip,
            );
        }
        println!();
        return;
    }

    // Run simulations
    let options = RunOptions {
        trials: args.num_sims,
        parallel: args.parallel,
        seed: args.seed,
        threads: args.threads,
    };
    let start = Instant::now();
    let stats = run_and_aggregate(&scenario, &options);
    let elapsed = start.elapsed();

    // Output results
    match args.output {
        OutputFormat::Plain => println!("{:.6}", stats.avg_cost),
        OutputFormat::Text => {
            println!("=== Grotto Simulation Results ===");
            println!("Simulations: {}", args.num_sims);
            println!();
            println!("Expected Cost: {:.2} ± {:.2}", stats.avg_cost, stats.std_error);
            println!("Std Deviation: {:.2}", stats.std_cost);
            println!("Cost Range: {} - {}", stats.min_cost, stats.max_cost);
            println!();
            println!("--- Walk Stats ---");
            println!("Avg Hops: {:.1}", stats.avg_hops);
            println!("Avg Reloads: {:.1}", stats.avg_reloads);
            println!("Avg Station Crossings: {:.1}", stats.avg_laps);
            println!();
            println!("--- Average Clear Position ---");
            for (idx, position) in stats.avg_clear_position.iter().enumerate() {
                if let Some(position) = position {
                    println!("{:<12} {:.2}", scenario.config().location_name(idx), position);
                }
            }

            if args.timing {
                println!();
                println!("--- Performance ---");
                println!("Total time: {:.3}s", elapsed.as_secs_f64());
                println!(
                    "Per simulation: {:.3}ms",
                    elapsed.as_secs_f64() * 1000.0 / args.num_sims.max(1) as f64
                );
                println!("Simulations/sec: {:.0}", args.num_sims as f64 / elapsed.as_secs_f64());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "simulations": args.num_sims,
                "parallel": args.parallel,
                "seed": args.seed,
                "elapsed_seconds": elapsed.as_secs_f64(),
                "stats": stats,
            });
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Failed to serialize results: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
