//! Debug a single seeded trial with a full hop-by-hop trace

use grotto_sim::simulation::{run_trial_with_seed, Scenario};
use grotto_sim::{logging, SimConfig};
use std::env;

fn main() {
    logging::init("trace");

    // Usage: debug-trial [seed] [config]
    let seed = env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(1);
    let config = match env::args().nth(2) {
        Some(path) => match SimConfig::from_file(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };
    let scenario = match Scenario::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            std::process::exit(1);
        }
    };

    let result = run_trial_with_seed(&scenario, seed);

    println!("\n=== TRIAL seed {} ===", seed);
    println!("Total cost: {}", result.total_cost);
    println!(
        "Hops: {}  Reloads: {}  Station crossings: {}",
        result.hops, result.reloads, result.laps
    );
    println!("Clear order:");
    for (pos, &idx) in result.clear_order.iter().enumerate() {
        println!("  {}. {}", pos + 1, scenario.config().location_name(idx));
    }
}
