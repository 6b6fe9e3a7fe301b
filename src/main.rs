//! gridstrike - headless scenario runner binary
//!
//! Loads a scenario config, simulates it tick by tick and prints a
//! summary; optionally exports the combat log as JSON.

use gridstrike::cli;
use gridstrike::headless::{run_scenario, ScenarioConfig};

fn main() {
    let args = cli::parse_args();

    let mut config = match ScenarioConfig::load(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(ticks) = args.ticks {
        config.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    println!("Running scenario '{}' for {} ticks...", config.name, config.ticks);

    let report = match run_scenario(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    println!("Completed after {} ticks.", report.ticks_run);
    for outcome in &report.combatants {
        println!(
            "  [faction {}] {}: {:.0}/{:.0} hp, dealt {:.0}, taken {:.0}{}",
            outcome.faction,
            outcome.name,
            outcome.final_health,
            outcome.max_health,
            outcome.damage_dealt,
            outcome.damage_taken,
            if outcome.survived { "" } else { " (dead)" }
        );
    }

    if let Some(output) = &args.output {
        match report
            .log
            .save_to_file(&report.metadata(), &output.to_string_lossy())
        {
            Ok(path) => println!("Combat log saved to: {}", path),
            Err(e) => eprintln!("Failed to save combat log: {}", e),
        }
    }
}
