//! Headless simulation execution
//!
//! Runs scripted combat scenarios without any graphical output, suitable
//! for automated testing and batch balance analysis.

pub mod config;
pub mod runner;

pub use config::ScenarioConfig;
pub use runner::{run_scenario, CombatantOutcome, ScenarioApp, SimReport};
