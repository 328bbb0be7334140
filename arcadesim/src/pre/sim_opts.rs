use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(
    version = "0.1.0",
    author = "Alexander Heilmeier <alexander.heilmeier@tum.de>",
    name = "ARCADE-SIM",
    about = "An arcade racing simulator with aerial threats and track hazards written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Activate GUI (race is then simulated in real-time with the inserted real-time factor)
    #[arg(short, long)]
    pub gui: bool,

    /// Let the player vehicle be driven by the AI steering law (always active without GUI)
    #[arg(short, long)]
    pub autopilot: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of simulation runs (must be one in case GUI/real-time simulation is activated)
    #[arg(short, long, default_value_t = 1)]
    pub no_sim_runs: u32,

    /// Set path to the simulation parameter file
    #[arg(short, long)]
    pub parfile_path: PathBuf,

    /// Set real-time factor (only relevant in case GUI/real-time simulation is activated)
    #[arg(short, long, default_value_t = 1.0)]
    pub realtime_factor: f64,

    /// Set the seed of the random number generator for reproducible races (batch runs use seed,
    /// seed + 1, ...)
    #[arg(short, long)]
    pub seed: Option<u64>,
}
