use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vic3data::config::DEFAULT_SMALL_REGION_THRESHOLD;

#[derive(Parser, Debug, PartialEq)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Merge state regions according to a plan and write the result into a mod.
    ///
    /// Example: `merge plan.json ./mod --ignore-small-states`
    Merge {
        /// JSON object mapping each target region to the regions merged into it.
        plan: PathBuf,
        /// Mod directory to write into.
        mod_dir: PathBuf,
        /// Victoria 3 installation (auto-detected when omitted).
        #[arg(long)]
        game_root: Option<PathBuf>,
        /// Regions below the small-state limit do not count toward integration traits.
        #[arg(long)]
        ignore_small_states: bool,
        /// Province count below which a region is small.
        #[arg(long, default_value_t = DEFAULT_SMALL_REGION_THRESHOLD)]
        small_state_limit: usize,
        /// Also write sea nodes, replacing the vanilla sea file.
        #[arg(long)]
        include_sea_nodes: bool,
        /// Languages to fill hub names for.
        #[arg(long, value_delimiter = ',', default_values = ["english", "simp_chinese"])]
        languages: Vec<String>,
        /// Do not rewrite region names in other script files.
        #[arg(long)]
        skip_misc: bool,
    },

    /// Parse a script file and print it back as script text or JSON.
    Dump {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Validate a plan against the game's state regions without writing anything.
    Check {
        plan: PathBuf,
        /// Victoria 3 installation (auto-detected when omitted).
        #[arg(long)]
        game_root: Option<PathBuf>,
    },
}
