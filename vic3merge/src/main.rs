use anyhow::Result;
use clap::Parser;
use vic3data::MergeOptions;

mod args;
mod ops;

use args::{Cli, Commands};

fn run(args: Cli) -> Result<()> {
    match args.command {
        Commands::Merge {
            plan,
            mod_dir,
            game_root,
            ignore_small_states,
            small_state_limit,
            include_sea_nodes,
            languages,
            skip_misc,
        } => {
            let game_root = ops::resolve_game_root(game_root.as_deref())?;
            let options = MergeOptions {
                ignore_small_regions: ignore_small_states,
                small_region_threshold: small_state_limit,
                include_sea_nodes,
            };
            ops::merge(&ops::MergeRun {
                plan: &plan,
                mod_dir: &mod_dir,
                game_root: &game_root,
                options,
                languages: &languages,
                skip_misc,
            })?;
        }
        Commands::Dump { file, json } => ops::dump(&file, json)?,
        Commands::Check { plan, game_root } => {
            let game_root = ops::resolve_game_root(game_root.as_deref())?;
            ops::check(&plan, &game_root)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    run(args)
}
