use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use vic3data::localisation::{Localisation, fill_hub_names, language_dir};
use vic3data::loader::{GameFiles, load_dir, write_localisation, write_outputs};
use vic3data::path::{STATE_REGIONS_DIR, detect_game_path, game_data_root};
use vic3data::rewrite::rewrite_misc;
use vic3data::state_regions::RegionMap;
use vic3data::{GameData, MergeOptions, MergePlan, MergeReport};
use vic3txt::{DefaultVic3Txt, Vic3Txt};

/// Normalize path for display - convert to forward slashes for cleaner logging
fn display_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

pub fn resolve_game_root(game_root: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = game_root {
        return Ok(game_data_root(p));
    }
    match detect_game_path() {
        Some(p) => {
            log::info!("Auto-detected Victoria 3 path: {}", display_path(&p));
            Ok(p)
        }
        None => bail!("Could not detect a Victoria 3 installation. Please provide --game-root."),
    }
}

fn load_plan(path: &Path) -> Result<MergePlan> {
    MergePlan::load(path).with_context(|| format!("reading plan {}", display_path(path)))
}

fn print_report(report: &MergeReport) {
    println!(
        "Merged {} region pairs ({} building shares retargeted)",
        report.merged, report.retargeted_shares
    );
    for notice in &report.notices {
        println!("  {}", notice);
    }
}

pub struct MergeRun<'a> {
    pub plan: &'a Path,
    pub mod_dir: &'a Path,
    pub game_root: &'a Path,
    pub options: MergeOptions,
    pub languages: &'a [String],
    pub skip_misc: bool,
}

pub fn merge(run: &MergeRun) -> Result<MergeReport> {
    let plan = load_plan(run.plan)?;
    let files = GameFiles::load(run.game_root)
        .with_context(|| format!("loading game files from {}", display_path(run.game_root)))?;
    let mut data = files.to_data();
    log::info!(
        "Loaded {} state regions, {} building regions, {} pop regions",
        data.regions.len(),
        data.buildings.len(),
        data.pops.len()
    );

    let report = data.apply(&plan, &run.options)?;
    print_report(&report);

    for path in write_outputs(run.mod_dir, &files, &data, &run.options)
        .with_context(|| format!("writing merged files to {}", display_path(run.mod_dir)))?
    {
        println!("Wrote {}", display_path(&path));
    }

    for language in run.languages {
        fill_localisation(run, &plan, &data, language)?;
    }

    if !run.skip_misc {
        let written = rewrite_misc(run.game_root, run.mod_dir, &plan)
            .context("rewriting region references")?;
        println!("Rewrote {} script files", written);
    }
    Ok(report)
}

fn fill_localisation(run: &MergeRun, plan: &MergePlan, data: &GameData, language: &str) -> Result<()> {
    let dir = run.game_root.join(language_dir(language));
    let mut loc = Localisation::new();
    let count = loc
        .load_from_dir(&dir, language)
        .with_context(|| format!("reading localisation from {}", display_path(&dir)))?;
    if count == 0 {
        log::warn!("No {} localisation found in {}", language, display_path(&dir));
        return Ok(());
    }
    let filled = fill_hub_names(&loc, &data.regions, plan);
    if let Some(path) = write_localisation(run.mod_dir, language, &filled)? {
        println!("Wrote {} hub names to {}", filled.len(), display_path(&path));
    }
    Ok(())
}

pub fn dump(file: &Path, json: bool) -> Result<()> {
    let tree = DefaultVic3Txt::parse_file(file)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("parsing {}", display_path(file)))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print!("{}", tree);
    }
    Ok(())
}

/// Validates `plan` against the state regions only; nothing is merged or written.
pub fn check(plan: &Path, game_root: &Path) -> Result<()> {
    let plan = load_plan(plan)?;
    let regions_dir = game_root.join(STATE_REGIONS_DIR);
    let files = load_dir(&regions_dir)
        .with_context(|| format!("loading {}", display_path(&regions_dir)))?;
    let data = GameData {
        regions: RegionMap::from_tree(&files.tree),
        ..GameData::default()
    };
    let (accepted, notices) = data.validate(&plan)?;
    println!("{} pairs will be merged", accepted.len());
    for notice in &notices {
        println!("  {}", notice);
    }
    Ok(())
}
