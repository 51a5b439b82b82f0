//! Reading the five domain directories of a game install and writing merged output
//! into a mod.

use crate::config::MergeOptions;
use crate::engine::GameData;
use crate::error::LoadError;
use crate::localisation::{hub_names_file, language_dir};
use crate::path::STATE_REGIONS_DIR;
use std::io::Write;
use std::path::{Path, PathBuf};
use vic3txt::{DefaultVic3Txt, Tree, Vic3Txt};

pub const BUILDINGS_DIR: &str = "common/history/buildings";
pub const POPS_DIR: &str = "common/history/pops";
pub const STATES_DIR: &str = "common/history/states";
pub const TRADE_DIR: &str = "common/history/trade";

/// Vanilla sea node file. Left active in the mod unless sea nodes are written out.
pub const SEAS_FILE: &str = "99_seas.txt";
pub const MERGED_FILE: &str = "00_states_merging.txt";
pub const STATES_FILE: &str = "00_states.txt";
pub const TRADE_FILE: &str = "00_historical_trade.txt";

const BOM: &str = "\u{feff}";

/// All `.txt` files of one directory, parsed and concatenated.
#[derive(Debug, Clone, Default)]
pub struct DomainFiles {
    pub tree: Tree,
    /// File names in load order.
    pub file_names: Vec<String>,
}

/// Parses every `.txt` file of `dir` in file-name order into one tree.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<DomainFiles, LoadError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(LoadError::Missing(dir.to_path_buf()));
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    paths.retain(|p| p.is_file() && p.extension().is_some_and(|e| e == "txt"));
    paths.sort();

    let mut files = DomainFiles::default();
    for path in paths {
        log::debug!("Parsing {:?}", path);
        let tree = DefaultVic3Txt::parse_file(&path).map_err(|e| LoadError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        files.tree.extend(tree);
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.file_names.push(name.to_string());
        }
    }
    Ok(files)
}

/// The raw domain files of a game install.
#[derive(Debug, Clone, Default)]
pub struct GameFiles {
    pub regions: DomainFiles,
    pub buildings: DomainFiles,
    pub pops: DomainFiles,
    pub states: DomainFiles,
    pub trade: DomainFiles,
}

impl GameFiles {
    pub fn load<P: AsRef<Path>>(game_root: P) -> Result<Self, LoadError> {
        let root = game_root.as_ref();
        log::info!("Loading state regions");
        let regions = load_dir(root.join(STATE_REGIONS_DIR))?;
        log::info!("Loading buildings");
        let buildings = load_dir(root.join(BUILDINGS_DIR))?;
        log::info!("Loading pops");
        let pops = load_dir(root.join(POPS_DIR))?;
        log::info!("Loading states");
        let states = load_dir(root.join(STATES_DIR))?;
        log::info!("Loading trade");
        let trade = load_dir(root.join(TRADE_DIR))?;
        Ok(Self {
            regions,
            buildings,
            pops,
            states,
            trade,
        })
    }

    pub fn to_data(&self) -> GameData {
        GameData::from_trees(
            &self.regions.tree,
            &self.buildings.tree,
            &self.pops.tree,
            &self.states.tree,
            &self.trade.tree,
        )
    }
}

/// Writes `text` as UTF-8 with a byte order mark, creating parent directories.
pub fn write_with_bom(path: &Path, text: &str) -> Result<(), LoadError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(BOM.as_bytes())?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Blanks the vanilla files of one domain and writes its merged file.
fn write_domain(
    dir: &Path,
    vanilla: &[String],
    keep: &[&str],
    output: &str,
    text: &str,
) -> Result<PathBuf, LoadError> {
    std::fs::create_dir_all(dir)?;
    for name in vanilla {
        if keep.contains(&name.as_str()) {
            continue;
        }
        write_with_bom(&dir.join(name), "")?;
    }
    let path = dir.join(output);
    log::info!("Writing {:?}", path);
    write_with_bom(&path, text)?;
    Ok(path)
}

/// Writes all five merged domains into `mod_root`.
///
/// Every vanilla file of a domain is replaced by an empty placeholder so only
/// the merged file takes effect. The vanilla sea file stays active unless sea
/// nodes are written out with the land regions.
pub fn write_outputs(
    mod_root: &Path,
    files: &GameFiles,
    data: &GameData,
    options: &MergeOptions,
) -> Result<Vec<PathBuf>, LoadError> {
    let regions_dir = mod_root.join(STATE_REGIONS_DIR);
    let keep: &[&str] = if options.include_sea_nodes {
        &[]
    } else {
        &[SEAS_FILE]
    };
    let mut written = vec![write_domain(
        &regions_dir,
        &files.regions.file_names,
        keep,
        MERGED_FILE,
        &data.regions.render(options.include_sea_nodes),
    )?];
    let stale_seas = regions_dir.join(SEAS_FILE);
    if !options.include_sea_nodes && stale_seas.exists() {
        std::fs::remove_file(&stale_seas)?;
    }

    written.push(write_domain(
        &mod_root.join(BUILDINGS_DIR),
        &files.buildings.file_names,
        &[],
        MERGED_FILE,
        &data.buildings.to_string(),
    )?);
    written.push(write_domain(
        &mod_root.join(POPS_DIR),
        &files.pops.file_names,
        &[],
        MERGED_FILE,
        &data.pops.to_string(),
    )?);
    written.push(write_domain(
        &mod_root.join(STATES_DIR),
        &files.states.file_names,
        &[],
        STATES_FILE,
        &data.states.to_string(),
    )?);
    written.push(write_domain(
        &mod_root.join(TRADE_DIR),
        &files.trade.file_names,
        &[],
        TRADE_FILE,
        &data.trade.to_string(),
    )?);
    Ok(written)
}

/// Writes filled-in hub names for one language. Nothing is written when empty.
pub fn write_localisation(
    mod_root: &Path,
    language: &str,
    entries: &[(String, String)],
) -> Result<Option<PathBuf>, LoadError> {
    if entries.is_empty() {
        return Ok(None);
    }
    let path = mod_root
        .join(language_dir(language))
        .join(hub_names_file(language));
    log::info!("Writing {:?}", path);
    write_with_bom(&path, &crate::localisation::render_yml(language, entries))?;
    Ok(Some(path))
}
