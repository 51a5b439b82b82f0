use std::path::{Path, PathBuf};

/// Game-relative directory of the state region definitions.
pub const STATE_REGIONS_DIR: &str = "map_data/state_regions";

/// Returns `path` itself, or its `game/` subdirectory, whichever holds the game data.
///
/// Steam installs put the data one level down; some tools point at the data
/// directory directly.
pub fn game_data_root(path: &Path) -> PathBuf {
    let nested = path.join("game");
    if !path.join(STATE_REGIONS_DIR).exists() && nested.join(STATE_REGIONS_DIR).exists() {
        nested
    } else {
        path.to_path_buf()
    }
}

/// Detects the Victoria 3 installation path.
///
/// Checks common Steam installation directories on Windows, Linux, and macOS.
pub fn detect_game_path() -> Option<PathBuf> {
    let candidates = [
        // Windows
        r"C:\Program Files (x86)\Steam\steamapps\common\Victoria 3",
        // Linux
        ".local/share/Steam/steamapps/common/Victoria 3",
        // macOS
        "Library/Application Support/Steam/steamapps/common/Victoria 3",
    ];

    for candidate in candidates {
        let path = if candidate.starts_with("C:") {
            PathBuf::from(candidate)
        } else {
            dirs::home_dir().map(|home| home.join(candidate))?
        };

        if path.exists() {
            return Some(game_data_root(&path));
        }
    }

    None
}
