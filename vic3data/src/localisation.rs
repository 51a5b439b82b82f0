use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::plan::MergePlan;
use crate::state_regions::{LandRegion, RegionMap};

/// Hub attributes that have a `HUB_NAME_<region>_<hub>` localisation key.
pub const HUB_KINDS: [&str; 5] = ["city", "port", "farm", "mine", "wood"];

/// Directory of a language's localisation, relative to the game or mod root.
pub fn language_dir(language: &str) -> PathBuf {
    Path::new("localization").join(bare_language(language))
}

/// File name the filled-in hub names are written to.
pub fn hub_names_file(language: &str) -> String {
    format!("hub_names_states_merging_l_{}.yml", bare_language(language))
}

fn bare_language(language: &str) -> &str {
    language.trim_start_matches("l_").trim_start_matches("L_")
}

/// Localisation keys and their text for one language.
///
/// Loaded from the game's `.yml` files, which look like
///
/// ```text
/// l_english:
///  KEY:0 "Value"
///  KEY2: "Value" # Optional comment
/// ```
///
/// Files for other languages are skipped by their `l_<lang>:` header, and a
/// leading UTF-8 BOM is ignored.
#[derive(Debug, Default)]
pub struct Localisation {
    map: HashMap<String, String>,
}

impl Localisation {
    /// Creates a new empty localisation store.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Inserts a key-value pair directly.
    pub fn insert(&mut self, key: String, value: String) {
        self.map.insert(key, value);
    }

    /// Retrieves the localised value for a given key.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Loads all `.yml` files in a directory, and its subdirectories, that match
    /// the specified language.
    ///
    /// # Arguments
    ///
    /// * `dir` - The directory path to search.
    /// * `language` - The language tag to filter for (e.g., "english", "l_simp_chinese").
    ///
    /// # Returns
    ///
    /// The number of keys successfully loaded.
    pub fn load_from_dir<P: AsRef<Path>>(
        &mut self,
        dir: P,
        language: &str,
    ) -> std::io::Result<usize> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(0);
        }
        let header_suffix = format!("_{}:", bare_language(language)).to_lowercase();
        self.load_tree(dir, &header_suffix)
    }

    fn load_tree(&mut self, dir: &Path, header_suffix: &str) -> std::io::Result<usize> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        paths.sort();

        let mut count = 0;
        for path in paths {
            if path.is_dir() {
                count += self.load_tree(&path, header_suffix)?;
            } else if path.extension().is_some_and(|e| e == "yml") {
                count += self.load_file(&path, header_suffix)?;
            }
        }
        Ok(count)
    }

    fn load_file(&mut self, path: &Path, header_suffix: &str) -> std::io::Result<usize> {
        let file = File::open(path)?;
        // Localisation files are UTF-8 with a BOM.
        let reader = BufReader::new(DecodeReaderBytesBuilder::new().build(file));

        let mut count = 0;
        let mut correct_language = false;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_start_matches('\u{feff}').trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line_lower = line.to_lowercase();
            if line_lower.starts_with("l_") && line_lower.ends_with(':') {
                if line_lower.ends_with(header_suffix) {
                    correct_language = true;
                    continue;
                }
                log::trace!("Skipping {:?}: different language", path);
                return Ok(0);
            }

            if !correct_language {
                if i > 5 {
                    return Ok(0);
                }
                continue;
            }

            // Parse: KEY:0 "Value"
            if let Some((key_part, val_part)) = line.split_once(':')
                && let Some(start_quote) = val_part.find('"')
                && let Some(end_quote) = val_part[start_quote + 1..].rfind('"')
            {
                let value = &val_part[start_quote + 1..start_quote + 1 + end_quote];
                self.map.insert(key_part.trim().to_string(), value.to_string());
                count += 1;
            }
        }
        Ok(count)
    }
}

fn hub<'a>(region: &'a LandRegion, kind: &str) -> Option<&'a vic3txt::Scalar> {
    match kind {
        "city" => region.city.as_ref(),
        "port" => region.port.as_ref(),
        "farm" => region.farm.as_ref(),
        "mine" => region.mine.as_ref(),
        "wood" => region.wood.as_ref(),
        _ => None,
    }
}

/// Hub-name keys a merged target now needs but has no text for.
///
/// For each target with sources and each hub the merged target has, a missing
/// `HUB_NAME_<target>_<hub>` takes the text of the first source that has one.
/// Call this after the region map has been merged.
pub fn fill_hub_names(
    loc: &Localisation,
    regions: &RegionMap,
    plan: &MergePlan,
) -> Vec<(String, String)> {
    let mut filled = Vec::new();
    for (target, sources) in plan.entries() {
        if sources.is_empty() {
            continue;
        }
        let Some(region) = regions.get(target).and_then(|r| r.as_land()) else {
            log::warn!("{} not found in map data, skipping hub names", target);
            continue;
        };
        for kind in HUB_KINDS {
            if hub(region, kind).is_none() {
                continue;
            }
            let key = format!("HUB_NAME_{}_{}", target, kind);
            if loc.get(&key).is_some() {
                continue;
            }
            let found = sources
                .iter()
                .find_map(|source| loc.get(&format!("HUB_NAME_{}_{}", source, kind)));
            match found {
                Some(text) => filled.push((key, text.clone())),
                None => log::debug!("No source has a name for {}", key),
            }
        }
    }
    filled
}

/// Renders entries as a localisation file for `language`, without the BOM.
pub fn render_yml(language: &str, entries: &[(String, String)]) -> String {
    let mut out = format!("l_{}:\n", bare_language(language));
    for (key, value) in entries {
        out.push_str(&format!(" {}: \"{}\"\n", key, value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use vic3txt::{DefaultVic3Txt, Vic3Txt};

    #[test]
    fn test_parse_simple() {
        let content = r#"
l_english:
 KEY:0 "Value"
 KEY_TWO: "Value Two"
 BROKEN "No colon"
        "#;

        let mut file = tempfile::NamedTempFile::new().expect("create temp");
        write!(file, "{}", content).expect("write temp");

        let mut loc = Localisation::new();
        loc.load_file(file.path(), "_english:").expect("load");

        assert_eq!(loc.get("KEY"), Some(&"Value".to_string()));
        assert_eq!(loc.get("KEY_TWO"), Some(&"Value Two".to_string()));
        assert_eq!(loc.get("BROKEN"), None);
    }

    #[test]
    fn test_other_language_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sub");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("a_l_english.yml"), "\u{feff}l_english:\n A: \"a\"\n").unwrap();
        std::fs::write(nested.join("b_l_english.yml"), "l_english:\n B:0 \"b\"\n").unwrap();
        std::fs::write(dir.path().join("c_l_french.yml"), "l_french:\n C: \"c\"\n").unwrap();

        let mut loc = Localisation::new();
        assert_eq!(loc.load_from_dir(dir.path(), "l_english").unwrap(), 2);
        assert_eq!(loc.get("B"), Some(&"b".to_string()));
        assert_eq!(loc.get("C"), None);
    }

    #[test]
    fn test_fill_hub_names() {
        let tree = DefaultVic3Txt::parse_str(
            r#"STATE_A = { id = 1 subsistence_building = farms provinces = { x1 } city = x1 port = x1 mine = x1 }"#,
        )
        .unwrap();
        let regions = RegionMap::from_tree(&tree);
        let plan = MergePlan::from_json(r#"{ "STATE_A": ["STATE_B", "STATE_C"], "STATE_D": [] }"#).unwrap();

        let mut loc = Localisation::new();
        loc.insert("HUB_NAME_STATE_A_city".into(), "Uppsala".into());
        loc.insert("HUB_NAME_STATE_B_city".into(), "Gävle".into());
        loc.insert("HUB_NAME_STATE_C_port".into(), "Luleå".into());
        loc.insert("HUB_NAME_STATE_B_farm".into(), "Sandviken".into());

        let filled = fill_hub_names(&loc, &regions, &plan);
        assert_eq!(
            filled,
            vec![("HUB_NAME_STATE_A_port".to_string(), "Luleå".to_string())]
        );
        assert_eq!(
            render_yml("english", &filled),
            "l_english:\n HUB_NAME_STATE_A_port: \"Luleå\"\n"
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(language_dir("l_english"), Path::new("localization/english"));
        assert_eq!(hub_names_file("simp_chinese"), "hub_names_states_merging_l_simp_chinese.yml");
    }
}
