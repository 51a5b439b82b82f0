//! Renames merged-away regions in script files outside the five history domains.

use crate::error::LoadError;
use crate::plan::MergePlan;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;

/// Directories whose references to a source region are pointed at its target.
pub const REPLACE_DIRS: &[&str] = &[
    "common/ai_strategies",
    "common/buildings",
    "common/canals",
    "common/character_templates",
    "common/company_types",
    "common/country_creation",
    "common/country_definitions",
    "common/country_formation",
    "common/decisions",
    "common/dynamic_country_map_colors",
    "common/dynamic_country_names",
    "common/geographic_regions",
    "common/flag_definitions",
    "common/history/countries",
    "common/history/global",
    "common/history/diplomatic_plays",
    "common/history/military_formations",
    "common/journal_entries",
    "common/mobilization_options",
    "common/on_actions",
    "common/political_movements",
    "common/scripted_buttons",
    "common/scripted_effects",
    "common/scripted_triggers",
    "events",
    "events/agitators_events",
    "events/american_civil_war",
    "events/balkans_events",
    "events/brazil",
    "events/iberia_events",
    "events/india_events",
    "events/soi_events",
    "gfx/map/city_data/city_types",
];

/// Directories where references to a source region are deleted outright.
pub const REMOVE_DIRS: &[&str] = &["common/strategic_regions"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMode {
    /// `STATE_B` becomes its target `STATE_A`.
    Replace,
    /// `STATE_B` is removed.
    Remove,
}

/// Whole-word substitution of every planned source name.
#[derive(Debug, Clone)]
pub struct Rewriter {
    pattern: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl Rewriter {
    pub fn new(plan: &MergePlan, mode: RewriteMode) -> Result<Self, regex::Error> {
        let mut replacements = HashMap::new();
        for (target, source) in plan.pairs() {
            if target == source {
                continue;
            }
            let with = match mode {
                RewriteMode::Replace => target.to_string(),
                RewriteMode::Remove => String::new(),
            };
            replacements.entry(source.to_string()).or_insert(with);
        }
        if replacements.is_empty() {
            return Ok(Self {
                pattern: None,
                replacements,
            });
        }

        let mut names: Vec<&str> = replacements.keys().map(String::as_str).collect();
        // Longest first so a name is never shadowed by its own prefix.
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\b(?:{})\b", alternation))?;
        Ok(Self {
            pattern: Some(pattern),
            replacements,
        })
    }

    /// The rewritten text, or `None` when `text` mentions no source region.
    pub fn rewrite(&self, text: &str) -> Option<String> {
        let pattern = self.pattern.as_ref()?;
        if !pattern.is_match(text) {
            return None;
        }
        let out = pattern.replace_all(text, |caps: &Captures| {
            self.replacements
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        });
        Some(out.into_owned())
    }

    /// Rewrites every file directly inside `src_dir` that needs it into `dst_dir`.
    ///
    /// Returns the number of files written. A missing `src_dir` writes nothing.
    pub fn rewrite_dir(&self, src_dir: &Path, dst_dir: &Path) -> Result<usize, LoadError> {
        if !src_dir.is_dir() {
            log::debug!("Skipping missing directory {:?}", src_dir);
            return Ok(0);
        }
        log::debug!("Scanning {:?}", src_dir);
        let mut written = 0;
        for entry in std::fs::read_dir(src_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let bytes = std::fs::read(&path)?;
            let text = String::from_utf8_lossy(&bytes);
            let Some(rewritten) = self.rewrite(&text) else {
                continue;
            };
            let Some(name) = path.file_name() else {
                continue;
            };
            log::info!("Modifying {:?}", path);
            std::fs::create_dir_all(dst_dir)?;
            std::fs::write(dst_dir.join(name), rewritten)?;
            written += 1;
        }
        Ok(written)
    }
}

/// Rewrites the miscellaneous game directories into the mod.
pub fn rewrite_misc(game_root: &Path, mod_root: &Path, plan: &MergePlan) -> Result<usize, LoadError> {
    let mut written = 0;
    for (dirs, mode) in [
        (REPLACE_DIRS, RewriteMode::Replace),
        (REMOVE_DIRS, RewriteMode::Remove),
    ] {
        let rewriter = Rewriter::new(plan, mode)?;
        for dir in dirs {
            written += rewriter.rewrite_dir(&game_root.join(dir), &mod_root.join(dir))?;
        }
    }
    Ok(written)
}
