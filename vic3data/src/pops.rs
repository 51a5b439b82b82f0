//! Historical populations from `common/history/pops`.

use crate::canonical::{Shape, canonicalize, to_int};
use crate::keyed::KeyedMap;
use crate::plan::scoped_key;
use std::fmt;
use vic3txt::{Entry, Scalar, Tree, Value, write_tree};

const TAG_SHAPE: Shape = Shape {
    lists: &[],
    records: &["create_pop"],
};

/// One `create_pop` entry.
///
/// Two cohorts are the same population when culture, pop type and religion agree,
/// including whether each is given at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort {
    pub culture: Option<Scalar>,
    pub pop_type: Option<Scalar>,
    pub religion: Option<Scalar>,
    pub size: i64,
    /// Any other fields, written back after the identity fields.
    pub extras: Tree,
}

impl Cohort {
    pub fn from_tree(tree: &Tree) -> Self {
        let mut cohort = Cohort {
            culture: None,
            pop_type: None,
            religion: None,
            size: 0,
            extras: Tree::new(),
        };
        for entry in &tree.entries {
            match entry {
                Entry::Pair {
                    key,
                    value: Value::Scalar(s),
                    ..
                } if matches!(key.as_str(), "culture" | "pop_type" | "religion" | "size") => {
                    match key.as_str() {
                        "culture" => cohort.culture = Some(s.clone()),
                        "pop_type" => cohort.pop_type = Some(s.clone()),
                        "religion" => cohort.religion = Some(s.clone()),
                        _ => cohort.size = to_int(s),
                    }
                }
                other => cohort.extras.entries.push(other.clone()),
            }
        }
        cohort
    }

    pub fn same_identity(&self, other: &Cohort) -> bool {
        self.culture == other.culture
            && self.pop_type == other.pop_type
            && self.religion == other.religion
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "            create_pop = {{")?;
        for (key, value) in [
            ("pop_type", &self.pop_type),
            ("culture", &self.culture),
            ("religion", &self.religion),
        ] {
            if let Some(value) = value {
                writeln!(f, "                {} = {}", key, value)?;
            }
        }
        writeln!(f, "                size = {}", self.size)?;
        f.write_str(&write_tree(&self.extras, 4))?;
        writeln!(f, "            }}")
    }
}

/// Cohorts of one region, grouped by tag.
pub type RegionPops = KeyedMap<Vec<Cohort>>;

/// Everything under `POPS`, keyed by scoped region.
#[derive(Debug, Clone, Default)]
pub struct PopulationSet {
    regions: KeyedMap<RegionPops>,
}

impl PopulationSet {
    pub fn from_tree(tree: &Tree) -> Self {
        let mut regions: KeyedMap<RegionPops> = KeyedMap::new();
        for block in tree.get_all("POPS").filter_map(Value::as_block) {
            for (key, value) in block.pairs() {
                let Value::Block(region) = value else {
                    log::warn!("Ignoring non-block pop entry {}", key);
                    continue;
                };
                log::trace!("Reading pops: {}", key);
                let tags = regions.entry_or_insert_with(key, KeyedMap::new);
                for (tag, value) in region.pairs() {
                    let cohorts = tags.entry_or_insert_with(tag, Vec::new);
                    if let Value::Block(block) = value {
                        let canon = canonicalize(block, &TAG_SHAPE);
                        cohorts.extend(canon.records("create_pop").iter().map(|c| Cohort::from_tree(c)));
                    }
                }
            }
        }
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn region(&self, name: &str) -> Option<&RegionPops> {
        self.regions.get(&scoped_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(&scoped_key(name))
    }

    /// Total population of a region across all tags.
    pub fn total(&self, name: &str) -> i64 {
        self.region(name)
            .map(|tags| tags.values().flatten().map(|c| c.size).sum::<i64>())
            .unwrap_or(0)
    }

    /// Folds the pops of `source` into `target`, by bare region name.
    pub fn merge(&mut self, target: &str, source: &str) -> bool {
        if target == source {
            return false;
        }
        let Some(incoming) = self.regions.remove(&scoped_key(source)) else {
            return false;
        };
        let target_key = scoped_key(target);
        if !self.regions.contains_key(&target_key) {
            self.regions.insert(target_key, incoming);
            return true;
        }
        let Some(tags) = self.regions.get_mut(&target_key) else {
            return false;
        };

        for (tag, cohorts) in incoming.iter() {
            let own = tags.entry_or_insert_with(tag, Vec::new);
            for cohort in cohorts {
                match own.iter_mut().find(|c| c.same_identity(cohort)) {
                    Some(existing) => existing.size += cohort.size,
                    None => own.push(cohort.clone()),
                }
            }
        }
        true
    }
}

impl fmt::Display for PopulationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "POPS = {{")?;
        for (region, tags) in self.regions.iter() {
            writeln!(f, "    {} = {{", region)?;
            for (tag, cohorts) in tags.iter() {
                writeln!(f, "        {} = {{", tag)?;
                for cohort in cohorts {
                    write!(f, "{}", cohort)?;
                }
                writeln!(f, "        }}")?;
            }
            writeln!(f, "    }}")?;
        }
        writeln!(f, "}}")
    }
}
