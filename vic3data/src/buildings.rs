//! Historical buildings from `common/history/buildings`.
//!
//! ```text
//! BUILDINGS = {
//!     s:STATE_SVEALAND = {
//!         region_state:SWE = {
//!             create_building = {
//!                 building = "building_iron_mine"
//!                 add_ownership = {
//!                     building = { type = "building_manor_house" country = "c:SWE" levels = 2 region = "STATE_SVEALAND" }
//!                     country = { country = "c:SWE" levels = 1 }
//!                 }
//!                 reserves = 1
//!                 activate_production_methods = { "pm_picks_and_shovels_building_iron_mine" }
//!             }
//!         }
//!     }
//! }
//! ```

use crate::canonical::{Shape, canonicalize};
use crate::keyed::KeyedMap;
use crate::plan::scoped_key;
use std::fmt;
use vic3txt::{Entry, Scalar, Tree, Value, write_tree};

const TAG_SHAPE: Shape = Shape {
    lists: &[],
    records: &["create_building"],
};

const BUILDING_SHAPE: Shape = Shape {
    lists: &["activate_production_methods"],
    records: &["add_ownership"],
};

const OWNERSHIP_SHAPE: Shape = Shape {
    lists: &[],
    records: &["building", "country", "company"],
};

/// Key of a top-level entry that is not a region, such as a DLC guard.
const CONDITIONAL_KEY: &str = "if";

/// One owner's stake in a building.
///
/// Building shares carry all four fields, company shares leave `region` unset and
/// country shares only have `country` and `levels`.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub kind: Option<Scalar>,
    pub country: Option<Scalar>,
    pub region: Option<Scalar>,
    pub levels: i64,
}

impl Share {
    fn from_tree(tree: &Tree) -> Self {
        let canon = canonicalize(tree, &Shape::default());
        Self {
            kind: canon.scalar("type").cloned(),
            country: canon.scalar("country").cloned(),
            region: canon.scalar("region").cloned(),
            levels: canon.int("levels"),
        }
    }

    fn same_owner(&self, other: &Share) -> bool {
        self.kind == other.kind && self.country == other.country && self.region == other.region
    }

    fn fmt_block(&self, f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
        let pad = "                    ";
        writeln!(f, "{}{} = {{", pad, key)?;
        if let Some(kind) = &self.kind {
            writeln!(f, "{}    type = {}", pad, kind)?;
        }
        if let Some(country) = &self.country {
            writeln!(f, "{}    country = {}", pad, country)?;
        }
        writeln!(f, "{}    levels = {}", pad, self.levels)?;
        if let Some(region) = &self.region {
            writeln!(f, "{}    region = {}", pad, region)?;
        }
        writeln!(f, "{}}}", pad)
    }
}

/// Shares of one kind. Shares with the same owner are folded together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    shares: Vec<Share>,
}

impl Ledger {
    pub fn add(&mut self, share: Share) {
        match self.shares.iter_mut().find(|s| s.same_owner(&share)) {
            Some(own) => own.levels += share.levels,
            None => self.shares.push(share),
        }
    }

    pub fn absorb(&mut self, other: Ledger) {
        for share in other.shares {
            self.add(share);
        }
    }

    /// Re-folds the ledger after owners have been edited in place.
    fn normalize(&mut self) {
        let shares = std::mem::take(&mut self.shares);
        for share in shares {
            self.add(share);
        }
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn levels(&self) -> i64 {
        self.shares.iter().map(|s| s.levels).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnedBuilding {
    pub building: Scalar,
    pub buildings: Ledger,
    pub countries: Ledger,
    pub companies: Ledger,
    pub reserves: i64,
    pub production_methods: Vec<Scalar>,
}

impl OwnedBuilding {
    pub fn levels(&self) -> i64 {
        self.buildings.levels() + self.countries.levels() + self.companies.levels()
    }

    fn absorb(&mut self, other: OwnedBuilding) {
        self.buildings.absorb(other.buildings);
        self.countries.absorb(other.countries);
        self.companies.absorb(other.companies);
    }
}

/// A `create_building` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Building {
    /// An entry without a building type. Dropped on output.
    Placeholder,
    /// A unique building created at a fixed level.
    Monument(Scalar),
    Owned(OwnedBuilding),
}

impl Building {
    pub fn from_tree(tree: &Tree) -> Self {
        let canon = canonicalize(tree, &BUILDING_SHAPE);
        let Some(building) = canon.scalar("building").cloned() else {
            return Building::Placeholder;
        };
        if canon.has("level") {
            return Building::Monument(building);
        }

        let mut owned = OwnedBuilding {
            building,
            buildings: Ledger::default(),
            countries: Ledger::default(),
            companies: Ledger::default(),
            reserves: canon.int("reserves"),
            production_methods: canon.list("activate_production_methods"),
        };
        for ownership in canon.records("add_ownership") {
            let shares = canonicalize(ownership, &OWNERSHIP_SHAPE);
            for (key, ledger) in [
                ("building", &mut owned.buildings),
                ("country", &mut owned.countries),
                ("company", &mut owned.companies),
            ] {
                for share in shares.records(key) {
                    ledger.add(Share::from_tree(share));
                }
            }
        }
        Building::Owned(owned)
    }

    pub fn building_type(&self) -> Option<&Scalar> {
        match self {
            Building::Placeholder => None,
            Building::Monument(building) => Some(building),
            Building::Owned(owned) => Some(&owned.building),
        }
    }

    pub fn is_monument(&self) -> bool {
        matches!(self, Building::Monument(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Building::Placeholder => true,
            Building::Monument(_) => false,
            Building::Owned(owned) => {
                owned.buildings.is_empty() && owned.countries.is_empty() && owned.companies.is_empty()
            }
        }
    }

    pub fn levels(&self) -> i64 {
        match self {
            Building::Placeholder => 0,
            Building::Monument(_) => 1,
            Building::Owned(owned) => owned.levels(),
        }
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "            create_building = {{")?;
        match self {
            Building::Placeholder => {}
            Building::Monument(building) => {
                writeln!(f, "                building = {}", building)?;
                writeln!(f, "                level = 1")?;
            }
            Building::Owned(owned) => {
                writeln!(f, "                building = {}", owned.building)?;
                writeln!(f, "                add_ownership = {{")?;
                for share in owned.buildings.shares() {
                    share.fmt_block(f, "building")?;
                }
                for share in owned.countries.shares() {
                    share.fmt_block(f, "country")?;
                }
                for share in owned.companies.shares() {
                    share.fmt_block(f, "company")?;
                }
                writeln!(f, "                }}")?;
                if owned.reserves != 0 {
                    writeln!(f, "                reserves = {}", owned.reserves)?;
                }
                if !owned.production_methods.is_empty() {
                    writeln!(f, "                activate_production_methods = {{")?;
                    for method in &owned.production_methods {
                        writeln!(f, "                    {}", method)?;
                    }
                    writeln!(f, "                }}")?;
                }
            }
        }
        writeln!(f, "            }}")
    }
}

/// Buildings of one region, grouped by owning tag.
pub type RegionBuildings = KeyedMap<Vec<Building>>;

/// Everything under `BUILDINGS`, keyed by scoped region (`s:STATE_SVEALAND`).
#[derive(Debug, Clone, Default)]
pub struct BuildingSet {
    regions: KeyedMap<RegionBuildings>,
    passthrough: Vec<Entry>,
}

/// Follows `name` through the absorbing pairs to the region that survives them.
fn final_target<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    let mut current: Option<&'a str> = None;
    for _ in 0..pairs.len() {
        let from = current.unwrap_or(name);
        match pairs.iter().find(|(_, source)| source == from) {
            Some((target, _)) => current = Some(target.as_str()),
            None => break,
        }
    }
    current
}

impl BuildingSet {
    /// Reads every `BUILDINGS` block in `tree`.
    pub fn from_tree(tree: &Tree) -> Self {
        let mut set = BuildingSet::default();
        for block in tree.get_all("BUILDINGS").filter_map(Value::as_block) {
            for entry in &block.entries {
                match entry {
                    Entry::Pair {
                        key,
                        value: Value::Block(region),
                        ..
                    } if key != CONDITIONAL_KEY => {
                        log::trace!("Reading buildings: {}", key);
                        let tags = set.regions.entry_or_insert_with(key, KeyedMap::new);
                        read_region(tags, region);
                    }
                    other => set.passthrough.push(other.clone()),
                }
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Buildings of a region, by bare region name.
    pub fn region(&self, name: &str) -> Option<&RegionBuildings> {
        self.regions.get(&scoped_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(&scoped_key(name))
    }

    /// Points sub-building shares at their new region before any region is merged.
    ///
    /// A share may reference a region other than the one the building sits in, so
    /// this has to cover every region up front. `pairs` are `(target, source)` in
    /// merge order; a region absorbed by a target that is absorbed later ends up
    /// at the last one.
    pub fn retarget_shares(&mut self, pairs: &[(String, String)]) -> usize {
        let mut moved = 0;
        for tags in self.regions.values_mut() {
            for buildings in tags.values_mut() {
                for building in buildings.iter_mut() {
                    let Building::Owned(owned) = building else {
                        continue;
                    };
                    let mut touched = false;
                    for share in &mut owned.buildings.shares {
                        let Some(region) = &share.region else {
                            continue;
                        };
                        if let Some(target) = final_target(pairs, region.text()) {
                            share.region = Some(region.with_text(target));
                            touched = true;
                            moved += 1;
                        }
                    }
                    if touched {
                        owned.buildings.normalize();
                    }
                }
            }
        }
        moved
    }

    /// Folds the buildings of `source` into `target`, by bare region name.
    ///
    /// Returns `false` when `source` has no buildings.
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

        for (tag, buildings) in incoming.iter() {
            let Some(own) = tags.get_mut(tag) else {
                tags.insert(tag, buildings.clone());
                continue;
            };
            for building in buildings.iter().filter(|b| !b.is_empty()) {
                merge_building(own, building.clone());
            }
        }
        true
    }

    /// Drops buildings that ended up empty.
    pub fn prune(&mut self) {
        for tags in self.regions.values_mut() {
            for buildings in tags.values_mut() {
                buildings.retain(|b| !b.is_empty());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionBuildings)> {
        self.regions.iter()
    }
}

fn read_region(tags: &mut RegionBuildings, region: &Tree) {
    for (tag, value) in region.pairs() {
        let buildings = tags.entry_or_insert_with(tag, Vec::new);
        if let Value::Block(block) = value {
            let canon = canonicalize(block, &TAG_SHAPE);
            buildings.extend(
                canon
                    .records("create_building")
                    .iter()
                    .map(|b| Building::from_tree(b))
                    .filter(|b| !b.is_empty()),
            );
        }
    }
}

fn merge_building(own: &mut Vec<Building>, building: Building) {
    let Building::Owned(incoming) = building else {
        own.push(building);
        return;
    };
    let existing = own.iter_mut().find_map(|b| match b {
        Building::Owned(o) if o.building == incoming.building => Some(o),
        _ => None,
    });
    match existing {
        Some(existing) => existing.absorb(incoming),
        None => own.push(Building::Owned(incoming)),
    }
}

impl fmt::Display for BuildingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BUILDINGS = {{")?;
        for (region, tags) in self.regions.iter() {
            writeln!(f, "    {} = {{", region)?;
            for (tag, buildings) in tags.iter() {
                writeln!(f, "        {} = {{", tag)?;
                for building in buildings.iter().filter(|b| !b.is_empty()) {
                    write!(f, "{}", building)?;
                }
                writeln!(f, "        }}")?;
            }
            writeln!(f, "    }}")?;
        }
        let passthrough = Tree {
            entries: self.passthrough.clone(),
        };
        f.write_str(&write_tree(&passthrough, 1))?;
        writeln!(f, "}}")
    }
}
