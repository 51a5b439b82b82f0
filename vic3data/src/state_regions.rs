//! State region definitions from `map_data/state_regions/*.txt`.
//!
//! Each top-level block is either a land region (it names a subsistence building)
//! or a sea node. Land regions merge by concatenating provinces, pooling resources,
//! and re-deriving the `state_trait_<n>_states_integration` /
//! `state_trait_<n>_coast_integration` traits that record how many regions have
//! been folded together.

use crate::canonical::{Shape, canonicalize, to_int};
use crate::config::MergeOptions;
use crate::error::MergeError;
use crate::keyed::KeyedMap;
use std::fmt::Write;
use vic3txt::{Scalar, Tree, Value};

const TIER_WORDS: [&str; 9] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight",
];

/// Highest states-integration trait the game defines.
pub const MAX_STATES_TIER: usize = 8;
/// Highest coast-integration trait the game defines.
pub const MAX_COAST_TIER: usize = 6;

const REGION_SHAPE: Shape = Shape {
    lists: &[
        "provinces",
        "impassable",
        "prime_land",
        "traits",
        "arable_resources",
    ],
    records: &["resource"],
};

pub fn states_trait(tier: usize) -> String {
    format!(
        "state_trait_{}_states_integration",
        TIER_WORDS[tier.min(MAX_STATES_TIER)]
    )
}

pub fn coast_trait(tier: usize) -> String {
    format!(
        "state_trait_{}_coast_integration",
        TIER_WORDS[tier.min(MAX_COAST_TIER)]
    )
}

/// Tier encoded by `trait_name` when it matches `state_trait_<n>_<kind>_integration`.
fn trait_tier(trait_name: &str, kind: &str, max: usize) -> Option<usize> {
    let word = trait_name
        .strip_prefix("state_trait_")?
        .strip_suffix(&format!("_{}_integration", kind))?;
    TIER_WORDS
        .iter()
        .position(|w| *w == word)
        .filter(|&n| (2..=max).contains(&n))
}

fn is_tier_trait(trait_name: &str) -> bool {
    trait_tier(trait_name, "states", MAX_STATES_TIER).is_some()
        || trait_tier(trait_name, "coast", MAX_COAST_TIER).is_some()
}

/// A deposit such as `building_gold_field`, keyed by its `type`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDeposit {
    pub kind: Scalar,
    pub depleted_type: Option<Scalar>,
    pub undiscovered: i64,
    pub discovered: i64,
}

impl ResourceDeposit {
    fn from_tree(tree: &Tree) -> Option<Self> {
        let canon = canonicalize(tree, &Shape::default());
        Some(Self {
            kind: canon.scalar("type")?.clone(),
            depleted_type: canon.scalar("depleted_type").cloned(),
            undiscovered: canon.int("undiscovered_amount"),
            discovered: canon.int("discovered_amount"),
        })
    }

    fn is_empty(&self) -> bool {
        self.undiscovered == 0 && self.discovered == 0
    }
}

/// A sea node. It only carries its id and provinces and never merges.
#[derive(Debug, Clone, PartialEq)]
pub struct SeaNode {
    pub id: i64,
    pub provinces: Vec<Scalar>,
}

/// A land state region.
#[derive(Debug, Clone, PartialEq)]
pub struct LandRegion {
    pub id: i64,
    pub subsistence_building: Scalar,
    pub provinces: Vec<Scalar>,
    pub impassable: Vec<Scalar>,
    pub prime_land: Vec<Scalar>,
    pub traits: Vec<Scalar>,
    pub city: Option<Scalar>,
    pub port: Option<Scalar>,
    pub farm: Option<Scalar>,
    pub mine: Option<Scalar>,
    pub wood: Option<Scalar>,
    pub arable_land: i64,
    pub arable_resources: Vec<Scalar>,
    pub capped_resources: KeyedMap<i64>,
    pub resources: Vec<ResourceDeposit>,
    pub naval_exit_id: Option<Scalar>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Sea(SeaNode),
    Land(LandRegion),
}

fn union_into(dst: &mut Vec<Scalar>, src: impl IntoIterator<Item = Scalar>) {
    for item in src {
        if !dst.contains(&item) {
            dst.push(item);
        }
    }
}

impl Region {
    pub fn from_tree(tree: &Tree) -> Self {
        let canon = canonicalize(tree, &REGION_SHAPE);
        let id = canon.int("id");
        let provinces = canon.list("provinces");
        let Some(subsistence_building) = canon.scalar("subsistence_building").cloned() else {
            return Region::Sea(SeaNode { id, provinces });
        };

        let mut capped_resources = KeyedMap::new();
        if let Some(capped) = canon.block("capped_resources") {
            for (name, amount) in capped.pairs() {
                if let Value::Scalar(amount) = amount {
                    *capped_resources.entry_or_insert_with(name, || 0) += to_int(amount);
                }
            }
        }

        let mut resources: Vec<ResourceDeposit> = Vec::new();
        for block in canon.records("resource") {
            match ResourceDeposit::from_tree(block) {
                Some(deposit) => resources.push(deposit),
                None => log::warn!("Resource without a type in region {}", id),
            }
        }

        Region::Land(LandRegion {
            id,
            subsistence_building,
            provinces,
            impassable: canon.list("impassable"),
            prime_land: canon.list("prime_land"),
            traits: canon.list("traits"),
            city: canon.scalar("city").cloned(),
            port: canon.scalar("port").cloned(),
            farm: canon.scalar("farm").cloned(),
            mine: canon.scalar("mine").cloned(),
            wood: canon.scalar("wood").cloned(),
            arable_land: canon.int("arable_land"),
            arable_resources: canon.list("arable_resources"),
            capped_resources,
            resources,
            naval_exit_id: canon.scalar("naval_exit_id").cloned(),
        })
    }

    pub fn is_sea_node(&self) -> bool {
        matches!(self, Region::Sea(_))
    }

    pub fn as_land(&self) -> Option<&LandRegion> {
        match self {
            Region::Land(land) => Some(land),
            Region::Sea(_) => None,
        }
    }

    pub fn provinces(&self) -> &[Scalar] {
        match self {
            Region::Land(land) => &land.provinces,
            Region::Sea(sea) => &sea.provinces,
        }
    }

    pub fn province_count(&self) -> usize {
        self.provinces().len()
    }

    /// How many land regions this one stands for. Sea nodes count as zero.
    pub fn states_tier(&self) -> usize {
        self.as_land().map_or(0, LandRegion::states_tier)
    }

    pub fn render(&self, name: &str) -> String {
        match self {
            Region::Land(land) => land.render(name),
            Region::Sea(sea) => {
                let mut out = format!("{} = {{\n    id = {}\n", name, sea.id);
                write_inline(&mut out, "provinces", &sea.provinces);
                out.push_str("}\n\n");
                out
            }
        }
    }
}

fn write_inline(out: &mut String, key: &str, items: &[Scalar]) {
    let _ = write!(out, "    {} = {{ ", key);
    for item in items {
        let _ = write!(out, "{} ", item);
    }
    out.push_str("}\n");
}

impl LandRegion {
    /// Integration tier recorded in the traits; an unmerged region is tier 1.
    pub fn states_tier(&self) -> usize {
        self.traits
            .iter()
            .find_map(|t| trait_tier(t.text(), "states", MAX_STATES_TIER))
            .unwrap_or(1)
    }

    /// Coastal integration tier; zero without a naval exit.
    pub fn coast_tier(&self) -> usize {
        if self.naval_exit_id.is_none() {
            return 0;
        }
        self.traits
            .iter()
            .find_map(|t| trait_tier(t.text(), "coast", MAX_COAST_TIER))
            .unwrap_or(1)
    }

    pub fn is_small(&self, threshold: usize) -> bool {
        self.provinces.len() < threshold
    }

    /// Folds `other` into `self`, leaving `other` an empty husk.
    pub fn absorb(&mut self, other: &mut LandRegion, options: &MergeOptions) {
        let own_states = self.states_tier() as i64;
        let other_states = other.states_tier() as i64;
        let own_coast = self.coast_tier() as i64;
        let other_coast = other.coast_tier() as i64;

        let mut states_total = own_states + other_states;
        let mut coast_total = own_coast + other_coast;
        if options.ignore_small_regions {
            let threshold = options.small_region_threshold;
            for (small, coast) in [
                (self.is_small(threshold), own_coast),
                (other.is_small(threshold), other_coast),
            ] {
                if small {
                    states_total -= 1;
                    if coast > 0 {
                        coast_total -= 1;
                    }
                }
            }
        }

        self.provinces.append(&mut other.provinces);
        self.impassable.append(&mut other.impassable);
        self.prime_land.append(&mut other.prime_land);

        self.traits.retain(|t| !is_tier_trait(t.text()));
        let incoming: Vec<Scalar> = std::mem::take(&mut other.traits)
            .into_iter()
            .filter(|t| !is_tier_trait(t.text()))
            .collect();
        union_into(&mut self.traits, incoming);

        self.arable_land += std::mem::take(&mut other.arable_land);
        union_into(
            &mut self.arable_resources,
            std::mem::take(&mut other.arable_resources),
        );
        for (name, amount) in std::mem::take(&mut other.capped_resources).iter() {
            *self.capped_resources.entry_or_insert_with(name, || 0) += amount;
        }
        for deposit in std::mem::take(&mut other.resources) {
            match self.resources.iter_mut().find(|d| d.kind == deposit.kind) {
                Some(own) => {
                    own.undiscovered += deposit.undiscovered;
                    own.discovered += deposit.discovered;
                    if own.depleted_type.is_none() {
                        own.depleted_type = deposit.depleted_type;
                    }
                }
                None => self.resources.push(deposit),
            }
        }

        for (own, theirs) in [
            (&mut self.city, &mut other.city),
            (&mut self.port, &mut other.port),
            (&mut self.farm, &mut other.farm),
            (&mut self.mine, &mut other.mine),
            (&mut self.wood, &mut other.wood),
            (&mut self.naval_exit_id, &mut other.naval_exit_id),
        ] {
            if own.is_none() {
                *own = theirs.take();
            }
        }

        if states_total > 1 {
            self.traits
                .push(Scalar::quoted(states_trait(states_total as usize)));
        }
        if self.naval_exit_id.is_some() && coast_total > 1 {
            self.traits
                .push(Scalar::quoted(coast_trait(coast_total as usize)));
        }
    }

    pub fn render(&self, name: &str) -> String {
        let mut out = format!("{} = {{\n    id = {}\n", name, self.id);
        let _ = writeln!(out, "    subsistence_building = {}", self.subsistence_building);
        write_inline(&mut out, "provinces", &self.provinces);
        for (key, items) in [
            ("impassable", &self.impassable),
            ("prime_land", &self.prime_land),
            ("traits", &self.traits),
        ] {
            if !items.is_empty() {
                write_inline(&mut out, key, items);
            }
        }
        for (key, hub) in [
            ("city", &self.city),
            ("port", &self.port),
            ("farm", &self.farm),
            ("mine", &self.mine),
            ("wood", &self.wood),
        ] {
            if let Some(hub) = hub {
                let _ = writeln!(out, "    {} = {}", key, hub);
            }
        }
        let _ = writeln!(out, "    arable_land = {}", self.arable_land);
        write_inline(&mut out, "arable_resources", &self.arable_resources);
        if !self.capped_resources.is_empty() {
            out.push_str("    capped_resources = {\n");
            for (name, amount) in self.capped_resources.iter() {
                let _ = writeln!(out, "        {} = {}", name, amount);
            }
            out.push_str("    }\n");
        }
        for deposit in self.resources.iter().filter(|d| !d.is_empty()) {
            out.push_str("    resource = {\n");
            let _ = writeln!(out, "        type = {}", deposit.kind);
            if let Some(depleted) = &deposit.depleted_type {
                let _ = writeln!(out, "        depleted_type = {}", depleted);
            }
            if deposit.undiscovered != 0 {
                let _ = writeln!(out, "        undiscovered_amount = {}", deposit.undiscovered);
            }
            if deposit.discovered != 0 {
                let _ = writeln!(out, "        discovered_amount = {}", deposit.discovered);
            }
            out.push_str("    }\n");
        }
        if let Some(exit) = &self.naval_exit_id {
            let _ = writeln!(out, "    naval_exit_id = {}", exit);
        }
        out.push_str("}\n\n");
        out
    }
}

/// All state regions, keyed by bare region name (`STATE_SVEALAND`).
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    regions: KeyedMap<Region>,
}

impl RegionMap {
    /// Builds the map from the concatenated `state_regions` files.
    pub fn from_tree(tree: &Tree) -> Self {
        let mut regions = KeyedMap::new();
        for (name, value) in tree.pairs() {
            match value {
                Value::Block(block) => {
                    log::trace!("Reading state region: {}", name);
                    regions.insert(name, Region::from_tree(block));
                }
                Value::Scalar(_) => log::warn!("Ignoring non-block state region entry {}", name),
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

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Region)> {
        self.regions.iter()
    }

    /// Checks that `source` could be merged into `target` without touching either.
    ///
    /// Returns `Ok(false)` when the source is not in the map.
    pub fn check_merge(&self, target: &str, source: &str) -> Result<bool, MergeError> {
        if target == source {
            return Err(MergeError::SameRegion(target.to_string()));
        }
        let target_region = self
            .regions
            .get(target)
            .ok_or_else(|| MergeError::TargetMissing(target.to_string()))?;
        if target_region.is_sea_node() {
            return Err(MergeError::SeaNode(target.to_string()));
        }
        match self.regions.get(source) {
            None => Ok(false),
            Some(region) if region.is_sea_node() => Err(MergeError::SeaNode(source.to_string())),
            Some(_) => Ok(true),
        }
    }

    /// Merges `source` into `target` and removes `source`.
    ///
    /// A missing source is a no-op and yields `Ok(false)`.
    pub fn merge(
        &mut self,
        target: &str,
        source: &str,
        options: &MergeOptions,
    ) -> Result<bool, MergeError> {
        if !self.check_merge(target, source)? {
            return Ok(false);
        }
        let Some(Region::Land(mut absorbed)) = self.regions.remove(source) else {
            return Ok(false);
        };
        if let Some(Region::Land(land)) = self.regions.get_mut(target) {
            land.absorb(&mut absorbed, options);
        }
        Ok(true)
    }

    /// Renders every region in file order. Sea nodes are skipped unless asked for.
    pub fn render(&self, include_sea_nodes: bool) -> String {
        let mut out = String::new();
        for (name, region) in self.regions.iter() {
            if region.is_sea_node() && !include_sea_nodes {
                continue;
            }
            out.push_str(&region.render(name));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vic3txt::{DefaultVic3Txt, Vic3Txt};

    fn land(id: i64, provinces: usize, traits: &[&str], naval_exit: Option<&str>) -> String {
        let provinces: Vec<String> = (0..provinces).map(|p| format!("\"x{:02}{:04}\"", id, p)).collect();
        let traits: Vec<String> = traits.iter().map(|t| format!("\"{}\"", t)).collect();
        let mut src = format!(
            "    id = {}\n    subsistence_building = \"building_subsistence_farms\"\n    provinces = {{ {} }}\n",
            id,
            provinces.join(" ")
        );
        if !traits.is_empty() {
            src.push_str(&format!("    traits = {{ {} }}\n", traits.join(" ")));
        }
        src.push_str("    arable_land = 10\n    arable_resources = { \"bg_wheat_farms\" }\n");
        if let Some(exit) = naval_exit {
            src.push_str(&format!("    naval_exit_id = {}\n", exit));
        }
        src
    }

    fn map_from(src: &str) -> RegionMap {
        RegionMap::from_tree(&DefaultVic3Txt::parse_str(src).unwrap())
    }

    fn trait_names(map: &RegionMap, name: &str) -> Vec<String> {
        map.get(name)
            .and_then(Region::as_land)
            .unwrap()
            .traits
            .iter()
            .map(|t| t.text().to_string())
            .collect()
    }

    #[test]
    fn test_trait_tier_parsing() {
        assert_eq!(trait_tier("state_trait_three_states_integration", "states", 8), Some(3));
        assert_eq!(trait_tier("state_trait_one_states_integration", "states", 8), None);
        assert_eq!(trait_tier("state_trait_seven_coast_integration", "coast", 6), None);
        assert_eq!(trait_tier("state_trait_good_soils", "states", 8), None);
        assert_eq!(states_trait(11), "state_trait_eight_states_integration");
        assert_eq!(coast_trait(9), "state_trait_six_coast_integration");
    }

    #[test]
    fn test_sea_node_detection() {
        let map = map_from("SEA_1 = { id = 3000 provinces = { \"xAAAAAA\" } }");
        let sea = map.get("SEA_1").unwrap();
        assert!(sea.is_sea_node());
        assert_eq!(sea.states_tier(), 0);
        assert_eq!(sea.province_count(), 1);
    }

    #[test]
    fn test_two_baselines_make_two_states() {
        let src = format!("A = {{\n{}}}\nB = {{\n{}}}\n", land(1, 2, &["state_trait_good_soils"], None), land(2, 3, &[], None));
        let mut map = map_from(&src);
        assert!(map.merge("A", "B", &MergeOptions::default()).unwrap());
        assert!(!map.contains("B"));
        let names = trait_names(&map, "A");
        assert_eq!(
            names,
            vec!["state_trait_good_soils", "state_trait_two_states_integration"]
        );
        assert!(!names.iter().any(|t| t.contains("_one_")));
        assert_eq!(map.get("A").unwrap().province_count(), 5);
    }

    #[test]
    fn test_existing_tier_is_replaced() {
        let src = format!(
            "A = {{\n{}}}\nC = {{\n{}}}\n",
            land(1, 2, &["state_trait_two_states_integration"], None),
            land(3, 2, &["state_trait_three_states_integration", "state_trait_natural_harbors"], None)
        );
        let mut map = map_from(&src);
        map.merge("A", "C", &MergeOptions::default()).unwrap();
        assert_eq!(
            trait_names(&map, "A"),
            vec!["state_trait_natural_harbors", "state_trait_five_states_integration"]
        );
    }

    #[test]
    fn test_states_tier_saturates() {
        let src = format!(
            "A = {{\n{}}}\nB = {{\n{}}}\n",
            land(1, 5, &["state_trait_six_states_integration"], None),
            land(2, 5, &["state_trait_five_states_integration"], None)
        );
        let mut map = map_from(&src);
        map.merge("A", "B", &MergeOptions::default()).unwrap();
        assert_eq!(trait_names(&map, "A"), vec!["state_trait_eight_states_integration"]);
    }

    #[test]
    fn test_small_regions_contribute_nothing() {
        let src = format!("A = {{\n{}}}\nB = {{\n{}}}\n", land(1, 2, &[], Some("3001")), land(2, 3, &[], Some("3002")));
        let options = MergeOptions {
            ignore_small_regions: true,
            ..MergeOptions::default()
        };
        let mut map = map_from(&src);
        map.merge("A", "B", &options).unwrap();
        assert!(trait_names(&map, "A").is_empty());
    }

    #[test]
    fn test_one_small_region() {
        let src = format!("A = {{\n{}}}\nB = {{\n{}}}\nC = {{\n{}}}\n", land(1, 5, &[], None), land(2, 5, &[], None), land(3, 1, &[], None));
        let options = MergeOptions {
            ignore_small_regions: true,
            ..MergeOptions::default()
        };
        let mut map = map_from(&src);
        map.merge("A", "B", &options).unwrap();
        map.merge("A", "C", &options).unwrap();
        assert_eq!(trait_names(&map, "A"), vec!["state_trait_two_states_integration"]);
    }

    #[test]
    fn test_coast_tier_needs_naval_exit() {
        let src = format!(
            "A = {{\n{}}}\nB = {{\n{}}}\nC = {{\n{}}}\n",
            land(1, 5, &[], Some("3001")),
            land(2, 5, &[], Some("3002")),
            land(3, 5, &[], None)
        );
        let mut map = map_from(&src);
        map.merge("A", "B", &MergeOptions::default()).unwrap();
        assert_eq!(
            trait_names(&map, "A"),
            vec!["state_trait_two_states_integration", "state_trait_two_coast_integration"]
        );
        map.merge("A", "C", &MergeOptions::default()).unwrap();
        assert_eq!(
            trait_names(&map, "A"),
            vec!["state_trait_three_states_integration", "state_trait_two_coast_integration"]
        );
        let a = map.get("A").and_then(Region::as_land).unwrap();
        assert_eq!(a.naval_exit_id.as_ref().map(Scalar::text), Some("3001"));
        assert_eq!(a.coast_tier(), 2);
    }

    #[test]
    fn test_inland_target_adopts_naval_exit() {
        let src = format!("A = {{\n{}}}\nB = {{\n{}}}\n", land(1, 5, &[], None), land(2, 5, &[], Some("3002")));
        let mut map = map_from(&src);
        map.merge("A", "B", &MergeOptions::default()).unwrap();
        let a = map.get("A").and_then(Region::as_land).unwrap();
        assert_eq!(a.naval_exit_id.as_ref().map(Scalar::text), Some("3002"));
        assert_eq!(a.coast_tier(), 1);
    }

    #[test]
    fn test_sea_merge_rejected() {
        let src = format!("A = {{\n{}}}\nSEA = {{ id = 3000 provinces = {{ \"xFF\" }} }}\n", land(1, 2, &[], None));
        let mut map = map_from(&src);
        assert_eq!(
            map.merge("A", "SEA", &MergeOptions::default()),
            Err(MergeError::SeaNode("SEA".to_string()))
        );
        assert!(map.contains("SEA"));
        assert_eq!(map.get("A").unwrap().province_count(), 2);
    }

    #[test]
    fn test_missing_source_and_self_merge() {
        let src = format!("A = {{\n{}}}\n", land(1, 2, &[], None));
        let mut map = map_from(&src);
        assert_eq!(map.merge("A", "NOPE", &MergeOptions::default()), Ok(false));
        assert_eq!(
            map.merge("A", "A", &MergeOptions::default()),
            Err(MergeError::SameRegion("A".to_string()))
        );
        assert_eq!(
            map.merge("NOPE", "A", &MergeOptions::default()),
            Err(MergeError::TargetMissing("NOPE".to_string()))
        );
    }

    #[test]
    fn test_resources_and_hubs_combine() {
        let src = r#"
A = {
    id = 1
    subsistence_building = "building_subsistence_farms"
    provinces = { "x1" "x2" }
    city = "x1"
    arable_land = 20
    arable_resources = { "bg_wheat_farms" "bg_livestock_ranches" }
    capped_resources = {
        bg_logging = 10
        bg_coal_mining = 4
    }
    resource = {
        type = "building_gold_field"
        depleted_type = "building_gold_mine"
        undiscovered_amount = 2
    }
}
B = {
    id = 2
    subsistence_building = "building_subsistence_farms"
    provinces = { "x3" "x4" }
    city = "x3"
    mine = "x4"
    arable_land = 15
    arable_resources = { "bg_livestock_ranches" "bg_coffee_plantations" }
    capped_resources = {
        bg_logging = 5
        bg_fishing = 3
    }
    resource = {
        type = "building_gold_field"
        depleted_type = "building_gold_mine"
        undiscovered_amount = 1
        discovered_amount = 3
    }
    resource = {
        type = "building_oil_rig"
        undiscovered_amount = 12
    }
}
"#;
        let mut map = map_from(src);
        map.merge("A", "B", &MergeOptions::default()).unwrap();
        let a = map.get("A").and_then(Region::as_land).unwrap();
        assert_eq!(a.arable_land, 35);
        assert_eq!(
            a.arable_resources.iter().map(Scalar::text).collect::<Vec<_>>(),
            vec!["bg_wheat_farms", "bg_livestock_ranches", "bg_coffee_plantations"]
        );
        assert_eq!(a.capped_resources.get("bg_logging"), Some(&15));
        assert_eq!(a.capped_resources.get("bg_coal_mining"), Some(&4));
        assert_eq!(a.capped_resources.get("bg_fishing"), Some(&3));
        assert_eq!(a.resources.len(), 2);
        assert_eq!((a.resources[0].undiscovered, a.resources[0].discovered), (3, 3));
        assert_eq!(a.resources[1].undiscovered, 12);
        assert_eq!(a.city.as_ref().map(Scalar::text), Some("x1"));
        assert_eq!(a.mine.as_ref().map(Scalar::text), Some("x4"));
    }

    #[test]
    fn test_duplicate_provinces_are_kept() {
        let src = "A = { id = 1 subsistence_building = x provinces = { \"x1\" } arable_land = 1 }\nB = { id = 2 subsistence_building = x provinces = { \"x1\" \"x2\" } arable_land = 1 }";
        let mut map = map_from(src);
        map.merge("A", "B", &MergeOptions::default()).unwrap();
        assert_eq!(map.get("A").unwrap().province_count(), 3);
    }

    #[test]
    fn test_render_land() {
        let src = r#"STATE_X = {
    id = 7
    subsistence_building = "building_subsistence_farms"
    provinces = { "x1" "x2" }
    traits = { "state_trait_good_soils" }
    city = "x1"
    arable_land = 20
    arable_resources = { "bg_wheat_farms" }
    capped_resources = {
        bg_logging = 10
    }
    resource = {
        type = "building_oil_rig"
        undiscovered_amount = 12
    }
    naval_exit_id = 3001
}
"#;
        let map = map_from(src);
        assert_eq!(map.render(false), format!("{}\n", src));
    }

    #[test]
    fn test_render_skips_sea_nodes() {
        let map = map_from("SEA = { id = 3000 provinces = { \"xFF\" } }");
        assert_eq!(map.render(false), "");
        assert_eq!(
            map.render(true),
            "SEA = {\n    id = 3000\n    provinces = { \"xFF\" }\n}\n\n"
        );
    }

    #[test]
    fn test_round_trip_after_merge() {
        let src = format!(
            "A = {{\n{}}}\nB = {{\n{}}}\n",
            land(1, 4, &["state_trait_good_soils"], Some("3001")),
            land(2, 4, &["state_trait_two_states_integration"], Some("3002"))
        );
        let mut map = map_from(&src);
        map.merge("A", "B", &MergeOptions::default()).unwrap();
        let reparsed = map_from(&map.render(false));
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed.get("A"), map.get("A"));
    }
}
