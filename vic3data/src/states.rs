//! Province ownership from `common/history/states`.

use crate::canonical::{Shape, canonicalize};
use crate::keyed::KeyedMap;
use crate::plan::scoped_key;
use std::fmt;
use vic3txt::{Scalar, Tree, Value};

const REGION_SHAPE: Shape = Shape {
    lists: &["add_homeland", "add_claim"],
    records: &["create_state"],
};

const CREATE_SHAPE: Shape = Shape {
    lists: &["owned_provinces", "state_type"],
    records: &[],
};

/// One country's share of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateState {
    pub country: Scalar,
    pub owned_provinces: Vec<Scalar>,
    pub state_types: Vec<Scalar>,
}

/// The ownership record of one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ownership {
    pub creates: Vec<CreateState>,
    pub homelands: Vec<Scalar>,
    pub claims: Vec<Scalar>,
}

fn union_into(dst: &mut Vec<Scalar>, src: &[Scalar]) {
    for item in src {
        if !dst.contains(item) {
            dst.push(item.clone());
        }
    }
}

impl Ownership {
    pub fn from_tree(tree: &Tree) -> Self {
        let canon = canonicalize(tree, &REGION_SHAPE);
        let mut creates = Vec::new();
        for block in canon.records("create_state") {
            let create = canonicalize(block, &CREATE_SHAPE);
            let Some(country) = create.scalar("country").cloned() else {
                log::warn!("create_state without a country");
                continue;
            };
            creates.push(CreateState {
                country,
                owned_provinces: create.list("owned_provinces"),
                state_types: create.list("state_type"),
            });
        }
        Self {
            creates,
            homelands: canon.list("add_homeland"),
            claims: canon.list("add_claim"),
        }
    }

    /// Owner of `province`, if any country lists it.
    pub fn owner_of(&self, province: &str) -> Option<&Scalar> {
        self.creates
            .iter()
            .find(|c| c.owned_provinces.iter().any(|p| p.text() == province))
            .map(|c| &c.country)
    }

    fn absorb(&mut self, other: Ownership) {
        for create in other.creates {
            match self.creates.iter_mut().find(|c| c.country == create.country) {
                Some(own) => {
                    own.owned_provinces.extend(create.owned_provinces);
                    union_into(&mut own.state_types, &create.state_types);
                }
                None => self.creates.push(create),
            }
        }
        union_into(&mut self.homelands, &other.homelands);
        union_into(&mut self.claims, &other.claims);
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for create in &self.creates {
            writeln!(f, "        create_state = {{")?;
            writeln!(f, "            country = {}", create.country)?;
            write!(f, "            owned_provinces = {{ ")?;
            for province in &create.owned_provinces {
                write!(f, "{} ", province)?;
            }
            writeln!(f, "}}")?;
            for state_type in &create.state_types {
                writeln!(f, "            state_type = {}", state_type)?;
            }
            writeln!(f, "        }}\n")?;
        }
        for culture in &self.homelands {
            writeln!(f, "        add_homeland = {}", culture)?;
        }
        for country in &self.claims {
            writeln!(f, "        add_claim = {}", country)?;
        }
        Ok(())
    }
}

/// Everything under `STATES`, keyed by scoped region.
#[derive(Debug, Clone, Default)]
pub struct OwnershipSet {
    regions: KeyedMap<Ownership>,
}

impl OwnershipSet {
    pub fn from_tree(tree: &Tree) -> Self {
        let mut regions: KeyedMap<Ownership> = KeyedMap::new();
        for block in tree.get_all("STATES").filter_map(Value::as_block) {
            for (key, value) in block.pairs() {
                let record = match value {
                    Value::Block(region) => Ownership::from_tree(region),
                    Value::Scalar(_) => Ownership::default(),
                };
                match regions.get_mut(key) {
                    Some(existing) => existing.absorb(record),
                    None => {
                        regions.insert(key, record);
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

    pub fn region(&self, name: &str) -> Option<&Ownership> {
        self.regions.get(&scoped_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(&scoped_key(name))
    }

    /// Folds the ownership of `source` into `target`, by bare region name.
    ///
    /// Homelands and claims of the source are kept even when the target had none.
    pub fn merge(&mut self, target: &str, source: &str) -> bool {
        if target == source {
            return false;
        }
        let Some(incoming) = self.regions.remove(&scoped_key(source)) else {
            return false;
        };
        let target_key = scoped_key(target);
        match self.regions.get_mut(&target_key) {
            Some(own) => own.absorb(incoming),
            None => {
                self.regions.insert(target_key, incoming);
            }
        }
        true
    }
}

impl fmt::Display for OwnershipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "STATES = {{")?;
        for (region, ownership) in self.regions.iter() {
            writeln!(f, "    {} = {{", region)?;
            write!(f, "{}", ownership)?;
            writeln!(f, "    }}")?;
        }
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vic3txt::{DefaultVic3Txt, Vic3Txt};

    const SAMPLE: &str = r#"STATES = {
    s:STATE_A = {
        create_state = {
            country = "c:SWE"
            owned_provinces = { x000001 x000002 }
        }
        add_homeland = cu:swedish
    }
    s:STATE_B = {
        create_state = {
            country = "c:SWE"
            owned_provinces = { x000003 }
            state_type = incorporated
        }
        create_state = {
            country = "c:NOR"
            owned_provinces = x000004
            state_type = unincorporated
        }
        add_homeland = cu:swedish
        add_homeland = cu:sami
        add_claim = c:NOR
    }
}
"#;

    fn sample() -> OwnershipSet {
        OwnershipSet::from_tree(&DefaultVic3Txt::parse_str(SAMPLE).unwrap())
    }

    #[test]
    fn test_merge_by_country() {
        let mut states = sample();
        assert!(states.merge("STATE_A", "STATE_B"));
        let a = states.region("STATE_A").unwrap();
        assert_eq!(a.creates.len(), 2);
        assert_eq!(a.creates[0].owned_provinces.len(), 3);
        assert_eq!(a.creates[0].state_types.len(), 1);
        assert_eq!(a.owner_of("x000004").map(Scalar::text), Some("c:NOR"));
        assert_eq!(
            a.homelands.iter().map(Scalar::text).collect::<Vec<_>>(),
            vec!["cu:swedish", "cu:sami"]
        );
        // STATE_A had no claims; the source's are adopted.
        assert_eq!(a.claims.len(), 1);
        assert!(!states.contains("STATE_B"));
        assert!(!states.merge("STATE_A", "STATE_B"));
    }

    #[test]
    fn test_render() {
        let mut states = sample();
        states.merge("STATE_A", "STATE_B");
        let text = states.to_string();
        assert_eq!(
            text,
            "STATES = {\n    s:STATE_A = {\n        create_state = {\n            country = \"c:SWE\"\n            owned_provinces = { x000001 x000002 x000003 }\n            state_type = incorporated\n        }\n\n        create_state = {\n            country = \"c:NOR\"\n            owned_provinces = { x000004 }\n            state_type = unincorporated\n        }\n\n        add_homeland = cu:swedish\n        add_homeland = cu:sami\n        add_claim = c:NOR\n    }\n}\n"
        );
        let again = OwnershipSet::from_tree(&DefaultVic3Txt::parse_str(&text).unwrap());
        assert_eq!(again.region("STATE_A"), states.region("STATE_A"));
    }
}
