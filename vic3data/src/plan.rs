//! The merge plan: which source regions fold into which target.
//!
//! On disk this is a JSON object mapping a target region to the sources merged into
//! it, in order:
//!
//! ```json
//! { "STATE_SVEALAND": ["STATE_NORRLAND", "STATE_GOTALAND"] }
//! ```

use crate::error::PlanError;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use std::path::Path;

/// Region key as used by the history files: `STATE_X` becomes `s:STATE_X`.
pub fn scoped_key(name: &str) -> String {
    format!("s:{}", name)
}

/// Ordered `target -> [sources]` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    entries: Vec<(String, Vec<String>)>,
}

impl MergePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends sources to `target`, creating the entry if needed.
    pub fn add(&mut self, target: impl Into<String>, sources: impl IntoIterator<Item = String>) {
        let target = target.into();
        match self.entries.iter_mut().find(|(t, _)| *t == target) {
            Some((_, existing)) => existing.extend(sources),
            None => self.entries.push((target, sources.into_iter().collect())),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PlanError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn entries(&self) -> &[(String, Vec<String>)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, sources)| sources.is_empty())
    }

    /// Every `(target, source)` pair in plan order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(target, sources)| {
            sources.iter().map(move |source| (target.as_str(), source.as_str()))
        })
    }

    /// The target a region is merged into, if it is a source anywhere.
    pub fn target_of(&self, source: &str) -> Option<&str> {
        self.pairs().find(|(_, s)| *s == source).map(|(t, _)| t)
    }
}

impl<'de> Deserialize<'de> for MergePlan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PlanVisitor;

        impl<'de> Visitor<'de> for PlanVisitor {
            type Value = MergePlan;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from target region to a list of source regions")
            }

            fn visit_map<A>(self, mut map: A) -> Result<MergePlan, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut plan = MergePlan::new();
                while let Some((target, sources)) = map.next_entry::<String, Vec<String>>()? {
                    plan.add(target, sources);
                }
                Ok(plan)
            }
        }

        deserializer.deserialize_map(PlanVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_preserved() {
        let plan = MergePlan::from_json(
            r#"{ "STATE_Z": ["STATE_Y"], "STATE_A": ["STATE_C", "STATE_B"], "STATE_M": [] }"#,
        )
        .unwrap();
        assert_eq!(
            plan.pairs().collect::<Vec<_>>(),
            vec![("STATE_Z", "STATE_Y"), ("STATE_A", "STATE_C"), ("STATE_A", "STATE_B")]
        );
        assert_eq!(plan.entries().len(), 3);
        assert_eq!(plan.target_of("STATE_B"), Some("STATE_A"));
        assert_eq!(plan.target_of("STATE_A"), None);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            MergePlan::from_json(r#"{ "STATE_A": "STATE_B" }"#),
            Err(PlanError::Malformed(_))
        ));
        assert!(matches!(
            MergePlan::from_json(r#"["STATE_A"]"#),
            Err(PlanError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_lists() {
        let plan = MergePlan::from_json(r#"{ "STATE_A": [] }"#).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.pairs().count(), 0);
    }

    #[test]
    fn test_scoped_key() {
        assert_eq!(scoped_key("STATE_SVEALAND"), "s:STATE_SVEALAND");
    }
}
