//! Drives a merge plan across all five data domains.

use crate::buildings::BuildingSet;
use crate::config::MergeOptions;
use crate::error::{MergeError, PlanError};
use crate::plan::MergePlan;
use crate::pops::PopulationSet;
use crate::state_regions::RegionMap;
use crate::states::OwnershipSet;
use crate::trade::TradeSet;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use vic3txt::Tree;

/// Why a pair was skipped or only partly applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    /// One side is a sea node. Nothing was merged.
    SeaNode,
    /// Source and target are the same region. Nothing was merged.
    SameRegion,
    /// The target was itself merged away earlier in the run. Nothing was merged.
    TargetGone,
    /// The source was already merged into another target. Nothing was merged.
    SourceGone,
    /// The source has no state region; only history records were merged.
    SourceNotInMap,
}

impl From<&MergeError> for NoticeKind {
    fn from(err: &MergeError) -> Self {
        match err {
            MergeError::SeaNode(_) => NoticeKind::SeaNode,
            MergeError::SameRegion(_) => NoticeKind::SameRegion,
            MergeError::TargetMissing(_) => NoticeKind::TargetGone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub target: String,
    pub source: String,
    pub kind: NoticeKind,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            NoticeKind::SeaNode => "sea node, skipped",
            NoticeKind::SameRegion => "same region, skipped",
            NoticeKind::TargetGone => "target already merged away, skipped",
            NoticeKind::SourceGone => "source already merged away, skipped",
            NoticeKind::SourceNotInMap => "source has no state region",
        };
        write!(f, "{} <- {}: {}", self.target, self.source, what)
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Pairs that were applied.
    pub merged: usize,
    /// Building shares repointed at a target region.
    pub retargeted_shares: usize,
    pub notices: Vec<Notice>,
}

/// The five domain collections of one game install.
#[derive(Debug, Clone, Default)]
pub struct GameData {
    pub regions: RegionMap,
    pub buildings: BuildingSet,
    pub pops: PopulationSet,
    pub states: OwnershipSet,
    pub trade: TradeSet,
}

fn notice(target: &str, source: &str, kind: NoticeKind) -> Notice {
    Notice {
        target: target.to_string(),
        source: source.to_string(),
        kind,
    }
}

impl GameData {
    /// Builds every collection from already parsed domain trees.
    pub fn from_trees(
        regions: &Tree,
        buildings: &Tree,
        pops: &Tree,
        states: &Tree,
        trade: &Tree,
    ) -> Self {
        Self {
            regions: RegionMap::from_tree(regions),
            buildings: BuildingSet::from_tree(buildings),
            pops: PopulationSet::from_tree(pops),
            states: OwnershipSet::from_tree(states),
            trade: TradeSet::from_tree(trade),
        }
    }

    /// Checks a plan against the current region map without changing anything.
    ///
    /// Returns the pairs that will be applied, plus notices for the ones that will not.
    /// Pairs are walked in plan order with earlier absorptions taken into account, so
    /// a region merged away cannot be a target or a source again.
    /// A target that is not a state region at all is fatal.
    pub fn validate(
        &self,
        plan: &MergePlan,
    ) -> Result<(Vec<(String, String)>, Vec<Notice>), PlanError> {
        let mut accepted = Vec::new();
        let mut notices = Vec::new();
        let mut absorbed: HashSet<&str> = HashSet::new();
        for (target, sources) in plan.entries() {
            if sources.is_empty() {
                continue;
            }
            if absorbed.contains(target.as_str()) {
                for source in sources {
                    log::warn!("Skipping {} <- {}: target already merged away", target, source);
                    notices.push(notice(target, source, NoticeKind::TargetGone));
                }
                continue;
            }
            if !self.regions.contains(target) {
                return Err(PlanError::UnknownTarget(target.clone()));
            }
            for source in sources {
                if absorbed.contains(source.as_str()) {
                    log::warn!("Skipping {} <- {}: source already merged away", target, source);
                    notices.push(notice(target, source, NoticeKind::SourceGone));
                    continue;
                }
                match self.regions.check_merge(target, source) {
                    Ok(in_map) => {
                        if !in_map {
                            log::warn!("{} has no state region; merging history only", source);
                            notices.push(notice(target, source, NoticeKind::SourceNotInMap));
                        }
                        absorbed.insert(source.as_str());
                        accepted.push((target.clone(), source.clone()));
                    }
                    Err(MergeError::TargetMissing(name)) => {
                        return Err(PlanError::UnknownTarget(name));
                    }
                    Err(e) => {
                        log::warn!("Skipping {} <- {}: {}", target, source, e);
                        notices.push(notice(target, source, NoticeKind::from(&e)));
                    }
                }
            }
        }
        Ok((accepted, notices))
    }

    /// Applies `plan` to every domain.
    ///
    /// Pairs run in plan order; later pairs see the result of earlier ones.
    pub fn apply(
        &mut self,
        plan: &MergePlan,
        options: &MergeOptions,
    ) -> Result<MergeReport, PlanError> {
        let (accepted, notices) = self.validate(plan)?;
        let mut report = MergeReport {
            notices,
            ..MergeReport::default()
        };

        log::info!("Retargeting building ownership");
        report.retargeted_shares = self.buildings.retarget_shares(&accepted);

        log::info!("Merging {} region pairs", accepted.len());
        for (target, source) in &accepted {
            match self.regions.merge(target, source, options) {
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Skipping {} <- {}: {}", target, source, e);
                    report
                        .notices
                        .push(notice(target, source, NoticeKind::from(&e)));
                    continue;
                }
            }
            let buildings = self.buildings.merge(target, source);
            let pops = self.pops.merge(target, source);
            let states = self.states.merge(target, source);
            let trade = self.trade.merge(target, source);
            log::debug!(
                "Merged {} into {} (buildings: {}, pops: {}, states: {}, trade: {})",
                source,
                target,
                buildings,
                pops,
                states,
                trade
            );
            report.merged += 1;
        }
        self.buildings.prune();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vic3txt::{DefaultVic3Txt, Vic3Txt};

    fn parse(src: &str) -> Tree {
        DefaultVic3Txt::parse_str(src).unwrap()
    }

    fn data() -> GameData {
        GameData::from_trees(
            &parse(
                r#"
STATE_A = { id = 1 subsistence_building = farms provinces = { x1 x2 } arable_land = 1 }
STATE_B = { id = 2 subsistence_building = farms provinces = { x3 } arable_land = 1 }
STATE_C = { id = 3 subsistence_building = farms provinces = { x4 } arable_land = 1 }
SEA = { id = 4 provinces = { x5 } }
"#,
            ),
            &parse("BUILDINGS = { s:STATE_B = { TAG = { create_building = { building = b_x add_ownership = { country = { country = c:TAG levels = 1 } } } } } }"),
            &parse("POPS = { s:STATE_C = { TAG = { create_pop = { culture = x size = 10 } } } }"),
            &parse("STATES = { s:STATE_A = { create_state = { country = c:TAG owned_provinces = { x1 } } } }"),
            &parse("TRADE = { }"),
        )
    }

    #[test]
    fn test_unknown_target_is_fatal() {
        let mut data = data();
        let plan = MergePlan::from_json(r#"{ "STATE_NOPE": ["STATE_B"] }"#).unwrap();
        assert!(matches!(
            data.apply(&plan, &MergeOptions::default()),
            Err(PlanError::UnknownTarget(t)) if t == "STATE_NOPE"
        ));
        assert!(data.regions.contains("STATE_B"));
    }

    #[test]
    fn test_sea_and_self_pairs_skipped() {
        let mut data = data();
        let plan = MergePlan::from_json(
            r#"{ "STATE_A": ["SEA", "STATE_A", "STATE_B"], "STATE_C": [] }"#,
        )
        .unwrap();
        let report = data.apply(&plan, &MergeOptions::default()).unwrap();
        assert_eq!(report.merged, 1);
        let kinds: Vec<_> = report.notices.iter().map(|n| n.kind.clone()).collect();
        assert_eq!(kinds, vec![NoticeKind::SeaNode, NoticeKind::SameRegion]);
        assert!(data.regions.contains("SEA"));
        assert!(!data.regions.contains("STATE_B"));
        assert!(data.buildings.contains("STATE_A"));
    }

    #[test]
    fn test_chained_target_gone() {
        let mut data = data();
        let plan =
            MergePlan::from_json(r#"{ "STATE_A": ["STATE_B"], "STATE_B": ["STATE_C"] }"#).unwrap();
        let report = data.apply(&plan, &MergeOptions::default()).unwrap();
        assert_eq!(report.merged, 1);
        assert_eq!(report.notices[0].kind, NoticeKind::TargetGone);
        assert!(data.regions.contains("STATE_C"));
        assert!(data.pops.contains("STATE_C"));
    }

    #[test]
    fn test_chained_target_keeps_share_region() {
        let mut data = data();
        data.buildings = BuildingSet::from_tree(&parse(
            r#"BUILDINGS = { s:STATE_A = { region_state:TAG = { create_building = { building = b_x add_ownership = { building = { type = building_manor_house country = c:TAG levels = 2 region = "STATE_C" } } } } } }"#,
        ));
        let plan =
            MergePlan::from_json(r#"{ "STATE_A": ["STATE_B"], "STATE_B": ["STATE_C"] }"#).unwrap();
        let (accepted, _) = data.validate(&plan).unwrap();
        assert_eq!(accepted, vec![("STATE_A".to_string(), "STATE_B".to_string())]);

        let report = data.apply(&plan, &MergeOptions::default()).unwrap();
        assert_eq!(report.retargeted_shares, 0);
        assert!(data.regions.contains("STATE_C"));
        let text = data.buildings.to_string();
        assert!(text.contains(r#"region = "STATE_C""#), "{}", text);
        assert!(!text.contains(r#"region = "STATE_B""#), "{}", text);
    }

    #[test]
    fn test_chain_into_surviving_target() {
        let mut data = data();
        data.buildings = BuildingSet::from_tree(&parse(
            r#"BUILDINGS = { s:STATE_A = { region_state:TAG = { create_building = { building = b_x add_ownership = { building = { type = building_manor_house country = c:TAG levels = 2 region = "STATE_C" } } } } } }"#,
        ));
        let plan =
            MergePlan::from_json(r#"{ "STATE_B": ["STATE_C"], "STATE_A": ["STATE_B"] }"#).unwrap();
        let report = data.apply(&plan, &MergeOptions::default()).unwrap();
        assert_eq!(report.merged, 2);
        assert_eq!(report.retargeted_shares, 1);
        assert!(!data.regions.contains("STATE_B"));
        assert!(!data.regions.contains("STATE_C"));
        let text = data.buildings.to_string();
        assert!(text.contains(r#"region = "STATE_A""#), "{}", text);
    }

    #[test]
    fn test_source_claimed_twice() {
        let mut data = data();
        let plan =
            MergePlan::from_json(r#"{ "STATE_A": ["STATE_B"], "STATE_C": ["STATE_B"] }"#).unwrap();
        let report = data.apply(&plan, &MergeOptions::default()).unwrap();
        assert_eq!(report.merged, 1);
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].kind, NoticeKind::SourceGone);
        assert!(data.regions.contains("STATE_C"));
    }

    #[test]
    fn test_source_only_in_history() {
        let mut data = data();
        data.pops = PopulationSet::from_tree(&parse(
            "POPS = { s:STATE_OLD = { TAG = { create_pop = { culture = x size = 3 } } } }",
        ));
        let plan = MergePlan::from_json(r#"{ "STATE_A": ["STATE_OLD"] }"#).unwrap();
        let report = data.apply(&plan, &MergeOptions::default()).unwrap();
        assert_eq!(report.notices[0].kind, NoticeKind::SourceNotInMap);
        assert_eq!(data.pops.total("STATE_A"), 3);
    }
}
