use serde::{Deserialize, Serialize};

/// Province count below which a region counts as "small".
pub const DEFAULT_SMALL_REGION_THRESHOLD: usize = 4;

/// Knobs for a merge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Small regions contribute nothing toward integration traits.
    pub ignore_small_regions: bool,
    /// Province count below which a region is small.
    pub small_region_threshold: usize,
    /// Write sea nodes back out with the land regions.
    pub include_sea_nodes: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            ignore_small_regions: false,
            small_region_threshold: DEFAULT_SMALL_REGION_THRESHOLD,
            include_sea_nodes: false,
        }
    }
}
