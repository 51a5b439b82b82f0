pub mod buildings;
pub mod canonical;
pub mod config;
pub mod engine;
pub mod error;
pub mod keyed;
pub mod loader;
pub mod localisation;
pub mod path;
pub mod plan;
pub mod pops;
pub mod rewrite;
pub mod state_regions;
pub mod states;
pub mod trade;

pub use config::MergeOptions;
pub use engine::{GameData, MergeReport, Notice, NoticeKind};
pub use error::{LoadError, MergeError, PlanError};
pub use keyed::KeyedMap;
pub use plan::{MergePlan, scoped_key};
