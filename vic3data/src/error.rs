//! Error types for loading, planning, and merging.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A single (target, source) merge that could not be carried out.
///
/// These are reported and skipped; the rest of the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("cannot merge sea node {0}")]
    SeaNode(String),
    #[error("cannot merge {0} into itself")]
    SameRegion(String),
    #[error("target region {0} not found")]
    TargetMissing(String),
}

/// Problems with the merge plan itself. These abort the run.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed merge plan: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Target region {0} is not defined in the region map")]
    UnknownTarget(String),
}

/// Failures reading game files.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Directory not found: {0:?}")]
    Missing(PathBuf),
    #[error("Invalid region pattern: {0}")]
    Pattern(#[from] regex::Error),
}
