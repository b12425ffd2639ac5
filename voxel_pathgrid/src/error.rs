// Error types for configuration loading and path queries.
//
// Nothing in this crate is fatal: every `PathError` degrades to "no path"
// at the `Navigator::find_path` surface and the caller may retry after the
// next rebuild. A column without ground is not an error at all; the grid
// builder marks it unwalkable and moves on.

use crate::types::GridCoord;
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating a `GridConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed into a config.
    #[error("failed to parse grid config: {0}")]
    Json(#[from] serde_json::Error),

    /// A field holds a value the grid cannot be built from.
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Why a path query produced no path.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("start position does not resolve to a grid node")]
    StartOutsideGrid,

    #[error("target position does not resolve to a grid node")]
    TargetOutsideGrid,

    #[error("target node {target} is not walkable")]
    TargetUnwalkable { target: GridCoord },

    /// The open set emptied before reaching the target.
    #[error("no path exists (open set exhausted after {expanded} expansions)")]
    Exhausted { expanded: usize },

    /// The search gave up before the open set emptied.
    #[error("search exceeded max iterations ({max_iterations})")]
    IterationCapped { max_iterations: u32 },
}

impl PathError {
    /// True when a retry with a larger iteration budget might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PathError::IterationCapped { .. })
    }
}
