//! Error taxonomy for engine operations.
//!
//! Every error is local and synchronous. The engine never retries on its own;
//! callers decide whether to submit more samples, wait, or force completion.

use thiserror::Error;

use crate::core::enforcement::EnforcementStatus;

/// Kind of entity a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Run,
    Node,
}

impl EntityKind {
    fn as_str(self) -> &'static str {
        match self {
            EntityKind::Run => "run",
            EntityKind::Node => "node",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed mode, level, prompt, override or candidate estimate.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// Completion was requested before the exploration requirement was met.
    #[error(
        "enforcement requirements not met: {}/{} nodes created",
        .0.nodes_created,
        .0.min_required
    )]
    EnforcementNotMet(Box<EnforcementStatus>),

    /// The root was never expanded, so there is no path to select.
    #[error("tree is empty: no candidates have been submitted")]
    EmptyTree,
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidArgument(message.into())
    }

    pub(crate) fn run_not_found(id: &str) -> Self {
        EngineError::NotFound {
            kind: EntityKind::Run,
            id: id.to_string(),
        }
    }

    pub(crate) fn node_not_found(id: &str) -> Self {
        EngineError::NotFound {
            kind: EntityKind::Node,
            id: id.to_string(),
        }
    }
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
