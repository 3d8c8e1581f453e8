//! Error types for graph-mcmc.

use thiserror::Error;

/// Top-level error type for graph sampling operations.
#[derive(Debug, Error)]
pub enum GraphMcmcError {
    /// Two vertices with a different number of coordinates were compared.
    #[error("dimension mismatch: {left} vs {right} coordinates")]
    DimensionMismatch { left: usize, right: usize },

    /// An operation that requires a connected graph was given a disconnected one.
    #[error("invalid graph state: {0}")]
    InvalidState(String),

    /// An edge addition was proposed on a complete graph.
    #[error("cannot add an edge: the graph is complete")]
    SaturatedGraph,

    /// An edge removal was proposed on a spanning tree.
    #[error("cannot remove an edge: every edge is a bridge")]
    NoRemovableEdge,

    /// Malformed vertex or edge input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A sampler parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Progress bar template error.
    #[error("progress bar error: {0}")]
    Progress(#[from] indicatif::style::TemplateError),
}

/// Result type for graph sampling operations.
pub type Result<T> = std::result::Result<T, GraphMcmcError>;
