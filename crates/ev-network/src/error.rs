//! Network-subsystem error type.

use thiserror::Error;

use ev_core::{CoreError, NodeId, TransportMode};

/// Errors produced by `ev-network`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("no {mode} route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId, mode: TransportMode },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error(transparent)]
    Cost(#[from] CoreError),
}

pub type SearchResult<T> = Result<T, SearchError>;
