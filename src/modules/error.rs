use std::io;
use std::path::PathBuf;

use crate::modules::agent::AgentId;
use crate::modules::grid::Position;

/// Rejected simulation parameters. Always raised before the first turn.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("grid size must be positive, got {0}")]
    GridSize(i64),

    #[error("agent count must be positive, got {0}")]
    AgentCount(i64),

    #[error("iterations must be non-negative, got {0}")]
    Iterations(i64),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Grid bookkeeping went out of sync with the roster.
///
/// None of these occur while agents only move through [`Grid`](crate::Grid)
/// operations; seeing one means the occupancy contract was bypassed and the
/// run cannot continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("agent {0} is not on the grid")]
    NotPlaced(AgentId),

    #[error("agent {agent} occupies {cells} cells")]
    Duplicated { agent: AgentId, cells: usize },

    #[error("agent {agent} is already placed at ({position})")]
    AlreadyPlaced { agent: AgentId, position: Position },

    #[error("position ({position}) lies outside a {size}x{size} grid")]
    OutOfBounds { position: Position, size: usize },

    #[error("agent {agent} found at ({found}) but indexed at {indexed:?}")]
    Misplaced {
        agent: AgentId,
        indexed: Option<Position>,
        found: Position,
    },

    #[error("grid holds {found} occupants, expected {expected}")]
    OccupancyMismatch { expected: usize, found: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invariant violation: {0}")]
    Invariant(#[from] GridError),

    #[error("agent {0} is not in the roster")]
    UnknownAgent(AgentId),

    #[error("agent {agent} cannot open another conflict against {antagonist}")]
    ConflictRejected { agent: AgentId, antagonist: AgentId },

    #[error("the world has not been run yet")]
    NotRun,
}
