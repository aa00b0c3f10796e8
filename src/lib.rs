pub mod modules;

pub use modules::agent::{Agent, AgentId, Behavior, Outcome, TurnContext, agent_name};
pub use modules::config::{
    DEFAULT_AGENT_COUNT, DEFAULT_GRID_SIZE, DEFAULT_ITERATIONS, SimulationConfig, WorldParams,
    seed_from_clock,
};
pub use modules::conflict::{Conflict, ConflictSet};
pub use modules::error::{ConfigError, GridError, SimError};
pub use modules::event::{Event, EventAction, EventLog, EventRecord, EventView};
pub use modules::grid::{Direction, Grid, Movement, Position, Surroundings};
pub use modules::skeleton::{Skeleton, SkeletonMeta, load_skeleton, save_skeleton};
pub use modules::stats::{ActionStats, ActionStatsStore, CharacterStats, record_events};
pub use modules::world::{RunSummary, TurnResult, World};
