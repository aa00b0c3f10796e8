use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};

use crate::modules::conflict::{Conflict, ConflictSet};
use crate::modules::error::SimError;
use crate::modules::event::{Event, EventAction, EventLog};
use crate::modules::grid::Surroundings;

/// Roster index of an agent. Fixed for the lifetime of a world.
pub type AgentId = usize;

pub fn agent_name(id: AgentId) -> String {
    format!("c{}", id)
}

/// The four things an agent may try on its turn, drawn uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Behavior {
    Idle,
    Wander,
    ResolveOrChase,
    ConfrontOrWander,
}

impl Behavior {
    pub const ALL: [Behavior; 4] = [
        Behavior::Idle,
        Behavior::Wander,
        Behavior::ResolveOrChase,
        Behavior::ConfrontOrWander,
    ];

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Behavior::Idle => "idle",
            Behavior::Wander => "wander",
            Behavior::ResolveOrChase => "resolve_or_chase",
            Behavior::ConfrontOrWander => "confront_or_wander",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-action inputs handed down by the world.
pub struct TurnContext<'a> {
    pub t: u64,
    pub event_id: u64,
    pub rng: &'a mut dyn RngCore,
    /// Names indexed by [`AgentId`].
    pub roster: &'a [String],
}

impl TurnContext<'_> {
    fn name_of(&self, id: AgentId) -> Result<&str, SimError> {
        self.roster
            .get(id)
            .map(String::as_str)
            .ok_or(SimError::UnknownAgent(id))
    }
}

/// The event an action produced and, if any, the other agent who must also
/// record it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub event: Event,
    pub witness: Option<AgentId>,
}

impl Outcome {
    fn solo(event: Event) -> Self {
        Self {
            event,
            witness: None,
        }
    }

    fn shared(event: Event, witness: AgentId) -> Self {
        Self {
            event,
            witness: Some(witness),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    name: String,
    conflicts: ConflictSet,
    backstory: EventLog,
}

impl Agent {
    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            name: agent_name(id),
            conflicts: ConflictSet::new(),
            backstory: EventLog::new(),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conflicts(&self) -> &ConflictSet {
        &self.conflicts
    }

    pub fn backstory(&self) -> &EventLog {
        &self.backstory
    }

    pub(crate) fn record(&mut self, event: Arc<Event>) {
        self.backstory.append(event);
    }

    /// Draw a behavior and carry it out.
    pub fn play<S: Surroundings + ?Sized>(
        &mut self,
        world: &mut S,
        turn: &mut TurnContext<'_>,
    ) -> Result<Outcome, SimError> {
        let behavior = Behavior::draw(&mut *turn.rng);
        self.perform(behavior, world, turn)
    }

    pub fn perform<S: Surroundings + ?Sized>(
        &mut self,
        behavior: Behavior,
        world: &mut S,
        turn: &mut TurnContext<'_>,
    ) -> Result<Outcome, SimError> {
        match behavior {
            Behavior::Idle => Ok(self.idle(turn)),
            Behavior::Wander => self.wander(world, turn),
            Behavior::ResolveOrChase => self.resolve_or_chase(world, turn),
            Behavior::ConfrontOrWander => self.confront_or_wander(world, turn),
        }
    }

    fn idle(&self, turn: &TurnContext<'_>) -> Outcome {
        Outcome::solo(Event::new(
            turn.t,
            turn.event_id,
            EventAction::Noop,
            &self.name,
        ))
    }

    fn wander<S: Surroundings + ?Sized>(
        &mut self,
        world: &mut S,
        turn: &mut TurnContext<'_>,
    ) -> Result<Outcome, SimError> {
        let movement = world.move_agent(self.id, None, &mut *turn.rng)?;
        let event =
            Event::new(turn.t, turn.event_id, EventAction::Move, &self.name).across(movement);
        Ok(Outcome::solo(event))
    }

    fn resolve_or_chase<S: Surroundings + ?Sized>(
        &mut self,
        world: &mut S,
        turn: &mut TurnContext<'_>,
    ) -> Result<Outcome, SimError> {
        if self.conflicts.is_empty() {
            return Ok(self.idle(turn));
        }

        let around = world.neighbors(self.id)?;
        let reachable = self
            .conflicts
            .iter()
            .find(|c| around.contains(&c.antagonist))
            .copied();
        if let Some(conflict) = reachable {
            self.conflicts.close(conflict.antagonist);
            let event = Event::new(turn.t, turn.event_id, EventAction::Resolve, &self.name)
                .story_arc(conflict.is_story_arc)
                .against(turn.name_of(conflict.antagonist)?);
            return Ok(Outcome::shared(event, conflict.antagonist));
        }

        let Some((target, direction)) =
            world.nearest_antagonist(self.id, self.conflicts.antagonists())?
        else {
            return Ok(self.idle(turn));
        };
        let movement = world.move_agent(self.id, Some(direction), &mut *turn.rng)?;
        let is_story_arc = self
            .conflicts
            .get(target)
            .is_some_and(|c| c.is_story_arc);

        let event = Event::new(
            turn.t,
            turn.event_id,
            EventAction::ChaseResolution,
            &self.name,
        )
        .story_arc(is_story_arc)
        .against(turn.name_of(target)?)
        .across(movement);
        Ok(Outcome::shared(event, target))
    }

    fn confront_or_wander<S: Surroundings + ?Sized>(
        &mut self,
        world: &mut S,
        turn: &mut TurnContext<'_>,
    ) -> Result<Outcome, SimError> {
        let candidates: Vec<AgentId> = world
            .neighbors(self.id)?
            .into_iter()
            .filter(|id| !self.conflicts.contains(*id))
            .collect();
        if candidates.is_empty() {
            return self.wander(world, turn);
        }

        let antagonist = candidates[turn.rng.gen_range(0..candidates.len())];
        // Only one story arc may be open at a time.
        let is_story_arc = if self.conflicts.has_story_arc() {
            false
        } else {
            turn.rng.gen_bool(0.5)
        };
        let event = Event::new(turn.t, turn.event_id, EventAction::Confront, &self.name)
            .story_arc(is_story_arc)
            .against(turn.name_of(antagonist)?);
        self.open_conflict(Conflict {
            antagonist,
            is_story_arc,
        })?;
        Ok(Outcome::shared(event, antagonist))
    }

    fn open_conflict(&mut self, conflict: Conflict) -> Result<(), SimError> {
        if self.conflicts.open(conflict) {
            Ok(())
        } else {
            Err(SimError::ConflictRejected {
                agent: self.id,
                antagonist: conflict.antagonist,
            })
        }
    }
}
