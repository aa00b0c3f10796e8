use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::modules::agent::{Agent, AgentId, TurnContext};
use crate::modules::config::WorldParams;
use crate::modules::error::SimError;
use crate::modules::event::{Event, EventLog};
use crate::modules::grid::{Grid, Position};
use crate::modules::skeleton::{Skeleton, SkeletonMeta};

/// Events produced by one pass over the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    pub turn: u64,
    pub order: Vec<AgentId>,
    pub events: Vec<Arc<Event>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub turns_completed: u64,
    pub events: usize,
    pub cancelled: bool,
}

/// Owns the grid, the roster, the global log and the run's only PRNG.
#[derive(Debug)]
pub struct World {
    params: WorldParams,
    rng: StdRng,
    grid: Grid,
    agents: Vec<Agent>,
    roster: Vec<String>,
    log: EventLog,
    turn: u64,
    next_event_id: u64,
    run_at: Option<DateTime<Utc>>,
}

impl World {
    /// Lay out the grid and drop every agent on a uniformly random cell.
    pub fn build(params: WorldParams) -> Result<Self, SimError> {
        let size = params.grid_size();
        let mut rng = StdRng::seed_from_u64(params.seed());
        let mut grid = Grid::new(size);
        let mut agents = Vec::with_capacity(params.agent_count());

        for id in 0..params.agent_count() {
            let x = rng.gen_range(0..size);
            let y = rng.gen_range(0..size);
            grid.place(id, Position::new(x, y))?;
            agents.push(Agent::new(id));
        }
        let roster = agents.iter().map(|a| a.name().to_string()).collect();

        info!(
            seed = params.seed(),
            grid_size = size,
            agents = params.agent_count(),
            iterations = params.iterations(),
            "world built"
        );

        Ok(Self {
            params,
            rng,
            grid,
            agents,
            roster,
            log: EventLog::new(),
            turn: 0,
            next_event_id: 0,
            run_at: None,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// The global log.
    pub fn events(&self) -> &EventLog {
        &self.log
    }

    /// Turns completed so far.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn is_finished(&self) -> bool {
        self.turn >= self.params.iterations()
    }

    /// Run one turn. Returns `None` once every iteration has been played.
    pub fn step(&mut self) -> Result<Option<TurnResult>, SimError> {
        if self.is_finished() {
            return Ok(None);
        }
        self.run_at.get_or_insert_with(Utc::now);

        let t = self.turn;
        let mut order: Vec<AgentId> = (0..self.agents.len()).collect();
        order.shuffle(&mut self.rng);

        let mut events = Vec::with_capacity(order.len());
        for &id in &order {
            let mut ctx = TurnContext {
                t,
                event_id: self.next_event_id,
                rng: &mut self.rng,
                roster: &self.roster,
            };
            let actor = self.agents.get_mut(id).ok_or(SimError::UnknownAgent(id))?;
            let outcome = actor.play(&mut self.grid, &mut ctx)?;
            self.next_event_id += 1;

            let event = Arc::new(outcome.event);
            trace!(
                turn = t,
                event_id = event.id,
                agent = %self.roster[id],
                action = %event.action,
                "agent acted"
            );

            actor.record(Arc::clone(&event));
            if let Some(witness) = outcome.witness {
                self.agents
                    .get_mut(witness)
                    .ok_or(SimError::UnknownAgent(witness))?
                    .record(Arc::clone(&event));
            }
            self.log.append(Arc::clone(&event));
            events.push(event);
        }

        self.grid.audit(self.agents.len())?;
        self.turn += 1;
        debug!(turn = t, events = events.len(), "turn complete");

        Ok(Some(TurnResult {
            turn: t,
            order,
            events,
        }))
    }

    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        self.run_with(|_| true)
    }

    /// Play the remaining turns, asking `keep_going` before each one.
    /// A turn, once started, always completes.
    pub fn run_with(
        &mut self,
        mut keep_going: impl FnMut(u64) -> bool,
    ) -> Result<RunSummary, SimError> {
        self.run_at.get_or_insert_with(Utc::now);
        info!(
            from_turn = self.turn,
            iterations = self.params.iterations(),
            "run started"
        );

        let start = self.turn;
        let mut cancelled = false;
        while !self.is_finished() {
            if !keep_going(self.turn) {
                cancelled = true;
                info!(turn = self.turn, "run cancelled between turns");
                break;
            }
            self.step()?;
        }

        let summary = RunSummary {
            turns_completed: self.turn - start,
            events: self.log.len(),
            cancelled,
        };
        info!(
            turns = summary.turns_completed,
            events = summary.events,
            "run finished"
        );
        Ok(summary)
    }

    /// Export the timeline. Only available once a run has started.
    pub fn skeleton(&self, show_labels: bool) -> Result<Skeleton, SimError> {
        let run_at = self.run_at.ok_or(SimError::NotRun)?;
        let owned = |log: &EventLog| log.iter().cloned().collect::<Vec<Event>>();

        Ok(Skeleton {
            meta: SkeletonMeta {
                seed: self.params.seed(),
                grid_size: self.params.grid_size(),
                character_size: self.params.agent_count(),
                iterations: self.params.iterations(),
                run_at: run_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                show_labels,
            },
            characters: self.roster.clone(),
            global: owned(&self.log),
            backstories: self
                .agents
                .iter()
                .map(|a| (a.name().to_string(), owned(a.backstory())))
                .collect(),
        })
    }
}
