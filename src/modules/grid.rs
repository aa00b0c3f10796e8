use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use rand::{Rng, RngCore};

use crate::modules::agent::AgentId;
use crate::modules::error::GridError;

/// A cell coordinate on the torus. Both axes lie in `0..size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    /// True when `other` is exactly one axis-aligned step away on a torus of `size`.
    pub fn is_adjacent(self, other: Position, size: usize) -> bool {
        let wrap = |a: usize, b: usize| {
            let d = a.abs_diff(b);
            d.min(size - d)
        };
        let dx = wrap(self.x, other.x);
        let dy = wrap(self.y, other.y);
        if size == 1 {
            // Every step on a single cell lands where it started.
            return self == other;
        }
        dx + dy == 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("position '{}' must be formatted as x, y", s))?;
        let x = x
            .trim()
            .parse::<usize>()
            .map_err(|_| "x must be a non-negative integer")?;
        let y = y
            .trim()
            .parse::<usize>()
            .map_err(|_| "y must be a non-negative integer")?;
        Ok(Position { x, y })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Draw order for random moves.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Heading for a signed offset. The larger axis wins and an exact tie
    /// goes to the vertical axis. A negative vertical offset maps to `Up`,
    /// which increments y.
    pub fn from_offset(dx: i128, dy: i128) -> Self {
        if dx.abs() > dy.abs() {
            if dx < 0 { Direction::Left } else { Direction::Right }
        } else if dy < 0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn apply(self, position: Position, size: usize) -> Position {
        let Position { x, y } = position;
        match self {
            Direction::Up => Position::new(x, (y + 1) % size),
            Direction::Down => Position::new(x, (y + size - 1) % size),
            Direction::Left => Position::new((x + size - 1) % size, y),
            Direction::Right => Position::new((x + 1) % size, y),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Movement {
    pub from: Position,
    pub to: Position,
    pub direction: Direction,
}

/// What an agent may ask of the world while acting.
pub trait Surroundings {
    fn locate(&self, agent: AgentId) -> Result<Position, GridError>;

    /// Other occupants of the agent's cell, in ascending id order.
    fn neighbors(&self, agent: AgentId) -> Result<Vec<AgentId>, GridError>;

    /// Step one cell; a missing direction is drawn uniformly from `rng`.
    fn move_agent(
        &mut self,
        agent: AgentId,
        direction: Option<Direction>,
        rng: &mut dyn RngCore,
    ) -> Result<Movement, GridError>;

    fn nearest_antagonist(
        &self,
        agent: AgentId,
        candidates: &[AgentId],
    ) -> Result<Option<(AgentId, Direction)>, GridError>;
}

/// Toroidal `size` x `size` lattice of agent sets. Only occupied cells are
/// stored; a cell is dropped when its last occupant leaves.
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    cells: BTreeMap<Position, BTreeSet<AgentId>>,
    locations: HashMap<AgentId, Position>,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: BTreeMap::new(),
            locations: HashMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn vacate(&mut self, agent: AgentId, position: Position) -> bool {
        let Some(cell) = self.cells.get_mut(&position) else {
            return false;
        };
        let removed = cell.remove(&agent);
        if cell.is_empty() {
            self.cells.remove(&position);
        }
        removed
    }

    pub fn place(&mut self, agent: AgentId, position: Position) -> Result<(), GridError> {
        if position.x >= self.size || position.y >= self.size {
            return Err(GridError::OutOfBounds {
                position,
                size: self.size,
            });
        }
        if let Some(existing) = self.locations.get(&agent) {
            return Err(GridError::AlreadyPlaced {
                agent,
                position: *existing,
            });
        }

        self.cells.entry(position).or_default().insert(agent);
        self.locations.insert(agent, position);
        Ok(())
    }

    pub fn occupants(&self, position: Position) -> impl Iterator<Item = AgentId> + '_ {
        self.cells
            .get(&position)
            .into_iter()
            .flat_map(|cell| cell.iter().copied())
    }

    /// Total number of agent entries across all cells.
    pub fn occupancy(&self) -> usize {
        self.cells.values().map(BTreeSet::len).sum()
    }

    /// Every cell of the lattice, x-major.
    pub fn places(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |x| (0..self.size).map(move |y| Position::new(x, y)))
    }

    /// Check that each of `expected` agents sits in exactly one cell and that
    /// the cell contents agree with the location index.
    pub fn audit(&self, expected: usize) -> Result<(), GridError> {
        let mut seen: HashMap<AgentId, Vec<Position>> = HashMap::new();
        for (position, cell) in &self.cells {
            if position.x >= self.size || position.y >= self.size {
                return Err(GridError::OutOfBounds {
                    position: *position,
                    size: self.size,
                });
            }
            for agent in cell {
                seen.entry(*agent).or_default().push(*position);
            }
        }

        for (agent, cells) in &seen {
            if cells.len() > 1 {
                return Err(GridError::Duplicated {
                    agent: *agent,
                    cells: cells.len(),
                });
            }
            let indexed = self.locations.get(agent).copied();
            if indexed != Some(cells[0]) {
                return Err(GridError::Misplaced {
                    agent: *agent,
                    indexed,
                    found: cells[0],
                });
            }
        }
        if let Some(agent) = (0..expected).find(|id| !seen.contains_key(id)) {
            return Err(GridError::NotPlaced(agent));
        }

        let found = self.occupancy();
        if found != expected {
            return Err(GridError::OccupancyMismatch { expected, found });
        }
        Ok(())
    }
}

impl Surroundings for Grid {
    fn locate(&self, agent: AgentId) -> Result<Position, GridError> {
        self.locations
            .get(&agent)
            .copied()
            .ok_or(GridError::NotPlaced(agent))
    }

    fn neighbors(&self, agent: AgentId) -> Result<Vec<AgentId>, GridError> {
        let position = self.locate(agent)?;
        Ok(self.occupants(position).filter(|id| *id != agent).collect())
    }

    fn move_agent(
        &mut self,
        agent: AgentId,
        direction: Option<Direction>,
        rng: &mut dyn RngCore,
    ) -> Result<Movement, GridError> {
        let from = self.locate(agent)?;
        let direction = match direction {
            Some(direction) => direction,
            None => Direction::random(rng),
        };
        let to = direction.apply(from, self.size);

        if !self.vacate(agent, from) {
            return Err(GridError::NotPlaced(agent));
        }
        self.cells.entry(to).or_default().insert(agent);
        self.locations.insert(agent, to);

        Ok(Movement {
            from,
            to,
            direction,
        })
    }

    fn nearest_antagonist(
        &self,
        agent: AgentId,
        candidates: &[AgentId],
    ) -> Result<Option<(AgentId, Direction)>, GridError> {
        let origin = self.locate(agent)?;
        let size = self.size as i128;
        let (x1, y1) = (origin.x as i128, origin.y as i128);

        // (squared distance, candidate, dx, dy); strict comparison keeps the
        // first candidate/image found at the minimum.
        let mut best: Option<(u128, AgentId, i128, i128)> = None;
        for &candidate in candidates {
            let target = self.locate(candidate)?;
            for y_shift in [-size, 0, size] {
                for x_shift in [-size, 0, size] {
                    let dx = target.x as i128 + x_shift - x1;
                    let dy = target.y as i128 + y_shift - y1;
                    let distance = squared(dx).saturating_add(squared(dy));
                    if best.is_none_or(|(current, ..)| distance < current) {
                        best = Some((distance, candidate, dx, dy));
                    }
                }
            }
        }

        Ok(best.map(|(_, candidate, dx, dy)| (candidate, Direction::from_offset(dx, dy))))
    }
}

fn squared(d: i128) -> u128 {
    let d = d.unsigned_abs();
    d.saturating_mul(d)
}
