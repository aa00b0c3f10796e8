use std::collections::HashMap;

use crate::modules::agent::AgentId;

/// An open grievance held by the instigator against `antagonist`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub antagonist: AgentId,
    pub is_story_arc: bool,
}

/// Open conflicts keyed by antagonist, iterated in creation order.
#[derive(Debug, Clone, Default)]
pub struct ConflictSet {
    by_antagonist: HashMap<AgentId, Conflict>,
    order: Vec<AgentId>,
}

impl ConflictSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, antagonist: AgentId) -> bool {
        self.by_antagonist.contains_key(&antagonist)
    }

    pub fn get(&self, antagonist: AgentId) -> Option<&Conflict> {
        self.by_antagonist.get(&antagonist)
    }

    pub fn has_story_arc(&self) -> bool {
        self.by_antagonist.values().any(|c| c.is_story_arc)
    }

    /// Opens a conflict. Returns `false` and leaves the set untouched if one
    /// against the same antagonist is already open, or if it would be a
    /// second story arc.
    pub fn open(&mut self, conflict: Conflict) -> bool {
        if self.contains(conflict.antagonist) {
            return false;
        }
        if conflict.is_story_arc && self.has_story_arc() {
            return false;
        }
        self.by_antagonist.insert(conflict.antagonist, conflict);
        self.order.push(conflict.antagonist);
        true
    }

    pub fn close(&mut self, antagonist: AgentId) -> Option<Conflict> {
        let conflict = self.by_antagonist.remove(&antagonist)?;
        self.order.retain(|id| *id != antagonist);
        Some(conflict)
    }

    pub fn antagonists(&self) -> &[AgentId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conflict> + '_ {
        self.order.iter().filter_map(|id| self.by_antagonist.get(id))
    }
}
