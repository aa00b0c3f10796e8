use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::modules::event::{Event, EventAction};
use crate::modules::skeleton::Skeleton;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
    pub noop_count: u64,
    pub move_count: u64,
    pub confront_count: u64,
    pub chase_count: u64,
    pub resolve_count: u64,
    /// Places seen on either end of a movement.
    pub places_visited: BTreeSet<String>,
}

impl ActionStats {
    pub fn record(&mut self, event: &Event) {
        match event.action {
            EventAction::Noop => self.noop_count = self.noop_count.saturating_add(1),
            EventAction::Move => self.move_count = self.move_count.saturating_add(1),
            EventAction::Confront => self.confront_count = self.confront_count.saturating_add(1),
            EventAction::ChaseResolution => self.chase_count = self.chase_count.saturating_add(1),
            EventAction::Resolve => self.resolve_count = self.resolve_count.saturating_add(1),
        }
        if event.action.is_movement() {
            self.places_visited.extend(event.places.iter().cloned());
        }
    }

    pub fn total(&self) -> u64 {
        self.noop_count
            .saturating_add(self.move_count)
            .saturating_add(self.confront_count)
            .saturating_add(self.chase_count)
            .saturating_add(self.resolve_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub name: String,
    pub stats: ActionStats,
}

/// Tallies of actions each character instigated, in roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStatsStore {
    pub per_character: Vec<CharacterStats>,
    pub story_arcs: u64,
}

impl ActionStatsStore {
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        let mut store = Self {
            per_character: skeleton
                .characters
                .iter()
                .map(|name| CharacterStats {
                    name: name.clone(),
                    stats: ActionStats::default(),
                })
                .collect(),
            story_arcs: 0,
        };
        record_events(&mut store, &skeleton.global);
        store
    }

    pub fn get(&self, name: &str) -> Option<&ActionStats> {
        self.per_character
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.stats)
    }
}

/// Count each event against its protagonist. Events naming a character the
/// store does not know are skipped.
pub fn record_events<'a>(store: &mut ActionStatsStore, events: impl IntoIterator<Item = &'a Event>) {
    for event in events {
        if event.action == EventAction::Confront && event.is_story_arc {
            store.story_arcs = store.story_arcs.saturating_add(1);
        }
        let Some(name) = event.protagonist() else {
            continue;
        };
        if let Some(entry) = store.per_character.iter_mut().find(|c| c.name == name) {
            entry.stats.record(event);
        }
    }
}
