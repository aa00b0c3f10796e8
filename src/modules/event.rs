use std::fmt;
use std::sync::Arc;

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::modules::grid::Movement;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Noop,
    Move,
    Confront,
    ChaseResolution,
    Resolve,
}

impl EventAction {
    pub const fn label(self) -> &'static str {
        match self {
            EventAction::Noop => "noop",
            EventAction::Move => "move",
            EventAction::Confront => "confront",
            EventAction::ChaseResolution => "chase_resolution",
            EventAction::Resolve => "resolve",
        }
    }

    /// Actions that carry before/after places.
    pub const fn is_movement(self) -> bool {
        matches!(self, EventAction::Move | EventAction::ChaseResolution)
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the timeline. Field order is the positional layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub t: u64,
    pub id: u64,
    pub is_story_arc: bool,
    pub action: EventAction,
    pub protagonists: Vec<String>,
    pub antagonists: Vec<String>,
    pub direct_complements: Vec<String>,
    pub indirect_complements: Vec<String>,
    pub places: Vec<String>,
}

impl Event {
    pub fn new(t: u64, id: u64, action: EventAction, protagonist: impl Into<String>) -> Self {
        Self {
            t,
            id,
            is_story_arc: false,
            action,
            protagonists: vec![protagonist.into()],
            antagonists: Vec::new(),
            direct_complements: Vec::new(),
            indirect_complements: Vec::new(),
            places: Vec::new(),
        }
    }

    pub fn story_arc(mut self, is_story_arc: bool) -> Self {
        self.is_story_arc = is_story_arc;
        self
    }

    pub fn against(mut self, antagonist: impl Into<String>) -> Self {
        self.antagonists = vec![antagonist.into()];
        self
    }

    pub fn across(mut self, movement: Movement) -> Self {
        self.places = vec![movement.from.to_string(), movement.to.to_string()];
        self
    }

    pub fn protagonist(&self) -> Option<&str> {
        self.protagonists.first().map(String::as_str)
    }

    pub fn antagonist(&self) -> Option<&str> {
        self.antagonists.first().map(String::as_str)
    }

    /// Place before and after a movement.
    pub fn route(&self) -> Option<(&str, &str)> {
        match self.places.as_slice() {
            [from, to] => Some((from.as_str(), to.as_str())),
            _ => None,
        }
    }

    pub fn view(&self, labeled: bool) -> EventView<'_> {
        EventView {
            event: self,
            labeled,
        }
    }
}

pub type PositionalEvent = (
    u64,
    u64,
    bool,
    EventAction,
    Vec<String>,
    Vec<String>,
    Vec<String>,
    Vec<String>,
    Vec<String>,
);

/// Serializes an event as a keyed object or as a bare array.
#[derive(Clone, Copy, Debug)]
pub struct EventView<'a> {
    event: &'a Event,
    labeled: bool,
}

impl Serialize for EventView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let e = self.event;
        if self.labeled {
            return e.serialize(serializer);
        }
        (
            e.t,
            e.id,
            e.is_story_arc,
            e.action,
            &e.protagonists,
            &e.antagonists,
            &e.direct_complements,
            &e.indirect_complements,
            &e.places,
        )
            .serialize(serializer)
    }
}

/// Either serialized form, read back. Arrays are tried first since the
/// derived `Event` impl would also accept them.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum EventRecord {
    Positional(PositionalEvent),
    Labeled(Event),
}

impl EventRecord {
    pub fn is_labeled(&self) -> bool {
        matches!(self, EventRecord::Labeled(_))
    }
}

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        match record {
            EventRecord::Labeled(event) => event,
            EventRecord::Positional((
                t,
                id,
                is_story_arc,
                action,
                protagonists,
                antagonists,
                direct_complements,
                indirect_complements,
                places,
            )) => Event {
                t,
                id,
                is_story_arc,
                action,
                protagonists,
                antagonists,
                direct_complements,
                indirect_complements,
                places,
            },
        }
    }
}

/// Append-only sequence of shared events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Arc<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: Arc<Event>) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().map(Arc::as_ref)
    }

    pub fn shared(&self) -> &[Arc<Event>] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last().map(Arc::as_ref)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.events.iter().any(|e| e.id == id)
    }

    pub fn views(&self, labeled: bool) -> Vec<EventView<'_>> {
        self.iter().map(|e| e.view(labeled)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::grid::{Direction, Position};

    fn chase() -> Event {
        Event::new(3, 17, EventAction::ChaseResolution, "c1")
            .story_arc(true)
            .against("c4")
            .across(Movement {
                from: Position::new(2, 0),
                to: Position::new(0, 0),
                direction: Direction::Right,
            })
    }

    #[test]
    fn labeled_form_uses_field_names() {
        let json = serde_json::to_value(chase().view(true)).unwrap();
        assert_eq!(json["t"], 3);
        assert_eq!(json["id"], 17);
        assert_eq!(json["is_story_arc"], true);
        assert_eq!(json["action"], "chase_resolution");
        assert_eq!(json["protagonists"], serde_json::json!(["c1"]));
        assert_eq!(json["antagonists"], serde_json::json!(["c4"]));
        assert_eq!(json["direct_complements"], serde_json::json!([]));
        assert_eq!(json["places"], serde_json::json!(["2, 0", "0, 0"]));
    }

    #[test]
    fn positional_form_is_ordered_array() {
        let json = serde_json::to_string(&chase().view(false)).unwrap();
        assert_eq!(
            json,
            r#"[3,17,true,"chase_resolution",["c1"],["c4"],[],[],["2, 0","0, 0"]]"#
        );
    }

    #[test]
    fn both_forms_read_back_to_the_same_event() {
        let event = chase();
        let labeled = serde_json::to_string(&event.view(true)).unwrap();
        let positional = serde_json::to_string(&event.view(false)).unwrap();

        let labeled: EventRecord = serde_json::from_str(&labeled).unwrap();
        let positional: EventRecord = serde_json::from_str(&positional).unwrap();
        assert!(labeled.is_labeled());
        assert!(!positional.is_labeled());

        let from_labeled: Event = labeled.into();
        let from_positional: Event = positional.into();

        assert_eq!(from_labeled, event);
        assert_eq!(from_positional, event);
    }

    #[test]
    fn noop_has_only_a_protagonist() {
        let event = Event::new(0, 0, EventAction::Noop, "c0");
        assert_eq!(event.protagonist(), Some("c0"));
        assert_eq!(event.antagonist(), None);
        assert_eq!(event.route(), None);
        assert!(!event.is_story_arc);
    }

    #[test]
    fn logs_share_event_instances() {
        let event = Arc::new(chase());
        let mut global = EventLog::new();
        let mut backstory = EventLog::new();
        global.append(Arc::clone(&event));
        backstory.append(Arc::clone(&event));

        assert!(Arc::ptr_eq(&global.shared()[0], &backstory.shared()[0]));
        assert!(backstory.contains(17));
        assert!(!backstory.contains(18));
        assert_eq!(global.last().map(|e| e.id), Some(17));
    }
}
