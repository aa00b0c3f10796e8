//! The exported timeline document.
//!
//! Layout, in key order:
//!
//! ```text
//! META        SEED, GRID_SIZE, CHARACTER_SIZE, ITERATIONS, RUN_AT, SHOW_LABELS
//! CHARACTERS  roster names
//! EVENTS      GLOBAL followed by one section per character, roster order
//! ```
//!
//! Events are written labeled or positional depending on `SHOW_LABELS`;
//! loading accepts either.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::modules::event::{Event, EventRecord};
use crate::modules::grid::Grid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SkeletonMeta {
    pub seed: u64,
    pub grid_size: usize,
    pub character_size: usize,
    pub iterations: u64,
    /// RFC 3339 timestamp of when the run started.
    pub run_at: String,
    /// Events are keyed objects rather than positional arrays.
    #[serde(default)]
    pub show_labels: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSkeleton")]
pub struct Skeleton {
    pub meta: SkeletonMeta,
    pub characters: Vec<String>,
    pub global: Vec<Event>,
    /// Per-character event sequences, in roster order.
    pub backstories: Vec<(String, Vec<Event>)>,
}

impl Skeleton {
    pub fn backstory(&self, name: &str) -> Option<&[Event]> {
        self.backstories
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, events)| events.as_slice())
    }

    /// Every place name a grid of this size can produce.
    pub fn places(&self) -> Vec<String> {
        Grid::new(self.meta.grid_size)
            .places()
            .map(|p| p.to_string())
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

struct Views<'a> {
    events: &'a [Event],
    labeled: bool,
}

impl Serialize for Views<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.events.iter().map(|e| e.view(self.labeled)))
    }
}

struct Sections<'a>(&'a Skeleton);

impl Serialize for Sections<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let skeleton = self.0;
        let labeled = skeleton.meta.show_labels;
        let mut map = serializer.serialize_map(Some(skeleton.backstories.len() + 1))?;
        map.serialize_entry(
            GLOBAL,
            &Views {
                events: &skeleton.global,
                labeled,
            },
        )?;
        for (name, events) in &skeleton.backstories {
            map.serialize_entry(name, &Views { events, labeled })?;
        }
        map.end()
    }
}

impl Serialize for Skeleton {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("META", &self.meta)?;
        map.serialize_entry("CHARACTERS", &self.characters)?;
        map.serialize_entry("EVENTS", &Sections(self))?;
        map.end()
    }
}

const GLOBAL: &str = "GLOBAL";

#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawSkeleton {
    meta: SkeletonMeta,
    characters: Vec<String>,
    events: HashMap<String, Vec<EventRecord>>,
}

impl TryFrom<RawSkeleton> for Skeleton {
    type Error = String;

    fn try_from(mut raw: RawSkeleton) -> Result<Self, Self::Error> {
        let mut labeled_records = false;
        let mut convert = |records: Vec<EventRecord>| -> Vec<Event> {
            records
                .into_iter()
                .map(|record| {
                    labeled_records |= record.is_labeled();
                    Event::from(record)
                })
                .collect()
        };

        let global = raw
            .events
            .remove(GLOBAL)
            .map(&mut convert)
            .ok_or("EVENTS is missing the GLOBAL section")?;

        let mut backstories = Vec::with_capacity(raw.characters.len());
        for name in &raw.characters {
            let records = raw
                .events
                .remove(name)
                .ok_or_else(|| format!("EVENTS is missing the section for {}", name))?;
            backstories.push((name.clone(), convert(records)));
        }
        if let Some(extra) = raw.events.keys().next() {
            return Err(format!("EVENTS has a section for unknown character {}", extra));
        }

        let mut meta = raw.meta;
        meta.show_labels |= labeled_records;
        Ok(Skeleton {
            meta,
            characters: raw.characters,
            global,
            backstories,
        })
    }
}

pub fn save_skeleton(path: &Path, skeleton: &Skeleton) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_vec_pretty(skeleton)?;
    fs::write(path, json)
}

pub fn load_skeleton(path: &Path) -> io::Result<Skeleton> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed to parse skeleton file {}: {}", path.display(), e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::event::EventAction;

    fn sample(show_labels: bool) -> Skeleton {
        let confront = Event::new(0, 0, EventAction::Confront, "c1")
            .story_arc(true)
            .against("c0");
        let noop = Event::new(0, 1, EventAction::Noop, "c0");
        Skeleton {
            meta: SkeletonMeta {
                seed: 99,
                grid_size: 2,
                character_size: 2,
                iterations: 1,
                run_at: "2024-05-01T10:00:00+00:00".into(),
                show_labels,
            },
            characters: vec!["c0".into(), "c1".into()],
            global: vec![confront.clone(), noop.clone()],
            backstories: vec![
                ("c0".into(), vec![confront.clone(), noop]),
                ("c1".into(), vec![confront]),
            ],
        }
    }

    #[test]
    fn document_keys_keep_their_order() {
        let json = sample(true).to_json().unwrap();
        let meta = json.find("\"META\"").unwrap();
        let characters = json.find("\"CHARACTERS\"").unwrap();
        let global = json.find("\"GLOBAL\"").unwrap();
        let c0 = json.find("\"c0\": [").unwrap();
        let c1 = json.find("\"c1\": [").unwrap();
        assert!(meta < characters && characters < global && global < c0 && c0 < c1);
        assert!(json.contains("\"GRID_SIZE\": 2"));
        assert!(json.contains("\"CHARACTER_SIZE\": 2"));
        assert!(json.contains("\"SHOW_LABELS\": true"));
    }

    #[test]
    fn labeled_document_reads_back() {
        let skeleton = sample(true);
        let parsed: Skeleton = serde_json::from_str(&skeleton.to_json().unwrap()).unwrap();
        assert_eq!(parsed, skeleton);
    }

    #[test]
    fn positional_document_reads_back() {
        let skeleton = sample(false);
        let json = skeleton.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["EVENTS"]["GLOBAL"][0].is_array());

        let parsed: Skeleton = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, skeleton);
    }

    #[test]
    fn empty_labeled_document_keeps_its_flag() {
        let mut skeleton = sample(true);
        skeleton.global.clear();
        for (_, events) in &mut skeleton.backstories {
            events.clear();
        }
        let parsed: Skeleton = serde_json::from_str(&skeleton.to_json().unwrap()).unwrap();
        assert!(parsed.meta.show_labels);
        assert_eq!(parsed, skeleton);
    }

    #[test]
    fn missing_section_is_rejected() {
        let mut value = serde_json::to_value(sample(true)).unwrap();
        value["EVENTS"].as_object_mut().unwrap().remove("c1");
        assert!(serde_json::from_value::<Skeleton>(value).is_err());
    }

    #[test]
    fn place_universe_follows_grid_size() {
        let places = sample(true).places();
        assert_eq!(places, vec!["0, 0", "0, 1", "1, 0", "1, 1"]);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("skeleton.json");
        let skeleton = sample(false);

        save_skeleton(&path, &skeleton).unwrap();
        let loaded = load_skeleton(&path).unwrap();

        assert_eq!(loaded, skeleton);
        assert_eq!(loaded.backstory("c1").map(<[Event]>::len), Some(1));
    }

    #[test]
    fn load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"META\": 3 }").unwrap();
        let err = load_skeleton(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
