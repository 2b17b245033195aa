use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::DictionaryError;

/// Display templates for one event type
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EventTemplate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDictionary {
    maps: Mapping,
    events: HashMap<String, Option<EventTemplate>>,
}

/// Map names and event templates, loaded once at startup and read-only afterwards
#[derive(Debug, Default)]
pub struct Dictionary {
    maps: HashMap<String, String>,
    events: HashMap<String, EventTemplate>,
}

impl Dictionary {
    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        let text = std::fs::read_to_string(path).map_err(|source| DictionaryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, DictionaryError> {
        let raw: RawDictionary = serde_yaml::from_str(text)?;

        let mut maps = HashMap::with_capacity(raw.maps.len());
        for (key, name) in raw.maps {
            let key = yaml_scalar(&key).ok_or_else(|| DictionaryError::InvalidMapKey {
                found: format!("{key:?}"),
            })?;
            // Non-scalar names render as empty
            let name = yaml_scalar(&name).unwrap_or_default();
            maps.insert(key, name);
        }

        // A null entry (`kill:` with nothing under it) counts as unmapped
        let events = raw
            .events
            .into_iter()
            .filter_map(|(event_type, template)| template.map(|t| (event_type, t)))
            .collect();

        Ok(Self { maps, events })
    }

    pub fn map_name(&self, map_id: &str) -> Option<&str> {
        self.maps.get(map_id).map(String::as_str)
    }

    pub fn event_template(&self, event_type: &str) -> Option<&EventTemplate> {
        self.events.get(event_type)
    }

    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

fn yaml_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
