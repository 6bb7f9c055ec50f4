use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::types::RuntimeEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    pub timestamp: String,
    pub level: Level,
    pub event: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
    pub details: Value,
}

impl StructuredLogLine {
    pub fn new(level: Level, event: &str, run_id: &str, details: Value) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            event: event.to_string(),
            run_id: run_id.to_string(),
            seed: None,
            frame: None,
            details,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn frame(mut self, frame: u64) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|error| {
            format!(r#"{{"level":"error","event":"log_encode_failed","details":"{error}"}}"#)
        })
    }

    /// Writes the line to stderr.
    pub fn emit(&self) {
        eprintln!("{}", self.to_json());
    }
}

/// Log event name for a runtime event.
pub fn event_name(event: &RuntimeEvent) -> &'static str {
    match event {
        RuntimeEvent::DotEaten { .. } => "dot_eaten",
        RuntimeEvent::GhostRecovered { .. } => "ghost_recovered",
        RuntimeEvent::PlayerCaught { .. } => "player_caught",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn optional_fields_are_omitted_until_set() {
        let line = StructuredLogLine::new(Level::Info, "run_started", "run-1", json!({}));
        let value: Value = serde_json::from_str(&line.to_json()).expect("valid json");
        assert_eq!(value["level"], "info");
        assert_eq!(value["runId"], "run-1");
        assert!(value.get("seed").is_none());
        assert!(value.get("frame").is_none());

        let line = line.seed(42).frame(7);
        let value: Value = serde_json::from_str(&line.to_json()).expect("valid json");
        assert_eq!(value["seed"], 42);
        assert_eq!(value["frame"], 7);
    }

    #[test]
    fn runtime_events_map_to_snake_case_names() {
        let caught = RuntimeEvent::PlayerCaught {
            ghost_id: "ghost_2".to_string(),
            x: 1,
            y: 2,
        };
        assert_eq!(event_name(&caught), "player_caught");
        let encoded = serde_json::to_value(&caught).expect("event serializes");
        assert_eq!(encoded["type"], "player_caught");
        assert_eq!(encoded["ghostId"], "ghost_2");
    }
}
