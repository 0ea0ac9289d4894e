use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque event identifier. Echoed back to the render endpoint exactly as
/// the search endpoint produced it, whether that was a string or a number.
/// `null` is rejected: it would be echoed back as a render of nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventId(pub serde_json::Value);

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Err(serde::de::Error::custom("event_id must not be null")),
            value => Ok(EventId(value)),
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub series_name: String,
    pub episode_number: String,
    pub timestamp: f64,
}

/// A single hit from `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub event_id: EventId,
    pub score: f64,
    pub plaintext: String,
    pub episode: Episode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    #[default]
    Image,
    Video,
}

impl RenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderType::Image => "image",
            RenderType::Video => "video",
        }
    }
}

impl fmt::Display for RenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted render; `task_id` identifies it for every later poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub task_id: String,
    pub render_type: RenderType,
}

/// One snapshot from `GET /api/render/{task_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStatus {
    pub finished: bool,
    pub failed: bool,
}

impl RenderStatus {
    pub fn is_terminal(&self) -> bool {
        self.finished || self.failed
    }

    /// A status with both flags set counts as a failure.
    pub fn is_success(&self) -> bool {
        self.finished && !self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_result_decodes_numeric_event_id() {
        let result: SearchResult = serde_json::from_value(json!({
            "event_id": 4821,
            "score": 0.5,
            "plaintext": "hello",
            "episode": { "series_name": "Show", "episode_number": "01", "timestamp": 61.5 }
        }))
        .unwrap();

        assert_eq!(result.event_id, EventId(json!(4821)));
        assert_eq!(result.event_id.to_string(), "4821");
    }

    #[test]
    fn test_event_id_string_display_is_unquoted() {
        let id = EventId(json!("ev-9"));
        assert_eq!(id.to_string(), "ev-9");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("ev-9"));
    }

    #[test]
    fn test_null_event_id_is_rejected() {
        let err = serde_json::from_value::<SearchResult>(json!({
            "event_id": null,
            "score": 0.5,
            "plaintext": "hello",
            "episode": { "series_name": "Show", "episode_number": "01", "timestamp": 61.5 }
        }))
        .unwrap_err();

        assert!(err.to_string().contains("event_id must not be null"), "got: {err}");
    }

    #[test]
    fn test_render_type_serializes_lowercase() {
        assert_eq!(serde_json::to_value(RenderType::Image).unwrap(), json!("image"));
        assert_eq!(serde_json::to_value(RenderType::Video).unwrap(), json!("video"));
        assert_eq!(RenderType::default(), RenderType::Image);
    }

    #[test]
    fn test_render_status_terminal_states() {
        let pending = RenderStatus { finished: false, failed: false };
        let done = RenderStatus { finished: true, failed: false };
        let failed = RenderStatus { finished: false, failed: true };
        let both = RenderStatus { finished: true, failed: true };

        assert!(!pending.is_terminal());
        assert!(done.is_terminal() && done.is_success());
        assert!(failed.is_terminal() && !failed.is_success());
        assert!(both.is_terminal());
        assert!(!both.is_success(), "failed takes precedence over finished");
    }
}
