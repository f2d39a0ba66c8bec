// src/models/checkpoint.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of the last fully completed result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_page: u32,
    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(last_page: u32) -> Self {
        Self {
            last_page,
            timestamp: Utc::now(),
        }
    }

    /// First page a resumed run should process.
    pub fn next_page(&self) -> u32 {
        self.last_page.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_flat_object() {
        let checkpoint = Checkpoint::new(2);
        let value = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(value["last_page"], 2);
        assert!(value["timestamp"].as_str().is_some_and(|t| t.contains('T')));
    }

    #[test]
    fn parses_iso_timestamp() {
        let checkpoint: Checkpoint =
            serde_json::from_str(r#"{"last_page": 7, "timestamp": "2026-01-15T10:30:00Z"}"#)
                .unwrap();
        assert_eq!(checkpoint.last_page, 7);
        assert_eq!(checkpoint.next_page(), 8);
    }
}
