//! History entries - the append-only audit log on risks and projects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author recorded on entries the store writes itself
pub const SYSTEM_AUTHOR: &str = "System";

/// One immutable audit line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,

    /// Free-text description of what happened
    pub event: String,

    /// Who caused it
    pub author: String,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time
    pub fn new(event: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.into(),
            author: author.into(),
        }
    }

    /// Create an entry authored by the store
    pub fn system(event: impl Into<String>) -> Self {
        Self::new(event, SYSTEM_AUTHOR)
    }
}
