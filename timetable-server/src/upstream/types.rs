//! Catalog records for the timetable listing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::fields::{as_text, first_text};

/// A timetable as shown in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetableSummary {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub published_at: Option<String>,
    /// Free-text description; empty when upstream has none.
    pub description: String,
}

impl TimetableSummary {
    /// Map a raw listing entry. Non-mapping entries yield an empty summary.
    pub fn from_value(entry: &Value) -> Self {
        let Some(record) = entry.as_object() else {
            return Self::default();
        };

        Self {
            id: first_text(record, &["id", "_id"]),
            name: first_text(record, &["name", "timetableName", "title"]),
            status: record.get("status").and_then(as_text),
            published_at: first_text(
                record,
                &["publishedAt", "published_at", "createdAt", "created_at"],
            ),
            description: first_text(record, &["description", "notes"]).unwrap_or_default(),
        }
    }

    pub fn is_published(&self) -> bool {
        self.status.as_deref() == Some("published")
    }
}
