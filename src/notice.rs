use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Destructive,
}

/// Short user-facing message emitted by the trip flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
        }
    }

    pub fn missing_destination() -> Self {
        Self::destructive("Missing destination", "Please enter a destination first")
    }

    pub fn suggestions_ready() -> Self {
        Self::info(
            "AI suggestions generated!",
            "Travel recommendations have been added to your trip",
        )
    }

    pub fn suggestions_failed() -> Self {
        Self::destructive("Failed to generate suggestions", "Please try again")
    }

    pub fn missing_required_fields() -> Self {
        Self::destructive(
            "Missing required fields",
            "Please fill in title and destination",
        )
    }

    pub fn invalid_field(description: impl Into<String>) -> Self {
        Self::destructive("Invalid value", description)
    }

    pub fn trip_saved(updated: bool) -> Self {
        let title = if updated {
            "Trip updated!"
        } else {
            "Trip created!"
        };
        Self::info(title, "Your trip has been saved successfully")
    }

    pub fn save_failed() -> Self {
        Self::destructive("Error", "Failed to save trip")
    }

    pub fn trip_deleted() -> Self {
        Self::info("Trip deleted", "Your trip has been successfully deleted")
    }

    pub fn delete_failed() -> Self {
        Self::destructive("Error", "Failed to delete trip")
    }

    pub fn is_destructive(&self) -> bool {
        self.severity == Severity::Destructive
    }
}

/// Receives notices for presentation; what happens to them is up to the host.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Collects notices until the host drains them, e.g. once per request.
#[derive(Debug, Clone, Default)]
pub struct NoticeBuffer {
    inner: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        let mut notices = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *notices)
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|n| n.title).collect()
    }
}

impl NoticeSink for NoticeBuffer {
    fn notify(&self, notice: Notice) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
