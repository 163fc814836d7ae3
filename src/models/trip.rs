use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub destination: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub ai_suggestions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Replaces every field the patch carries. Identity and timestamps are left alone.
    pub fn apply(&mut self, patch: &TripPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(destination) = &patch.destination {
            self.destination.clone_from(destination);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(budget) = patch.budget {
            self.budget = budget;
        }
        if let Some(ai_suggestions) = &patch.ai_suggestions {
            self.ai_suggestions.clone_from(ai_suggestions);
        }
    }

    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }

    pub fn has_suggestions(&self) -> bool {
        self.ai_suggestions.is_some()
    }
}

/// Fields a caller supplies when creating a trip; the store fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTrip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub destination: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub ai_suggestions: Option<String>,
}

impl NewTrip {
    pub fn new(title: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            destination: destination.into(),
            ..Self::default()
        }
    }
}

/// Partial update. `None` leaves a column untouched, `Some(None)` clears a
/// nullable one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub budget: Option<Option<f64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub ai_suggestions: Option<Option<String>>,
}

impl TripPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A full replacement of every editable field, which is what the editor sends.
impl From<NewTrip> for TripPatch {
    fn from(fields: NewTrip) -> Self {
        Self {
            title: Some(fields.title),
            destination: Some(fields.destination),
            description: Some(fields.description),
            start_date: Some(fields.start_date),
            end_date: Some(fields.end_date),
            budget: Some(fields.budget),
            ai_suggestions: Some(fields.ai_suggestions),
        }
    }
}
