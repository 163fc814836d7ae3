use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::trip::{NewTrip, Trip};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Editable fields of a trip as the form holds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
    Destination,
    StartDate,
    EndDate,
    Budget,
    AiSuggestions,
}

impl DraftField {
    pub const ALL: [DraftField; 7] = [
        DraftField::Title,
        DraftField::Description,
        DraftField::Destination,
        DraftField::StartDate,
        DraftField::EndDate,
        DraftField::Budget,
        DraftField::AiSuggestions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Description => "description",
            DraftField::Destination => "destination",
            DraftField::StartDate => "start_date",
            DraftField::EndDate => "end_date",
            DraftField::Budget => "budget",
            DraftField::AiSuggestions => "ai_suggestions",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("budget must be a non-negative number, got {0:?}")]
    InvalidBudget(String),
    #[error("{field} must be a date (YYYY-MM-DD), got {value:?}")]
    InvalidDate { field: DraftField, value: String },
}

/// String-typed working copy of a trip; values are parsed only on submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub ai_suggestions: String,
}

impl TripDraft {
    pub fn from_trip(trip: &Trip) -> Self {
        Self {
            title: trip.title.clone(),
            description: trip.description.clone().unwrap_or_default(),
            destination: trip.destination.clone(),
            start_date: format_date(trip.start_date),
            end_date: format_date(trip.end_date),
            budget: trip.budget.map(|b| b.to_string()).unwrap_or_default(),
            ai_suggestions: trip.ai_suggestions.clone().unwrap_or_default(),
        }
    }

    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Title => &self.title,
            DraftField::Description => &self.description,
            DraftField::Destination => &self.destination,
            DraftField::StartDate => &self.start_date,
            DraftField::EndDate => &self.end_date,
            DraftField::Budget => &self.budget,
            DraftField::AiSuggestions => &self.ai_suggestions,
        }
    }

    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let slot = match field {
            DraftField::Title => &mut self.title,
            DraftField::Description => &mut self.description,
            DraftField::Destination => &mut self.destination,
            DraftField::StartDate => &mut self.start_date,
            DraftField::EndDate => &mut self.end_date,
            DraftField::Budget => &mut self.budget,
            DraftField::AiSuggestions => &mut self.ai_suggestions,
        };
        *slot = value.into();
    }

    pub fn has_destination(&self) -> bool {
        !self.destination.trim().is_empty()
    }

    pub fn has_required_fields(&self) -> bool {
        !self.title.trim().is_empty() && self.has_destination()
    }

    /// Parses the draft into store input. Presence of title and destination is
    /// checked separately by the editor.
    pub fn to_new_trip(&self) -> Result<NewTrip, DraftError> {
        Ok(NewTrip {
            user_id: None,
            title: self.title.trim().to_string(),
            description: normalize_optional(&self.description),
            destination: self.destination.trim().to_string(),
            start_date: parse_date(DraftField::StartDate, &self.start_date)?,
            end_date: parse_date(DraftField::EndDate, &self.end_date)?,
            budget: parse_budget(&self.budget)?,
            ai_suggestions: normalize_optional(&self.ai_suggestions),
        })
    }
}

/// Blank means "no budget", never zero.
pub fn parse_budget(raw: &str) -> Result<Option<f64>, DraftError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        _ => Err(DraftError::InvalidBudget(trimmed.to_string())),
    }
}

fn parse_date(field: DraftField, raw: &str) -> Result<Option<NaiveDate>, DraftError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(Some)
        .map_err(|_| DraftError::InvalidDate {
            field,
            value: trimmed.to_string(),
        })
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn normalize_optional(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
