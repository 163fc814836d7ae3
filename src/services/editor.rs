//! Create/edit flow for a single trip form.
//!
//! The editor holds a string-typed draft, guards the two remote actions
//! (save and suggestion generation) with presence checks, and reports every
//! outcome as a [`Notice`]. Save and suggestion generation track separate flags
//! and are not mutually exclusive; each may be in flight while the other runs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    error::{GenerationError, StoreError},
    models::{
        draft::{DraftError, DraftField, TripDraft},
        trip::{Trip, TripPatch},
    },
    notice::{Notice, NoticeSink},
    services::{repository::TripRepository, suggestions::SuggestionGenerator},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Idle,
    Submitting,
    /// Saved or cancelled; the host should dismiss the editor.
    Closed,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("a destination is required before requesting suggestions")]
    MissingDestination,
    #[error("title and destination are required")]
    MissingRequiredFields,
    #[error(transparent)]
    InvalidDraft(#[from] DraftError),
    #[error("a suggestion request is already in flight")]
    SuggestionInFlight,
    #[error("the trip is already being saved")]
    SubmitInFlight,
    #[error("the editor is closed")]
    Closed,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Debug)]
struct EditorState {
    draft: TripDraft,
    phase: EditorPhase,
    generating: bool,
}

pub struct TripEditor {
    target: Option<Trip>,
    repository: TripRepository,
    generator: SuggestionGenerator,
    notices: Arc<dyn NoticeSink>,
    state: Mutex<EditorState>,
}

impl TripEditor {
    /// Blank draft; submitting creates a new trip.
    pub fn create(
        repository: TripRepository,
        generator: SuggestionGenerator,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self::build(None, TripDraft::default(), repository, generator, notices)
    }

    /// Draft pre-populated from `target`; submitting updates it.
    pub fn edit(
        target: Trip,
        repository: TripRepository,
        generator: SuggestionGenerator,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        let draft = TripDraft::from_trip(&target);
        Self::build(Some(target), draft, repository, generator, notices)
    }

    fn build(
        target: Option<Trip>,
        draft: TripDraft,
        repository: TripRepository,
        generator: SuggestionGenerator,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            target,
            repository,
            generator,
            notices,
            state: Mutex::new(EditorState {
                draft,
                phase: EditorPhase::Idle,
                generating: false,
            }),
        }
    }

    /// Replaces the whole draft, e.g. with values posted back by a form.
    pub fn with_draft(self, draft: TripDraft) -> Self {
        self.state().draft = draft;
        self
    }

    pub fn is_editing(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&Trip> {
        self.target.as_ref()
    }

    pub fn draft(&self) -> TripDraft {
        self.state().draft.clone()
    }

    pub fn phase(&self) -> EditorPhase {
        self.state().phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase() == EditorPhase::Submitting
    }

    pub fn is_generating(&self) -> bool {
        self.state().generating
    }

    pub fn update_field(&self, field: DraftField, value: impl Into<String>) {
        self.state().draft.set(field, value);
    }

    /// Asks the gateway for suggestions and writes them into the draft.
    /// Nothing is persisted.
    pub async fn request_suggestion(&self) -> Result<String, EditorError> {
        let prompt = {
            let mut state = self.state();
            if state.phase == EditorPhase::Closed {
                return Err(EditorError::Closed);
            }
            if !state.draft.has_destination() {
                drop(state);
                self.notices.notify(Notice::missing_destination());
                return Err(EditorError::MissingDestination);
            }
            if state.generating {
                return Err(EditorError::SuggestionInFlight);
            }
            state.generating = true;
            suggestion_prompt(&state.draft)
        };
        let _flight = InFlight::new(&self.state, Flight::Suggestion);

        debug!(model = self.generator.model(), "requesting trip suggestions");
        match self.generator.generate(&prompt).await {
            Ok(text) => {
                self.state().draft.ai_suggestions.clone_from(&text);
                self.notices.notify(Notice::suggestions_ready());
                Ok(text)
            }
            Err(err) => {
                self.notices.notify(Notice::suggestions_failed());
                Err(err.into())
            }
        }
    }

    /// Validates and persists the draft: create when there is no target,
    /// update otherwise. On failure the draft is kept so the user can retry.
    pub async fn submit(&self) -> Result<Trip, EditorError> {
        let fields = {
            let mut state = self.state();
            match state.phase {
                EditorPhase::Closed => return Err(EditorError::Closed),
                EditorPhase::Submitting => return Err(EditorError::SubmitInFlight),
                EditorPhase::Idle => {}
            }
            if !state.draft.has_required_fields() {
                drop(state);
                self.notices.notify(Notice::missing_required_fields());
                return Err(EditorError::MissingRequiredFields);
            }
            match state.draft.to_new_trip() {
                Ok(fields) => {
                    state.phase = EditorPhase::Submitting;
                    fields
                }
                Err(err) => {
                    drop(state);
                    self.notices.notify(Notice::invalid_field(err.to_string()));
                    return Err(err.into());
                }
            }
        };
        let _flight = InFlight::new(&self.state, Flight::Submit);

        let result = match &self.target {
            Some(target) => {
                self.repository
                    .update(&target.id, TripPatch::from(fields))
                    .await
            }
            None => self.repository.create(fields).await,
        };

        match result {
            Ok(trip) => {
                self.state().phase = EditorPhase::Closed;
                info!(id = %trip.id, updated = self.is_editing(), "saved trip");
                self.notices.notify(Notice::trip_saved(self.is_editing()));
                Ok(trip)
            }
            Err(err) => {
                self.notices.notify(Notice::save_failed());
                Err(err.into())
            }
        }
    }

    /// Discards the draft without persisting anything.
    pub fn cancel(&self) {
        let mut state = self.state();
        state.draft = TripDraft::default();
        state.phase = EditorPhase::Closed;
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<EditorState>) -> MutexGuard<'_, EditorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Flight {
    Submit,
    Suggestion,
}

/// Clears the in-flight flag on every exit path, including a dropped future.
struct InFlight<'a> {
    state: &'a Mutex<EditorState>,
    flight: Flight,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<EditorState>, flight: Flight) -> Self {
        Self { state, flight }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        match self.flight {
            Flight::Submit => {
                if state.phase == EditorPhase::Submitting {
                    state.phase = EditorPhase::Idle;
                }
            }
            Flight::Suggestion => state.generating = false,
        }
    }
}

/// Prompt for the gateway. Budget and the date range are included only when
/// present (the range needs both ends).
pub fn suggestion_prompt(draft: &TripDraft) -> String {
    let mut prompt = format!(
        "Generate travel suggestions for a trip to {}",
        draft.destination.trim()
    );
    let budget = draft.budget.trim();
    if !budget.is_empty() {
        prompt.push_str(&format!(" with a budget of ${budget}"));
    }
    let (start, end) = (draft.start_date.trim(), draft.end_date.trim());
    if !start.is_empty() && !end.is_empty() {
        prompt.push_str(&format!(" from {start} to {end}"));
    }
    prompt.push_str(
        ". Include top attractions, local cuisine recommendations, and practical tips. \
         Keep it concise but helpful.",
    );
    prompt
}
