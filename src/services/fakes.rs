//! In-memory store and gateway doubles for unit tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use crate::{
    error::{GenerationError, StoreError},
    models::trip::{NewTrip, Trip, TripPatch},
    services::{
        gateway::GenerationGateway,
        store::{not_found, TripStore},
    },
};

#[derive(Default)]
struct StoreState {
    rows: Vec<Trip>,
    failure: Option<String>,
    next_id: u32,
    select_calls: usize,
    write_calls: usize,
    select_gate: Option<Arc<Notify>>,
}

#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed(&self, input: NewTrip) -> Trip {
        let mut state = self.state();
        Self::insert_row(&mut state, &input)
    }

    pub fn fail_with(&self, message: &str) {
        self.state().failure = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.state().failure = None;
    }

    /// Makes every later `select_all` wait for a permit on the returned gate.
    pub fn hold_selects(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().select_gate = Some(gate.clone());
        gate
    }

    pub fn select_calls(&self) -> usize {
        self.state().select_calls
    }

    pub fn write_calls(&self) -> usize {
        self.state().write_calls
    }

    pub fn rows(&self) -> Vec<Trip> {
        self.state().rows.clone()
    }

    fn insert_row(state: &mut StoreState, input: &NewTrip) -> Trip {
        state.next_id += 1;
        let created_at = epoch() + Duration::seconds(i64::from(state.next_id));
        let trip = Trip {
            id: format!("trip-{}", state.next_id),
            user_id: input.user_id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            destination: input.destination.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            budget: input.budget,
            ai_suggestions: input.ai_suggestions.clone(),
            created_at,
            updated_at: created_at,
        };
        state.rows.push(trip.clone());
        trip
    }

    fn check(state: &StoreState) -> Result<(), StoreError> {
        match &state.failure {
            Some(message) => Err(StoreError::new(message.clone())),
            None => Ok(()),
        }
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

#[async_trait]
impl TripStore for FakeStore {
    async fn select_all(&self) -> Result<Vec<Trip>, StoreError> {
        let gate = {
            let mut state = self.state();
            state.select_calls += 1;
            state.select_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let state = self.state();
        Self::check(&state)?;
        let mut rows = state.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, trip: &NewTrip) -> Result<Trip, StoreError> {
        let mut state = self.state();
        state.write_calls += 1;
        Self::check(&state)?;
        Ok(Self::insert_row(&mut state, trip))
    }

    async fn update(&self, id: &str, patch: &TripPatch) -> Result<Trip, StoreError> {
        let mut state = self.state();
        state.write_calls += 1;
        Self::check(&state)?;
        let row = state
            .rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(id))?;
        row.apply(patch);
        row.updated_at += Duration::seconds(1);
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        state.write_calls += 1;
        Self::check(&state)?;
        let before = state.rows.len();
        state.rows.retain(|t| t.id != id);
        if state.rows.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}

#[derive(Default)]
struct GatewayState {
    reply: Option<Result<String, String>>,
    prompts: Vec<(String, String)>,
    gate: Option<Arc<Notify>>,
}

/// Answers every prompt with the scripted reply (or an error when none is set).
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<GatewayState>,
}

impl FakeGateway {
    pub fn replying(text: &str) -> Self {
        let gateway = Self::default();
        gateway.state().reply = Some(Ok(text.to_string()));
        gateway
    }

    pub fn failing(message: &str) -> Self {
        let gateway = Self::default();
        gateway.state().reply = Some(Err(message.to_string()));
        gateway
    }

    fn state(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every later `generate` wait for a permit on the returned gate.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().gate = Some(gate.clone());
        gate
    }

    /// `(prompt, model)` pairs seen so far.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.state().prompts.clone()
    }
}

#[async_trait]
impl GenerationGateway for FakeGateway {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError> {
        let (reply, gate) = {
            let mut state = self.state();
            state.prompts.push((prompt.to_string(), model.to_string()));
            (state.reply.clone(), state.gate.clone())
        };
        // Suspend once so callers can interleave other work with the request.
        tokio::task::yield_now().await;
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenerationError::new(message)),
            None => Err(GenerationError::new("no scripted reply")),
        }
    }
}
