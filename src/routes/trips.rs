use std::sync::Arc;

use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::AppError,
    format::{budget_label, date_range_label},
    models::{draft::TripDraft, trip::Trip},
    notice::{Notice, NoticeBuffer},
    routes::flash,
    services::editor::{EditorError, TripEditor},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trips_list))
        .route("/trips", post(create_submit))
        .route("/trips/new", get(new_form))
        .route("/trips/refresh", post(refresh))
        .route("/trips/:id", post(edit_submit))
        .route("/trips/:id/edit", get(edit_form))
        .route("/trips/:id/delete", post(delete_trip))
}

#[derive(Clone)]
struct NoticeView {
    title: String,
    description: String,
    destructive: bool,
}

impl From<Notice> for NoticeView {
    fn from(notice: Notice) -> Self {
        Self {
            destructive: notice.is_destructive(),
            title: notice.title,
            description: notice.description,
        }
    }
}

fn notice_views(notices: Vec<Notice>) -> Vec<NoticeView> {
    notices.into_iter().map(NoticeView::from).collect()
}

#[derive(Clone)]
struct TripCard {
    id: String,
    title: String,
    destination: String,
    has_description: bool,
    description: String,
    has_dates: bool,
    date_range: String,
    has_budget: bool,
    budget: String,
    has_suggestions: bool,
    ai_suggestions: String,
}

impl From<&Trip> for TripCard {
    fn from(trip: &Trip) -> Self {
        let date_range = date_range_label(trip.start_date, trip.end_date);
        let budget = budget_label(trip.budget);
        Self {
            id: trip.id.clone(),
            title: trip.title.clone(),
            destination: trip.destination.clone(),
            has_description: trip.has_description(),
            description: trip.description.clone().unwrap_or_default(),
            has_dates: date_range.is_some(),
            date_range: date_range.unwrap_or_default(),
            has_budget: budget.is_some(),
            budget: budget.unwrap_or_default(),
            has_suggestions: trip.has_suggestions(),
            ai_suggestions: trip.ai_suggestions.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "trips/list.html")]
struct TripListTemplate {
    notices: Vec<NoticeView>,
    is_loading: bool,
    has_error: bool,
    error: String,
    trips: Vec<TripCard>,
}

async fn trips_list(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (jar, notices) = flash::take(jar);
    let snapshot = state.repository.snapshot();
    let template = TripListTemplate {
        notices: notice_views(notices),
        is_loading: snapshot.is_loading,
        has_error: snapshot.error.is_some(),
        error: snapshot.error.unwrap_or_default(),
        trips: snapshot.trips.iter().map(TripCard::from).collect(),
    };
    Ok((jar, AskamaTemplateResponse::into_response(template)))
}

async fn refresh(State(state): State<AppState>) -> Redirect {
    // Failures are recorded on the repository and shown by the list.
    if let Err(err) = state.repository.fetch_all().await {
        debug!("manual refresh failed: {err}");
    }
    Redirect::to("/")
}

#[derive(Template)]
#[template(path = "trips/form.html")]
struct TripFormTemplate {
    notices: Vec<NoticeView>,
    heading: &'static str,
    action_url: String,
    submit_label: &'static str,
    draft: TripDraft,
}

impl TripFormTemplate {
    fn new(target: Option<&Trip>, draft: TripDraft, notices: Vec<Notice>) -> Self {
        let (heading, action_url, submit_label) = match target {
            Some(trip) => ("Edit Trip", format!("/trips/{}", trip.id), "Update Trip"),
            None => ("Create New Trip", "/trips".to_string(), "Create Trip"),
        };
        Self {
            notices: notice_views(notices),
            heading,
            action_url,
            submit_label,
            draft,
        }
    }
}

async fn new_form() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(TripFormTemplate::new(
        None,
        TripDraft::default(),
        Vec::new(),
    ))
}

async fn edit_form(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let trip = state.repository.find(&trip_id).ok_or(AppError::NotFound)?;
    let draft = TripDraft::from_trip(&trip);
    Ok(AskamaTemplateResponse::into_response(TripFormTemplate::new(
        Some(&trip),
        draft,
        Vec::new(),
    )))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FormAction {
    #[default]
    Save,
    Suggest,
    Cancel,
}

#[derive(Debug, Deserialize)]
struct TripForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    destination: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
    #[serde(default)]
    budget: String,
    #[serde(default)]
    ai_suggestions: String,
    #[serde(default)]
    action: FormAction,
}

impl TripForm {
    fn into_parts(self) -> (TripDraft, FormAction) {
        let draft = TripDraft {
            title: self.title,
            description: self.description,
            destination: self.destination,
            start_date: self.start_date,
            end_date: self.end_date,
            budget: self.budget,
            ai_suggestions: self.ai_suggestions,
        };
        (draft, self.action)
    }
}

async fn create_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<TripForm>,
) -> Response {
    let notices = NoticeBuffer::new();
    let (draft, action) = form.into_parts();
    let editor = state.editor(Arc::new(notices.clone())).with_draft(draft);
    run_editor(editor, action, notices, jar).await
}

async fn edit_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(trip_id): Path<String>,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let trip = state.repository.find(&trip_id).ok_or(AppError::NotFound)?;
    let notices = NoticeBuffer::new();
    let (draft, action) = form.into_parts();
    let editor = state
        .editor_for(trip, Arc::new(notices.clone()))
        .with_draft(draft);
    Ok(run_editor(editor, action, notices, jar).await)
}

async fn run_editor(
    editor: TripEditor,
    action: FormAction,
    notices: NoticeBuffer,
    jar: PrivateCookieJar,
) -> Response {
    match action {
        FormAction::Cancel => {
            editor.cancel();
            Redirect::to("/").into_response()
        }
        FormAction::Suggest => {
            if let Err(err) = editor.request_suggestion().await {
                debug!("suggestion request did not complete: {err}");
            }
            render_form(&editor, notices.drain(), StatusCode::OK)
        }
        FormAction::Save => match editor.submit().await {
            Ok(_) => (flash::put(jar, notices.drain()), Redirect::to("/")).into_response(),
            Err(err) => {
                let status = match err {
                    EditorError::Store(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                render_form(&editor, notices.drain(), status)
            }
        },
    }
}

fn render_form(editor: &TripEditor, notices: Vec<Notice>, status: StatusCode) -> Response {
    let template = TripFormTemplate::new(editor.target(), editor.draft(), notices);
    (status, AskamaTemplateResponse::into_response(template)).into_response()
}

async fn delete_trip(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(trip_id): Path<String>,
) -> (PrivateCookieJar, Redirect) {
    let notice = match state.repository.delete(&trip_id).await {
        Ok(()) => Notice::trip_deleted(),
        Err(_) => Notice::delete_failed(),
    };
    (flash::put(jar, vec![notice]), Redirect::to("/"))
}
