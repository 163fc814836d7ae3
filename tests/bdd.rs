use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use cucumber::{given, then, when, World as _};
use trip_planner::{
    db::{init_pool, run_migrations},
    error::GenerationError,
    format::budget_label,
    models::{draft::DraftField, trip::NewTrip},
    notice::NoticeBuffer,
    services::{
        editor::{EditorPhase, TripEditor},
        gateway::GenerationGateway,
        repository::TripRepository,
        sqlite_store::SqliteTripStore,
        store::TripStore,
        suggestions::SuggestionGenerator,
    },
};

#[derive(Default)]
struct ScriptedGateway {
    reply: Mutex<Option<Result<String, String>>>,
    calls: Mutex<usize>,
}

impl ScriptedGateway {
    fn script(&self, reply: Result<String, String>) {
        *self.reply.lock().unwrap_or_else(PoisonError::into_inner) = Some(reply);
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl GenerationGateway for ScriptedGateway {
    async fn generate(&self, _prompt: &str, _model: &str) -> Result<String, GenerationError> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        match self
            .reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenerationError::new(message)),
            None => Err(GenerationError::new("gateway reply was not scripted")),
        }
    }
}

#[derive(Debug, cucumber::World, Default)]
struct TripWorld {
    state: Option<TestState>,
}

impl TripWorld {
    fn state(&self) -> &TestState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
    }

    fn state_mut(&mut self) -> &mut TestState {
        self.state
            .as_mut()
            .expect("state must be initialised first")
    }

    fn editor(&self) -> &TripEditor {
        self.state()
            .editor
            .as_ref()
            .expect("an editor must be open")
    }
}

struct TestState {
    store: SqliteTripStore,
    repository: TripRepository,
    gateway: Arc<ScriptedGateway>,
    notices: NoticeBuffer,
    editor: Option<TripEditor>,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let db = init_pool("sqlite::memory:").await?;
        run_migrations(&db).await?;
        let store = SqliteTripStore::new(db);
        let repository = TripRepository::load(Arc::new(store.clone())).await;
        Ok(Self {
            store,
            repository,
            gateway: Arc::new(ScriptedGateway::default()),
            notices: NoticeBuffer::new(),
            editor: None,
        })
    }

    fn generator(&self) -> SuggestionGenerator {
        SuggestionGenerator::new(self.gateway.clone(), "bdd-model")
    }

    fn titles(&self) -> Vec<String> {
        self.repository
            .trips()
            .into_iter()
            .map(|t| t.title)
            .collect()
    }
}

#[given("an empty trip store")]
async fn given_empty_store(world: &mut TripWorld) {
    world.state = Some(TestState::new().await.expect("state"));
}

#[given(regex = r#"^the gateway replies "([^"]*)"$"#)]
async fn given_gateway_replies(world: &mut TripWorld, text: String) {
    world.state().gateway.script(Ok(text));
}

#[given(regex = r#"^the gateway fails with "([^"]*)"$"#)]
async fn given_gateway_fails(world: &mut TripWorld, message: String) {
    world.state().gateway.script(Err(message));
}

#[given(regex = r#"^a stored trip "([^"]+)" to "([^"]+)"$"#)]
async fn given_stored_trip(world: &mut TripWorld, title: String, destination: String) {
    world
        .state()
        .repository
        .create(NewTrip::new(title, destination))
        .await
        .expect("create trip");
}

#[given("a new trip draft")]
async fn given_new_draft(world: &mut TripWorld) {
    let state = world.state_mut();
    let editor = TripEditor::create(
        state.repository.clone(),
        state.generator(),
        Arc::new(state.notices.clone()),
    );
    state.editor = Some(editor);
}

#[given(regex = r#"^I edit the trip "([^"]+)"$"#)]
async fn given_edit_trip(world: &mut TripWorld, title: String) {
    let state = world.state_mut();
    let trip = state
        .repository
        .trips()
        .into_iter()
        .find(|t| t.title == title)
        .expect("trip to edit");
    let editor = TripEditor::edit(
        trip,
        state.repository.clone(),
        state.generator(),
        Arc::new(state.notices.clone()),
    );
    state.editor = Some(editor);
}

#[when(regex = r#"^I set "([a-z_]+)" to "([^"]*)"$"#)]
async fn when_set_field(world: &mut TripWorld, field: String, value: String) {
    let field = DraftField::from_name(&field).expect("known draft field");
    world.editor().update_field(field, value);
}

#[when("I submit the draft")]
async fn when_submit(world: &mut TripWorld) {
    // Outcomes are asserted through notices and the store.
    let _ = world.editor().submit().await;
}

#[when("I request suggestions")]
async fn when_request_suggestions(world: &mut TripWorld) {
    let _ = world.editor().request_suggestion().await;
}

#[when(regex = r#"^I delete the trip "([^"]+)"$"#)]
async fn when_delete_trip(world: &mut TripWorld, title: String) {
    let repository = world.state().repository.clone();
    let trip = repository
        .trips()
        .into_iter()
        .find(|t| t.title == title)
        .expect("trip to delete");
    repository.delete(&trip.id).await.expect("delete trip");
}

#[then(regex = r#"^the notice "([^"]+)" is shown$"#)]
async fn then_notice_shown(world: &mut TripWorld, title: String) {
    let titles = world.state().notices.titles();
    assert!(titles.contains(&title), "notices were {titles:?}");
}

#[then(regex = r#"^after a refetch the newest trip is "([^"]+)" to "([^"]+)" without a budget$"#)]
async fn then_newest_after_refetch(world: &mut TripWorld, title: String, destination: String) {
    let trips = world
        .state()
        .repository
        .fetch_all()
        .await
        .expect("refetch");
    let newest = trips.first().expect("at least one trip");
    assert_eq!(newest.title, title);
    assert_eq!(newest.destination, destination);
    assert_eq!(newest.budget, None);
}

#[then(regex = r#"^the newest trip has budget ([0-9.]+) shown as "([^"]+)"$"#)]
async fn then_newest_budget(world: &mut TripWorld, budget: f64, label: String) {
    let trips = world.state().store.select_all().await.expect("select");
    let newest = trips.first().expect("at least one trip");
    assert_eq!(newest.budget, Some(budget));
    assert_eq!(budget_label(newest.budget), Some(label));
}

#[then(regex = r"^the store holds (\d+) trips$")]
async fn then_store_holds(world: &mut TripWorld, expected: usize) {
    let trips = world.state().store.select_all().await.expect("select");
    assert_eq!(trips.len(), expected);
}

#[then(regex = r"^the mirror holds (\d+) trips$")]
async fn then_mirror_holds(world: &mut TripWorld, expected: usize) {
    assert_eq!(world.state().repository.len(), expected);
}

#[then(regex = r"^the gateway was called (\d+) times$")]
async fn then_gateway_calls(world: &mut TripWorld, expected: usize) {
    assert_eq!(world.state().gateway.calls(), expected);
}

#[then(regex = r#"^the draft suggestions are "([^"]*)"$"#)]
async fn then_draft_suggestions(world: &mut TripWorld, expected: String) {
    assert_eq!(world.editor().draft().ai_suggestions, expected);
}

#[then("the editor is not submitting")]
async fn then_not_submitting(world: &mut TripWorld) {
    assert!(!world.editor().is_submitting());
    assert_eq!(world.editor().phase(), EditorPhase::Idle);
}

#[then(regex = r#"^the mirror titles are "([^"]+)"$"#)]
async fn then_mirror_titles(world: &mut TripWorld, expected: String) {
    let expected: Vec<String> = expected.split(" | ").map(str::to_string).collect();
    assert_eq!(world.state().titles(), expected);
}

#[then("two refetches return the same trips")]
async fn then_refetch_stable(world: &mut TripWorld) {
    let repository = &world.state().repository;
    let first = repository.fetch_all().await.expect("first fetch");
    let second = repository.fetch_all().await.expect("second fetch");
    assert_eq!(first, second);
    assert_eq!(repository.trips(), second);
}

#[tokio::main]
async fn main() {
    TripWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
