//! Application state shared between a presentation layer and the lookup pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    client::WeatherClient,
    error::{HistoryError, LookupError},
    history::{HistoryList, HistoryStore},
    model::WeatherSnapshot,
};

/// Everything a renderer needs, passed around explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Text of the most recent search, trimmed.
    pub query: String,
    pub history: HistoryList,
    /// Result of the most recent successful search, cleared on failure.
    pub snapshot: Option<WeatherSnapshot>,
    pub last_error: Option<String>,
}

/// Runs searches and keeps [`AppState`] consistent with the latest one.
///
/// Starting a search cancels whichever search is still in flight, and a result
/// is only applied if no newer search was started in the meantime.
#[derive(Debug)]
pub struct WeatherApp {
    client: WeatherClient,
    store: HistoryStore,
    state: Mutex<AppState>,
    generation: AtomicU64,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl WeatherApp {
    /// Build the app, loading history from `store`.
    pub fn new(client: WeatherClient, store: HistoryStore) -> Self {
        let history = store.load();
        Self {
            client,
            store,
            state: Mutex::new(AppState { history, ..Default::default() }),
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    pub async fn search(&self, city: &str) -> Result<WeatherSnapshot, LookupError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        self.state.lock().await.query = city.trim().to_string();

        let result = self.client.lookup_with_cancel(city, &token).await;

        let mut state = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "dropping result of superseded search");
            return Err(LookupError::Cancelled);
        }

        match &result {
            Ok(snapshot) => {
                state.history = std::mem::take(&mut state.history).record(&snapshot.location.name);
                self.persist(&state.history);
                state.snapshot = Some(snapshot.clone());
                state.last_error = None;
            }
            Err(LookupError::Cancelled) => {}
            Err(e) => {
                tracing::info!(kind = %e.kind(), "search failed: {e}");
                state.snapshot = None;
                state.last_error = Some(e.user_message());
            }
        }

        result
    }

    pub async fn state(&self) -> AppState {
        self.state.lock().await.clone()
    }

    pub async fn history(&self) -> HistoryList {
        self.state.lock().await.history.clone()
    }

    pub async fn clear_history(&self) -> Result<(), HistoryError> {
        let mut state = self.state.lock().await;
        state.history.clear();
        self.store.save(&state.history)
    }

    /// Flush history one last time before exit.
    pub async fn shutdown(&self) -> Result<(), HistoryError> {
        if let Some(token) = self.in_flight.lock().await.take() {
            token.cancel();
        }
        let state = self.state.lock().await;
        self.store.save(&state.history)
    }

    fn persist(&self, history: &HistoryList) {
        if let Err(e) = self.store.save(history) {
            tracing::warn!("search history not saved: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;

    use super::*;
    use crate::provider::fake::{FakeProvider, Mode};

    fn app_with(fake: FakeProvider, dir: &tempfile::TempDir) -> WeatherApp {
        let store = HistoryStore::new(dir.path().join("history.json"));
        WeatherApp::new(WeatherClient::new(Arc::new(fake)), store)
    }

    #[tokio::test]
    async fn success_records_resolved_name_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(FakeProvider::default(), &dir);

        app.search(" Hangzhou ").await.unwrap();

        let state = app.state().await;
        assert_eq!(state.query, "Hangzhou");
        assert_eq!(state.history.as_slice(), ["Hangzhou"]);
        assert!(state.snapshot.is_some());
        assert!(state.last_error.is_none());

        let reloaded = HistoryStore::new(dir.path().join("history.json")).load();
        assert_eq!(reloaded, state.history);
    }

    #[tokio::test]
    async fn failure_leaves_history_alone() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(FakeProvider { geocode: Mode::Empty, ..Default::default() }, &dir);

        let err = app.search("Nonexistentville").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CityNotFound);

        let state = app.state().await;
        assert!(state.history.is_empty());
        assert!(state.snapshot.is_none());
        assert!(state.last_error.unwrap().contains("Nonexistentville"));
        assert!(!dir.path().join("history.json").exists());
    }

    #[tokio::test]
    async fn history_is_loaded_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.save(&HistoryList::new().record("Oslo")).unwrap();

        let app = app_with(FakeProvider::default(), &dir);
        assert_eq!(app.history().await.as_slice(), ["Oslo"]);
    }

    #[tokio::test]
    async fn newer_search_supersedes_older_one() {
        let dir = tempfile::tempdir().unwrap();
        let started = Arc::new(Notify::new());
        let app = app_with(
            FakeProvider { hang_on: Some(("Slow".into(), started.clone())), ..Default::default() },
            &dir,
        );

        let (slow, fast) = tokio::join!(app.search("Slow"), async {
            started.notified().await;
            app.search("Fast").await
        });

        assert_eq!(slow, Err(LookupError::Cancelled));
        assert_eq!(fast.unwrap().location.name, "Fast");

        let state = app.state().await;
        assert_eq!(state.query, "Fast");
        assert_eq!(state.history.as_slice(), ["Fast"]);
        assert_eq!(state.snapshot.unwrap().location.name, "Fast");
    }

    #[tokio::test]
    async fn clear_and_shutdown_persist_history() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(FakeProvider::default(), &dir);
        app.search("Rome").await.unwrap();

        app.clear_history().await.unwrap();
        app.shutdown().await.unwrap();

        let reloaded = HistoryStore::new(dir.path().join("history.json")).load();
        assert!(reloaded.is_empty());
    }
}
