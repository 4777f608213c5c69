//! HTTP server for the document chat
//!
//! Serves the chat page and a JSON API over per-session state. Each session
//! sits behind its own mutex, so requests within one session run one at a
//! time while separate sessions proceed independently. Sessions nobody
//! touches for the idle timeout are swept away.

mod error;
pub mod health;
mod page;
pub mod sessions;

pub use error::ApiError;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::Result;
use crate::clipboard::Clipboard;
use crate::completion::CompletionClient;
use crate::config::{DEFAULT_SESSION_IDLE, DEFAULT_SPEECH_CHUNK_SIZE};
use crate::session::SessionState;
use crate::voice::Synthesizer;

/// Shared handle to one session's state
pub type SharedSession = Arc<Mutex<SessionState>>;

/// How often idle sessions are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// In-memory sessions keyed by id
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session and return its id
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(
            id,
            Entry {
                session: Arc::new(Mutex::new(SessionState::new())),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(session = %id, "session created");
        id
    }

    /// Look up a session and mark it as recently used
    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    /// End a session, dropping its history and document
    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "session ended");
        }
        removed
    }

    /// Drop sessions unused for at least `max_idle`
    ///
    /// Sessions a handler still holds are kept. Returns how many were dropped.
    pub async fn expire_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep =
                entry.last_seen.elapsed() < max_idle || Arc::strong_count(&entry.session) > 1;
            if !keep {
                tracing::info!(session = %id, "idle session expired");
            }
            keep
        });
        before - sessions.len()
    }

    /// Periodically expire sessions idle for `max_idle`
    #[must_use]
    pub fn spawn_sweeper(self: &Arc<Self>, max_idle: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let period = SWEEP_INTERVAL.min(max_idle).max(MIN_SWEEP_INTERVAL);
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let expired = store.expire_idle(max_idle).await;
                if expired > 0 {
                    tracing::debug!(expired, "swept idle sessions");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Shared state for API handlers
///
/// Optional collaborators answer 503 when absent.
#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionStore>,
    pub completion: Option<Arc<dyn CompletionClient>>,
    pub synthesizer: Option<Arc<dyn Synthesizer>>,
    pub clipboard: Option<Arc<dyn Clipboard>>,
    /// Characters per synthesized read-aloud chunk
    pub speech_chunk_size: usize,
}

impl ApiState {
    #[must_use]
    pub fn new(completion: Option<Arc<dyn CompletionClient>>) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            completion,
            synthesizer: None,
            clipboard: None,
            speech_chunk_size: DEFAULT_SPEECH_CHUNK_SIZE,
        }
    }

    /// Set the speech synthesizer for read-aloud
    #[must_use]
    pub fn synthesizer(mut self, synthesizer: Option<Arc<dyn Synthesizer>>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Set the clipboard for copy requests
    #[must_use]
    pub fn clipboard(mut self, clipboard: Option<Arc<dyn Clipboard>>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Set the read-aloud chunk size in characters
    #[must_use]
    pub const fn speech_chunk_size(mut self, chunk_size: usize) -> Self {
        self.speech_chunk_size = chunk_size;
        self
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/sessions", sessions::router(state))
        .merge(health::router())
        .merge(page::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    session_idle_timeout: Duration,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            port,
            session_idle_timeout: DEFAULT_SESSION_IDLE,
        }
    }

    /// Drop sessions left untouched for `timeout`
    #[must_use]
    pub const fn session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout = timeout;
        self
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        if self.state.completion.is_none() {
            tracing::warn!("no completion client configured, chat requests will return 503");
        }

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "chat server listening");
        let sweeper = self.state.sessions.spawn_sweeper(self.session_idle_timeout);

        let served = axum::serve(listener, router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")));
        sweeper.abort();

        served
    }
}
