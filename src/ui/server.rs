//! Local web front end driving the form state machine.

use super::state::{
    on_conversion_finished, on_language_change, on_load, on_metadata_loaded, on_submit, Effect,
    Metadata, Phase, SubmitForm, Transition, UiState,
};
use crate::session::Session;
use crate::tts::ConnectionTarget;
use crate::Result;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

const PAGE: &str = include_str!("page.html");
const SESSION_PLACEHOLDER: &str = "{{SESSION_ID}}";

/// How long a page-load session survives without any request touching it.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

const CANCELLED: &str = "conversion was cancelled before it finished";

/// One browser tab: its form state, its server session, and the latest audio.
#[derive(Default)]
struct UiSession {
    state: UiState,
    session: Option<Session>,
    audio: Option<Bytes>,
}

/// Returns a session left in `Submitting` to `Loaded` when the future driving
/// it is dropped, e.g. because the browser gave up on the request.
struct SubmitGuard<'a>(&'a mut UiSession);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.0.state.phase == Phase::Submitting {
            warn!("conversion abandoned before completion");
            let outcome = Err(CANCELLED.to_string());
            self.0.state = on_conversion_finished(&self.0.state, outcome).state;
        }
    }
}

impl UiSession {
    fn session_for(&mut self, target: &ConnectionTarget) -> Result<&mut Session> {
        match &mut self.session {
            Some(session) => {
                session.bind(target)?;
                Ok(session)
            }
            slot => Ok(slot.insert(Session::new(target.clone())?)),
        }
    }

    /// Apply `transition` and run its effects until none remain.
    ///
    /// Cancellation safe: dropping the future never leaves the session in `Submitting`.
    async fn drive(&mut self, transition: Transition) {
        let guard = SubmitGuard(self);
        guard.0.run(transition).await;
    }

    async fn run(&mut self, transition: Transition) {
        self.state = transition.state;
        let mut pending: VecDeque<Effect> = transition.effects.into();
        while let Some(effect) = pending.pop_front() {
            let next = match effect {
                Effect::FetchMetadata(target) => {
                    let outcome = self.fetch_metadata(&target).await;
                    on_metadata_loaded(&self.state, outcome.map_err(|e| e.to_string()))
                }
                Effect::Convert(job) => {
                    let outcome = match self.session_for(&job.connection) {
                        Ok(session) => session.convert(&job).await,
                        Err(e) => Err(e),
                    };
                    let outcome = outcome.map(|conversion| {
                        self.audio = Some(conversion.audio);
                        conversion.path
                    });
                    if let Err(e) = &outcome {
                        warn!(error = %e, "conversion failed");
                    }
                    on_conversion_finished(&self.state, outcome.map_err(|e| e.to_string()))
                }
            };
            self.state = next.state;
            pending.extend(next.effects);
        }
    }

    async fn fetch_metadata(&mut self, target: &ConnectionTarget) -> Result<Metadata> {
        let transport = self.session_for(target)?.transport();
        let models = transport.list_models().await?;
        let speakers = transport.list_speakers().await?;
        Ok(Metadata { models, speakers })
    }
}

struct SessionEntry {
    ui: Arc<Mutex<UiSession>>,
    touched: Instant,
}

/// Shared state of the UI server: one entry per page load, dropped once idle.
#[derive(Clone)]
pub struct UiContext {
    sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    idle_ttl: Duration,
}

impl Default for UiContext {
    fn default() -> Self {
        Self::with_idle_ttl(SESSION_IDLE_TTL)
    }
}

impl UiContext {
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
        }
    }

    async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.touched) < self.idle_ttl);
        if sessions.len() < before {
            debug!(evicted = before - sessions.len(), "dropped idle UI sessions");
        }
        sessions.insert(
            id,
            SessionEntry {
                ui: Arc::new(Mutex::new(UiSession::default())),
                touched: now,
            },
        );
        id
    }

    async fn get(&self, id: &str) -> std::result::Result<Arc<Mutex<UiSession>>, StatusCode> {
        let id = Uuid::parse_str(id).map_err(|_| StatusCode::NOT_FOUND)?;
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
        entry.touched = Instant::now();
        Ok(entry.ui.clone())
    }
}

#[derive(Debug, Deserialize)]
struct LoadPayload {
    host: String,
    port: u16,
}

#[derive(Debug, Deserialize)]
struct LanguagePayload {
    language: String,
}

pub fn router(context: UiContext) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/sessions/:id/load", post(load))
        .route("/api/sessions/:id/language", post(change_language))
        .route("/api/sessions/:id/convert", post(convert))
        .route("/api/sessions/:id/audio", get(audio))
        .with_state(context)
}

/// Bind `addr`, optionally open the browser at it, and serve until the process stops.
pub async fn serve(addr: SocketAddr, open_browser: bool) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let url = format!("http://{}", local);
    info!(%url, "XTTS client UI listening");
    if open_browser {
        if let Err(e) = open::that(&url) {
            warn!(error = %e, %url, "could not open browser");
        }
    }
    axum::serve(listener, router(UiContext::default())).await?;
    Ok(())
}

async fn index(State(context): State<UiContext>) -> Html<String> {
    let id = context.create().await;
    Html(PAGE.replace(SESSION_PLACEHOLDER, &id.to_string()))
}

async fn load(
    State(context): State<UiContext>,
    Path(id): Path<String>,
    Json(payload): Json<LoadPayload>,
) -> std::result::Result<Json<UiState>, StatusCode> {
    let entry = context.get(&id).await?;
    let mut ui = entry.lock().await;
    let transition = on_load(&ui.state, ConnectionTarget::new(payload.host, payload.port));
    ui.drive(transition).await;
    Ok(Json(ui.state.clone()))
}

async fn change_language(
    State(context): State<UiContext>,
    Path(id): Path<String>,
    Json(payload): Json<LanguagePayload>,
) -> std::result::Result<Json<UiState>, StatusCode> {
    let entry = context.get(&id).await?;
    let mut ui = entry.lock().await;
    let transition = on_language_change(&ui.state, &payload.language);
    ui.drive(transition).await;
    Ok(Json(ui.state.clone()))
}

async fn convert(
    State(context): State<UiContext>,
    Path(id): Path<String>,
    Json(form): Json<SubmitForm>,
) -> std::result::Result<Json<UiState>, StatusCode> {
    let entry = context.get(&id).await?;
    let mut ui = entry.lock().await;
    let transition = on_submit(&ui.state, form);
    ui.drive(transition).await;
    Ok(Json(ui.state.clone()))
}

async fn audio(
    State(context): State<UiContext>,
    Path(id): Path<String>,
) -> std::result::Result<Response, StatusCode> {
    let entry = context.get(&id).await?;
    let ui = entry.lock().await;
    let audio = ui.audio.clone().ok_or(StatusCode::NOT_FOUND)?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], audio).into_response())
}
