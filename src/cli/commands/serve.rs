//! HTTP API server for tutoring sessions.
//!
//! Each session owns one [`TutorCoordinator`]. Messages to the same session
//! are handled one at a time.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::coordinator::{SessionState, TutorCoordinator, TutorReply};
use crate::error::LearnieError;
use crate::schema::{Clarification, LearningStyle, QuizAnswer, Subtopic, SubtopicSuggestion};
use crate::tutor::{AgentFactory, TopicPreferences};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

type Session = Arc<Mutex<TutorCoordinator>>;

/// Shared application state.
pub struct AppState {
    factory: AgentFactory,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl AppState {
    pub fn new(factory: AgentFactory) -> Self {
        Self {
            factory,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn session(&self, id: Uuid) -> Option<Session> {
        self.sessions.read().await.get(&id).cloned()
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/messages", post(send_message))
        .route("/sessions/{id}/clarifications", post(ask_clarifications))
        .route("/sessions/{id}/topic", get(get_topic).post(create_topic))
        .route("/sessions/{id}/subtopics", post(add_subtopic))
        .route(
            "/sessions/{id}/subtopics/{parent}/suggestions",
            get(suggest_subtopics),
        )
        .route("/sessions/{id}/progress/{subtopic}", get(get_progress))
        .route("/sessions/{id}/quiz-answers", post(submit_quiz_answers))
        .route("/sessions/{id}/game-score", post(submit_game_score))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Session, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'learnie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let factory = AgentFactory::from_settings(&settings)?;
    let app = router(Arc::new(AppState::new(factory)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Learnie API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Session state", "GET    /sessions/{id}");
    Output::kv("End session", "DELETE /sessions/{id}");
    Output::kv("Send message", "POST   /sessions/{id}/messages");
    Output::kv("Clarify", "POST   /sessions/{id}/clarifications");
    Output::kv("Topic", "GET    /sessions/{id}/topic");
    Output::kv("Plan topic", "POST   /sessions/{id}/topic");
    Output::kv("Add subtopic", "POST   /sessions/{id}/subtopics");
    Output::kv("Suggestions", "GET    /sessions/{id}/subtopics/{parent}/suggestions");
    Output::kv("Progress", "GET    /sessions/{id}/progress/{subtopic}");
    Output::kv("Quiz answers", "POST   /sessions/{id}/quiz-answers");
    Output::kv("Game score", "POST   /sessions/{id}/game-score");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
    state: SessionState,
}

#[derive(Deserialize)]
struct MessageRequest {
    message: String,
}

#[derive(Serialize)]
struct MessageResponse {
    state: SessionState,
    reply: TutorReply,
}

#[derive(Deserialize)]
struct ClarificationRequest {
    request: String,
    /// Questions asked so far, with the learner's answers
    #[serde(default)]
    answered: Vec<Clarification>,
}

#[derive(Serialize)]
struct ClarificationResponse {
    questions: Vec<Clarification>,
}

#[derive(Deserialize)]
struct TopicRequest {
    request: String,
    #[serde(default, rename = "learningStyle")]
    learning_style: Option<LearningStyle>,
    #[serde(default)]
    clarifications: Vec<Clarification>,
}

#[derive(Deserialize)]
struct SubtopicRequest {
    /// Subtopic id ("1.2") or title to deepen
    parent: String,
    context: Option<String>,
}

#[derive(Serialize)]
struct SubtopicResponse {
    id: String,
    subtopic: Subtopic,
}

#[derive(Serialize)]
struct SuggestionsResponse {
    suggestions: Vec<SubtopicSuggestion>,
}

#[derive(Deserialize)]
struct QuizAnswersRequest {
    /// Subtopic id ("1.2") or title
    subtopic: String,
    answers: Vec<QuizAnswer>,
}

#[derive(Deserialize)]
struct GameScoreRequest {
    /// Subtopic id ("1.2") or title
    subtopic: String,
    score: i64,
}

#[derive(Serialize)]
struct GameScoreResponse {
    subtopic: String,
    game_score: u8,
    progress: u8,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn learnie_error(e: LearnieError) -> Response {
    let status = match e {
        LearnieError::SubtopicNotFound(_) => StatusCode::NOT_FOUND,
        LearnieError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LearnieError::GenerationFailed { .. } | LearnieError::Timeout(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

fn session_not_found(id: Uuid) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let id = Uuid::new_v4();
    let coordinator = TutorCoordinator::new(state.factory.clone());
    state
        .sessions
        .write()
        .await
        .insert(id, Arc::new(Mutex::new(coordinator)));

    info!("Created session {}", id);
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: id,
            state: SessionState::AwaitingTopic,
        }),
    )
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.session(id).await {
        Some(session) => Json(SessionResponse {
            session_id: id,
            state: session.lock().await.state(),
        })
        .into_response(),
        None => session_not_found(id),
    }
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            info!("Ended session {}", id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => session_not_found(id),
    }
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let mut tutor = session.lock().await;
    match tutor.handle(&req.message).await {
        Ok(reply) => Json(MessageResponse {
            state: tutor.state(),
            reply,
        })
        .into_response(),
        Err(e) => learnie_error(e),
    }
}

async fn ask_clarifications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ClarificationRequest>,
) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let tutor = session.lock().await;
    match tutor
        .clarification_questions(&req.request, &req.answered)
        .await
    {
        Ok(questions) => Json(ClarificationResponse { questions }).into_response(),
        Err(e) => learnie_error(e),
    }
}

async fn create_topic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TopicRequest>,
) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let preferences = TopicPreferences {
        learning_style: req.learning_style,
        clarifications: req.clarifications,
    };
    let mut tutor = session.lock().await;
    let topic = match tutor.create_topic_with(&req.request, &preferences).await {
        Ok(topic) => topic.clone(),
        Err(e) => return learnie_error(e),
    };
    (
        StatusCode::CREATED,
        Json(MessageResponse {
            state: tutor.state(),
            reply: TutorReply::TopicCreated { topic },
        }),
    )
        .into_response()
}

async fn add_subtopic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubtopicRequest>,
) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let mut tutor = session.lock().await;
    match tutor.add_subtopic(&req.parent, req.context.as_deref()).await {
        Ok((id, subtopic)) => (
            StatusCode::CREATED,
            Json(SubtopicResponse {
                id: id.to_string(),
                subtopic,
            }),
        )
            .into_response(),
        Err(e) => learnie_error(e),
    }
}

async fn suggest_subtopics(
    State(state): State<Arc<AppState>>,
    Path((id, parent)): Path<(Uuid, String)>,
) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let tutor = session.lock().await;
    match tutor.suggest_subtopics(&parent).await {
        Ok(suggestions) => Json(SuggestionsResponse { suggestions }).into_response(),
        Err(e) => learnie_error(e),
    }
}

async fn get_topic(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let tutor = session.lock().await;
    match tutor.topic() {
        Some(topic) => Json(topic.clone()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "This session has no topic yet"),
    }
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path((id, subtopic)): Path<(Uuid, String)>,
) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let tutor = session.lock().await;
    match tutor.resolve(&subtopic) {
        Ok(subtopic) => Json(tutor.progress().report(subtopic)).into_response(),
        Err(e) => learnie_error(e),
    }
}

async fn submit_quiz_answers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<QuizAnswersRequest>,
) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let mut tutor = session.lock().await;
    let result = tutor
        .resolve(&req.subtopic)
        .and_then(|subtopic| tutor.record_quiz_answers(subtopic, &req.answers));
    match result {
        Ok(result) => Json(result).into_response(),
        Err(e) => learnie_error(e),
    }
}

async fn submit_game_score(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<GameScoreRequest>,
) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let mut tutor = session.lock().await;
    let result = tutor.resolve(&req.subtopic).and_then(|subtopic| {
        let game_score = tutor.record_game_score(subtopic, req.score)?;
        let progress = tutor.report_progress(subtopic)?;
        Ok(GameScoreResponse {
            subtopic: subtopic.to_string(),
            game_score,
            progress,
        })
    });
    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => learnie_error(e),
    }
}
