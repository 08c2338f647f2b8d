//! Web chat UI.
//!
//! Serves a single HTML page plus a JSON API. Each browser tab opens its own
//! session; keys, uploads and the transcript live in that session only.

use super::load_prompts;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::HjelperError;
use crate::loader::UploadedFile;
use crate::session::{ChatMessage, Credentials, DefaultServices, Services, SessionInfo, SessionStore};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// Shared application state.
pub struct AppState {
    pub store: SessionStore,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, store: SessionStore) -> Self {
        Self { store, settings }
    }
}

/// Run the web UI server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let prompts = load_prompts(&settings)?;
    let settings = Arc::new(settings);
    let services: Arc<dyn Services> = Arc::new(DefaultServices);
    let store = SessionStore::new(settings.clone(), prompts, services);
    let app = router(Arc::new(AppState::new(settings, store)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Hjelper Web UI");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Chat UI", "GET    /");
    Output::kv("Health", "GET    /health");
    Output::kv("New session", "POST   /api/sessions");
    Output::kv("Credentials", "PUT    /api/sessions/{id}/credentials");
    Output::kv("Uploads", "POST   /api/sessions/{id}/uploads");
    Output::kv("Chat", "POST   /api/sessions/{id}/chat");
    Output::kv("Messages", "GET    /api/sessions/{id}/messages");
    Output::kv("Close", "DELETE /api/sessions/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router for the web UI and its API.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.settings.server.max_upload_mb * 1024 * 1024;

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/credentials", put(set_credentials))
        .route("/api/sessions/{id}/uploads", post(upload_files))
        .route("/api/sessions/{id}/chat", post(chat))
        .route("/api/sessions/{id}/messages", get(messages))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct CredentialsRequest {
    #[serde(default)]
    openai_api_key: String,
    #[serde(default)]
    tavily_api_key: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
    answer: String,
    used_tools: Vec<String>,
}

#[derive(Serialize)]
struct MessagesResponse {
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Library errors rendered as JSON with a matching status code.
struct ApiError(HjelperError);

impl From<HjelperError> for ApiError {
    fn from(e: HjelperError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HjelperError::MissingCredentials(_) => StatusCode::UNAUTHORIZED,
            HjelperError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            HjelperError::InvalidInput(_) | HjelperError::Pdf(_) | HjelperError::Csv(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }

        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// === Handlers ===

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(State(state): State<Arc<AppState>>) -> ApiResult<(StatusCode, Json<SessionInfo>)> {
    let id = state.store.create().await;
    let session = state.store.get(id).await?;
    let info = session.lock().await.info();
    Ok((StatusCode::CREATED, Json(info)))
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<Json<SessionInfo>> {
    let session = state.store.get(id).await?;
    let info = session.lock().await.info();
    Ok(Json(info))
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.store.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_credentials(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<SessionInfo>> {
    let session = state.store.get(id).await?;
    let mut session = session.lock().await;
    session.set_credentials(Credentials::new(req.openai_api_key.trim(), req.tavily_api_key.trim()));
    Ok(Json(session.info()))
}

/// Replace the session's uploads with the files in the form.
///
/// `pdf` fields form the new PDF set; a `csv` field replaces the CSV, and
/// its absence removes it.
async fn upload_files(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<SessionInfo>> {
    let session = state.store.get(id).await?;

    let mut pdfs = Vec::new();
    let mut csv = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HjelperError::InvalidInput(format!("Bad upload: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| HjelperError::InvalidInput(format!("Bad upload: {}", e)))?;

        match field_name.as_str() {
            "pdf" => pdfs.push(UploadedFile::new(file_name, bytes.to_vec())),
            "csv" => csv = Some(UploadedFile::new(file_name, bytes.to_vec())),
            other => {
                return Err(HjelperError::InvalidInput(format!("Unknown upload field: {}", other)).into());
            }
        }
    }

    let mut session = session.lock().await;
    info!("Session {} uploads: {} PDFs, csv={}", id, pdfs.len(), csv.is_some());
    session.set_pdfs(pdfs);
    session.set_csv(csv);
    Ok(Json(session.info()))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let session = state.store.get(id).await?;
    let mut session = session.lock().await;
    let turn = session.ask(&req.question).await?;

    Ok(Json(ChatResponse {
        reply: turn.reply,
        answer: turn.answer,
        used_tools: turn.used_tools,
    }))
}

async fn messages(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<Json<MessagesResponse>> {
    let session = state.store.get(id).await?;
    let messages = session.lock().await.transcript().messages().to_vec();
    Ok(Json(MessagesResponse { messages }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ModelTurn;
    use crate::config::Prompts;
    use crate::session::testing::{settings_in, TestServices};
    use crate::session::MISSING_CREDENTIALS_WARNING;

    async fn spawn(dir: &std::path::Path, turns: Vec<ModelTurn>) -> String {
        let settings = settings_in(dir);
        let store = SessionStore::new(
            settings.clone(),
            Arc::new(Prompts::default()),
            TestServices::new(turns, ""),
        );
        let app = router(Arc::new(AppState::new(settings, store)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn new_session(client: &reqwest::Client, base: &str) -> String {
        let resp = client.post(format!("{}/api/sessions", base)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        let info: serde_json::Value = resp.json().await.unwrap();
        info["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), vec![]).await;

        let page = reqwest::get(format!("{}/", base)).await.unwrap().text().await.unwrap();
        assert!(page.contains("<html"));

        let health: serde_json::Value = reqwest::get(format!("{}/health", base)).await.unwrap().json().await.unwrap();
        assert_eq!(health["status"], "ok");
    }

    #[tokio::test]
    async fn test_chat_without_keys_is_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), vec![]).await;
        let client = reqwest::Client::new();
        let id = new_session(&client, &base).await;

        let resp = client
            .post(format!("{}/api/sessions/{}/chat", base, id))
            .json(&serde_json::json!({ "question": "안녕" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], MISSING_CREDENTIALS_WARNING);
    }

    #[tokio::test]
    async fn test_chat_round_trip_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), vec![ModelTurn::Final("안녕하세요".to_string())]).await;
        let client = reqwest::Client::new();
        let id = new_session(&client, &base).await;

        let resp = client
            .put(format!("{}/api/sessions/{}/credentials", base, id))
            .json(&serde_json::json!({ "openai_api_key": "sk-test", "tavily_api_key": "tvly-test" }))
            .send()
            .await
            .unwrap();
        let info: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(info["credentials_ready"], true);

        let reply: serde_json::Value = client
            .post(format!("{}/api/sessions/{}/chat", base, id))
            .json(&serde_json::json!({ "question": "안녕" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(reply["answer"], "안녕하세요");
        assert_eq!(reply["reply"], " 답변:\n안녕하세요\n\n 사용된 툴: 없음");

        let history: serde_json::Value = client
            .get(format!("{}/api/sessions/{}/messages", base, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let messages = history["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");

        let resp = client.delete(format!("{}/api/sessions/{}", base, id)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
        let resp = client.get(format!("{}/api/sessions/{}", base, id)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_replaces_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), vec![]).await;
        let client = reqwest::Client::new();
        let id = new_session(&client, &base).await;

        let form = reqwest::multipart::Form::new()
            .part("csv", reqwest::multipart::Part::bytes(b"a,b\n1,2\n".to_vec()).file_name("usage.csv"));
        let info: serde_json::Value = client
            .post(format!("{}/api/sessions/{}/uploads", base, id))
            .multipart(form)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(info["csv"], "usage.csv");
        assert_eq!(info["pdfs"].as_array().unwrap().len(), 0);

        let form = reqwest::multipart::Form::new()
            .part("pdf", reqwest::multipart::Part::bytes(b"%PDF".to_vec()).file_name("a.pdf"));
        let info: serde_json::Value = client
            .post(format!("{}/api/sessions/{}/uploads", base, id))
            .multipart(form)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(info["csv"].is_null());
        assert_eq!(info["pdfs"][0], "a.pdf");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), vec![]).await;

        let resp = reqwest::get(format!("{}/api/sessions/{}/messages", base, Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
