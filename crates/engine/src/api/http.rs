//! HTTP routes.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use trionforge_domain::{
    CharacterId, CharacterRecord, EditMode, FieldValue, Identity, SessionId, TriggerCatalogEntry,
    TriggerType, ViolationSet,
};

use crate::app::App;
use crate::infrastructure::ports::{AuthError, RepoError};
use crate::stores::session::SharedSession;
use crate::use_cases::{EditorError, EditorSnapshot};

/// Header carrying the editor session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/sessions", post(open_session).delete(close_session))
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/catalog", get(get_catalog))
        .route("/api/catalog/{trigger_type}", get(get_catalog_type))
        .route("/api/editor", get(get_editor))
        .route("/api/editor/fields", patch(update_field))
        .route("/api/editor/mode", put(set_mode))
        .route("/api/editor/undo", post(undo))
        .route("/api/editor/redo", post(redo))
        .route("/api/editor/reset", post(reset))
        .route(
            "/api/characters",
            get(list_characters).post(save_character),
        )
        .route("/api/characters/{id}/load", post(load_character))
        .route("/api/characters/{id}", delete(delete_character))
}

async fn health() -> &'static str {
    "OK"
}

fn session_id(headers: &HeaderMap) -> Result<SessionId, ApiError> {
    let raw = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {} header", SESSION_HEADER)))?;
    Uuid::parse_str(raw.trim())
        .map(SessionId::from_uuid)
        .map_err(|_| ApiError::BadRequest("Malformed session id".to_string()))
}

fn session_for(app: &App, headers: &HeaderMap) -> Result<SharedSession, ApiError> {
    app.sessions
        .get(session_id(headers)?)
        .ok_or(ApiError::NotFound)
}

// =============================================================================
// Sessions & auth
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionOpened {
    session_id: SessionId,
    editor: EditorSnapshot,
}

async fn open_session(State(app): State<Arc<App>>) -> Result<Json<SessionOpened>, ApiError> {
    let session_id = app.open_session();
    let session = app.sessions.get(session_id).ok_or(ApiError::NotFound)?;
    let editor = session.lock().await.snapshot();
    Ok(Json(SessionOpened { session_id, editor }))
}

async fn close_session(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let session = app
        .sessions
        .remove(session_id(&headers)?)
        .ok_or(ApiError::NotFound)?;
    session.lock().await.sign_out();
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedIn {
    identity: Identity,
    editor: EditorSnapshot,
}

async fn sign_up(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(body): Json<Credentials>,
) -> Result<Json<SignedIn>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    let identity = app
        .use_cases
        .auth
        .sign_up(&mut session, &body.email, &body.password)
        .await?;
    Ok(Json(SignedIn {
        identity,
        editor: session.snapshot(),
    }))
}

async fn sign_in(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(body): Json<Credentials>,
) -> Result<Json<SignedIn>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    let identity = app
        .use_cases
        .auth
        .sign_in(&mut session, &body.email, &body.password)
        .await?;
    Ok(Json(SignedIn {
        identity,
        editor: session.snapshot(),
    }))
}

async fn sign_out(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<EditorSnapshot>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    app.use_cases.auth.sign_out(&mut session);
    Ok(Json(session.snapshot()))
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Serialize)]
struct CategoryInfo {
    #[serde(rename = "type")]
    trigger_type: TriggerType,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    categories: Vec<CategoryInfo>,
    entries: Vec<TriggerCatalogEntry>,
}

async fn get_catalog(State(app): State<Arc<App>>) -> Json<CatalogResponse> {
    let categories = app
        .catalog
        .categories()
        .into_iter()
        .map(|trigger_type| CategoryInfo {
            trigger_type,
            label: trigger_type.label(),
        })
        .collect();
    Json(CatalogResponse {
        categories,
        entries: app.catalog.entries().to_vec(),
    })
}

async fn get_catalog_type(
    State(app): State<Arc<App>>,
    Path(trigger_type): Path<String>,
) -> Result<Json<Vec<TriggerCatalogEntry>>, ApiError> {
    let trigger_type: TriggerType = trigger_type
        .parse()
        .map_err(|e: trionforge_domain::DomainError| ApiError::BadRequest(e.to_string()))?;
    let entries = app
        .catalog
        .entries_of_type(trigger_type)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(entries))
}

// =============================================================================
// Editor
// =============================================================================

async fn get_editor(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<EditorSnapshot>, ApiError> {
    let session = session_for(&app, &headers)?;
    let session = session.lock().await;
    Ok(Json(session.snapshot()))
}

#[derive(Debug, Deserialize)]
struct FieldPatch {
    path: String,
    value: FieldValue,
}

async fn update_field(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(body): Json<FieldPatch>,
) -> Result<Json<EditorSnapshot>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    session.update_path(&body.path, body.value)?;
    Ok(Json(session.snapshot()))
}

#[derive(Debug, Deserialize)]
struct ModeChange {
    mode: EditMode,
}

async fn set_mode(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(body): Json<ModeChange>,
) -> Result<Json<EditorSnapshot>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    session.set_mode(body.mode)?;
    Ok(Json(session.snapshot()))
}

async fn undo(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<EditorSnapshot>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    session.undo();
    Ok(Json(session.snapshot()))
}

async fn redo(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<EditorSnapshot>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    session.redo();
    Ok(Json(session.snapshot()))
}

async fn reset(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<EditorSnapshot>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    session.new_character();
    Ok(Json(session.snapshot()))
}

// =============================================================================
// Characters
// =============================================================================

async fn list_characters(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<Vec<CharacterRecord>>, ApiError> {
    let session = session_for(&app, &headers)?;
    let session = session.lock().await;
    Ok(Json(session.list_saved().await?))
}

async fn save_character(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<CharacterRecord>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    Ok(Json(session.save().await?))
}

async fn load_character(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<EditorSnapshot>, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    session.load(CharacterId::from_uuid(id)).await?;
    Ok(Json(session.snapshot()))
}

async fn delete_character(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = session_for(&app, &headers)?;
    let mut session = session.lock().await;
    session.delete(CharacterId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Unprocessable(ViolationSet),
    Internal(String),
}

#[derive(Serialize)]
struct ViolationBody {
    error: &'static str,
    violations: ViolationSet,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg).into_response(),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            ApiError::Unprocessable(violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ViolationBody {
                    error: "Character cannot be saved",
                    violations,
                }),
            )
                .into_response(),
            ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        tracing::warn!(error = %e, "Storage operation failed");
        ApiError::Internal(e.to_string())
    }
}

impl From<EditorError> for ApiError {
    fn from(e: EditorError) -> Self {
        match e {
            EditorError::NotSignedIn => ApiError::Unauthorized(e.to_string()),
            EditorError::NotVipEligible => ApiError::Forbidden(e.to_string()),
            EditorError::FieldLocked(_) | EditorError::Domain(_) => {
                ApiError::BadRequest(e.to_string())
            }
            EditorError::Invalid(violations) => ApiError::Unprocessable(violations),
            EditorError::CharacterNotFound(_) => ApiError::NotFound,
            EditorError::Repo(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::EmptyEmail | AuthError::EmptySecret => ApiError::BadRequest(e.to_string()),
            AuthError::AlreadyRegistered(_) => ApiError::Conflict(e.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
        }
    }
}
