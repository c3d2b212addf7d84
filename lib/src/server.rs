//! HTTP endpoints for progress persistence and content lookup.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::accounts::{AccountStore, UpsertProgress};
use crate::api::{
    UpdateProgressResponse, GET_CONTENT_PATH, GET_PROGRESS_PATH, UPDATE_PROGRESS_PATH,
};
use crate::cms::ContentStore;
use crate::error::{Error, Result};
use crate::progress::CompletionMap;
use crate::session::UserDetail;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    /// `None` when the content store is not configured; content requests
    /// then fail with a 500.
    pub content: Option<Arc<dyn ContentStore>>,
}

impl AppState {
    pub fn new(accounts: Arc<dyn AccountStore>, content: Option<Arc<dyn ContentStore>>) -> Self {
        Self { accounts, content }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            GET_PROGRESS_PATH,
            get(get_progress).fallback(method_not_allowed),
        )
        .route(
            UPDATE_PROGRESS_PATH,
            post(update_progress).fallback(method_not_allowed),
        )
        .route(
            GET_CONTENT_PATH,
            get(get_content).fallback(method_not_allowed),
        )
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    info!("Starting HTTP server on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state)).await?;

    Ok(())
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal_error(err: &Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal server error",
            "message": err.to_string(),
        })),
    )
        .into_response()
}

/// The user comes from the query, either JSON-encoded (`user={...}`) or in
/// bracket form (`user[email]=...`), or else from a JSON body.
fn user_from_request(query: &HashMap<String, String>, body: &[u8]) -> Option<UserDetail> {
    if let Some(raw) = query.get("user") {
        return serde_json::from_str(raw).ok();
    }

    if query.keys().any(|key| key.starts_with("user[")) {
        return Some(UserDetail {
            name: query.get("user[name]").cloned(),
            image: query.get("user[image]").cloned(),
            email: query.get("user[email]").cloned(),
        });
    }

    #[derive(Deserialize)]
    struct Body {
        user: Option<UserDetail>,
    }

    serde_json::from_slice::<Body>(body)
        .ok()
        .and_then(|body| body.user)
}

async fn get_progress(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let user = user_from_request(&query, &body);
    let Some(email) = user.as_ref().and_then(UserDetail::email) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid request: user email is required",
        );
    };

    match state.accounts.find_progress(email).await {
        Ok(progress) => (
            StatusCode::OK,
            Json(json!({ "progress": progress.unwrap_or_default() })),
        )
            .into_response(),
        Err(err) => {
            error!("Error in get-progress API: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[derive(Deserialize)]
struct RawUpdate {
    user: Option<UserDetail>,
    progress: Option<CompletionMap>,
}

/// Validates every record before anything is written, so one bad record
/// rejects the whole batch.
fn prepare_upserts(updates: Vec<Value>) -> Result<Vec<UpsertProgress>> {
    updates
        .into_iter()
        .map(|update| {
            let update: RawUpdate = serde_json::from_value(update)?;
            let email = update
                .user
                .as_ref()
                .and_then(UserDetail::email)
                .ok_or(Error::MissingEmail)?
                .to_owned();

            Ok(UpsertProgress::new(email, &update.progress.unwrap_or_default()))
        })
        .collect()
}

async fn update_progress(State(state): State<AppState>, body: Bytes) -> Response {
    let updates = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|mut body| body.get_mut("updates").map(Value::take));

    let updates = match updates {
        Some(Value::Array(updates)) if !updates.is_empty() => updates,
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid request: updates array is required",
            )
        }
    };

    let result = match prepare_upserts(updates) {
        Ok(operations) => state.accounts.bulk_upsert(operations).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(result) => (
            StatusCode::OK,
            Json(UpdateProgressResponse {
                success: true,
                modified: result.modified,
                inserted: result.inserted,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Error in update-progress API: {err}");
            internal_error(&err)
        }
    }
}

#[derive(Deserialize, Debug)]
struct ContentQuery {
    id: Option<String>,
    #[serde(rename = "type")]
    content_type: Option<String>,
    slug: Option<String>,
}

async fn get_content(State(state): State<AppState>, Query(query): Query<ContentQuery>) -> Response {
    let Some(content) = state.content.as_ref() else {
        let err = Error::Config("Contentful environment variables are not set".to_owned());
        error!("Error in get-content API: {err}");
        return internal_error(&err);
    };

    let id = query.id.as_deref().filter(|id| !id.is_empty());
    let content_type = query.content_type.as_deref().filter(|t| !t.is_empty());
    let slug = query.slug.as_deref().filter(|slug| !slug.is_empty());

    let result = match (id, content_type) {
        (Some(id), _) => content.get_entry(id).await,
        (None, Some(content_type)) => match slug {
            Some(slug) => match content.get_entries(content_type, Some(slug)).await {
                Ok(entries) => match find_by_slug(&entries, slug) {
                    Some(entry) => Ok(entry),
                    None => {
                        return error_response(
                            StatusCode::NOT_FOUND,
                            &format!("Entry with slug '{slug}' not found"),
                        )
                    }
                },
                Err(err) => Err(err),
            },
            None => content.get_entries(content_type, None).await,
        },
        (None, None) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Missing required parameters: type, id, or slug",
            )
        }
    };

    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(Error::NotFound) => error_response(StatusCode::NOT_FOUND, "Content not found"),
        Err(err) => {
            error!("Error in get-content API: {err}");
            internal_error(&err)
        }
    }
}

fn find_by_slug(entries: &Value, slug: &str) -> Option<Value> {
    entries
        .get("items")?
        .as_array()?
        .iter()
        .find(|item| item.pointer("/fields/slug").and_then(Value::as_str) == Some(slug))
        .cloned()
}
