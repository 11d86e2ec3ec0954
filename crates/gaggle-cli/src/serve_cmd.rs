use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use gaggle_core::busy::BusySet;
use gaggle_core::itinerary::{DayTabs, ItineraryItem, compute_progress, day_tabs, group_by_day};
use gaggle_core::notice::{Notice, Notices};
use gaggle_core::planner::Planner;
use gaggle_core::sharing::{SharingError, collaborators, invites, share};
use gaggle_core::store::{PgTripStore, TripStore};
use gaggle_core::trip::{self, TripRecord};
use gaggle_db::models::Collaborator;
use gaggle_db::queries::trips as trip_db;

/// Header carrying the acting user's email. The server expects to sit
/// behind a proxy that authenticates the user and sets it.
pub const USER_HEADER: &str = "x-gaggle-user";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
    }
}

impl From<SharingError> for AppError {
    fn from(err: SharingError) -> Self {
        let status = match err {
            SharingError::Database(inner) => return Self::internal(inner),
            SharingError::TripNotFound(_)
            | SharingError::InviteNotFound
            | SharingError::RequestNotFound => StatusCode::NOT_FOUND,
            SharingError::NotOwner | SharingError::Forbidden | SharingError::NotAddressee => {
                StatusCode::FORBIDDEN
            }
            SharingError::InviteExpired => StatusCode::GONE,
            SharingError::InviteClaimed
            | SharingError::DuplicateRequest
            | SharingError::AlreadyAnswered => StatusCode::CONFLICT,
            SharingError::OwnInvite | SharingError::SelfRequest | SharingError::InvalidEmail(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State and extractors
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when no gateway key is configured; chat is then unavailable.
    pub planner: Option<Planner>,
    pub busy: BusySet,
}

impl AppState {
    pub fn new(pool: PgPool, planner: Option<Planner>) -> Self {
        Self {
            pool,
            planner,
            busy: BusySet::new(),
        }
    }

    fn store(&self) -> Arc<dyn TripStore> {
        Arc::new(PgTripStore::new(self.pool.clone()))
    }
}

/// The authenticated user, from [`USER_HEADER`].
pub struct CurrentUser(pub String);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .map(CurrentUser)
            .ok_or_else(|| {
                AppError::new(StatusCode::UNAUTHORIZED, format!("missing {USER_HEADER} header"))
            })
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummaryResponse {
    pub id: Uuid,
    pub location: String,
    pub owner: String,
    pub start_date: chrono::NaiveDate,
    pub end_date: Option<chrono::NaiveDate>,
    pub item_count: usize,
    pub progress: f64,
}

impl From<&TripRecord> for TripSummaryResponse {
    fn from(t: &TripRecord) -> Self {
        Self {
            id: t.id,
            location: t.location.clone(),
            owner: t.owner.clone(),
            start_date: t.dates.from,
            end_date: t.dates.to,
            item_count: t.itinerary.len(),
            progress: compute_progress(&t.completed, t.itinerary.len()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetailResponse {
    #[serde(flatten)]
    pub trip: TripRecord,
    pub duration_days: u32,
    pub tabs: DayTabs,
    pub progress: f64,
}

impl From<TripRecord> for TripDetailResponse {
    fn from(trip: TripRecord) -> Self {
        let duration_days = trip.dates.duration_days();
        let tabs = day_tabs(&group_by_day(&trip.itinerary), duration_days);
        let progress = compute_progress(&trip.completed, trip.itinerary.len());
        Self {
            trip,
            duration_days,
            tabs,
            progress,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub index: usize,
    pub completed: bool,
    pub progress: f64,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: Option<String>,
    pub replaced: bool,
    pub itinerary: Vec<ItineraryItem>,
    pub progress: f64,
    pub notices: Vec<Notice>,
}

/// `?public=false` turns the share link off; the code is kept.
#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    #[serde(default = "default_public")]
    pub public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_code: Option<String>,
    pub is_public: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/trips", get(list_trips))
        .route("/api/trips/{id}", get(get_trip).delete(delete_trip))
        .route("/api/trips/{id}/toggle/{index}", post(toggle_item))
        .route("/api/trips/{id}/chat", post(chat))
        .route("/api/trips/{id}/share", post(share_trip))
        .route("/api/shared/{code}", get(get_shared))
        .route("/api/invites/{code}/claim", post(claim_invite))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    if state.planner.is_none() {
        tracing::warn!("no LLM gateway key configured; chat requests will be refused");
    }
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("gaggle serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("gaggle serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn load(pool: &PgPool, id: Uuid) -> Result<TripRecord, AppError> {
    trip::load_trip(pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("trip {id} not found")))
}

async fn list_trips(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<axum::response::Response, AppError> {
    let trips = trip::list_trips(&state.pool, &user)
        .await
        .map_err(AppError::internal)?;
    let summaries: Vec<TripSummaryResponse> = trips.iter().map(Into::into).collect();
    Ok(Json(summaries).into_response())
}

async fn get_trip(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    collaborators::require_view(&state.pool, id, &user).await?;
    let record = load(&state.pool, id).await?;
    Ok(Json(TripDetailResponse::from(record)).into_response())
}

async fn delete_trip(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let record = load(&state.pool, id).await?;
    if record.owner != user {
        return Err(SharingError::NotOwner.into());
    }
    trip_db::delete_trip(&state.pool, id)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(trip_id = %id, "trip deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn toggle_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<axum::response::Response, AppError> {
    collaborators::require_edit(&state.pool, id, &user).await?;
    let record = load(&state.pool, id).await?;
    if index >= record.itinerary.len() {
        return Err(AppError::bad_request(format!(
            "item {index} out of range (trip has {} items)",
            record.itinerary.len()
        )));
    }

    let mut tracker = record.into_tracker(state.store());
    let mut notices = Notices::new();
    let completed = tracker.toggle(index, &mut notices).await;

    Ok(Json(ToggleResponse {
        index,
        completed,
        progress: tracker.progress(),
        notices: notices.drain(),
    })
    .into_response())
}

async fn chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ChatRequest>,
) -> Result<axum::response::Response, AppError> {
    if body.message.trim().is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }
    let Some(planner) = state.planner.as_ref() else {
        return Err(AppError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "the planner is not configured on this server",
        ));
    };
    collaborators::require_edit(&state.pool, id, &user).await?;

    let Some(_guard) = state.busy.try_begin(id) else {
        return Err(AppError::new(
            StatusCode::CONFLICT,
            "a chat request for this trip is already in progress",
        ));
    };

    let record = load(&state.pool, id).await?;
    let location = record.location.clone();
    let mut tracker = record.into_tracker(state.store());
    let mut notices = Notices::new();
    let outcome = trip::chat_turn(
        &state.pool,
        planner,
        &mut tracker,
        &location,
        &body.message,
        &mut notices,
    )
    .await
    .map_err(AppError::internal)?;

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        replaced: outcome.replaced,
        itinerary: tracker.itinerary().to_vec(),
        progress: tracker.progress(),
        notices: notices.drain(),
    })
    .into_response())
}

async fn share_trip(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ShareQuery>,
) -> Result<axum::response::Response, AppError> {
    let record = share::share_trip(&state.pool, id, &user, query.public).await?;
    Ok(Json(ShareResponse {
        share_code: record.share_code,
        is_public: record.is_public,
    })
    .into_response())
}

async fn get_shared(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let record = share::find_shared(&state.pool, &code)
        .await?
        .ok_or_else(|| AppError::not_found("shared trip not found"))?;
    Ok(Json(TripDetailResponse::from(record)).into_response())
}

async fn claim_invite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(code): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let collaborator: Collaborator = invites::claim_invite(&state.pool, &code, &user).await?;
    Ok(Json(collaborator).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
