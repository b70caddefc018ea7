use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use mealweek_core::plan::{WeekView, project_week};
use mealweek_core::week::{parse_week_start, today};
use mealweek_core::{DayPatch, PlanError, Planner};
use mealweek_db::queries::households;

/// Header carrying the authenticated user, set by the fronting identity layer.
pub const USER_HEADER: &str = "x-user-id";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!("request failed: {err:#}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        if err.is_not_found() {
            Self::not_found(err.to_string())
        } else if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(anyhow::Error::new(err))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error("missing x-user-id header")]
    Missing,
    #[error("x-user-id header is not a valid UUID: {0:?}")]
    Invalid(String),
}

impl From<ActorError> for AppError {
    fn from(err: ActorError) -> Self {
        Self::bad_request(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Extractors and response types
// ---------------------------------------------------------------------------

/// The acting user, taken from the [`USER_HEADER`] header.
pub struct Actor(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .ok_or(ActorError::Missing)?
            .to_str()
            .map_err(|_| ActorError::Invalid("<non-ascii>".to_string()))?;
        let id = Uuid::parse_str(raw.trim()).map_err(|_| ActorError::Invalid(raw.to_string()))?;
        Ok(Actor(id))
    }
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub start: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    #[serde(flatten)]
    pub week: WeekView,
    pub assigned: usize,
    pub regenerated: bool,
}

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    planner: Planner,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pool: PgPool) -> Router {
    let state = AppState {
        planner: Planner::postgres(pool.clone()),
        pool,
    };
    Router::new()
        .route("/api/households/{household_id}/week", get(get_week))
        .route(
            "/api/households/{household_id}/week/generate",
            post(generate_week),
        )
        .route(
            "/api/households/{household_id}/days/{day_id}",
            patch(update_day),
        )
        .route("/api/households/{household_id}/meals", get(list_meals))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, bind: &str, port: u16) -> Result<()> {
    let app = build_router(pool);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("mealweek serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("mealweek serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn ensure_household(pool: &PgPool, household_id: Uuid) -> Result<(), AppError> {
    households::get_household(pool, household_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("household {household_id} not found")))?;
    Ok(())
}

async fn get_week(
    State(state): State<AppState>,
    Path(household_id): Path<Uuid>,
    Actor(actor_id): Actor,
    Query(query): Query<WeekQuery>,
) -> Result<axum::response::Response, AppError> {
    let week_start = parse_week_start(query.start.as_deref(), today())?;
    ensure_household(&state.pool, household_id).await?;

    let week = state
        .planner
        .resolve_week(household_id, actor_id, week_start)
        .await?;
    let catalog = state.planner.catalog(household_id).await?;

    Ok(Json(project_week(&week, &catalog)).into_response())
}

async fn generate_week(
    State(state): State<AppState>,
    Path(household_id): Path<Uuid>,
    Actor(actor_id): Actor,
    Query(query): Query<WeekQuery>,
) -> Result<axum::response::Response, AppError> {
    let week_start = parse_week_start(query.start.as_deref(), today())?;
    ensure_household(&state.pool, household_id).await?;

    let outcome = state
        .planner
        .generate(household_id, actor_id, week_start)
        .await?;
    let catalog = state.planner.catalog(household_id).await?;

    Ok(Json(GenerateResponse {
        week: project_week(&outcome.week, &catalog),
        assigned: outcome.assigned,
        regenerated: outcome.regenerated,
    })
    .into_response())
}

async fn update_day(
    State(state): State<AppState>,
    Path((household_id, day_id)): Path<(Uuid, Uuid)>,
    Actor(actor_id): Actor,
    Json(patch): Json<DayPatch>,
) -> Result<axum::response::Response, AppError> {
    let day = state
        .planner
        .update_day(household_id, actor_id, day_id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found(format!("day {day_id} not found")))?;

    Ok(Json(day).into_response())
}

async fn list_meals(
    State(state): State<AppState>,
    Path(household_id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    ensure_household(&state.pool, household_id).await?;
    let catalog = state.planner.catalog(household_id).await?;
    Ok(Json(catalog).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
