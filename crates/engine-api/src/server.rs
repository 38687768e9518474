//! HTTP control surface: one live reign behind a mutex, JSON in and out,
//! the shared error envelope on every failure path. The engine core
//! stays free of any network concern; this module only translates.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ApiError, ChoiceSide, DailyChallenge, ErrorCode, GameConfig, GameSnapshot, ReignSummary,
    ResourceKind, TurnResolution, SCHEMA_VERSION_V1,
};
use engine_core::daily;
use engine_core::engine::{EngineError, TurnPhase};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::{CompletedGameRecord, GameApi, PersistenceError, SqliteGameStore};

const DEFAULT_COMPLETED_PAGE: usize = 50;
const MAX_COMPLETED_PAGE: usize = 500;
const DEFAULT_SQLITE_PATH: &str = "kingdom_games.sqlite";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn game_not_found(requested_game_id: &str, active_game_id: Option<&str>) -> Self {
        let details = active_game_id
            .map(|active| format!("requested_game_id={requested_game_id} active_game_id={active}"));
        Self {
            status: StatusCode::NOT_FOUND,
            error: ApiError::new(
                ErrorCode::GameNotFound,
                "game_id does not match an active game",
                details,
            ),
        }
    }

    fn invalid_query(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidQuery, message, details),
        }
    }

    fn from_engine(err: EngineError) -> Self {
        match err {
            EngineError::GameComplete => Self {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    ErrorCode::GameComplete,
                    "game already reached a terminal state",
                    None,
                ),
            },
            EngineError::NoEventAvailable => Self {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    ErrorCode::NoEventAvailable,
                    "no eligible event available this turn",
                    None,
                ),
            },
            EngineError::NoPendingEvent => Self {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new(
                    ErrorCode::InvalidChoice,
                    "no drawn event awaiting a choice",
                    None,
                ),
            },
            EngineError::GameInProgress => Self {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    ErrorCode::InvalidChoice,
                    "game has not reached a terminal state",
                    None,
                ),
            },
        }
    }

    fn from_persistence(err: PersistenceError) -> Self {
        match err {
            PersistenceError::UnsupportedSchema(version) => Self {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    ErrorCode::ContractVersionUnsupported,
                    "persisted game uses an unsupported schema version",
                    Some(format!("schema_version={version}")),
                ),
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::new(
                    ErrorCode::InternalError,
                    "persistence operation failed",
                    Some(other.to_string()),
                ),
            },
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<ServerInner>>,
}

impl AppState {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ServerInner::default())),
        }
    }
}

#[derive(Debug, Default)]
struct ServerInner {
    game: Option<GameApi>,
}

fn require_game<'a>(inner: &'a ServerInner, game_id: &str) -> Result<&'a GameApi, HttpApiError> {
    let Some(game) = inner.game.as_ref() else {
        return Err(HttpApiError::game_not_found(game_id, None));
    };
    if game.game_id() != game_id {
        return Err(HttpApiError::game_not_found(game_id, Some(game.game_id())));
    }
    Ok(game)
}

fn require_game_mut<'a>(
    inner: &'a mut ServerInner,
    game_id: &str,
) -> Result<&'a mut GameApi, HttpApiError> {
    let active_game_id = inner.game.as_ref().map(|game| game.game_id().to_string());
    let Some(game) = inner.game.as_mut() else {
        return Err(HttpApiError::game_not_found(game_id, None));
    };
    if game.game_id() != game_id {
        return Err(HttpApiError::game_not_found(
            game_id,
            active_game_id.as_deref(),
        ));
    }
    Ok(game)
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct CreateGameRequest {
    config: Option<GameConfig>,
    sqlite_path: Option<String>,
    /// Daily challenge date (YYYY-MM-DD); overrides `config` when set.
    daily_date: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateGameResponse {
    schema_version: String,
    game_id: String,
    replaced_existing_game: bool,
    state: GameStateResponse,
}

#[derive(Debug, Serialize)]
struct GameStateResponse {
    schema_version: String,
    game_id: String,
    phase: String,
    pending_event_id: Option<String>,
    snapshot: GameSnapshot,
}

#[derive(Debug, Serialize)]
struct DrawResponse {
    schema_version: String,
    event_id: String,
    tier: contracts::SelectionTier,
    left_text: String,
    right_text: String,
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    side: String,
}

#[derive(Debug, Serialize)]
struct PreviewResponse {
    schema_version: String,
    side: ChoiceSide,
    deltas: Vec<PreviewDelta>,
}

#[derive(Debug, Serialize)]
struct PreviewDelta {
    resource: ResourceKind,
    midpoint: i64,
}

#[derive(Debug, Deserialize)]
struct ChooseRequest {
    side: String,
}

#[derive(Debug, Serialize)]
struct ChooseResponse {
    schema_version: String,
    resolution: TurnResolution,
}

#[derive(Debug, Serialize)]
struct ConcludeResponse {
    schema_version: String,
    summary: ReignSummary,
}

#[derive(Debug, Deserialize)]
struct CompletedQuery {
    sqlite_path: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct CompletedResponse {
    schema_version: String,
    games: Vec<CompletedGameRecord>,
}

#[derive(Debug, Serialize)]
struct DailyResponse {
    schema_version: String,
    challenge: DailyChallenge,
}

fn phase_label(phase: TurnPhase) -> &'static str {
    match phase {
        TurnPhase::AwaitingChoice => "awaiting_choice",
        TurnPhase::Resolving => "resolving",
        TurnPhase::Terminal => "terminal",
    }
}

fn parse_side(raw: &str) -> Result<ChoiceSide, HttpApiError> {
    match raw.trim().to_lowercase().as_str() {
        "left" => Ok(ChoiceSide::Left),
        "right" => Ok(ChoiceSide::Right),
        other => Err(HttpApiError::invalid_query(
            "side must be 'left' or 'right'",
            Some(format!("side={other}")),
        )),
    }
}

fn parse_date_key(raw: &str) -> Result<(u32, u32, u32), HttpApiError> {
    let invalid = || {
        HttpApiError::invalid_query(
            "date must be formatted YYYY-MM-DD",
            Some(format!("date={raw}")),
        )
    };
    let parts: Vec<&str> = raw.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return Err(invalid());
    };
    let year: u32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(invalid());
    }
    Ok((year, month, day))
}

fn state_response(game: &GameApi) -> GameStateResponse {
    GameStateResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        game_id: game.game_id().to_string(),
        phase: phase_label(game.phase()).to_string(),
        pending_event_id: game.pending().map(|pending| pending.event.event_id.clone()),
        snapshot: game.snapshot(),
    }
}

fn default_sqlite_path() -> String {
    std::env::var("KINGDOM_SQLITE_PATH")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string())
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub async fn serve(addr: SocketAddr) -> Result<(), ServerError> {
    let state = AppState::new();
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/games", post(create_game))
        .route("/api/v1/games/completed", get(list_completed))
        .route("/api/v1/games/{game_id}/state", get(get_state))
        .route("/api/v1/games/{game_id}/draw", post(draw_event))
        .route("/api/v1/games/{game_id}/preview", get(preview_choice))
        .route("/api/v1/games/{game_id}/choices", post(submit_choice))
        .route("/api/v1/games/{game_id}/abdicate", post(abdicate_game))
        .route("/api/v1/games/{game_id}/conclude", post(conclude_game))
        .route("/api/v1/daily/{date}", get(get_daily))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, HttpApiError> {
    let mut game = match &request.daily_date {
        Some(date) => {
            let (year, month, day) = parse_date_key(date)?;
            GameApi::from_daily_challenge(&daily::challenge_for_date(year, month, day))
        }
        None => GameApi::from_config(request.config.unwrap_or_default()),
    };

    if let Some(path) = request.sqlite_path.filter(|path| !path.trim().is_empty()) {
        game.attach_sqlite_store(path)
            .map_err(HttpApiError::from_persistence)?;
    }

    let mut inner = state.inner.lock().await;
    let replaced_existing_game = inner.game.is_some();
    let response = CreateGameResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        game_id: game.game_id().to_string(),
        replaced_existing_game,
        state: state_response(&game),
    };
    inner.game = Some(game);
    Ok(Json(response))
}

async fn get_state(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameStateResponse>, HttpApiError> {
    let inner = state.inner.lock().await;
    let game = require_game(&inner, &game_id)?;
    Ok(Json(state_response(game)))
}

async fn draw_event(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<DrawResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let game = require_game_mut(&mut inner, &game_id)?;
    let pending = game.draw_event().map_err(HttpApiError::from_engine)?;
    Ok(Json(DrawResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        event_id: pending.event.event_id,
        tier: pending.tier,
        left_text: pending.event.left.text,
        right_text: pending.event.right.text,
    }))
}

async fn preview_choice(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<PreviewResponse>, HttpApiError> {
    let side = parse_side(&query.side)?;
    let inner = state.inner.lock().await;
    let game = require_game(&inner, &game_id)?;
    let deltas = game.preview(side).map_err(HttpApiError::from_engine)?;
    Ok(Json(PreviewResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        side,
        deltas: deltas
            .into_iter()
            .map(|(resource, midpoint)| PreviewDelta { resource, midpoint })
            .collect(),
    }))
}

async fn submit_choice(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ChooseRequest>,
) -> Result<Json<ChooseResponse>, HttpApiError> {
    let side = parse_side(&request.side)?;
    let mut inner = state.inner.lock().await;
    let game = require_game_mut(&mut inner, &game_id)?;
    let resolution = game.choose(side).map_err(HttpApiError::from_engine)?;
    Ok(Json(ChooseResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        resolution,
    }))
}

async fn abdicate_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameStateResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let game = require_game_mut(&mut inner, &game_id)?;
    game.abdicate().map_err(HttpApiError::from_engine)?;
    Ok(Json(state_response(game)))
}

async fn conclude_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<ConcludeResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let game = require_game_mut(&mut inner, &game_id)?;
    let summary = game.conclude().map_err(HttpApiError::from_engine)?;
    Ok(Json(ConcludeResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        summary,
    }))
}

async fn list_completed(
    Query(query): Query<CompletedQuery>,
) -> Result<Json<CompletedResponse>, HttpApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_COMPLETED_PAGE)
        .max(1)
        .min(MAX_COMPLETED_PAGE);
    let sqlite_path = query
        .sqlite_path
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(default_sqlite_path);

    let store = SqliteGameStore::open(sqlite_path).map_err(HttpApiError::from_persistence)?;
    let games = store
        .list_completed(limit)
        .map_err(HttpApiError::from_persistence)?;
    Ok(Json(CompletedResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        games,
    }))
}

async fn get_daily(Path(date): Path<String>) -> Result<Json<DailyResponse>, HttpApiError> {
    let (year, month, day) = parse_date_key(&date)?;
    Ok(Json(DailyResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        challenge: daily::challenge_for_date(year, month, day),
    }))
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS,PUT,PATCH,DELETE"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}
