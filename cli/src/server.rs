use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use crate::page;
use frond_core::catalog::{find_plant, group_by_category};
use frond_core::models::Plant;
use frond_core::schedule::ScheduleView;
use frond_core::service::{ScheduleService, WateringStore};
use frond_core::settings::{Settings, SettingsService};

/// Shared state behind every route: the catalog (parsed once at startup),
/// the schedule service, and the settings service. Plants never change
/// while the server runs, so only the settings need a lock; nothing
/// awaits while holding it.
pub struct AppState<S> {
    plants: Arc<Vec<Plant>>,
    service: Arc<ScheduleService<S>>,
    settings: Arc<Mutex<SettingsService>>,
}

impl<S> AppState<S> {
    pub fn new(plants: Vec<Plant>, service: ScheduleService<S>, settings: SettingsService) -> Self {
        Self {
            plants: Arc::new(plants),
            service: Arc::new(service),
            settings: Arc::new(Mutex::new(settings)),
        }
    }
}

// derive(Clone) would demand S: Clone, which the stores don't implement.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            plants: Arc::clone(&self.plants),
            service: Arc::clone(&self.service),
            settings: Arc::clone(&self.settings),
        }
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct SetIntervalRequest {
    interval_days: i64,
}

#[derive(Deserialize)]
struct UpdateSettingsRequest {
    cute_mode: bool,
}

#[derive(Serialize)]
struct CategoryGroup {
    category: String,
    plants: Vec<Plant>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// A schedule mutation failed. The outer message is the action's
    /// user-facing string ("Failed to mark watered" and friends), so it
    /// goes in the body; the cause chain is only logged.
    Action(anyhow::Error),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Action(err) => {
                eprintln!("Action failed: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            Self::Internal(err) => {
                eprintln!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn require_plant<'a>(plants: &'a [Plant], name: &str) -> Result<&'a Plant, ApiError> {
    find_plant(plants, name)
        .ok_or_else(|| ApiError::NotFound(format!("No plant named '{name}' in the catalog")))
}

// --- Handlers ---

async fn index<S: WateringStore + 'static>(State(state): State<AppState<S>>) -> Html<String> {
    let now = Utc::now();
    let states = state.service.load_all(&state.plants).await;
    let views: Vec<ScheduleView> = state
        .plants
        .iter()
        .zip(&states)
        .map(|(plant, schedule)| ScheduleView::build(schedule, &plant.notes, now))
        .collect();

    let cute_mode = {
        let settings = state
            .settings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        settings.cute_mode()
    };

    Html(page::render(
        &state.plants,
        &views,
        state.service.available(),
        cute_mode,
    ))
}

async fn list_plants<S: WateringStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<Vec<CategoryGroup>> {
    let groups = group_by_category(&state.plants)
        .into_iter()
        .map(|(category, plants)| CategoryGroup { category, plants })
        .collect();
    Json(groups)
}

async fn list_waterings<S: WateringStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<Vec<ScheduleView>> {
    if !state.service.available() {
        return Json(Vec::new());
    }
    let now = Utc::now();
    let states = state.service.load_all(&state.plants).await;
    let views = state
        .plants
        .iter()
        .zip(&states)
        .map(|(plant, schedule)| ScheduleView::build(schedule, &plant.notes, now))
        .collect();
    Json(views)
}

async fn get_watering<S: WateringStore + 'static>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> Result<Json<ScheduleView>, ApiError> {
    let plant = require_plant(&state.plants, &name)?;
    let schedule = state.service.load(&plant.name, &plant.category).await;
    Ok(Json(ScheduleView::build(&schedule, &plant.notes, Utc::now())))
}

async fn set_interval<S: WateringStore + 'static>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
    Json(req): Json<SetIntervalRequest>,
) -> Result<Json<ScheduleView>, ApiError> {
    if req.interval_days <= 0 {
        return Err(ApiError::BadRequest(
            "interval_days must be greater than 0".to_string(),
        ));
    }
    let plant = require_plant(&state.plants, &name)?;
    let current = state.service.load(&plant.name, &plant.category).await;
    let updated = state
        .service
        .set_interval(&current, req.interval_days)
        .await
        .map_err(ApiError::Action)?;
    Ok(Json(ScheduleView::build(&updated, &plant.notes, Utc::now())))
}

async fn mark_watered<S: WateringStore + 'static>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> Result<Json<ScheduleView>, ApiError> {
    let plant = require_plant(&state.plants, &name)?;
    let current = state.service.load(&plant.name, &plant.category).await;
    let updated = state
        .service
        .mark_watered(&current)
        .await
        .map_err(ApiError::Action)?;
    Ok(Json(ScheduleView::build(&updated, &plant.notes, Utc::now())))
}

async fn snooze<S: WateringStore + 'static>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> Result<Json<ScheduleView>, ApiError> {
    let plant = require_plant(&state.plants, &name)?;
    let current = state.service.load(&plant.name, &plant.category).await;
    let updated = state
        .service
        .snooze(&current)
        .await
        .map_err(ApiError::Action)?;
    Ok(Json(ScheduleView::build(&updated, &plant.notes, Utc::now())))
}

async fn get_settings<S: WateringStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<Settings> {
    let settings = state
        .settings
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Json(settings.settings())
}

async fn update_settings<S: WateringStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<Settings>, ApiError> {
    let mut settings = state
        .settings
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    settings.set_cute_mode(req.cute_mode)?;
    Ok(Json(settings.settings()))
}

// --- Router builder ---

fn build_router<S: WateringStore + 'static>(
    state: AppState<S>,
    images_dir: std::path::PathBuf,
) -> Router {
    Router::new()
        .route("/", get(index::<S>))
        .route("/api/plants", get(list_plants::<S>))
        .route("/api/waterings", get(list_waterings::<S>))
        .route("/api/waterings/{plant}", get(get_watering::<S>))
        .route("/api/waterings/{plant}/interval", put(set_interval::<S>))
        .route("/api/waterings/{plant}/water", post(mark_watered::<S>))
        .route("/api/waterings/{plant}/snooze", post(snooze::<S>))
        .route(
            "/api/settings",
            get(get_settings::<S>).put(update_settings::<S>),
        )
        .nest_service("/plants", ServeDir::new(images_dir))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server<S: WateringStore + 'static>(
    state: AppState<S>,
    bind: &str,
    port: u16,
    images_dir: std::path::PathBuf,
) -> anyhow::Result<()> {
    if state.plants.is_empty() {
        eprintln!("Warning: the catalog is empty; the page will have nothing to show");
    }
    if !state.service.available() {
        eprintln!(
            "Warning: watering store not configured (set SUPABASE_URL and SUPABASE_ANON_KEY); \
             schedule controls are disabled"
        );
    }
    if !images_dir.is_dir() {
        eprintln!(
            "Note: image directory '{}' not found; cards fall back to the leaf glyph",
            images_dir.display()
        );
    }

    let app = build_router(state, images_dir);

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {bind}:{port}"))?;
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
