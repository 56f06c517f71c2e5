// Clinic Map - API Server
// Local JSON API over a single Dashboard, for a browser map front end

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use clinic_map::{
    is_valid_font_size, logging, AppConfig, ClinicRegistry, ConusProjection, Dashboard,
    DragOutcome, ExportOptions, FilterSelection, LabelEdit, LabelOverride, LabelStats, LabelView,
    ListEntry, Notice, Region, SqliteStorage, UploadMode,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;

/// How often the debounced settings writer is polled
const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Shared application state
#[derive(Clone)]
struct AppState {
    dashboard: Arc<Mutex<Dashboard>>,
}

impl AppState {
    /// A poisoned lock still holds a usable dashboard
    fn lock(&self) -> MutexGuard<'_, Dashboard> {
        self.dashboard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notices: Vec<Notice>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
            notices: Vec::new(),
        }
    }

    fn with_notices(mut self, notices: Vec<Notice>) -> Self {
        self.notices = notices;
        self
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse {
            success: false,
            data: (),
            error: Some(message.into()),
            notices: Vec::new(),
        }),
    )
        .into_response()
}

/// Dashboard snapshot returned after every mutation
#[derive(Serialize)]
struct StateResponse {
    stats: LabelStats,
    filter: FilterSelection,
    selected: Option<String>,
    search: String,
    upload_mode: UploadMode,
    pending_write: bool,
}

#[derive(Serialize)]
struct RegionResponse {
    region: Region,
    name: &'static str,
    color: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct RegionGroupResponse {
    region: Region,
    clinics: Vec<ListEntry>,
}

fn snapshot(dashboard: &Dashboard) -> StateResponse {
    StateResponse {
        stats: dashboard.stats(),
        filter: *dashboard.filter(),
        selected: dashboard.selected().map(str::to_string),
        search: dashboard.search_query().to_string(),
        upload_mode: dashboard.upload_mode(),
        pending_write: dashboard.has_pending_write(),
    }
}

fn state_reply(mut dashboard: MutexGuard<'_, Dashboard>) -> Response {
    let notices = dashboard.take_notices();
    Json(ApiResponse::ok(snapshot(&dashboard)).with_notices(notices)).into_response()
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Deserialize)]
struct FilterRequest {
    /// YYYY-MM-DD; empty or missing clears
    #[serde(default)]
    date_from: Option<String>,
    #[serde(default)]
    date_to: Option<String>,
    #[serde(default)]
    recent_n: Option<i64>,
}

#[derive(Deserialize)]
struct SelectRequest {
    name: Option<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

#[derive(Deserialize)]
struct UploadRequest {
    csv: String,
    #[serde(default)]
    mode: Option<UploadMode>,
}

#[derive(Deserialize)]
struct FontStepRequest {
    up: bool,
}

#[derive(Deserialize)]
struct GlobalFontRequest {
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    up: Option<bool>,
}

#[derive(Deserialize)]
struct DragDelta {
    dx: f64,
    dy: f64,
}

#[derive(Deserialize)]
struct SceneQuery {
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

fn parse_input_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => clinic_map::from_input_date(text)
            .map(Some)
            .ok_or_else(|| format!("{} must be YYYY-MM-DD", field)),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/state - Stats, filters and UI state
async fn get_state(State(state): State<AppState>) -> Response {
    state_reply(state.lock())
}

/// GET /api/clinics - Region-grouped clinic list (honours search)
async fn get_clinics(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.lock();
    let groups: Vec<RegionGroupResponse> = dashboard
        .list()
        .into_iter()
        .map(|(region, clinics)| RegionGroupResponse { region, clinics })
        .collect();
    Json(ApiResponse::ok(groups))
}

/// GET /api/regions - Clinic counts per region with legend colours
async fn get_regions(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.lock();
    let regions: Vec<RegionResponse> = dashboard
        .region_counts()
        .into_iter()
        .map(|(region, count)| RegionResponse {
            region,
            name: region.as_str(),
            color: region.color(),
            count,
        })
        .collect();
    Json(ApiResponse::ok(regions))
}

/// GET /api/scene?width=&height= - Drawable dots and labels
async fn get_scene(
    State(state): State<AppState>,
    Query(query): Query<SceneQuery>,
) -> impl IntoResponse {
    let defaults = ConusProjection::default();
    let projection = ConusProjection::new(
        query.width.unwrap_or(defaults.width),
        query.height.unwrap_or(defaults.height),
    );
    let views: Vec<LabelView> = state.lock().scene(&projection);
    Json(ApiResponse::ok(views))
}

/// GET /api/export-options - Raster export parameters
async fn get_export_options() -> impl IntoResponse {
    Json(ApiResponse::ok(ExportOptions::default()))
}

/// POST /api/filter - Replace the label filter
async fn set_filter(State(state): State<AppState>, Json(body): Json<FilterRequest>) -> Response {
    let date_from = match parse_input_date("date_from", body.date_from.as_deref()) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };
    let date_to = match parse_input_date("date_to", body.date_to.as_deref()) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };

    let mut dashboard = state.lock();
    dashboard.set_filter(FilterSelection {
        date_from,
        date_to,
        recent_n: body.recent_n,
    });
    state_reply(dashboard)
}

/// POST /api/filter/clear
async fn clear_filter(State(state): State<AppState>) -> Response {
    let mut dashboard = state.lock();
    dashboard.clear_filters();
    state_reply(dashboard)
}

/// POST /api/select
async fn select_clinic(State(state): State<AppState>, Json(body): Json<SelectRequest>) -> Response {
    let mut dashboard = state.lock();
    dashboard.select_clinic(body.name.as_deref());
    state_reply(dashboard)
}

/// POST /api/search
async fn set_search(State(state): State<AppState>, Json(body): Json<SearchRequest>) -> Response {
    let mut dashboard = state.lock();
    dashboard.set_search(&body.query);
    state_reply(dashboard)
}

/// POST /api/clinics/upload - Load clinics from CSV text
async fn upload_clinics(State(state): State<AppState>, Json(body): Json<UploadRequest>) -> Response {
    let mut dashboard = state.lock();
    if let Some(mode) = body.mode {
        dashboard.set_upload_mode(mode);
    }
    dashboard.upload_csv(&body.csv);
    state_reply(dashboard)
}

/// GET /api/labels - Current label settings
async fn get_labels(State(state): State<AppState>) -> impl IntoResponse {
    let settings = state.lock().settings().clone();
    Json(ApiResponse::ok(settings))
}

/// POST /api/labels/:name/offset - Patch offset / font size
async fn patch_offset(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(patch): Json<LabelOverride>,
) -> Response {
    if patch.fs.is_some_and(|fs| !is_valid_font_size(fs)) {
        return bad_request("fs must be a positive number");
    }
    let mut dashboard = state.lock();
    dashboard.handle_offset_change(&name, patch);
    state_reply(dashboard)
}

/// POST /api/labels/:name/edit - {"field": "...", "value": ...}
async fn edit_label(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(edit): Json<LabelEdit>,
) -> Response {
    if let LabelEdit::FontSize(fs) = edit {
        if !is_valid_font_size(fs) {
            return bad_request("font size must be a positive number");
        }
    }
    let mut dashboard = state.lock();
    dashboard.handle_label_change(&name, &edit);
    state_reply(dashboard)
}

/// POST /api/labels/:name/font-step
async fn step_font(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<FontStepRequest>,
) -> Response {
    let mut dashboard = state.lock();
    dashboard.step_font_size(&name, body.up);
    state_reply(dashboard)
}

/// POST /api/labels/:name/reset
async fn reset_label(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let mut dashboard = state.lock();
    dashboard.reset_label(&name);
    state_reply(dashboard)
}

/// POST /api/labels/:name/drag/start
async fn drag_start(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let mut dashboard = state.lock();
    if !dashboard.begin_drag(&name) {
        return bad_request(format!("unknown clinic: {}", name));
    }
    state_reply(dashboard)
}

/// POST /api/drag/move - Returns the working offset
async fn drag_move(State(state): State<AppState>, Json(delta): Json<DragDelta>) -> Response {
    match state.lock().drag_by(delta.dx, delta.dy) {
        Some(offset) => Json(ApiResponse::ok(offset)).into_response(),
        None => bad_request("no drag in progress"),
    }
}

/// POST /api/drag/end
async fn drag_end(State(state): State<AppState>) -> impl IntoResponse {
    let outcome: DragOutcome = state.lock().end_drag();
    Json(ApiResponse::ok(outcome))
}

/// POST /api/font - {"size": 16} or {"up": true}
async fn global_font(State(state): State<AppState>, Json(body): Json<GlobalFontRequest>) -> Response {
    let mut dashboard = state.lock();
    match (body.size, body.up) {
        (Some(size), _) if is_valid_font_size(size) => {
            dashboard.set_global_font_size(size);
        }
        (Some(_), _) => return bad_request("size must be a positive number"),
        (None, Some(up)) => {
            dashboard.step_global_font_size(up);
        }
        (None, None) => return bad_request("expected size or up"),
    }
    state_reply(dashboard)
}

/// GET /api/settings/export - Settings document as a download
async fn export_settings(State(state): State<AppState>) -> Response {
    match state.lock().export_settings() {
        Some(json) => (
            [
                ("content-type", "application/json".to_string()),
                (
                    "content-disposition",
                    format!("attachment; filename=\"{}\"", clinic_map::SETTINGS_FILE_NAME),
                ),
            ],
            json,
        )
            .into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "export failed").into_response(),
    }
}

/// POST /api/settings/import - Merge a settings document
async fn import_settings(State(state): State<AppState>, Json(value): Json<serde_json::Value>) -> Response {
    let mut dashboard = state.lock();
    if dashboard.import_settings_value(value) {
        state_reply(dashboard)
    } else {
        let notices = dashboard.take_notices();
        let reason = notices
            .iter()
            .find_map(|n| match n {
                Notice::SettingsRejected { reason } => Some(reason.clone()),
                _ => None,
            })
            .unwrap_or_else(|| "invalid settings".to_string());
        bad_request(reason)
    }
}

/// POST /api/reset - Labels, clinics and filters back to defaults
async fn reset_everything(State(state): State<AppState>) -> Response {
    let mut dashboard = state.lock();
    dashboard.reset_everything();
    state_reply(dashboard)
}

fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/state", get(get_state))
        .route("/clinics", get(get_clinics))
        .route("/clinics/upload", post(upload_clinics))
        .route("/regions", get(get_regions))
        .route("/scene", get(get_scene))
        .route("/export-options", get(get_export_options))
        .route("/filter", post(set_filter))
        .route("/filter/clear", post(clear_filter))
        .route("/select", post(select_clinic))
        .route("/search", post(set_search))
        .route("/labels", get(get_labels))
        .route("/labels/:name/offset", post(patch_offset))
        .route("/labels/:name/edit", post(edit_label))
        .route("/labels/:name/font-step", post(step_font))
        .route("/labels/:name/reset", post(reset_label))
        .route("/labels/:name/drag/start", post(drag_start))
        .route("/drag/move", post(drag_move))
        .route("/drag/end", post(drag_end))
        .route("/font", post(global_font))
        .route("/settings/export", get(export_settings))
        .route("/settings/import", post(import_settings))
        .route("/reset", post(reset_everything))
        .with_state(state)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    println!("🌐 Clinic Map - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let args: Vec<String> = std::env::args().collect();
    let config = AppConfig::from_args(&args)?;

    let storage = SqliteStorage::open(&config.db_path)?;
    println!("✓ Settings database opened: {:?}", config.db_path);

    let registry = match &config.csv_path {
        Some(path) => {
            let mut registry = ClinicRegistry::new();
            registry.load(clinic_map::load_clinics_csv(path)?, config.upload_mode);
            registry
        }
        None => ClinicRegistry::new(),
    };
    println!("✓ {} clinics loaded", registry.count());

    let mut dashboard = Dashboard::with_registry(registry, Box::new(storage), config.debounce);
    dashboard.set_upload_mode(config.upload_mode);

    let state = AppState {
        dashboard: Arc::new(Mutex::new(dashboard)),
    };

    // Debounced writes fire from here
    let ticker = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            ticker.lock().tick(Instant::now());
        }
    });

    let app = Router::new()
        .nest("/api", api_routes(state.clone()))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    println!("\n🚀 Server running on http://{}", config.addr);
    println!("   API: http://{}/api/state", config.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Pending label edits land before exit
    state.lock().flush();
    tracing::info!("server stopped");
    Ok(())
}
