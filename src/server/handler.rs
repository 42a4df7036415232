use crate::api::GalleryClient;
use crate::charts::{
    self, LiveChart, SharedCharts, STAR_CANVAS, TOP_DOWNLOADS_CANVAS,
    TOP_DOWNLOADS_FILTERED_CANVAS,
};
use crate::config::DashboardConfig;
use crate::error::{AppError, AppResult, LoggedJson};
use crate::history::{self, TrendOutcome};
use crate::types::{
    AppDetail, AppDetailView, AppListQuery, AppPage, HealthResponse, MarketInfo, RankingEntry,
    RankingQueryParams, StarDistribution, SubmitRequest,
};
use crate::view::{DetailOutcome, SessionStore};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const MAX_RANKING_LIMIT: u32 = 100;

/// `charts` holds the page-level charts (rankings, ratings) that every client
/// sees alike; trend charts live in each client's detail session.
pub struct DashState {
    pub client: GalleryClient,
    pub charts: SharedCharts,
    pub sessions: SessionStore,
    pub dashboard: DashboardConfig,
}

impl DashState {
    pub fn new(client: GalleryClient, charts: SharedCharts, dashboard: DashboardConfig) -> Self {
        let sessions = SessionStore::new(
            client.clone(),
            Duration::from_secs(dashboard.session_idle_secs),
            dashboard.max_sessions,
        );
        Self {
            client,
            charts,
            sessions,
            dashboard,
        }
    }
}

fn require_name(kind: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{kind} must not be empty")));
    }
    Ok(())
}

/// GET /health - Health check, including upstream reachability.
pub async fn health(State(state): State<Arc<DashState>>) -> Json<HealthResponse> {
    let upstream_ok = state.client.market_info().await.is_ok();
    Json(HealthResponse {
        status: if upstream_ok {
            "ok".into()
        } else {
            "degraded".into()
        },
        upstream_ok,
        live_charts: state.charts.live_count(),
        live_sessions: state.sessions.len(),
    })
}

/// GET /api/overview - Catalog totals.
pub async fn overview(State(state): State<Arc<DashState>>) -> AppResult<Json<MarketInfo>> {
    Ok(Json(state.client.market_info().await?))
}

/// GET /api/apps - One page of the app table.
pub async fn list_apps(
    State(state): State<Arc<DashState>>,
    Query(mut params): Query<AppListQuery>,
) -> AppResult<Json<AppPage>> {
    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(AppError::Validation("page starts at 1".to_string()));
    }
    params.page_size = Some(
        params
            .page_size
            .unwrap_or(state.dashboard.page_size)
            .clamp(1, 1000),
    );
    Ok(Json(state.client.app_list(page, &params).await?))
}

/// Shared tail of the two detail lookups: rejections mean the app is gone.
fn detail_view(key: &str, result: AppResult<AppDetail>) -> AppResult<Json<AppDetailView>> {
    match result {
        Ok(detail) => {
            if !detail.get_data {
                tracing::info!(app = %key, "upstream could not refresh app, serving cached detail");
            }
            Ok(Json(AppDetailView::from(detail)))
        }
        Err(AppError::UpstreamRejected(msg)) => Err(AppError::NotFound(format!(
            "app {key} may be delisted or missing: {msg}"
        ))),
        Err(e) => Err(e),
    }
}

/// GET /api/apps/{app_id} - App detail.
pub async fn app_detail(
    State(state): State<Arc<DashState>>,
    Path(app_id): Path<String>,
) -> AppResult<Json<AppDetailView>> {
    require_name("app_id", &app_id)?;
    detail_view(&app_id, state.client.app_by_id(&app_id).await)
}

/// GET /api/packages/{pkg} - App detail looked up by package name.
pub async fn package_detail(
    State(state): State<Arc<DashState>>,
    Path(pkg_name): Path<String>,
) -> AppResult<Json<AppDetailView>> {
    require_name("pkg_name", &pkg_name)?;
    detail_view(&pkg_name, state.client.app_by_pkg(&pkg_name).await)
}

/// GET /api/apps/{pkg}/trend - Download trend series, without touching the detail panel.
pub async fn app_trend(
    State(state): State<Arc<DashState>>,
    Path(pkg_name): Path<String>,
) -> AppResult<Json<TrendOutcome>> {
    require_name("pkg_name", &pkg_name)?;
    let records = state.client.metrics_history(&pkg_name).await?;
    let samples = history::samples_from_records(&records);
    Ok(Json(history::build_trend(&samples)))
}

/// POST /api/sessions/{sid}/detail/{pkg} - Open this session's detail panel for a package.
pub async fn open_detail(
    State(state): State<Arc<DashState>>,
    Path((sid, pkg_name)): Path<(String, String)>,
) -> AppResult<Json<DetailOutcome>> {
    require_name("pkg_name", &pkg_name)?;
    let session = state.sessions.get_or_create(&sid)?;
    Ok(Json(session.detail.open(&pkg_name).await))
}

/// DELETE /api/sessions/{sid}/detail - Close this session's detail panel.
pub async fn close_detail(
    State(state): State<Arc<DashState>>,
    Path(sid): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    SessionStore::validate_id(&sid)?;
    if let Some(session) = state.sessions.get(&sid) {
        session.detail.close();
    }
    Ok(Json(serde_json::json!({ "closed": true })))
}

/// DELETE /api/sessions/{sid} - Forget a session and its charts.
pub async fn end_session(
    State(state): State<Arc<DashState>>,
    Path(sid): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    SessionStore::validate_id(&sid)?;
    let removed = state.sessions.remove(&sid);
    Ok(Json(serde_json::json!({ "removed": removed })))
}

/// GET /api/sessions/{sid}/charts/{canvas} - A trend chart mounted by this session.
pub async fn get_session_chart(
    State(state): State<Arc<DashState>>,
    Path((sid, canvas)): Path<(String, String)>,
) -> AppResult<Json<LiveChart>> {
    let session = state
        .sessions
        .get(&sid)
        .ok_or_else(|| AppError::NotFound(format!("no session {sid}")))?;
    session
        .charts
        .get(&canvas)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no chart on canvas {canvas}")))
}

/// GET /api/charts/{canvas} - A page-level chart currently mounted on a canvas.
pub async fn get_chart(
    State(state): State<Arc<DashState>>,
    Path(canvas): Path<String>,
) -> AppResult<Json<LiveChart>> {
    state
        .charts
        .get(&canvas)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no chart on canvas {canvas}")))
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub entries: Vec<RankingEntry>,
    pub canvas: &'static str,
    pub chart_instance: u64,
}

/// GET /api/rankings/top-downloads - Download ranking, mounted as a bar chart.
pub async fn top_downloads(
    State(state): State<Arc<DashState>>,
    Query(params): Query<RankingQueryParams>,
) -> AppResult<Json<RankingResponse>> {
    let limit = params
        .limit
        .unwrap_or(state.dashboard.ranking_limit)
        .clamp(1, MAX_RANKING_LIMIT);
    let exclude = params.exclude_pattern.filter(|p| !p.trim().is_empty());
    let entries = state
        .client
        .top_downloads(limit, exclude.as_deref())
        .await?;

    let (canvas, title) = match exclude {
        Some(_) => (TOP_DOWNLOADS_FILTERED_CANVAS, "Top downloads (filtered)"),
        None => (TOP_DOWNLOADS_CANVAS, "Top downloads"),
    };
    let chart_instance = state
        .charts
        .mount(canvas, charts::ranking_chart(title, &entries, 0.9));

    Ok(Json(RankingResponse {
        entries,
        canvas,
        chart_instance,
    }))
}

#[derive(Debug, Serialize)]
pub struct StarResponse {
    pub distribution: StarDistribution,
    pub total: i64,
    pub chart_instance: u64,
}

/// GET /api/charts/star-distribution - Rating distribution, mounted as a doughnut chart.
pub async fn star_distribution(
    State(state): State<Arc<DashState>>,
) -> AppResult<Json<StarResponse>> {
    let distribution = state.client.star_distribution().await?;
    let chart_instance = state
        .charts
        .mount(STAR_CANVAS, charts::star_chart(&distribution));
    Ok(Json(StarResponse {
        distribution,
        total: distribution.total(),
        chart_instance,
    }))
}

/// POST /api/submit - Forward an app submission to the upstream.
pub async fn submit(
    State(state): State<Arc<DashState>>,
    LoggedJson(request): LoggedJson<SubmitRequest>,
) -> AppResult<Json<serde_json::Value>> {
    request.validate().map_err(AppError::Validation)?;
    tracing::info!(
        app_id = ?request.app_id,
        pkg = ?request.pkg_name,
        "forwarding app submission"
    );
    Ok(Json(state.client.submit(&request).await?))
}
