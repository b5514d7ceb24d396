//! HTTP API over the scraping pipeline.
//!
//! All JSON responses carry a `success` flag. Errors are
//! `{"success": false, "error": "..."}` with a status derived from the
//! [`ScrapeError`] variant.

use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use http_client::HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::catalog::{Catalog, GenreEntry, GenreGroup, SearchType};
use crate::client::HttpPageFetcher;
use crate::config::AppConfig;
use crate::export::{list_exports, resolve_download};
use crate::pipeline::{GenreSummary, ScrapeOptions, ScrapeOutcome, Scraper};
use crate::types::{ExportEntry, Platform, RankedRecord};
use crate::ScrapeError;

/// Records included in a scrape response.
const PREVIEW_LEN: usize = 10;

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
}

impl AppState {
    pub fn new(scraper: Scraper) -> Self {
        Self {
            scraper: Arc::new(scraper),
        }
    }

    /// State for a configured service backed by `client`.
    pub fn from_config(config: &AppConfig, client: Box<dyn HttpClient>) -> Self {
        let fetcher = HttpPageFetcher::new(client)
            .with_user_agent(config.fetch.user_agent.clone())
            .with_timeout(config.fetch.timeout())
            .with_retry(config.fetch.retry_config());
        let scraper = Scraper::new(
            Arc::new(fetcher),
            Arc::new(Catalog::builtin()),
            config.downloads_root.clone(),
        )
        .with_synthetic_fallback(config.fallback.synthetic);
        Self::new(scraper)
    }
}

/// Error wrapper that renders a [`ScrapeError`] as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub ScrapeError);

impl From<ScrapeError> for ApiError {
    fn from(error: ScrapeError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScrapeError::NoRecords { .. } | ScrapeError::NotFound(_) => StatusCode::NOT_FOUND,
            ScrapeError::UnknownPlatform(_)
            | ScrapeError::UnknownCategory { .. }
            | ScrapeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ScrapeError::Http(_) | ScrapeError::Timeout { .. } | ScrapeError::RateLimit { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ScrapeError::Io(_) | ScrapeError::Csv(_) | ScrapeError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        } else {
            log::debug!("Request rejected: {}", self.0);
        }
        (
            status,
            Json(json!({
                "success": false,
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub success: bool,
    pub platform: Platform,
    pub category: String,
    pub records_count: usize,
    pub file_name: String,
    pub download_url: String,
    pub synthetic: bool,
    pub generated_at: DateTime<Utc>,
    pub preview: Vec<RankedRecord>,
}

impl From<ScrapeOutcome> for ScrapeResponse {
    fn from(outcome: ScrapeOutcome) -> Self {
        Self {
            success: true,
            platform: outcome.platform,
            records_count: outcome.result_set.len(),
            file_name: outcome.artifact.file_name.clone(),
            download_url: outcome.artifact.download_url(),
            synthetic: outcome.is_synthetic(),
            generated_at: outcome.artifact.created_at,
            preview: outcome.result_set.preview(PREVIEW_LEN).to_vec(),
            category: outcome.category,
        }
    }
}

/// Body of `POST /api/:platform/scrape`.
///
/// Chart platforms take a `genre`; 1001Tracklists takes a `searchType`
/// and, for query-based searches, a `query`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub synthetic_fallback: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiScrapeRequest {
    pub genres: Vec<String>,
    #[serde(default)]
    pub synthetic_fallback: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiScrapeResponse {
    pub success: bool,
    pub platform: Platform,
    pub total_genres: usize,
    pub successful: usize,
    pub results: Vec<GenreSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracksRequest {
    pub tracklist_url: String,
}

#[derive(Debug, Serialize)]
pub struct TrackEntry {
    pub position: u32,
    pub artist: String,
    pub title: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracksResponse {
    pub success: bool,
    pub tracklist_url: String,
    pub tracks_count: usize,
    pub tracks: Vec<TrackEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenresResponse {
    pub success: bool,
    pub platform: Platform,
    pub total: usize,
    pub genres: Vec<GenreEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreGroupsResponse {
    pub success: bool,
    pub total_genres: usize,
    pub groups: Vec<GenreGroup>,
}

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub success: bool,
    pub files: Vec<ExportEntry>,
}

/// Build the application router.
///
/// When `public_dir` is given, unmatched paths are served from it.
pub fn build_router(state: AppState, public_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/files", get(list_all_files))
        .route("/api/files/:category", get(list_category_files))
        .route("/api/download/:category/:filename", get(download))
        .route("/api/:platform/genres", get(genres))
        .route("/api/:platform/genre-groups", get(genre_groups))
        .route("/api/:platform/tracks", post(tracklist_tracks))
        .route("/api/:platform/scrape", post(scrape_post))
        .route("/api/:platform/scrape/:genre", get(scrape_get))
        .route("/api/:platform/scrape-multiple", post(scrape_multiple))
        .with_state(state);

    let router = match public_dir {
        Some(dir) if dir.is_dir() => {
            log::info!("Serving static files from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        _ => router,
    };

    router
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
}

/// Serve the API on `config.bind_addr` until the process stops.
pub async fn serve(config: &AppConfig, state: AppState) -> crate::Result<()> {
    let app = build_router(state, config.public_dir.clone());
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    log::info!("Listening on {}", config.bind_addr);
    log::info!("Exports are written under {}", config.downloads_root.display());
    axum::serve(listener, app).await?;
    Ok(())
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    log::info!(
        "{} {} -> {} ({}ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn genres(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> ApiResult<GenresResponse> {
    let platform: Platform = platform.parse()?;
    let genres = state.scraper.catalog().genres(platform);
    Ok(Json(GenresResponse {
        success: true,
        platform,
        total: genres.len(),
        genres,
    }))
}

async fn genre_groups(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> ApiResult<GenreGroupsResponse> {
    require(platform.parse()?, Platform::Beatport, "genre groups")?;
    let groups = state.scraper.catalog().genre_groups();
    Ok(Json(GenreGroupsResponse {
        success: true,
        total_genres: groups.iter().map(|g| g.genres.len()).sum(),
        groups,
    }))
}

/// Reject endpoints that only exist for one platform.
fn require(platform: Platform, expected: Platform, what: &str) -> Result<(), ApiError> {
    if platform == expected {
        Ok(())
    } else {
        Err(ScrapeError::InvalidRequest(format!(
            "{what} are only available for {}",
            expected.slug()
        ))
        .into())
    }
}

async fn scrape_post(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Json(body): Json<ScrapeRequest>,
) -> ApiResult<ScrapeResponse> {
    let platform: Platform = platform.parse()?;
    let options = ScrapeOptions {
        synthetic_fallback: body.synthetic_fallback,
    };

    let outcome = if platform == Platform::Tracklists {
        let search_type: SearchType = body
            .search_type
            .as_deref()
            .ok_or_else(|| ScrapeError::InvalidRequest("searchType is required".to_string()))?
            .parse()?;
        state
            .scraper
            .search_tracklists(search_type, body.query.as_deref(), options)
            .await?
    } else {
        let genre = body
            .genre
            .as_deref()
            .ok_or_else(|| ScrapeError::InvalidRequest("genre is required".to_string()))?;
        state
            .scraper
            .scrape_chart_with(platform, genre, options)
            .await?
    };
    Ok(Json(outcome.into()))
}

async fn scrape_get(
    State(state): State<AppState>,
    Path((platform, genre)): Path<(String, String)>,
) -> ApiResult<ScrapeResponse> {
    let platform: Platform = platform.parse()?;
    let outcome = state.scraper.scrape_chart(platform, &genre).await?;
    Ok(Json(outcome.into()))
}

async fn scrape_multiple(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Json(body): Json<MultiScrapeRequest>,
) -> ApiResult<MultiScrapeResponse> {
    let platform: Platform = platform.parse()?;
    if body.genres.is_empty() {
        return Err(ScrapeError::InvalidRequest("genres must not be empty".to_string()).into());
    }
    let options = ScrapeOptions {
        synthetic_fallback: body.synthetic_fallback,
    };
    let outcomes = state
        .scraper
        .scrape_multiple(platform, &body.genres, options)
        .await;
    let results: Vec<GenreSummary> = outcomes.iter().map(GenreSummary::from).collect();
    Ok(Json(MultiScrapeResponse {
        success: true,
        platform,
        total_genres: results.len(),
        successful: results.iter().filter(|r| r.success).count(),
        results,
    }))
}

async fn tracklist_tracks(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Json(body): Json<TracksRequest>,
) -> ApiResult<TracksResponse> {
    require(platform.parse()?, Platform::Tracklists, "tracklist tracks")?;
    let result_set = state.scraper.tracklist_tracks(&body.tracklist_url).await?;
    let tracks: Vec<TrackEntry> = result_set
        .into_records()
        .into_iter()
        .map(|ranked| TrackEntry {
            position: ranked.position,
            artist: ranked.record.artist,
            title: ranked.record.title,
            label: ranked.record.label,
        })
        .collect();
    Ok(Json(TracksResponse {
        success: true,
        tracklist_url: body.tracklist_url,
        tracks_count: tracks.len(),
        tracks,
    }))
}

async fn list_all_files(State(state): State<AppState>) -> ApiResult<FilesResponse> {
    files_response(&state, None).await
}

async fn list_category_files(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<FilesResponse> {
    files_response(&state, Some(category)).await
}

async fn files_response(state: &AppState, category: Option<String>) -> ApiResult<FilesResponse> {
    let root = state.scraper.downloads_root().to_path_buf();
    let files = tokio::task::spawn_blocking(move || list_exports(&root, category.as_deref()))
        .await
        .map_err(|e| ScrapeError::Io(std::io::Error::other(e.to_string())))??;
    Ok(Json(FilesResponse {
        success: true,
        files,
    }))
}

async fn download(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let path = resolve_download(state.scraper.downloads_root(), &category, &filename)?;
    let bytes = tokio::fs::read(&path).await.map_err(ScrapeError::from)?;
    log::info!("Serving download {}", path.display());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
