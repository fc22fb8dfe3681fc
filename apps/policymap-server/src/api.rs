//! API handlers for the policymap server
//!
//! Provides REST endpoints for:
//! - Session screens and view transitions
//! - Mind map loading, regeneration and downloads
//! - Fact review, upload and export
//! - Source sentence search and source document listing

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use policy_engine::export::{to_pretty_json, ExportKind};
use policy_engine::patterns::PREVIEW_CHARS;
use policy_engine::{assets, facts, locator, outline};
use shared_types::{
    is_searchable_sentence, FactIndex, FactMetrics, FactsOverview, LocateResult, Outline,
    OutlineStats, SearchResult, SourceLibrary,
};

use crate::error::ServerError;
use crate::session::{ViewEvent, ViewState};
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "policymap-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================
// Sessions and screens
// ============================================================

#[derive(Serialize)]
pub struct SessionCreatedResponse {
    pub success: bool,
    pub session_id: String,
    pub screen: ViewState,
}

/// Handler: POST /api/sessions
pub async fn handle_create_session(State(state): State<AppState>) -> Json<SessionCreatedResponse> {
    let session_id = state.sessions.create().await;
    info!("Created session {}", session_id);

    Json(SessionCreatedResponse {
        success: true,
        session_id,
        screen: ViewState::Main,
    })
}

/// Source document metadata with a bounded content preview
#[derive(Serialize)]
pub struct SourceSummary {
    pub filename: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub last_updated: String,
    pub preview: String,
    pub length: usize,
}

fn summarize_sources(library: &SourceLibrary) -> Vec<SourceSummary> {
    library
        .iter()
        .map(|(filename, doc)| {
            let length = doc.content.chars().count();
            let preview = if length > PREVIEW_CHARS {
                let head: String = doc.content.chars().take(PREVIEW_CHARS).collect();
                format!("{}...", head)
            } else {
                doc.content.clone()
            };

            SourceSummary {
                filename: filename.clone(),
                title: doc.title.clone(),
                kind: doc.kind.clone(),
                version: doc.version.clone(),
                last_updated: doc.last_updated.clone(),
                preview,
                length,
            }
        })
        .collect()
}

/// Everything needed to draw the session's current screen
#[derive(Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenResponse {
    Main {
        mindmap_loaded: bool,
        outline_stats: Option<OutlineStats>,
        facts: FactMetrics,
    },
    MindMapFullscreen {
        unified_title: String,
        audit_context: String,
        stats: OutlineStats,
        markdown: String,
        outline: Outline,
    },
    FactsPopup {
        overview: FactsOverview,
        sources: Vec<SourceSummary>,
        search_result: Option<SearchResult>,
    },
}

/// Uploaded facts win over the file on disk
fn session_facts(state: &AppState, uploaded: Option<FactIndex>) -> Result<FactIndex, ServerError> {
    match uploaded {
        Some(index) => Ok(index),
        None => Ok(state.engine.load_facts()?),
    }
}

/// Handler: GET /api/sessions/:id
pub async fn handle_render_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScreenResponse>, ServerError> {
    let (view, loaded, uploaded, search_result) = state
        .sessions
        .read(&id, |s| {
            (
                s.view,
                s.outline.clone(),
                s.uploaded_facts.clone(),
                s.search_result.clone(),
            )
        })
        .await?;

    debug!("Rendering {:?} for session {}", view, id);

    let screen = match (view, loaded) {
        (ViewState::MindMapFullscreen, Some(loaded)) => ScreenResponse::MindMapFullscreen {
            unified_title: loaded.outline.unified_title.clone(),
            audit_context: loaded.outline.audit_context.clone(),
            stats: outline::stats(&loaded.outline, &loaded.markdown),
            markdown: loaded.markdown,
            outline: loaded.outline,
        },
        (ViewState::FactsPopup, _) => {
            let index = session_facts(&state, uploaded)?;
            let library = state.engine.load_sources()?;
            ScreenResponse::FactsPopup {
                overview: facts::overview(&index),
                sources: summarize_sources(&library),
                search_result,
            }
        }
        (_, loaded) => {
            let index = session_facts(&state, uploaded)?;
            ScreenResponse::Main {
                mindmap_loaded: loaded.is_some(),
                outline_stats: loaded
                    .as_ref()
                    .map(|l| outline::stats(&l.outline, &l.markdown)),
                facts: facts::metrics(&index),
            }
        }
    };

    Ok(Json(screen))
}

#[derive(Deserialize)]
pub struct ViewEventRequest {
    pub event: ViewEvent,
}

#[derive(Serialize)]
pub struct ViewResponse {
    pub success: bool,
    pub screen: ViewState,
}

/// Handler: POST /api/sessions/:id/view
pub async fn handle_view_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ViewEventRequest>,
) -> Result<Json<ViewResponse>, ServerError> {
    info!("Session {}: {:?}", id, req.event);

    let screen = if req.event == ViewEvent::LoadMindMap {
        let loaded = state.engine.load_outline()?;
        state.sessions.update(&id, |s| s.load_outline(loaded)).await?
    } else {
        state.sessions.update(&id, |s| s.apply(req.event)).await?
    };

    Ok(Json(ViewResponse {
        success: true,
        screen,
    }))
}

// ============================================================
// Mind map
// ============================================================

#[derive(Serialize)]
pub struct MindMapResponse {
    pub success: bool,
    pub screen: ViewState,
    pub markdown: String,
    pub outline: Outline,
    pub stats: OutlineStats,
}

/// Handler: POST /api/sessions/:id/mindmap
pub async fn handle_load_mindmap(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MindMapResponse>, ServerError> {
    let loaded = state.engine.load_outline()?;
    let stats = outline::stats(&loaded.outline, &loaded.markdown);
    info!(
        "Session {}: loaded mind map with {} documents",
        id, stats.documents
    );

    let markdown = loaded.markdown.clone();
    let parsed = loaded.outline.clone();
    let screen = state.sessions.update(&id, |s| s.load_outline(loaded)).await?;

    Ok(Json(MindMapResponse {
        success: true,
        screen,
        markdown,
        outline: parsed,
        stats,
    }))
}

/// Handler: POST /api/sessions/:id/mindmap/regenerate
pub async fn handle_regenerate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ViewResponse>, ServerError> {
    let screen = state
        .sessions
        .update(&id, |s| s.apply(ViewEvent::Regenerate))
        .await?;

    Ok(Json(ViewResponse {
        success: true,
        screen,
    }))
}

/// File download with a generated name
fn attachment(kind: ExportKind, body: String) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", kind.file_name());
    (
        [
            (header::CONTENT_TYPE, kind.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// Handler: GET /api/sessions/:id/mindmap/markdown
pub async fn handle_download_markdown(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let markdown = state
        .sessions
        .read(&id, |s| s.outline.as_ref().map(|l| l.markdown.clone()))
        .await?
        .ok_or(ServerError::OutlineNotLoaded)?;

    Ok(attachment(ExportKind::OutlineMarkdown, markdown))
}

/// Handler: GET /api/sessions/:id/mindmap/json
pub async fn handle_download_outline_json(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let parsed = state
        .sessions
        .read(&id, |s| s.outline.as_ref().map(|l| l.outline.clone()))
        .await?
        .ok_or(ServerError::OutlineNotLoaded)?;

    let body = to_pretty_json(&parsed, "mind map")?;
    Ok(attachment(ExportKind::OutlineJson, body))
}

// ============================================================
// Facts
// ============================================================

#[derive(Serialize)]
pub struct FactsResponse {
    pub success: bool,
    /// "uploaded" when the session replaced the index, else "file"
    pub source: &'static str,
    pub overview: FactsOverview,
}

/// Handler: GET /api/sessions/:id/facts
pub async fn handle_facts_overview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FactsResponse>, ServerError> {
    let uploaded = state
        .sessions
        .read(&id, |s| s.uploaded_facts.clone())
        .await?;
    let source = if uploaded.is_some() { "uploaded" } else { "file" };
    let index = session_facts(&state, uploaded)?;

    Ok(Json(FactsResponse {
        success: true,
        source,
        overview: facts::overview(&index),
    }))
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub metrics: FactMetrics,
}

/// Handler: POST /api/sessions/:id/facts
///
/// Replaces the session's fact index with the uploaded JSON. Nothing is
/// kept from a body that fails to decode.
pub async fn handle_upload_facts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<UploadResponse>, ServerError> {
    state.sessions.read(&id, |_| ()).await?;

    let index = assets::parse_fact_index(&body, "uploaded facts")
        .map_err(|e| ServerError::InvalidFacts(e.to_string()))?;
    let metrics = facts::metrics(&index);

    info!(
        "Session {}: uploaded {} fact fields ({} inconsistent)",
        id, metrics.total, metrics.inconsistent
    );

    state
        .sessions
        .update(&id, |s| s.uploaded_facts = Some(index))
        .await?;

    Ok(Json(UploadResponse {
        success: true,
        metrics,
    }))
}

/// Handler: GET /api/sessions/:id/facts/export
pub async fn handle_export_facts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let uploaded = state
        .sessions
        .read(&id, |s| s.uploaded_facts.clone())
        .await?;
    let index = session_facts(&state, uploaded)?;

    let body = to_pretty_json(&index, "facts")?;
    Ok(attachment(ExportKind::Facts, body))
}

// ============================================================
// Search
// ============================================================

#[derive(Deserialize)]
pub struct SearchRequest {
    /// Source sentence of the fact
    pub sentence: String,
    /// The fact's `document_title`, a source file name or document title
    pub document_title: String,
    pub context_radius: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub found: bool,
    pub result: SearchResult,
}

/// Handler: POST /api/sessions/:id/search
pub async fn handle_search(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ServerError> {
    if !is_searchable_sentence(&req.sentence) {
        return Err(ServerError::InvalidRequest(
            "No source sentence available".to_string(),
        ));
    }

    let radius = req.context_radius.unwrap_or(state.context_radius);
    let result = state.engine.search(&req.sentence, &req.document_title, radius)?;
    let found = result.position.is_some();

    info!(
        "Session {}: search in '{}' found={}",
        id, req.document_title, found
    );

    let stored = result.clone();
    state
        .sessions
        .update(&id, |s| s.search_result = Some(stored))
        .await?;

    Ok(Json(SearchResponse {
        success: true,
        found,
        result,
    }))
}

#[derive(Serialize)]
pub struct ClearSearchResponse {
    pub success: bool,
    pub cleared: bool,
}

/// Handler: DELETE /api/sessions/:id/search
pub async fn handle_clear_search(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClearSearchResponse>, ServerError> {
    let cleared = state
        .sessions
        .update(&id, |s| s.search_result.take().is_some())
        .await?;

    Ok(Json(ClearSearchResponse {
        success: true,
        cleared,
    }))
}

// ============================================================
// Source documents
// ============================================================

#[derive(Serialize)]
pub struct SourcesResponse {
    pub success: bool,
    pub count: usize,
    pub documents: Vec<SourceSummary>,
}

/// Handler: GET /api/sources
pub async fn handle_list_sources(
    State(state): State<AppState>,
) -> Result<Json<SourcesResponse>, ServerError> {
    let library = state.engine.load_sources()?;
    let documents = summarize_sources(&library);

    Ok(Json(SourcesResponse {
        success: true,
        count: documents.len(),
        documents,
    }))
}

/// Handler: GET /api/sources/export
pub async fn handle_export_sources(State(state): State<AppState>) -> Result<Response, ServerError> {
    let library = state.engine.load_sources()?;
    let body = to_pretty_json(&library, "source documents")?;
    Ok(attachment(ExportKind::Sources, body))
}

// ============================================================
// Stateless tools
// ============================================================

#[derive(Deserialize)]
pub struct LocateRequest {
    pub sentence: String,
    /// Raw text to search
    pub content: String,
    pub context_radius: Option<usize>,
}

/// Handler: POST /api/locate
pub async fn handle_locate(
    State(state): State<AppState>,
    Json(req): Json<LocateRequest>,
) -> Json<LocateResult> {
    let radius = req.context_radius.unwrap_or(state.context_radius);
    Json(locator::locate(&req.sentence, &req.content, radius))
}

#[derive(Deserialize)]
pub struct ParseOutlineRequest {
    pub markdown: String,
}

#[derive(Serialize)]
pub struct ParseOutlineResponse {
    pub success: bool,
    pub outline: Outline,
    pub stats: OutlineStats,
}

/// Handler: POST /api/outline/parse
pub async fn handle_parse_outline(Json(req): Json<ParseOutlineRequest>) -> Json<ParseOutlineResponse> {
    let parsed = outline::parse(&req.markdown);
    let stats = outline::stats(&parsed, &req.markdown);

    Json(ParseOutlineResponse {
        success: true,
        outline: parsed,
        stats,
    })
}
