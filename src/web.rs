use crate::{
    corpus::{Document, EXCERPT_CHARS},
    semantic::{
        concepts::QueryContext, Answer, EngineError, Relevance, SearchEngine, SearchResult,
    },
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    engine: Arc<SearchEngine>,
}

pub fn router(engine: Arc<SearchEngine>) -> Router {
    let shared_state = Arc::new(SharedState { engine });

    Router::new()
        .route("/api/search", post(search))
        .route("/api/ask", post(ask))
        .route("/api/highlight", post(highlight))
        .route("/api/documents", get(documents))
        .route("/api/documents/:id", get(document))
        .route("/api/topics", get(topics))
        .route("/api/reindex", post(reindex))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::warn!("shutting down");
}

async fn start_app(engine: Arc<SearchEngine>, bind: &str) -> anyhow::Result<()> {
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("listening on {bind}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn start_daemon(engine: Arc<SearchEngine>, bind: &str) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(engine, bind))
}

#[derive(Debug)]
enum HttpError {
    Engine(EngineError),
    BadRequest(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self {
            HttpError::BadRequest(message) => (
                axum::http::StatusCode::BAD_REQUEST,
                Json(json!({"error": message})),
            ),
            HttpError::Engine(err @ EngineError::DocumentNotFound(_)) => (
                axum::http::StatusCode::NOT_FOUND,
                Json(json!({"error": err.to_string()})),
            ),
            HttpError::Engine(err) => {
                log::error!("{err:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": err.to_string()})),
                )
            }
        }
        .into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<EngineError>,
{
    fn from(err: E) -> Self {
        Self::Engine(err.into())
    }
}

/// A ranked document as returned over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    /// Title with the query's concepts wrapped in `<mark>`
    pub highlighted_title: String,
    /// Leading content characters followed by "..."
    pub excerpt: String,
    pub highlighted_excerpt: String,
    pub score: f32,
    pub relevance: Relevance,
    pub explanation: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchHit {
    fn new(result: &SearchResult<'_>, context: &QueryContext) -> Self {
        let doc = result.document;
        let excerpt = doc.excerpt(EXCERPT_CHARS);
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            highlighted_title: context.highlight(&doc.title),
            highlighted_excerpt: context.highlight(&excerpt),
            excerpt,
            score: result.score,
            relevance: result.relevance,
            explanation: result.relevance.explanation().to_string(),
            tags: doc.tags.clone(),
            source: doc.primary_source().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,

    /// Maximum number of results; everything relevant when omitted
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub concepts: Vec<String>,
    pub results: Vec<SearchHit>,
}

async fn search(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, HttpError> {
    log::debug!("payload: {payload:?}");

    if payload.limit == Some(0) {
        return Err(HttpError::BadRequest("limit must be greater than 0".to_string()));
    }

    let engine = state.engine.clone();

    tokio::task::block_in_place(move || {
        let context = QueryContext::new(&payload.query);
        let results = engine.search_with_limit(&payload.query, payload.limit)?;

        Ok(Json(SearchResponse {
            results: results.iter().map(|r| SearchHit::new(r, &context)).collect(),
            query: context.query,
            concepts: context.concepts,
        }))
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub query: String,
    pub concepts: Vec<String>,
    pub results: Vec<SearchHit>,
    /// Full answer text, citations included
    pub answer: String,
    /// The answer split into body, citations and footer
    pub sections: Answer,
}

async fn ask(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, HttpError> {
    log::debug!("payload: {payload:?}");

    let engine = state.engine.clone();

    tokio::task::block_in_place(move || {
        let response = engine.ask(&payload.query)?;
        let context = response.context;

        Ok(Json(AskResponse {
            results: response
                .results
                .iter()
                .map(|r| SearchHit::new(r, &context))
                .collect(),
            sections: Answer::parse(&response.answer),
            answer: response.answer,
            query: context.query,
            concepts: context.concepts,
        }))
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct HighlightRequest {
    pub text: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightResponse {
    pub concepts: Vec<String>,
    pub text: String,
}

async fn highlight(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<HighlightRequest>,
) -> Result<Json<HighlightResponse>, HttpError> {
    let concepts = state.engine.extract_concepts(&payload.query);
    let text = state.engine.highlight(&payload.text, &concepts);

    Ok(Json(HighlightResponse { concepts, text }))
}

async fn documents(State(state): State<Arc<SharedState>>) -> Json<Vec<Document>> {
    Json(state.engine.documents().to_vec())
}

async fn document(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, HttpError> {
    Ok(Json(state.engine.require_document(&id)?.clone()))
}

async fn topics(State(state): State<Arc<SharedState>>) -> Json<Vec<String>> {
    Json(state.engine.topics())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexResponse {
    pub documents: usize,
}

async fn reindex(
    State(state): State<Arc<SharedState>>,
) -> Result<Json<ReindexResponse>, HttpError> {
    let engine = state.engine.clone();

    tokio::task::block_in_place(move || {
        let documents = engine.reindex()?;
        log::info!("reindexed {documents} documents");
        Ok(Json(ReindexResponse { documents }))
    })
}
