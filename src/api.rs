use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::pipeline::PipelineContext;
use crate::queue::ChainQueue;
use crate::sites::{derive_site_id, SiteRegistry};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SiteRegistry>,
    pub queue: ChainQueue,
    pub default_site: String,
}

impl AppState {
    pub fn new(registry: Arc<SiteRegistry>, queue: ChainQueue, default_site: impl Into<String>) -> Self {
        Self {
            registry,
            queue,
            default_site: default_site.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(news_get).post(news_post))
        .route("/health", get(|| async { "ok" }))
        .route("/sites", get(list_sites))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Slash-command style fields. `domain` is accepted as an alias of `text` on the query.
#[derive(Debug, Default, Deserialize)]
pub struct NewsRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    response_url: Option<String>,
}

impl NewsRequest {
    /// Form fields win over query fields.
    fn merged(self, other: NewsRequest) -> Self {
        Self {
            text: self.text.or(other.text),
            domain: self.domain.or(other.domain),
            response_url: self.response_url.or(other.response_url),
        }
    }

    fn site_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.domain.as_deref())
    }
}

async fn news_get(State(state): State<AppState>, Query(q): Query<NewsRequest>) -> Response {
    enqueue(&state, q)
}

/// A POST without a form body (query fields only) is served from the query alone.
async fn news_post(
    State(state): State<AppState>,
    Query(q): Query<NewsRequest>,
    form: Result<Form<NewsRequest>, FormRejection>,
) -> Response {
    let req = match form {
        Ok(Form(f)) => f.merged(q),
        Err(e) => {
            debug!(error = %e, "no usable form body; using query fields");
            q
        }
    };
    enqueue(&state, req)
}

fn enqueue(state: &AppState, req: NewsRequest) -> Response {
    let site = derive_site_id(req.site_text(), &state.default_site);

    if let Err(e) = state.registry.resolve(&site) {
        counter!("headlines_requests_total", "result" => "unsupported").increment(1);
        info!(%site, "rejected unsupported site");
        return Json(json!({ "error": e.to_string() })).into_response();
    }

    let ctx = PipelineContext::new(site.clone(), req.response_url);
    let with_callback = ctx.callback_url.is_some();
    match state.queue.submit(ctx) {
        Ok(()) => {
            counter!("headlines_requests_total", "result" => "accepted").increment(1);
            info!(%site, with_callback, "chain enqueued");
            Json(json!({ "text": format!("parsing {site} headlines") })).into_response()
        }
        Err(e @ PipelineError::QueueUnavailable(_)) => {
            counter!("headlines_requests_total", "result" => "busy").increment(1);
            warn!(%site, error = %e, "could not enqueue chain");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn list_sites(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.registry.supported())
}
