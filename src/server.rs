//! HTTP endpoints for rendering clients.
//!
//! Both lookups always answer `200 OK`; failures are reported inside the body
//! so a dashboard can keep rendering whatever did resolve.

use crate::core::Holding;
use crate::engine::{Estimator, HoldingsResolution};
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, Method, header},
    routing::get,
};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

pub struct ServerState {
    pub estimator: Estimator,
}

pub type AppState = Arc<ServerState>;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HoldingEntry {
    pub code: String,
    pub name: String,
    pub ratio: f64,
}

impl From<Holding> for HoldingEntry {
    fn from(holding: Holding) -> Self {
        Self {
            code: holding.security_code,
            name: holding.security_name,
            ratio: holding.portfolio_weight_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HoldingsResponse {
    pub code: String,
    pub name: String,
    pub holdings: Vec<HoldingEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_close: Option<f64>,
    pub change: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn get_holdings(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<HoldingsResponse> {
    let today = Local::now().date_naive();
    let response = match state.estimator.resolve_holdings(&code, today).await {
        HoldingsResolution::Resolved { period, extracted } => {
            debug!(code = %code, %period, holdings = extracted.holdings.len(), "Serving holdings");
            HoldingsResponse {
                code,
                name: extracted.display_name,
                holdings: extracted.holdings.into_iter().map(Into::into).collect(),
                date: Some(extracted.disclosure_date_label),
                error: None,
            }
        }
        HoldingsResolution::Unresolvable { last_attempt } => HoldingsResponse {
            code,
            name: last_attempt.display_name,
            holdings: Vec::new(),
            date: None,
            error: Some(
                last_attempt
                    .error
                    .unwrap_or_else(|| "no holdings disclosed".to_string()),
            ),
        },
    };
    Json(response)
}

pub async fn get_price(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<PriceResponse> {
    let response = match state.estimator.quote_provider().fetch_quote(&code).await {
        Ok(quote) => PriceResponse {
            change: quote.change_percent(),
            current_price: Some(quote.current_price),
            prev_close: Some(quote.prev_close),
            code,
        },
        Err(e) => {
            warn!(code = %code, error = %e, "Quote unavailable");
            PriceResponse {
                code,
                current_price: None,
                prev_close: None,
                change: 0.0,
            }
        }
    };
    Json(response)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/holdings/:code", get(get_holdings))
        .route("/price/:code", get(get_price))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

/// Serves the router on all interfaces until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    info!(port, "Estimation server listening on http://localhost:{port}");

    axum::serve(listener, app)
        .await
        .context("Estimation server error")
}
