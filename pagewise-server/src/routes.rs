use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use pagewise::wire::{
    Envelope, ITEMS_PATH, ORDER_PATH, SELECTED_PATH, STATE_PATH, SaveOrderRequest,
    SaveSelectedRequest, WriteAck,
};
use pagewise::{CurrentState, PageRequest, PageResult, StateService};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ApiError;

pub const HEALTH_PATH: &str = "/health";

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: StateService,
    pub default_page_size: usize,
}

impl AppState {
    pub fn new(service: StateService, default_page_size: usize) -> Self {
        Self {
            service,
            default_page_size: default_page_size.max(1),
        }
    }
}

/// Builds the API router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route(ITEMS_PATH, get(list_items))
        .route(ORDER_PATH, post(save_order))
        .route(SELECTED_PATH, post(save_selected))
        .route(STATE_PATH, get(current_state))
        .route(HEALTH_PATH, get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Raw `GET /api/items` parameters. Signed so that negative values are reported as such.
#[derive(Debug, Default, Deserialize)]
struct ItemsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    search: Option<String>,
}

impl ItemsQuery {
    fn into_request(self, default_page_size: usize) -> Result<PageRequest, ApiError> {
        let page = positive("page", self.page.unwrap_or(1))?;
        let page_size = match self.limit {
            Some(limit) => positive("limit", limit)?,
            None => default_page_size,
        };
        Ok(PageRequest::new(
            page,
            page_size,
            self.search.unwrap_or_default(),
        ))
    }
}

fn positive(field: &str, value: i64) -> Result<usize, ApiError> {
    usize::try_from(value)
        .ok()
        .filter(|&v| v >= 1)
        .ok_or_else(|| ApiError::validation(field, format!("must be at least 1, got {value}")))
}

async fn list_items(
    State(state): State<AppState>,
    query: Result<Query<ItemsQuery>, QueryRejection>,
) -> Result<Json<Envelope<PageResult>>, ApiError> {
    let Query(query) = query?;
    let request = query.into_request(state.default_page_size)?;
    tracing::debug!(
        target: "pagewise_server",
        page = request.page,
        page_size = request.page_size,
        search = %request.search,
        "list items"
    );
    // A search scans the whole collection; keep it off the async workers.
    let service = state.service.clone();
    let page = tokio::task::spawn_blocking(move || service.query(&request))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(Envelope::ok("Items fetched successfully", page)))
}

async fn save_order(
    State(state): State<AppState>,
    body: Result<Json<SaveOrderRequest>, JsonRejection>,
) -> Result<Json<Envelope<WriteAck>>, ApiError> {
    let Json(body) = body?;
    let len = body.order.len();
    let version = state.service.set_order(body.order, body.version)?;
    tracing::info!(target: "pagewise_server", len, %version, "order saved");
    Ok(Json(Envelope::ok(
        "Order saved successfully",
        WriteAck { version },
    )))
}

async fn save_selected(
    State(state): State<AppState>,
    body: Result<Json<SaveSelectedRequest>, JsonRejection>,
) -> Result<Json<Envelope<WriteAck>>, ApiError> {
    let Json(body) = body?;
    let len = body.selected.len();
    let version = state.service.set_selected(body.selected, body.version)?;
    tracing::info!(target: "pagewise_server", len, %version, "selection saved");
    Ok(Json(Envelope::ok(
        "Selection saved successfully",
        WriteAck { version },
    )))
}

async fn current_state(State(state): State<AppState>) -> Json<Envelope<CurrentState>> {
    Json(Envelope::ok(
        "State fetched successfully",
        state.service.state(),
    ))
}

#[derive(Debug, Serialize)]
struct Health {
    items: usize,
}

async fn health(State(state): State<AppState>) -> Json<Envelope<Health>> {
    Json(Envelope::ok(
        "ok",
        Health {
            items: state.service.collection_len(),
        },
    ))
}
