use crate::{
    entities::internal_order,
    models::{ExecutionSource, OrderStatus},
    services::orders::{CreateOrderInput, CreateOrderResult},
    services::BatchSummary,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/confirm", post(confirm_orders))
        .route("/hold", post(hold_orders))
        .route("/resume", post(resume_orders))
        .route("/schedule", post(schedule_orders))
        .route("/cancel", post(cancel_orders))
        .route("/rollback", post(rollback_orders))
        .route("/source", post(change_order_source))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub client_name: String,
    #[validate(length(min = 1))]
    pub external_order_no: String,
    #[validate(length(min = 1))]
    pub product_code: String,
    pub option_name: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub price: Decimal,
    pub order_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OrderIdsRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct HoldRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<Uuid>,
    #[validate(length(min = 1))]
    pub reason: String,
    #[serde(default)]
    pub next_round: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ScheduleRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<Uuid>,
    pub target_date: NaiveDate,
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CancelRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<Uuid>,
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ChangeSourceRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<Uuid>,
    pub source_type: ExecutionSource,
    pub warehouse_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_per_page() -> u64 {
    20
}

async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<CreateOrderResult> {
    payload.validate()?;
    let result = state
        .services
        .orders
        .create_order(CreateOrderInput {
            client_name: payload.client_name,
            external_order_no: payload.external_order_no,
            product_code: payload.product_code,
            option_name: payload.option_name,
            quantity: payload.quantity,
            price: payload.price,
            order_date: payload.order_date,
        })
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<internal_order::Model>> {
    let (items, total) = state
        .services
        .orders
        .list_orders(query.status, query.page, query.per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page: query.page,
        per_page: query.per_page,
    })))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<internal_order::Model> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

async fn confirm_orders(
    State(state): State<AppState>,
    Json(payload): Json<OrderIdsRequest>,
) -> ApiResult<BatchSummary> {
    payload.validate()?;
    let summary = state
        .services
        .orders
        .confirm_orders(&payload.order_ids)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn hold_orders(
    State(state): State<AppState>,
    Json(payload): Json<HoldRequest>,
) -> ApiResult<BatchSummary> {
    payload.validate()?;
    let summary = state
        .services
        .orders
        .hold_orders(&payload.order_ids, &payload.reason, payload.next_round)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn resume_orders(
    State(state): State<AppState>,
    Json(payload): Json<OrderIdsRequest>,
) -> ApiResult<BatchSummary> {
    payload.validate()?;
    let summary = state
        .services
        .orders
        .resume_orders(&payload.order_ids)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn schedule_orders(
    State(state): State<AppState>,
    Json(payload): Json<ScheduleRequest>,
) -> ApiResult<BatchSummary> {
    payload.validate()?;
    let summary = state
        .services
        .orders
        .schedule_orders(&payload.order_ids, payload.target_date, &payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn cancel_orders(
    State(state): State<AppState>,
    Json(payload): Json<CancelRequest>,
) -> ApiResult<BatchSummary> {
    payload.validate()?;
    let summary = state
        .services
        .orders
        .cancel_orders(&payload.order_ids, &payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn rollback_orders(
    State(state): State<AppState>,
    Json(payload): Json<OrderIdsRequest>,
) -> ApiResult<BatchSummary> {
    payload.validate()?;
    let summary = state
        .services
        .orders
        .rollback_orders(&payload.order_ids)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn change_order_source(
    State(state): State<AppState>,
    Json(payload): Json<ChangeSourceRequest>,
) -> ApiResult<BatchSummary> {
    payload.validate()?;
    let summary = state
        .services
        .orders
        .change_order_source(&payload.order_ids, payload.source_type, payload.warehouse_id)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}
