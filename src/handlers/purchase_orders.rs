use crate::{
    entities::supplier_order,
    services::purchase_orders::SupplierOrderReport,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supplier_orders).get(list_supplier_orders))
        .route("/:id", delete(cancel_supplier_order))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateSupplierOrdersRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<Uuid>,
}

async fn create_supplier_orders(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplierOrdersRequest>,
) -> ApiResult<SupplierOrderReport> {
    payload.validate()?;
    let report = state
        .services
        .purchase_orders
        .create_supplier_orders(&payload.order_ids)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

async fn cancel_supplier_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.purchase_orders.cancel_supplier_order(id).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn list_supplier_orders(
    State(state): State<AppState>,
) -> ApiResult<Vec<supplier_order::Model>> {
    let orders = state.services.purchase_orders.list_supplier_orders().await?;
    Ok(Json(ApiResponse::success(orders)))
}
