use crate::{
    entities::{stock_transfer, warehouse_stock},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:warehouse_id/:product_id", get(get_stock))
        .route("/product/:product_id", get(list_product_stock))
        .route("/adjust", post(adjust_stock))
        .route("/transfer", post(transfer_stock))
        .route("/transfers", get(list_transfers))
}

/// Stock level with the derived available count, the number every screen
/// actually wants.
#[derive(Debug, Serialize)]
pub struct StockView {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub allocated: i32,
    pub available: i32,
}

impl From<warehouse_stock::Model> for StockView {
    fn from(model: warehouse_stock::Model) -> Self {
        let available = model.available();
        Self {
            warehouse_id: model.warehouse_id,
            product_id: model.product_id,
            quantity: model.quantity,
            allocated: model.allocated,
            available,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AdjustStockRequest {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    /// Signed on-hand correction; must be non-zero
    pub delta: i32,
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TransferStockRequest {
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub reason: Option<String>,
}

async fn get_stock(
    State(state): State<AppState>,
    Path((warehouse_id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StockView> {
    let stock = state
        .services
        .inventory
        .get_stock(warehouse_id, product_id)
        .await?;
    Ok(Json(ApiResponse::success(stock.into())))
}

async fn list_product_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Vec<StockView>> {
    let rows = state.services.inventory.list_product_stock(product_id).await?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(StockView::from).collect(),
    )))
}

async fn adjust_stock(
    State(state): State<AppState>,
    Json(payload): Json<AdjustStockRequest>,
) -> ApiResult<StockView> {
    payload.validate()?;
    let stock = state
        .services
        .inventory
        .adjust_stock(
            payload.warehouse_id,
            payload.product_id,
            payload.delta,
            payload.reason,
        )
        .await?;
    Ok(Json(ApiResponse::success(stock.into())))
}

async fn transfer_stock(
    State(state): State<AppState>,
    Json(payload): Json<TransferStockRequest>,
) -> ApiResult<stock_transfer::Model> {
    payload.validate()?;
    let transfer = state
        .services
        .inventory
        .transfer_stock(
            payload.from_warehouse_id,
            payload.to_warehouse_id,
            payload.product_id,
            payload.quantity,
            payload.reason,
        )
        .await?;
    Ok(Json(ApiResponse::success(transfer)))
}

async fn list_transfers(State(state): State<AppState>) -> ApiResult<Vec<stock_transfer::Model>> {
    let transfers = state.services.inventory.list_transfers().await?;
    Ok(Json(ApiResponse::success(transfers)))
}
