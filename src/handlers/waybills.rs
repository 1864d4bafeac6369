use crate::{
    services::waybills::{WaybillAction, WaybillRow},
    services::BatchSummary,
    ApiResponse, ApiResult, AppState,
};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(upload_waybill))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct WaybillRowRequest {
    pub action: WaybillAction,
    #[validate(length(min = 1))]
    pub execution_no: String,
    pub carrier_name: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UploadWaybillRequest {
    #[validate(length(min = 1))]
    pub rows: Vec<WaybillRowRequest>,
}

async fn upload_waybill(
    State(state): State<AppState>,
    Json(payload): Json<UploadWaybillRequest>,
) -> ApiResult<BatchSummary> {
    payload.validate()?;
    let rows: Vec<WaybillRow> = payload
        .rows
        .into_iter()
        .map(|r| WaybillRow {
            action: r.action,
            execution_no: r.execution_no,
            carrier_name: r.carrier_name,
            tracking_number: r.tracking_number,
        })
        .collect();
    let summary = state.services.waybills.upload_waybill(&rows).await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_request_validates_rows() {
        let empty: UploadWaybillRequest = serde_json::from_str(r#"{"rows": []}"#).unwrap();
        assert!(empty.validate().is_err());

        let req: UploadWaybillRequest = serde_json::from_str(
            r#"{"rows": [{"action": "register", "execution_no": "ST-260101-AAAAA_1x1",
                "carrier_name": "CJ Logistics", "tracking_number": "T-1"}]}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(matches!(req.rows[0].action, WaybillAction::Register));
    }
}
