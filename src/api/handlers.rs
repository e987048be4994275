use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Deserialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::allocation::allocator::ThreadRandom;
use crate::error::AllocationError;
use crate::logging::allocation_log::AllocationLog;
use crate::model::context::AllocationContext;
use crate::AppState;

/// 查询参数：`campaign`、`anonymous`（必填）、`ad`（预览指定广告）、`slot`（原样返回）
#[derive(Deserialize, Debug, Clone)]
pub struct AllocateParams {
    pub campaign: Option<String>,
    pub anonymous: bool,
    pub ad: Option<String>,
    pub slot: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AllocationResponse {
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AllocationResponse {
    fn success(ad: String, campaign: Option<String>, slot: Option<String>) -> Self {
        Self { result: "success".to_string(), ad: Some(ad), campaign, slot, error: None }
    }

    fn failure(error: &AllocationError, slot: Option<String>) -> Self {
        Self { result: "error".to_string(), ad: None, campaign: None, slot, error: Some(error.code().to_string()) }
    }
}

fn failure_response(error: &AllocationError, slot: Option<String>) -> Response {
    match error {
        // 没有可展示的广告：204 不带响应体
        AllocationError::NoAdsMatchingCriteria(_) => StatusCode::NO_CONTENT.into_response(),
        AllocationError::AdNotFound(_) => {
            (StatusCode::NOT_FOUND, Json(AllocationResponse::failure(error, slot))).into_response()
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, Json(AllocationResponse::failure(error, slot))).into_response(),
    }
}

/// **处理广告分配请求**
///
/// 没有可展示的广告时返回 204，调用方静默不展示；配置或存储问题返回 500。
pub async fn handle_allocate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AllocateParams>,
) -> Response {
    let context = AllocationContext::new(params.anonymous);
    let requested = params.campaign.as_deref().filter(|name| !name.is_empty());
    let slot = params.slot.clone();
    let mut log = AllocationLog::new(requested, &context, slot.as_deref());

    let response = match params.ad.as_deref().filter(|name| !name.is_empty()) {
        Some(ad_name) => match state.engine.preview(ad_name) {
            Ok(ad) => {
                log.set_preview(&ad.name);
                (StatusCode::OK, Json(AllocationResponse::success(ad.name, None, slot))).into_response()
            }
            Err(e) => {
                log.set_failure(&e);
                failure_response(&e, slot)
            }
        },
        None => match state.engine.allocate(requested, context, &mut ThreadRandom) {
            Ok(allocation) => {
                log.set_allocation(&allocation);
                match allocation.ad {
                    Some(ad) => (
                        StatusCode::OK,
                        Json(AllocationResponse::success(ad.name, Some(allocation.campaign), slot)),
                    )
                        .into_response(),
                    None => StatusCode::NO_CONTENT.into_response(),
                }
            }
            Err(e) => {
                log.set_failure(&e);
                failure_response(&e, slot)
            }
        },
    };

    match log.level() {
        "ERROR" => error!(request_id = %log.request_id, status = %log.status, "allocation failed: {:?}", log.error),
        "WARN" => warn!(request_id = %log.request_id, status = %log.status, "allocation rejected"),
        _ => info!(
            request_id = %log.request_id,
            status = %log.status,
            campaign = ?log.resolved_campaign,
            ad = ?log.selected_ad,
            "allocation finished"
        ),
    }
    state.runtime_logger.log(log.level(), &log.to_json()).await;

    response
}
