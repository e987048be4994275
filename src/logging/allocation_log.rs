use chrono::Utc;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::allocation::engine::Allocation;
use crate::error::AllocationError;
use crate::model::context::AllocationContext;

/// **广告分配日志**，每个 HTTP 请求一条
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AllocationLog {
    pub timestamp: String,                   // 记录时间
    pub log_type: String,                    // 固定为 "promoter_allocation"
    pub request_id: String,                  // 请求唯一标识
    pub requested_campaign: Option<String>,  // 请求中的活动名称
    pub resolved_campaign: Option<String>,   // 实际使用的活动
    pub fallback_used: bool,                 // 是否使用了回退活动
    pub anonymous: bool,                     // 访客是否匿名
    pub slot: Option<String>,                // 页面广告位
    pub status: String,                      // "success" / "no_ad_selected" / "preview" / 错误码
    pub selected_ad: Option<String>,         // 选中的广告
    pub error: Option<String>,               // 错误描述
}

impl AllocationLog {
    pub fn new(requested_campaign: Option<&str>, context: &AllocationContext, slot: Option<&str>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "promoter_allocation".to_string(),
            request_id: Uuid::new_v4().to_string(),
            requested_campaign: requested_campaign.map(str::to_string),
            resolved_campaign: None,
            fallback_used: false,
            anonymous: context.is_anonymous(),
            slot: slot.map(str::to_string),
            status: "no_ad_selected".to_string(),
            selected_ad: None,
            error: None,
        }
    }

    /// **记录分配结果**，没有选中广告时仍记录实际使用的活动
    pub fn set_allocation(&mut self, allocation: &Allocation) {
        self.status = if allocation.is_selected() { "success" } else { "no_ad_selected" }.to_string();
        self.resolved_campaign = Some(allocation.campaign.clone());
        self.fallback_used = allocation.fallback_used();
        self.selected_ad = allocation.ad.as_ref().map(|ad| ad.name.clone());
    }

    pub fn set_preview(&mut self, ad_name: &str) {
        self.status = "preview".to_string();
        self.selected_ad = Some(ad_name.to_string());
    }

    pub fn set_failure(&mut self, error: &AllocationError) {
        self.status = error.code().to_string();
        if let AllocationError::NoAdsMatchingCriteria(campaign) = error {
            self.resolved_campaign = Some(campaign.clone());
        }
        self.error = Some(error.to_string());
    }

    /// 配置 / 存储问题记 ERROR，预览不存在的广告记 WARN，其余记 INFO
    pub fn level(&self) -> &'static str {
        match self.status.as_str() {
            "no_fallback_campaign" | "fallback_campaign_disabled" | "repository_error" => "ERROR",
            "ad_not_found" => "WARN",
            _ => "INFO",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
