// src/model/campaign.rs

use serde::{Serialize, Deserialize};

use crate::model::ad::Ad;

pub type CampaignId = u64;

/// 广告活动
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub enabled: bool,  // 禁用的活动不参与分配，触发回退
    pub archived: bool, // 仅影响管理列表，不影响分配
}

impl Campaign {
    pub fn new(id: CampaignId, name: &str, enabled: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            enabled,
            archived: false,
        }
    }
}

/// 活动与广告的关联，权重属于关联而不属于广告本身
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CampaignAdLink {
    pub ad: Ad,
    pub weight: u32,
}

impl CampaignAdLink {
    pub fn new(ad: Ad, weight: u32) -> Self {
        Self { ad, weight }
    }
}
