// src/allocation/filter.rs

use crate::model::campaign::CampaignAdLink;
use crate::model::context::AllocationContext;

/// 过滤出当前访客可见的广告，保持原有顺序
///
/// 未激活或展示标记不匹配的广告被静默丢弃。
pub fn eligible_links(links: &[CampaignAdLink], context: &AllocationContext) -> Vec<CampaignAdLink> {
    links
        .iter()
        .filter(|link| link.ad.is_eligible(context))
        .cloned()
        .collect()
}
