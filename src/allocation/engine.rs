// src/allocation/engine.rs

use serde::Serialize;
use std::sync::Arc;

use crate::allocation::allocator::{self, RandomSource};
use crate::allocation::filter::eligible_links;
use crate::allocation::resolver::{CampaignResolver, CampaignSource};
use crate::config::config_manager::ConfigManager;
use crate::error::{AllocationError, Result};
use crate::model::ad::Ad;
use crate::model::adapters::{AdRepository, CampaignRepository, Lookup};
use crate::model::context::AllocationContext;

/// 一次分配的结果；`ad` 为 `None` 表示活动可用，但可见广告的权重全部为 0
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub ad: Option<Ad>,
    pub campaign: String,
    pub source: CampaignSource,
}

impl Allocation {
    pub fn is_selected(&self) -> bool {
        self.ad.is_some()
    }

    pub fn fallback_used(&self) -> bool {
        self.source == CampaignSource::Fallback
    }
}

/// **分配流程：解析活动 -> 过滤广告 -> 加权抽取**
///
/// - `Ok(Allocation { ad: Some(_), .. })`：选中了广告
/// - `Ok(Allocation { ad: None, .. })`：可见广告的权重全部为 0，没有选中任何广告
/// - `Err(NoAdsMatchingCriteria)`：活动里没有当前访客可见的广告
pub fn allocate<C, R>(
    repository: &C,
    requested_campaign: Option<&str>,
    context: AllocationContext,
    fallback_campaign: &str,
    rng: &mut R,
) -> Result<Allocation>
where
    C: CampaignRepository + ?Sized,
    R: RandomSource + ?Sized,
{
    let resolved = CampaignResolver::new(repository, fallback_campaign).resolve(requested_campaign)?;
    let links = repository.list_ads_with_weights(&resolved.campaign)?;

    let eligible = eligible_links(&links, &context);
    if eligible.is_empty() {
        return Err(AllocationError::NoAdsMatchingCriteria(resolved.campaign.name));
    }

    let ad = allocator::allocate(&eligible, rng).map(|link| link.ad.clone());
    Ok(Allocation {
        ad,
        campaign: resolved.campaign.name,
        source: resolved.source,
    })
}

/// 持有存储和回退配置的分配引擎，可在多个请求间共享
#[derive(Clone)]
pub struct AllocationEngine {
    campaigns: Arc<dyn CampaignRepository>,
    ads: Arc<dyn AdRepository>,
    fallback_campaign: String,
}

impl AllocationEngine {
    pub fn new<S>(store: Arc<S>, config: &ConfigManager) -> Self
    where
        S: CampaignRepository + AdRepository + 'static,
    {
        Self {
            campaigns: store.clone(),
            ads: store,
            fallback_campaign: config.fallback_campaign.clone(),
        }
    }

    pub fn fallback_campaign(&self) -> &str {
        &self.fallback_campaign
    }

    pub fn allocate<R: RandomSource + ?Sized>(
        &self,
        requested_campaign: Option<&str>,
        context: AllocationContext,
        rng: &mut R,
    ) -> Result<Allocation> {
        allocate(self.campaigns.as_ref(), requested_campaign, context, &self.fallback_campaign, rng)
    }

    /// 按名称直接取广告（预览），不经过活动和权重
    pub fn preview(&self, ad_name: &str) -> Result<Ad> {
        match self.ads.find_ad_by_name(ad_name)? {
            Lookup::Found(ad) => Ok(ad),
            Lookup::NotFound => Err(AllocationError::AdNotFound(ad_name.to_string())),
        }
    }
}
