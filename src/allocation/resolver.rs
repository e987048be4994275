// src/allocation/resolver.rs

use serde::Serialize;

use crate::error::{AllocationError, Result};
use crate::model::adapters::{CampaignRepository, Lookup};
use crate::model::campaign::Campaign;

/// 活动来源：请求中指定的活动，或回退活动
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignSource {
    Requested,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCampaign {
    pub campaign: Campaign,
    pub source: CampaignSource,
}

/// **活动解析器**
///
/// 请求的活动不存在或被禁用时回退到 `fallback_campaign`；回退活动本身不可用时返回错误。
pub struct CampaignResolver<'a, C: CampaignRepository + ?Sized> {
    repository: &'a C,
    fallback_campaign: &'a str,
}

impl<'a, C: CampaignRepository + ?Sized> CampaignResolver<'a, C> {
    pub fn new(repository: &'a C, fallback_campaign: &'a str) -> Self {
        Self { repository, fallback_campaign }
    }

    pub fn resolve(&self, requested: Option<&str>) -> Result<ResolvedCampaign> {
        if let Some(name) = requested.filter(|name| !name.is_empty()) {
            if let Lookup::Found(campaign) = self.repository.find_by_name(name)? {
                if self.repository.is_enabled(&campaign) {
                    return Ok(ResolvedCampaign { campaign, source: CampaignSource::Requested });
                }
            }
        }

        match self.repository.find_by_name(self.fallback_campaign)? {
            Lookup::NotFound => Err(AllocationError::NoFallbackCampaign(self.fallback_campaign.to_string())),
            Lookup::Found(campaign) if !self.repository.is_enabled(&campaign) => {
                Err(AllocationError::FallbackCampaignDisabled(campaign.name))
            }
            Lookup::Found(campaign) => Ok(ResolvedCampaign { campaign, source: CampaignSource::Fallback }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use crate::model::campaign::CampaignAdLink;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 内存中的活动存储，记录被查询过的名称
    #[derive(Default)]
    pub(crate) struct MemoryCampaigns {
        pub campaigns: HashMap<String, (Campaign, Vec<CampaignAdLink>)>,
        pub lookups: Mutex<Vec<String>>,
        pub broken: bool,
    }

    impl MemoryCampaigns {
        pub fn with(mut self, campaign: Campaign, links: Vec<CampaignAdLink>) -> Self {
            self.campaigns.insert(campaign.name.clone(), (campaign, links));
            self
        }

        pub fn looked_up(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    impl CampaignRepository for MemoryCampaigns {
        fn find_by_name(&self, name: &str) -> std::result::Result<Lookup<Campaign>, RepositoryError> {
            if self.broken {
                return Err(RepositoryError::Unavailable("connection refused".into()));
            }
            self.lookups.lock().unwrap().push(name.to_string());
            Ok(self.campaigns.get(name).map(|(c, _)| c.clone()).into())
        }

        fn list_ads_with_weights(&self, campaign: &Campaign) -> std::result::Result<Vec<CampaignAdLink>, RepositoryError> {
            Ok(self.campaigns.get(&campaign.name).map(|(_, l)| l.clone()).unwrap_or_default())
        }
    }

    #[test]
    fn requested_campaign_is_used_when_enabled() {
        let repo = MemoryCampaigns::default()
            .with(Campaign::new(1, "Employment", true), vec![])
            .with(Campaign::new(2, "general", true), vec![]);
        let resolved = CampaignResolver::new(&repo, "general").resolve(Some("Employment")).unwrap();
        assert_eq!(resolved.campaign.name, "Employment");
        assert_eq!(resolved.source, CampaignSource::Requested);
        assert_eq!(repo.looked_up(), vec!["Employment".to_string()]);
    }

    #[test]
    fn missing_campaign_falls_back() {
        let repo = MemoryCampaigns::default().with(Campaign::new(2, "general", true), vec![]);
        let resolved = CampaignResolver::new(&repo, "general").resolve(Some("Employment")).unwrap();
        assert_eq!(resolved.campaign.name, "general");
        assert_eq!(resolved.source, CampaignSource::Fallback);
    }

    #[test]
    fn disabled_campaign_without_fallback_fails() {
        let repo = MemoryCampaigns::default().with(Campaign::new(1, "Employment", false), vec![]);
        let err = CampaignResolver::new(&repo, "general").resolve(Some("Employment")).unwrap_err();
        assert!(matches!(err, AllocationError::NoFallbackCampaign(ref name) if name == "general"));
    }

    #[test]
    fn disabled_campaign_falls_back_to_enabled_fallback() {
        let repo = MemoryCampaigns::default()
            .with(Campaign::new(1, "Employment", false), vec![])
            .with(Campaign::new(2, "general", true), vec![]);
        let resolved = CampaignResolver::new(&repo, "general").resolve(Some("Employment")).unwrap();
        assert_eq!(resolved.campaign.name, "general");
        assert_eq!(resolved.source, CampaignSource::Fallback);
        assert_eq!(repo.looked_up(), vec!["Employment".to_string(), "general".to_string()]);
    }

    #[test]
    fn requesting_the_disabled_fallback_fails() {
        let repo = MemoryCampaigns::default().with(Campaign::new(2, "general", false), vec![]);
        let err = CampaignResolver::new(&repo, "general").resolve(Some("general")).unwrap_err();
        assert!(matches!(err, AllocationError::FallbackCampaignDisabled(ref name) if name == "general"));
    }

    #[test]
    fn no_request_with_disabled_fallback_fails() {
        let repo = MemoryCampaigns::default().with(Campaign::new(2, "general", false), vec![]);
        let resolver = CampaignResolver::new(&repo, "general");
        assert!(matches!(resolver.resolve(None), Err(AllocationError::FallbackCampaignDisabled(_))));
        assert!(matches!(resolver.resolve(Some("")), Err(AllocationError::FallbackCampaignDisabled(_))));
        assert_eq!(repo.looked_up(), vec!["general".to_string(), "general".to_string()]);
    }

    #[test]
    fn repository_failures_propagate() {
        let repo = MemoryCampaigns { broken: true, ..Default::default() };
        let err = CampaignResolver::new(&repo, "general").resolve(Some("Employment")).unwrap_err();
        assert!(matches!(err, AllocationError::Repository(RepositoryError::Unavailable(_))));
    }
}
