// src/model/adapters.rs

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::RepositoryError;
use crate::model::ad::{validate_name, Ad, AdId, ValidityWindow};
use crate::model::campaign::{Campaign, CampaignAdLink, CampaignId};

/// 查询结果：找到 / 未找到。未找到不是错误，由调用方决定是否回退
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::NotFound, Lookup::Found)
    }
}

pub trait CampaignRepository: Send + Sync {
    fn find_by_name(&self, name: &str) -> Result<Lookup<Campaign>, RepositoryError>;

    fn is_enabled(&self, campaign: &Campaign) -> bool {
        campaign.enabled
    }

    /// 返回活动下的 (广告, 权重) 列表，顺序即存储顺序
    fn list_ads_with_weights(&self, campaign: &Campaign) -> Result<Vec<CampaignAdLink>, RepositoryError>;
}

pub trait AdRepository: Send + Sync {
    fn find_ad_by_name(&self, name: &str) -> Result<Lookup<Ad>, RepositoryError>;

    fn find_ad_by_id(&self, id: AdId) -> Result<Lookup<Ad>, RepositoryError>;

    fn ad_exists(&self, name: &str) -> Result<bool, RepositoryError> {
        Ok(self.find_ad_by_name(name)?.is_found())
    }
}

/// 数据文件中的广告记录
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdRecord {
    pub id: AdId,
    pub name: String,
    #[serde(default)]
    pub display_to_anonymous: bool,
    #[serde(default)]
    pub display_to_user: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(flatten)]
    pub window: ValidityWindow,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LinkRecord {
    pub ad: String,
    pub weight: u32,
}

/// 数据文件中的活动记录
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CampaignRecord {
    pub id: CampaignId,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub ads: Vec<LinkRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RepositoryData {
    #[serde(default)]
    pub ads: Vec<AdRecord>,
    #[serde(default)]
    pub campaigns: Vec<CampaignRecord>,
}

/// 基于 JSON 文件的广告 / 活动存储，加载后只读
pub struct FileRepository {
    ads: Vec<AdRecord>,
    ads_by_name: HashMap<String, usize>,
    campaigns: Vec<CampaignRecord>,
    campaigns_by_name: HashMap<String, usize>,
    pinned_now: Option<DateTime<Utc>>,
}

impl FileRepository {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RepositoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let data: RepositoryData = serde_json::from_str(&content)?;
        Self::from_data(data)
    }

    /// 校验名称、重名和悬空引用后建立索引
    pub fn from_data(data: RepositoryData) -> Result<Self, RepositoryError> {
        let mut ads_by_name = HashMap::new();
        let mut ad_ids = HashSet::new();
        for (index, ad) in data.ads.iter().enumerate() {
            validate_name(&ad.name)?;
            if ads_by_name.insert(ad.name.clone(), index).is_some() {
                return Err(RepositoryError::DuplicateName { kind: "ad", name: ad.name.clone() });
            }
            if !ad_ids.insert(ad.id) {
                return Err(RepositoryError::DuplicateName { kind: "ad id", name: ad.id.to_string() });
            }
        }

        let mut campaigns_by_name = HashMap::new();
        for (index, campaign) in data.campaigns.iter().enumerate() {
            validate_name(&campaign.name)?;
            if campaigns_by_name.insert(campaign.name.clone(), index).is_some() {
                return Err(RepositoryError::DuplicateName { kind: "campaign", name: campaign.name.clone() });
            }
            if let Some(link) = campaign.ads.iter().find(|link| !ads_by_name.contains_key(&link.ad)) {
                return Err(RepositoryError::DanglingAdReference {
                    campaign: campaign.name.clone(),
                    ad: link.ad.clone(),
                });
            }
        }

        Ok(Self {
            ads: data.ads,
            ads_by_name,
            campaigns: data.campaigns,
            campaigns_by_name,
            pinned_now: None,
        })
    }

    /// 固定有效期判断使用的时间
    pub fn pin_clock(mut self, at: DateTime<Utc>) -> Self {
        self.pinned_now = Some(at);
        self
    }

    pub fn campaign_names(&self, include_archived: bool) -> Vec<String> {
        self.campaigns
            .iter()
            .filter(|c| include_archived || !c.archived)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn ad_count(&self) -> usize {
        self.ads.len()
    }

    fn now(&self) -> DateTime<Utc> {
        self.pinned_now.unwrap_or_else(Utc::now)
    }

    fn project(&self, record: &AdRecord) -> Ad {
        Ad {
            id: record.id,
            name: record.name.clone(),
            display_to_anonymous: record.display_to_anonymous,
            display_to_user: record.display_to_user,
            active: record.active && record.window.contains(self.now()),
        }
    }
}

impl CampaignRepository for FileRepository {
    fn find_by_name(&self, name: &str) -> Result<Lookup<Campaign>, RepositoryError> {
        let campaign = self.campaigns_by_name.get(name).map(|&index| {
            let record = &self.campaigns[index];
            Campaign {
                id: record.id,
                name: record.name.clone(),
                enabled: record.enabled,
                archived: record.archived,
            }
        });
        Ok(campaign.into())
    }

    fn list_ads_with_weights(&self, campaign: &Campaign) -> Result<Vec<CampaignAdLink>, RepositoryError> {
        let Some(&index) = self.campaigns_by_name.get(&campaign.name) else {
            return Ok(Vec::new());
        };
        let links = self.campaigns[index]
            .ads
            .iter()
            .filter_map(|link| {
                self.ads_by_name
                    .get(&link.ad)
                    .map(|&ad_index| CampaignAdLink::new(self.project(&self.ads[ad_index]), link.weight))
            })
            .collect();
        Ok(links)
    }
}

impl AdRepository for FileRepository {
    fn find_ad_by_name(&self, name: &str) -> Result<Lookup<Ad>, RepositoryError> {
        Ok(self.ads_by_name.get(name).map(|&index| self.project(&self.ads[index])).into())
    }

    fn find_ad_by_id(&self, id: AdId) -> Result<Lookup<Ad>, RepositoryError> {
        Ok(self.ads.iter().find(|ad| ad.id == id).map(|ad| self.project(ad)).into())
    }
}
