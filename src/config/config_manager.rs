// src/config/config_manager.rs

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_FALLBACK_CAMPAIGN: &str = "general";

/// 运行配置：回退活动名称和数据文件位置
#[derive(Clone, Debug)]
pub struct ConfigManager {
    pub fallback_campaign: String,
    pub data_file: PathBuf,
}

impl ConfigManager {
    pub fn new(fallback_campaign: &str, data_file: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let fallback_campaign = fallback_campaign.trim();
        if fallback_campaign.is_empty() {
            return Err(ConfigError::EmptyFallbackCampaign);
        }
        Ok(ConfigManager {
            fallback_campaign: fallback_campaign.to_string(),
            data_file: data_file.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_fallback() {
        assert_eq!(
            ConfigManager::new("  ", "static/promoter.json").unwrap_err(),
            ConfigError::EmptyFallbackCampaign
        );
    }

    #[test]
    fn trims_fallback_name() {
        let config = ConfigManager::new(" general ", "data.json").unwrap();
        assert_eq!(config.fallback_campaign, DEFAULT_FALLBACK_CAMPAIGN);
        assert_eq!(config.data_file, PathBuf::from("data.json"));
    }
}
