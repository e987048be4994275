// src/error.rs

use thiserror::Error;

/// 存储层错误（广告 / 活动数据读取失败）
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Unable to read data file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse data file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid name `{0}`: only letters, digits and underscore are allowed")]
    InvalidName(String),

    #[error("Duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Campaign `{campaign}` links unknown ad `{ad}`")]
    DanglingAdReference { campaign: String, ad: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// 配置错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Fallback campaign name must not be empty")]
    EmptyFallbackCampaign,
}

/// **广告分配失败**
///
/// 前两个变体是配置问题，`NoAdsMatchingCriteria` 是定向问题（活动可用，但当前访客没有可展示的广告）。
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Fallback campaign `{0}` does not exist")]
    NoFallbackCampaign(String),

    #[error("Fallback campaign `{0}` is disabled")]
    FallbackCampaignDisabled(String),

    #[error("No ads in campaign `{0}` match the viewer criteria")]
    NoAdsMatchingCriteria(String),

    #[error("Ad `{0}` does not exist")]
    AdNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AllocationError {
    /// 对外返回的错误码
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::NoFallbackCampaign(_) => "no_fallback_campaign",
            AllocationError::FallbackCampaignDisabled(_) => "fallback_campaign_disabled",
            AllocationError::NoAdsMatchingCriteria(_) => "no_ads_matching_criteria",
            AllocationError::AdNotFound(_) => "ad_not_found",
            AllocationError::Repository(_) => "repository_error",
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AllocationError::NoFallbackCampaign(_)
                | AllocationError::FallbackCampaignDisabled(_)
                | AllocationError::Repository(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AllocationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_separated_from_targeting() {
        assert!(AllocationError::NoFallbackCampaign("general".into()).is_configuration_error());
        assert!(AllocationError::FallbackCampaignDisabled("general".into()).is_configuration_error());
        assert!(!AllocationError::NoAdsMatchingCriteria("Employment".into()).is_configuration_error());
        assert!(!AllocationError::AdNotFound("jobs".into()).is_configuration_error());
    }

    #[test]
    fn repository_error_is_transparent() {
        let err: AllocationError = RepositoryError::Unavailable("db down".into()).into();
        assert_eq!(err.to_string(), "Storage unavailable: db down");
        assert_eq!(err.code(), "repository_error");
    }
}
