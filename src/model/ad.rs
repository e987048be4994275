// src/model/ad.rs

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::error::RepositoryError;
use crate::model::context::AllocationContext;

pub type AdId = u64;

/// 广告（分配时使用的只读投影）
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ad {
    pub id: AdId,
    pub name: String,
    pub display_to_anonymous: bool, // 是否展示给匿名用户
    pub display_to_user: bool,      // 是否展示给已登录用户
    pub active: bool,               // 未激活的广告不参与分配
}

impl Ad {
    pub fn new(id: AdId, name: &str, display_to_anonymous: bool, display_to_user: bool, active: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            display_to_anonymous,
            display_to_user,
            active,
        }
    }

    /// 广告在给定上下文中是否可展示
    pub fn is_eligible(&self, context: &AllocationContext) -> bool {
        let displayed = if context.is_anonymous() {
            self.display_to_anonymous
        } else {
            self.display_to_user
        };
        self.active && displayed
    }
}

/// 广告有效期，区间为 [start, end)，两端均可省略
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at < end)
    }
}

fn is_name_char(c: char) -> bool {
    // 希伯来字母 א..ת（含词尾形式）
    c.is_ascii_alphanumeric() || c == '_' || ('\u{05D0}'..='\u{05EA}').contains(&c)
}

/// 校验广告 / 活动名称：非空，只允许字母（含希伯来字母）、数字和下划线
pub fn validate_name(name: &str) -> Result<(), RepositoryError> {
    if !name.is_empty() && name.chars().all(is_name_char) {
        Ok(())
    } else {
        Err(RepositoryError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn eligibility_truth_table() {
        for active in [false, true] {
            for display_to_anonymous in [false, true] {
                for display_to_user in [false, true] {
                    let ad = Ad::new(1, "ad", display_to_anonymous, display_to_user, active);
                    for anonymous in [false, true] {
                        let context = AllocationContext::new(anonymous);
                        let expected = active
                            && ((anonymous && display_to_anonymous) || (!anonymous && display_to_user));
                        assert_eq!(
                            ad.is_eligible(&context),
                            expected,
                            "active={active} anon_flag={display_to_anonymous} user_flag={display_to_user} anonymous={anonymous}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("Employment_2024").is_ok());
        assert!(validate_name("תעסוקה_1").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("with space").is_err());
        assert!(validate_name("dash-ed").is_err());
        assert!(validate_name("Привет").is_err());
    }

    #[test]
    fn validity_window_is_half_open() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let window = ValidityWindow { start: Some(start), end: Some(end) };

        assert!(window.contains(start));
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()));
        assert!(!window.contains(end));
        assert!(!window.contains(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()));
        assert!(ValidityWindow::default().contains(end));
    }
}
