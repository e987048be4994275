// src/model/context.rs

use serde::{Serialize, Deserialize};

/// 分配上下文：当前访客是匿名用户还是已登录用户
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationContext {
    anonymous: bool,
}

impl AllocationContext {
    pub fn new(anonymous: bool) -> Self {
        Self { anonymous }
    }

    pub fn anonymous() -> Self {
        Self::new(true)
    }

    pub fn logged_in() -> Self {
        Self::new(false)
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}
