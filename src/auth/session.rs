use chrono::{DateTime, Utc};
use std::fmt;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 未登录（初始状态，或登录失败 / 登出之后）
    Unauthenticated,
    /// 登录中
    Authenticating,
    /// 已登录
    Authenticated,
    /// 平台已使会话失效，等待重新登录
    Expired,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated => "authenticated",
            SessionState::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 已建立会话的描述
///
/// 只是一份快照，cookie 始终由会话管理器持有。重新登录后 `generation` 递增，
/// 旧的句柄仍可继续使用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    email: String,
    logged_in_at: DateTime<Utc>,
    generation: u64,
}

impl SessionHandle {
    pub(crate) fn new(email: impl Into<String>, generation: u64) -> Self {
        Self {
            email: email.into(),
            logged_in_at: Utc::now(),
            generation,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn logged_in_at(&self) -> DateTime<Utc> {
        self.logged_in_at
    }

    /// 第几次成功登录
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 单次逻辑操作内允许的重新登录次数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloginBudget {
    remaining: u8,
}

impl ReloginBudget {
    /// 每个逻辑操作最多重新登录一次
    pub fn new() -> Self {
        Self { remaining: 1 }
    }

    pub fn exhausted() -> Self {
        Self { remaining: 0 }
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    pub(crate) fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

impl Default for ReloginBudget {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_allows_one_relogin() {
        let mut budget = ReloginBudget::new();
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.remaining(), 0);
        assert!(!ReloginBudget::exhausted().try_consume());
    }
}
