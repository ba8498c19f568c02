//! 错误类型
//!
//! 按层划分：传输层 (`TransportError`)、认证层 (`AuthenticationFailed` / `SessionError`)、
//! 解析层 (`ExtractionFailure`)、配置 (`ConfigError`)，最终在仓储层汇总为 `GradescopeError`。

use std::fmt;
use thiserror::Error;

/// 被解析的实体类型（用于定位解析失败）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// 登录表单
    LoginForm,
    /// 页面级 CSRF token
    CsrfToken,
    Course,
    Assignment,
    Submission,
    RosterMember,
    Grade,
    Question,
    /// 延期页面中的学生
    Extension,
}

impl EntityType {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            EntityType::LoginForm => "login_form",
            EntityType::CsrfToken => "csrf_token",
            EntityType::Course => "course",
            EntityType::Assignment => "assignment",
            EntityType::Submission => "submission",
            EntityType::RosterMember => "roster_member",
            EntityType::Grade => "grade",
            EntityType::Question => "question",
            EntityType::Extension => "extension",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ========== 解析层 ==========

/// HTML 解析失败：页面中缺少预期的结构锚点
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("解析 {entity_type} 失败: 缺少锚点 `{anchor_name}`{}", detail_suffix(.detail))]
pub struct ExtractionFailure {
    /// 正在解析的实体类型
    pub entity_type: EntityType,
    /// 缺失（或无法解析）的锚点
    pub anchor_name: &'static str,
    /// 附加诊断信息
    pub detail: Option<String>,
}

impl ExtractionFailure {
    /// 创建缺少锚点的错误
    pub fn missing(entity_type: EntityType, anchor_name: &'static str) -> Self {
        Self {
            entity_type,
            anchor_name,
            detail: None,
        }
    }

    /// 创建带诊断信息的错误
    pub fn invalid(
        entity_type: EntityType,
        anchor_name: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            entity_type,
            anchor_name,
            detail: Some(detail.into()),
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

// ========== 传输层 ==========

/// 网络错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// 请求超时
    Timeout,
    /// 连接失败
    Connect,
    /// 请求发送过程中断（连接重置等）
    Request,
    /// 读取响应体失败
    Body,
    /// 其他错误（重定向循环、构建失败等）
    Other,
}

impl NetworkErrorKind {
    /// 是否属于可重试的瞬时错误
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            NetworkErrorKind::Timeout
                | NetworkErrorKind::Connect
                | NetworkErrorKind::Request
                | NetworkErrorKind::Body
        )
    }

    /// 从 reqwest 错误推断分类
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            NetworkErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            NetworkErrorKind::Body
        } else if err.is_request() {
            NetworkErrorKind::Request
        } else {
            NetworkErrorKind::Other
        }
    }
}

/// 传输层错误
///
/// HTTP 4xx/5xx 不属于传输错误，会作为正常响应返回给调用方
#[derive(Debug, Error)]
pub enum TransportError {
    /// 网络请求失败
    #[error("网络请求失败 ({url}, {kind:?}), 共尝试 {attempts} 次{}: {source}", exhausted_note(.exhausted))]
    Network {
        url: String,
        attempts: usize,
        /// 是否因重试次数耗尽而失败
        exhausted: bool,
        kind: NetworkErrorKind,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求地址无效
    #[error("无效的请求地址: {url}")]
    InvalidUrl { url: String },
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端构建失败: {0}")]
    Build(#[source] reqwest::Error),
    /// 请求头无效
    #[error("无效的请求头 {name}")]
    InvalidHeader { name: String },
}

impl TransportError {
    /// 是否因重试次数耗尽而失败
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, TransportError::Network { exhausted: true, .. })
    }
}

fn exhausted_note(exhausted: &bool) -> &'static str {
    if *exhausted {
        "（重试已耗尽）"
    } else {
        ""
    }
}

// ========== 认证层 ==========

/// 登录失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailureReason {
    /// 账号或密码错误（登录后被重定向回登录页）
    BadCredentials,
    /// 登录页结构异常（缺少 CSRF 锚点）
    MalformedLoginPage { anchor: &'static str },
    /// 登录流程中出现非 2xx 响应
    UnexpectedStatus { status: u16 },
    /// 网络错误
    Network,
}

impl fmt::Display for AuthFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailureReason::BadCredentials => write!(f, "账号或密码错误"),
            AuthFailureReason::MalformedLoginPage { anchor } => {
                write!(f, "登录页结构异常，缺少 `{}`", anchor)
            }
            AuthFailureReason::UnexpectedStatus { status } => {
                write!(f, "登录流程返回异常状态码 {}", status)
            }
            AuthFailureReason::Network => write!(f, "网络错误"),
        }
    }
}

/// 登录失败
#[derive(Debug, Error)]
#[error("登录失败: {reason}")]
pub struct AuthenticationFailed {
    pub reason: AuthFailureReason,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AuthenticationFailed {
    pub fn bad_credentials() -> Self {
        Self {
            reason: AuthFailureReason::BadCredentials,
            source: None,
        }
    }

    pub fn malformed_login_page(failure: ExtractionFailure) -> Self {
        Self {
            reason: AuthFailureReason::MalformedLoginPage {
                anchor: failure.anchor_name,
            },
            source: Some(Box::new(failure)),
        }
    }

    pub fn unexpected_status(status: u16) -> Self {
        Self {
            reason: AuthFailureReason::UnexpectedStatus { status },
            source: None,
        }
    }

    pub fn network(err: TransportError) -> Self {
        Self {
            reason: AuthFailureReason::Network,
            source: Some(Box::new(err)),
        }
    }
}

/// 已认证请求的错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 会话尚未建立（或已登出）
    #[error("会话未建立，请先登录")]
    NotAuthenticated,
    /// 会话过期，且重新登录失败或本次操作的重登录次数已用完
    #[error("会话已过期{}", relogin_note(.relogin))]
    SessionExpired {
        #[source]
        relogin: Option<AuthenticationFailed>,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn relogin_note(relogin: &Option<AuthenticationFailed>) -> &'static str {
    if relogin.is_some() {
        "，重新登录失败"
    } else {
        "，本次操作已无重新登录机会"
    }
}

// ========== 配置 ==========

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: toml::de::Error,
    },
    /// 站点地址无效
    #[error("无效的站点地址: {value}")]
    InvalidBaseUrl { value: String },
}

// ========== 查找 ==========

/// 按名称 / ID 查找实体失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("未找到 {entity}: {key}")]
    NotFound { entity: EntityType, key: String },
    #[error("{entity} 名称 '{key}' 不唯一 (共 {count} 个)，请改用 ID")]
    Ambiguous {
        entity: EntityType,
        key: String,
        count: usize,
    },
    #[error("{entity} ID 重复: {id}")]
    DuplicateId { entity: EntityType, id: String },
}

// ========== 汇总 ==========

/// 仓储层对外暴露的错误
#[derive(Debug, Error)]
pub enum GradescopeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Authentication(#[from] AuthenticationFailed),
    #[error("会话未建立，请先登录")]
    NotAuthenticated,
    #[error("会话已过期{}", relogin_note(.relogin))]
    SessionExpired {
        #[source]
        relogin: Option<AuthenticationFailed>,
    },
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
    /// 业务请求返回非 2xx 状态码
    #[error("请求 {url} 返回异常状态码 {status}")]
    UnexpectedStatus { url: String, status: u16 },
    /// 分页达到上限，之后的页没有抓取
    #[error("已达到分页上限 {max_pages} 页，后续页未抓取")]
    PageLimitReached { max_pages: usize },
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<SessionError> for GradescopeError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotAuthenticated => GradescopeError::NotAuthenticated,
            SessionError::SessionExpired { relogin } => GradescopeError::SessionExpired { relogin },
            SessionError::Transport(e) => GradescopeError::Transport(e),
        }
    }
}

// ========== Result 类型别名 ==========

/// 仓储层结果类型
pub type Result<T, E = GradescopeError> = std::result::Result<T, E>;
