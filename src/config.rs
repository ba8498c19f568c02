use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::ConfigError;

/// 客户端配置
///
/// 加载顺序：默认值 → TOML 文件（可选）→ 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 站点地址
    pub base_url: String,
    /// 请求使用的 User-Agent
    pub user_agent: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 网络错误最大重试次数（不含首次请求）
    pub max_retries: usize,
    /// 首次重试等待时间（毫秒）
    pub initial_retry_delay_ms: u64,
    /// 重试等待时间上限（毫秒）
    pub max_retry_delay_ms: u64,
    /// 分页抓取的最大页数
    pub max_pages: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://www.gradescope.com".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            initial_retry_delay_ms: 500,
            max_retry_delay_ms: 8000,
            max_pages: 200,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取，未出现的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.to_string(),
                source,
            })?;
        config.base_url()?;
        Ok(config)
    }

    /// 按加载顺序得到最终配置
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let config = Self {
            base_url: env_string("GRADESCOPE_BASE_URL").unwrap_or(self.base_url),
            user_agent: env_string("GRADESCOPE_USER_AGENT").unwrap_or(self.user_agent),
            request_timeout_secs: env_parse("GRADESCOPE_TIMEOUT_SECS", self.request_timeout_secs)?,
            max_retries: env_parse("GRADESCOPE_MAX_RETRIES", self.max_retries)?,
            initial_retry_delay_ms: env_parse(
                "GRADESCOPE_RETRY_DELAY_MS",
                self.initial_retry_delay_ms,
            )?,
            max_retry_delay_ms: env_parse(
                "GRADESCOPE_MAX_RETRY_DELAY_MS",
                self.max_retry_delay_ms,
            )?,
            max_pages: env_parse("GRADESCOPE_MAX_PAGES", self.max_pages)?,
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
        };
        config.base_url()?;
        Ok(config)
    }

    /// 解析后的站点地址
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .ok()
            .filter(|u| u.scheme() == "http" || u.scheme() == "https")
            .ok_or_else(|| ConfigError::InvalidBaseUrl {
                value: self.base_url.clone(),
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match env_string(var_name) {
        Some(raw) => parse_value(var_name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(var_name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: raw.to_string(),
            expected_type: std::any::type_name::<T>().to_string(),
        })
}
