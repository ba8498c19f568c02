//! 网络错误重试
//!
//! 只重试瞬时网络错误（超时、连接失败、连接中断）。HTTP 4xx/5xx 由调用方处理，不在此重试。

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::Config;
use crate::error::{NetworkErrorKind, TransportError};

/// 重试策略：指数退避 `initial * 2^attempt`，不超过 `max_delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次请求）
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
        }
    }

    /// 不重试
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// 第 `attempt` 次失败后的等待时间（从 0 开始计数）
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31) as u32);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// 单次尝试的失败信息
#[derive(Debug)]
pub struct AttemptFailure {
    pub kind: NetworkErrorKind,
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl From<reqwest::Error> for AttemptFailure {
    fn from(err: reqwest::Error) -> Self {
        Self {
            kind: NetworkErrorKind::from_reqwest(&err),
            source: Box::new(err),
        }
    }
}

/// 按策略执行 `op`，`op` 的参数为当前尝试序号（从 0 开始）
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut op: F,
) -> Result<T, TransportError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, AttemptFailure>>,
{
    let mut attempt = 0;
    loop {
        let failure = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        let attempts = attempt + 1;
        if !failure.kind.is_transient() {
            return Err(TransportError::Network {
                url: url.to_string(),
                attempts,
                exhausted: false,
                kind: failure.kind,
                source: failure.source,
            });
        }

        if attempt >= policy.max_retries {
            warn!("❌ 请求 {} 重试 {} 次后仍然失败: {}", url, attempt, failure.source);
            return Err(TransportError::Network {
                url: url.to_string(),
                attempts,
                exhausted: true,
                kind: failure.kind,
                source: failure.source,
            });
        }

        let delay = policy.delay_for(attempt);
        warn!(
            "⚠️ 请求 {} 失败 ({:?}, 尝试 {}/{}), {}ms 后重试: {}",
            url,
            failure.kind,
            attempts,
            policy.max_retries + 1,
            delay.as_millis(),
            failure.source
        );
        sleep(delay).await;
        attempt += 1;
    }
}
