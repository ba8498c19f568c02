/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`；未设置时按 `verbose` 选择 debug 或 info 级别。
/// 重复调用不会报错，只有第一次生效
pub fn init_with_verbosity(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).try_init().ok();
}

/// 以默认级别初始化日志
pub fn init() {
    init_with_verbosity(false);
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 Gradescope 客户端启动");
    info!("🌐 站点: {}", config.base_url);
    info!(
        "🔁 最多重试 {} 次，单页超时 {} 秒，分页上限 {} 页",
        config.max_retries, config.request_timeout_secs, config.max_pages
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
