use std::path::PathBuf;

use anyhow::{Context, Result};
use gradescope_client::models::CourseSplit;
use gradescope_client::utils::logging;
use gradescope_client::{Config, Credentials, GradescopeRepository};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（可选参数：配置文件路径）
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    // 初始化日志
    logging::init_with_verbosity(config.verbose_logging);
    logging::log_startup(&config);

    let email = std::env::var("GRADESCOPE_EMAIL").context("缺少环境变量 GRADESCOPE_EMAIL")?;
    let password =
        std::env::var("GRADESCOPE_PASSWORD").context("缺少环境变量 GRADESCOPE_PASSWORD")?;

    let repository = GradescopeRepository::new(&config)?;
    let handle = repository.login(Credentials::new(email, password)).await?;

    let mut output = Vec::new();
    for course in repository.list_courses(&handle, CourseSplit::All).await? {
        let assignments = match repository.list_assignments(&handle, &course).await {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!("⚠️ 课程 {} 的作业读取失败: {}", course.display_name(), e);
                Vec::new()
            }
        };
        output.push(serde_json::json!({
            "course": course,
            "assignments": assignments,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&output)?);

    repository.logout().await?;
    info!("✅ 完成，共 {} 门课程", output.len());
    Ok(())
}
