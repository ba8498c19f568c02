//! # Gradescope Client
//!
//! Gradescope 课程平台的非官方客户端：登录、读取课程 / 作业 / 提交 / 成员 / 成绩，
//! 以及少量教师写操作
//!
//! ## 架构设计
//!
//! 本系统采用四层架构，每层只依赖其下方的层：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP 客户端与 cookie jar），只暴露能力
//! - `Transport` - 发送请求、跟随重定向、对网络错误做有限次重试
//!
//! ### ② 认证层（Auth）
//! - `auth/` - 会话状态机（未登录 / 登录中 / 已登录 / 已过期）
//! - `SessionManager` - 串行化所有请求；检测会话过期后在一次逻辑操作内最多重新登录一次
//!
//! ### ③ 解析层（Extractors）
//! - `extractors/` - 纯函数，HTML → 实体；结构变化时报告缺失的锚点
//!
//! ### ④ 仓储层（Repository）
//! - `repository/` - 组合认证与解析，提供以实体为单位的操作；分页结果可部分成功
//!
//! ## 模块结构

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod infrastructure;
pub mod models;
pub mod repository;
pub mod utils;

// 重新导出常用类型
pub use auth::{Credentials, SessionHandle, SessionManager, SessionState};
pub use config::Config;
pub use error::{ExtractionFailure, GradescopeError, Result};
pub use infrastructure::{HttpTransport, Transport};
pub use models::{Assignment, Course, CourseRole, CourseSplit};
pub use repository::{GradescopeRepository, PartialResult};
