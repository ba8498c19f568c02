//! 认证层
//!
//! - `Credentials` - 登录凭据（不持久化）
//! - `SessionManager` - 会话状态机，独占 cookie，串行化所有请求
//! - `SessionHandle` - 会话快照，供仓储层调用时出示

pub mod credentials;
pub mod manager;
pub mod session;

pub use credentials::Credentials;
pub use manager::{is_login_path, SessionManager, LOGIN_PAGE_PATH, LOGIN_PATH};
pub use session::{ReloginBudget, SessionHandle, SessionState};
