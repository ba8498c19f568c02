//! 会话管理器
//!
//! 状态机：Unauthenticated → Authenticating → Authenticated ⇄ Expired
//!
//! 所有经过管理器的请求都在同一把异步锁内执行，重新登录不会与使用旧 cookie 的请求交错。

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::credentials::Credentials;
use crate::auth::session::{ReloginBudget, SessionHandle, SessionState};
use crate::error::{AuthenticationFailed, SessionError, TransportError};
use crate::extractors::login::extract_login_csrf;
use crate::infrastructure::transport::{Transport, TransportRequest, TransportResponse, Url};

/// 登录页（获取 CSRF token）
pub const LOGIN_PAGE_PATH: &str = "/";
/// 登录表单提交地址
pub const LOGIN_PATH: &str = "/login";

/// 最终地址是否为登录页
pub fn is_login_path(path: &str) -> bool {
    matches!(path.trim_end_matches('/'), "" | "/login")
}

struct SessionSlot {
    state: SessionState,
    credentials: Option<Credentials>,
    session: Option<SessionHandle>,
    generation: u64,
    /// 是否实际观察到请求被重定向到登录页（`mark_expired` 不设置）
    expiry_observed: bool,
}

impl SessionSlot {
    fn reset(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.credentials = None;
        self.session = None;
        self.expiry_observed = false;
    }
}

/// 会话管理器，独占传输层与会话状态
pub struct SessionManager<T: Transport> {
    transport: T,
    base_url: Url,
    slot: Mutex<SessionSlot>,
}

impl<T: Transport> SessionManager<T> {
    pub fn new(transport: T, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
            slot: Mutex::new(SessionSlot {
                state: SessionState::Unauthenticated,
                credentials: None,
                session: None,
                generation: 0,
                expiry_observed: false,
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 站内路径转换为完整地址
    pub fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|_| TransportError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
            })
    }

    pub async fn state(&self) -> SessionState {
        self.slot.lock().await.state
    }

    pub async fn current_session(&self) -> Option<SessionHandle> {
        let slot = self.slot.lock().await;
        match slot.state {
            SessionState::Authenticated => slot.session.clone(),
            _ => None,
        }
    }

    /// 登录，成功后替换当前会话
    pub async fn login(
        &self,
        credentials: Credentials,
    ) -> Result<SessionHandle, AuthenticationFailed> {
        let mut slot = self.slot.lock().await;
        self.login_locked(&mut slot, credentials).await
    }

    /// 已以同一账号登录时直接返回当前会话，否则登录
    pub async fn ensure_session(
        &self,
        credentials: Credentials,
    ) -> Result<SessionHandle, AuthenticationFailed> {
        let mut slot = self.slot.lock().await;
        if slot.state == SessionState::Authenticated {
            if let Some(session) = slot
                .session
                .as_ref()
                .filter(|s| s.email() == credentials.email())
            {
                debug!("♻️ 复用已有会话: {}", session.email());
                return Ok(session.clone());
            }
        }
        self.login_locked(&mut slot, credentials).await
    }

    /// 标记当前会话可能已失效
    ///
    /// 下一次请求仍使用现有 cookie；被重定向到登录页时才重新登录
    pub async fn mark_expired(&self) {
        let mut slot = self.slot.lock().await;
        if slot.state == SessionState::Authenticated {
            warn!("⚠️ 会话被标记为过期");
            slot.state = SessionState::Expired;
            slot.expiry_observed = false;
        }
    }

    /// 登出：丢弃凭据、会话与 cookie
    pub async fn logout(&self) -> Result<(), TransportError> {
        let mut slot = self.slot.lock().await;
        slot.reset();
        self.transport.reset_cookies()?;
        info!("👋 已登出");
        Ok(())
    }

    /// 使用新的重登录预算发送请求
    pub async fn execute(
        &self,
        handle: &SessionHandle,
        request: &TransportRequest,
    ) -> Result<TransportResponse, SessionError> {
        let mut budget = ReloginBudget::new();
        self.execute_as(handle, request, &mut budget).await
    }

    /// 以已登录身份发送请求
    ///
    /// 响应被重定向到登录页时视为会话过期：在 `budget` 允许时用原凭据重新登录一次并重发请求，
    /// 否则返回 `SessionError::SessionExpired`。
    ///
    /// 只有实际观察到被重定向到登录页才消耗重登录预算：通过 `mark_expired` 进入 `Expired`
    /// 状态时仍先用现有 cookie 发送请求。
    pub async fn execute_as(
        &self,
        handle: &SessionHandle,
        request: &TransportRequest,
        budget: &mut ReloginBudget,
    ) -> Result<TransportResponse, SessionError> {
        let mut slot = self.slot.lock().await;
        loop {
            let owns_session = slot
                .credentials
                .as_ref()
                .is_some_and(|c| c.email() == handle.email());
            if !owns_session {
                return Err(SessionError::NotAuthenticated);
            }

            match slot.state {
                SessionState::Unauthenticated | SessionState::Authenticating => {
                    return Err(SessionError::NotAuthenticated);
                }
                SessionState::Expired if slot.expiry_observed => {
                    if !budget.try_consume() {
                        warn!("❌ 会话已过期，本次操作已无重新登录机会");
                        return Err(SessionError::SessionExpired { relogin: None });
                    }
                    let Some(credentials) = slot.credentials.clone() else {
                        return Err(SessionError::SessionExpired { relogin: None });
                    };
                    info!("🔄 会话已过期，重新登录 {}", credentials.email());
                    if let Err(e) = self.login_locked(&mut slot, credentials).await {
                        return Err(SessionError::SessionExpired { relogin: Some(e) });
                    }
                }
                SessionState::Authenticated | SessionState::Expired => {
                    let response = self.transport.execute(request).await?;
                    if response.redirected && is_login_path(response.path()) {
                        warn!(
                            "⚠️ 请求 {} 被重定向到登录页，会话已过期",
                            request.url
                        );
                        slot.state = SessionState::Expired;
                        slot.expiry_observed = true;
                        continue;
                    }
                    if slot.state == SessionState::Expired {
                        debug!("♻️ 标记为过期的会话仍然有效: {}", handle.email());
                        slot.state = SessionState::Authenticated;
                    }
                    return Ok(response);
                }
            }
        }
    }

    async fn login_locked(
        &self,
        slot: &mut SessionSlot,
        credentials: Credentials,
    ) -> Result<SessionHandle, AuthenticationFailed> {
        slot.state = SessionState::Authenticating;
        slot.session = None;
        info!("🔐 正在登录: {}", credentials.email());

        match self.perform_login(&credentials).await {
            Ok(()) => {
                slot.generation += 1;
                let handle = SessionHandle::new(credentials.email(), slot.generation);
                slot.state = SessionState::Authenticated;
                slot.expiry_observed = false;
                slot.session = Some(handle.clone());
                slot.credentials = Some(credentials);
                info!("✅ 登录成功: {} (第 {} 次)", handle.email(), handle.generation());
                Ok(handle)
            }
            Err(e) => {
                slot.reset();
                warn!("❌ {}", e);
                Err(e)
            }
        }
    }

    async fn perform_login(&self, credentials: &Credentials) -> Result<(), AuthenticationFailed> {
        self.transport
            .reset_cookies()
            .map_err(AuthenticationFailed::network)?;

        let page_url = self
            .url(LOGIN_PAGE_PATH)
            .map_err(AuthenticationFailed::network)?;
        let page = self
            .transport
            .execute(&TransportRequest::get(page_url))
            .await
            .map_err(AuthenticationFailed::network)?;
        if !page.is_success() {
            return Err(AuthenticationFailed::unexpected_status(page.status.as_u16()));
        }

        let token =
            extract_login_csrf(&page.body).map_err(AuthenticationFailed::malformed_login_page)?;
        debug!("🔑 已获取登录 CSRF token");

        let login_url = self.url(LOGIN_PATH).map_err(AuthenticationFailed::network)?;
        let form = TransportRequest::post_form(
            login_url,
            [
                ("utf8", "✓"),
                ("session[email]", credentials.email()),
                ("session[password]", credentials.password()),
                ("session[remember_me]", "0"),
                ("commit", "Log In"),
                ("session[remember_me_sso]", "0"),
                ("authenticity_token", token.as_str()),
            ],
        );
        let response = self
            .transport
            .execute(&form)
            .await
            .map_err(AuthenticationFailed::network)?;

        if !response.is_success() {
            return Err(AuthenticationFailed::unexpected_status(
                response.status.as_u16(),
            ));
        }
        if response.redirected && !is_login_path(response.path()) {
            Ok(())
        } else {
            Err(AuthenticationFailed::bad_credentials())
        }
    }
}
