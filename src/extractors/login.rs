//! 登录页与页面级 CSRF token

use scraper::Html;

use crate::error::{EntityType, ExtractionFailure};
use crate::extractors::text::{attr, first, selector};

/// 登录表单
pub const LOGIN_FORM_ANCHOR: &str = r#"form[action="/login"]"#;
/// 登录表单中的 CSRF token
pub const LOGIN_TOKEN_ANCHOR: &str = r#"input[name="authenticity_token"]"#;
/// 已登录页面中的 CSRF token（写操作使用）
pub const PAGE_CSRF_ANCHOR: &str = r#"meta[name="csrf-token"]"#;

/// 从登录页提取 CSRF token
pub fn extract_login_csrf(html: &str) -> Result<String, ExtractionFailure> {
    let document = Html::parse_document(html);
    let form = first(&document, EntityType::LoginForm, LOGIN_FORM_ANCHOR)?
        .ok_or_else(|| ExtractionFailure::missing(EntityType::LoginForm, LOGIN_FORM_ANCHOR))?;

    let token_sel = selector(EntityType::LoginForm, LOGIN_TOKEN_ANCHOR)?;
    form.select(&token_sel)
        .find_map(|input| attr(input, "value"))
        .ok_or_else(|| ExtractionFailure::missing(EntityType::LoginForm, LOGIN_TOKEN_ANCHOR))
}

/// 从已登录页面的 `<meta name="csrf-token">` 提取 token
pub fn extract_page_csrf(html: &str) -> Result<String, ExtractionFailure> {
    let document = Html::parse_document(html);
    first(&document, EntityType::CsrfToken, PAGE_CSRF_ANCHOR)?
        .and_then(|meta| attr(meta, "content"))
        .ok_or_else(|| ExtractionFailure::missing(EntityType::CsrfToken, PAGE_CSRF_ANCHOR))
}
