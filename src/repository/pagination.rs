//! 分页抓取
//!
//! 沿"下一页"链接依次抓取，按顺序累积并按 ID 去重。遇到重复地址或达到页数上限时停止；
//! 某一页失败时保留之前各页的结果，并记录失败的页。

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{GradescopeError, TransportError};
use crate::infrastructure::transport::Url;

/// 抓取失败的页
#[derive(Debug)]
pub struct PageFailure {
    /// 页码（从 1 开始）
    pub page: usize,
    pub url: String,
    pub error: GradescopeError,
}

/// 可能不完整的分页结果
#[derive(Debug)]
pub struct PartialResult<E> {
    /// 成功抓取的各页中的实体，按页面顺序
    pub items: Vec<E>,
    /// 第一个失败或未抓取的页（之后的页不再抓取）
    pub failure: Option<PageFailure>,
    pub pages_fetched: usize,
    /// 是否因达到页数上限而停止；此时 `failure` 记录第一个未抓取的页
    pub truncated: bool,
}

impl<E> PartialResult<E> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            failure: None,
            pages_fetched: 0,
            truncated: false,
        }
    }

    /// 第一页之前就失败
    pub(crate) fn failed(failure: PageFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::empty()
        }
    }

    /// 所有页都抓取成功，且没有因页数上限而截断
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// 部分页失败，但已有结果
    pub fn is_partial(&self) -> bool {
        self.failure.is_some() && !self.items.is_empty()
    }

    /// 没有任何结果且发生了失败
    pub fn is_total_failure(&self) -> bool {
        self.failure.is_some() && self.items.is_empty()
    }

    /// 要求完整结果：存在失败页时返回该页的错误
    pub fn into_result(self) -> Result<Vec<E>, GradescopeError> {
        match self.failure {
            Some(failure) => Err(failure.error),
            None => Ok(self.items),
        }
    }
}

/// 一页的解析结果
#[derive(Debug)]
pub struct Paged<E> {
    pub items: Vec<E>,
    /// 下一页链接，相对于当前页地址
    pub next: Option<String>,
}

/// 分页数据来源
#[async_trait]
pub(crate) trait PageSource<E: Send>: Send {
    async fn fetch_page(&mut self, url: Url) -> Result<Paged<E>, GradescopeError>;
}

/// 从 `start` 开始抓取全部分页
pub(crate) async fn collect_pages<E, K, S>(
    start: Url,
    max_pages: usize,
    key: K,
    source: &mut S,
) -> PartialResult<E>
where
    E: Send,
    K: Fn(&E) -> String,
    S: PageSource<E>,
{
    let mut result = PartialResult::empty();
    let mut seen_urls = HashSet::new();
    let mut seen_keys = HashSet::new();
    let mut next = Some(start);

    while let Some(url) = next.take() {
        if result.pages_fetched >= max_pages {
            warn!("⚠️ 已达到分页上限 {} 页，停止抓取 {}", max_pages, url);
            result.truncated = true;
            result.failure = Some(PageFailure {
                page: result.pages_fetched + 1,
                url: url.to_string(),
                error: GradescopeError::PageLimitReached { max_pages },
            });
            break;
        }
        if !seen_urls.insert(url.to_string()) {
            warn!("⚠️ 分页链接重复出现，停止抓取: {}", url);
            break;
        }

        let page_no = result.pages_fetched + 1;
        let page = match source.fetch_page(url.clone()).await {
            Ok(page) => page,
            Err(error) => {
                warn!("❌ 第 {} 页抓取失败 ({}): {}", page_no, url, error);
                result.failure = Some(PageFailure {
                    page: page_no,
                    url: url.to_string(),
                    error,
                });
                break;
            }
        };

        result.pages_fetched = page_no;
        let before = result.items.len();
        for item in page.items {
            if seen_keys.insert(key(&item)) {
                result.items.push(item);
            }
        }
        debug!(
            "📄 第 {} 页新增 {} 条，累计 {} 条",
            page_no,
            result.items.len() - before,
            result.items.len()
        );

        if let Some(href) = page.next {
            match url.join(&href) {
                Ok(next_url) => next = Some(next_url),
                Err(_) => {
                    result.failure = Some(PageFailure {
                        page: page_no + 1,
                        url: href.clone(),
                        error: TransportError::InvalidUrl { url: href }.into(),
                    });
                }
            }
        }
    }

    result
}
