//! 分页遍历 - 沿着"下一页"标记逐页获取，直到标记消失

use crate::transport::{HttpResponse, Transport};
use crate::FetchError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static LINK_NEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("LINK_NEXT_RE 是合法的正则")
});

/// 从 `Link` 头中提取 `rel="next"` 的URL
pub fn parse_link_next(header: &str) -> Option<String> {
    header
        .split(',')
        .find_map(|part| LINK_NEXT_RE.captures(part))
        .map(|caps| caps[1].to_string())
}

/// 默认的下一页提取函数
pub fn link_next(response: &HttpResponse) -> Option<String> {
    response.link.as_deref().and_then(parse_link_next)
}

/// 惰性分页器，每次调用 [`Paginator::next_page`] 只发出一个请求
pub struct Paginator<'a, T: ?Sized, F> {
    transport: &'a T,
    next: Option<String>,
    extract_next: F,
}

impl<'a, T, F> Paginator<'a, T, F>
where
    T: Transport + ?Sized,
    F: Fn(&HttpResponse) -> Option<String>,
{
    pub fn new(transport: &'a T, first_url: impl Into<String>, extract_next: F) -> Self {
        Self {
            transport,
            next: Some(first_url.into()),
            extract_next,
        }
    }

    /// 获取下一页；没有更多页时返回 None
    pub async fn next_page(&mut self) -> Option<Result<HttpResponse, FetchError>> {
        let url = self.next.take()?;
        debug!("获取分页 {}", url);

        let response = match self.transport.get(&url).await {
            Ok(response) => response,
            Err(e) => return Some(Err(e)),
        };
        if !response.is_success() {
            return Some(Err(FetchError::Status(response.status)));
        }

        // 指向自身的下一页视为结束
        self.next = (self.extract_next)(&response).filter(|next| *next != url);
        Some(Ok(response))
    }

    /// 获取全部页面，任何一页失败即返回错误
    pub async fn collect_all(mut self) -> Result<Vec<HttpResponse>, FetchError> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await {
            pages.push(page?);
        }
        Ok(pages)
    }
}
