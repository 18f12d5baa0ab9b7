use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::LINK;
use reqwest::Client;

/// HTTP 响应中需要的部分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// `Link` 响应头 (分页用)
    pub link: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            link: None,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 网络获取能力 - 单次 GET，不重试
#[async_trait(?Send)]
pub trait Transport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// 基于 reqwest 的实现
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("site-indexer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(HttpResponse { status, link, body })
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// 预设响应的传输层，按URL (忽略查询参数) 匹配
    #[derive(Default)]
    pub struct MockTransport {
        routes: HashMap<String, Result<HttpResponse, FetchError>>,
        requests: RefCell<Vec<String>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(mut self, url: &str, response: HttpResponse) -> Self {
            self.routes.insert(url.to_string(), Ok(response));
            self
        }

        pub fn fail(mut self, url: &str, error: FetchError) -> Self {
            self.routes.insert(url.to_string(), Err(error));
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl Transport for MockTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            let route = self
                .routes
                .get(url)
                .or_else(|| url.split('?').next().and_then(|base| self.routes.get(base)));
            match route {
                Some(result) => result.clone(),
                None => Ok(HttpResponse {
                    status: 404,
                    link: None,
                    body: String::new(),
                }),
            }
        }
    }
}
