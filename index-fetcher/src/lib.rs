//! 站点索引获取
//!
//! 通过网络获取站点索引 (site-index.json)，失败时回退到本地缓存；
//! 也支持遍历仓库目录、逐篇抓取文章页面的模式。

use thiserror::Error;

pub mod fetcher;
pub mod markup;
pub mod paginate;
pub mod paths;
pub mod recent;
pub mod transport;
pub mod tree;

pub use fetcher::{FetchConfig, FetchedIndex, IndexFetcher, IndexSource};
pub use paginate::{link_next, parse_link_next, Paginator};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
pub use tree::{TreeConfig, TreeEntry, TreeFetcher};

/// 获取过程中的错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("无效的URL {0}")]
    InvalidUrl(String),
    #[error("网络请求失败: {0}")]
    Network(String),
    #[error("服务器返回状态码 {0}")]
    Status(u16),
    #[error("解析失败: {0}")]
    Parse(String),
    #[error("加载失败且没有可用的缓存: {0}")]
    Unavailable(Box<FetchError>),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}
