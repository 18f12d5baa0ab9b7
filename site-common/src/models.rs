use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 文章条目 - 站点索引中的一篇笔记
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Post {
    /// 文章标题
    pub title: String,
    /// 发布日期 (YYYY-MM-DD，可按字符串排序)
    #[serde(default)]
    pub date: String,
    /// 文章URL路径，同时作为唯一标识
    #[serde(alias = "url")]
    pub path: String,
    /// 文章标签列表，保持页面中的出现顺序
    #[serde(default)]
    pub tags: Vec<String>,
    /// 所在目录 (根目录下的页面为空)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl Post {
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// 站点索引 - site-index.json 的完整结构
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SiteIndex {
    /// 所有文章
    #[serde(default)]
    pub posts: Vec<Post>,
    /// 生成时间 (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    /// 构建编号 (%Y%m%d%H%M%S)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    /// 目录页路径 -> 该目录下的文章数量
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_counts: Option<BTreeMap<String, usize>>,
}

/// 缓存记录 - 写入本地存储的带时间戳的数据
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CacheRecord<T> {
    /// 写入时间 (毫秒时间戳)
    pub timestamp: i64,
    /// 缓存内容
    pub payload: T,
}

/// 最近更新条目
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RecentUpdate {
    pub title: String,
    pub date: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_index_reads_camel_case_fields() {
        let json = r#"{
            "buildId": "20240601120000",
            "generatedAt": "2024-06-01T12:00:00Z",
            "posts": [
                {"title": "Pointers", "date": "2024-06-01", "path": "cpp-notes/a%20b/p.html", "tags": ["cpp"], "folder": "cpp-notes/a b"},
                {"title": "Untagged", "url": "misc.html"}
            ],
            "folderCounts": {"cpp-notes/a%20b/index.html": 1}
        }"#;
        let index: SiteIndex = serde_json::from_str(json).unwrap();

        assert_eq!(index.build_id.as_deref(), Some("20240601120000"));
        assert_eq!(index.posts.len(), 2);
        assert_eq!(index.posts[0].folder.as_deref(), Some("cpp-notes/a b"));
        assert_eq!(index.posts[1].path, "misc.html");
        assert!(!index.posts[1].has_tags());
        assert_eq!(index.posts[1].date, "");
        assert_eq!(
            index.folder_counts.unwrap().get("cpp-notes/a%20b/index.html"),
            Some(&1)
        );
    }
}
