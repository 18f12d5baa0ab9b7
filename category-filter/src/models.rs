use serde::{Deserialize, Serialize};
use site_common::Post;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 排序方式
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// 按日期
    #[default]
    Time,
    /// 按标题
    Alpha,
}

/// 排序方向
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(SortMode::Time),
            "alpha" => Ok(SortMode::Alpha),
            other => Err(format!("未知的排序方式: {}", other)),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("未知的排序方向: {}", other)),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortMode::Time => "time",
            SortMode::Alpha => "alpha",
        })
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        })
    }
}

/// 排序状态 - 每个视图各自持有，初始为按日期降序
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub mode: SortMode,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(mode: SortMode, direction: SortDirection) -> Self {
        Self { mode, direction }
    }

    pub fn toggle_direction(self) -> Self {
        Self {
            direction: self.direction.toggled(),
            ..self
        }
    }

    pub fn with_mode(self, mode: SortMode) -> Self {
        Self { mode, ..self }
    }
}

/// 分类 - 标签及带有该标签的文章
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub name: String,
    pub posts: Vec<Post>,
}

impl CategoryEntry {
    /// 分类列表中的一行: 文章数与最新日期
    pub fn summary(&self) -> CategorySummary {
        CategorySummary {
            name: self.name.clone(),
            count: self.posts.len(),
            latest_date: self
                .posts
                .iter()
                .map(|p| p.date.as_str())
                .max()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// 分类列表中的一行
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub name: String,
    pub count: usize,
    /// 该分类中最新文章的日期
    pub latest_date: String,
}

/// 分类索引: 标签名 -> 文章列表 (保持文章原顺序)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    pub tag_index: BTreeMap<String, Vec<Post>>,
}

impl CategoryIndex {
    pub fn get(&self, tag: &str) -> Option<&[Post]> {
        self.tag_index.get(tag).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.tag_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tag_index.is_empty()
    }

    pub fn entries(&self) -> Vec<CategoryEntry> {
        self.tag_index
            .iter()
            .map(|(name, posts)| CategoryEntry {
                name: name.clone(),
                posts: posts.clone(),
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<CategorySummary> {
        self.entries().iter().map(CategoryEntry::summary).collect()
    }
}

/// 视图配置 - 对应页面元素上的 data-* 属性
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    /// data-count-repo: 统计所用的仓库 (owner/name)
    pub count_repo: Option<String>,
    /// data-count-path: 仓库中的目录
    pub count_path: Option<String>,
    /// data-scope-prefix: 只收录该路径前缀下的文章
    pub scope_prefix: Option<String>,
    /// data-category-page: 分类详情页地址
    pub category_page: String,
    /// data-filter-input: 搜索框选择器
    pub filter_input: Option<String>,
    /// data-filter-target: 列表容器选择器
    pub filter_target: Option<String>,
    /// data-count-display: 计数显示元素选择器
    pub count_display: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            count_repo: None,
            count_path: None,
            scope_prefix: None,
            category_page: "category.html".to_string(),
            filter_input: None,
            filter_target: None,
            count_display: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_sort_state_is_newest_first() {
        let state = SortState::default();
        assert_eq!(state, SortState::new(SortMode::Time, SortDirection::Desc));
        assert_eq!(state.toggle_direction().direction, SortDirection::Asc);
        assert_eq!(state.toggle_direction().toggle_direction(), state);
        assert_eq!(state.with_mode(SortMode::Alpha).direction, SortDirection::Desc);
    }

    #[test]
    fn parses_mode_and_direction() {
        assert_eq!("alpha".parse::<SortMode>(), Ok(SortMode::Alpha));
        assert_eq!("asc".parse::<SortDirection>(), Ok(SortDirection::Asc));
        assert!("random".parse::<SortMode>().is_err());
    }

    #[test]
    fn view_config_from_partial_json() {
        let config: ViewConfig =
            serde_json::from_str(r#"{"scopePrefix": "cpp-notes/", "countRepo": "me/notes"}"#)
                .unwrap();
        assert_eq!(config.scope_prefix.as_deref(), Some("cpp-notes/"));
        assert_eq!(config.count_repo.as_deref(), Some("me/notes"));
        assert_eq!(config.category_page, "category.html");
    }
}
