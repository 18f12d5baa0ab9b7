//! 渲染与绑定 - 把可见条目写入容器
//!
//! 每次渲染整体替换容器内容，不做增量比对。

use crate::engine::{self, Sortable};
use crate::models::{CategorySummary, SortMode, SortState, ViewConfig};
use crate::ViewError;
use serde::Serialize;
use site_common::Post;
use url::form_urlencoded;

/// 没有匹配结果时的提示
pub const NO_RESULTS: &str = "No results";
/// 加载失败时的提示
pub const LOAD_FAILED: &str = "Load failed";

/// 渲染出的一个节点
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderedNode {
    Item {
        title: String,
        href: String,
        date: String,
        /// 文章的标签，或分类的文章数
        badges: Vec<String>,
    },
    Placeholder {
        message: String,
    },
}

impl RenderedNode {
    pub fn placeholder(message: &str) -> Self {
        RenderedNode::Placeholder {
            message: message.to_string(),
        }
    }
}

/// 可渲染的条目
pub trait Renderable: Sortable {
    fn to_node(&self, config: &ViewConfig) -> RenderedNode;
}

impl Renderable for Post {
    fn to_node(&self, _config: &ViewConfig) -> RenderedNode {
        RenderedNode::Item {
            title: self.title.clone(),
            href: self.path.clone(),
            date: self.date.clone(),
            badges: self.tags.clone(),
        }
    }
}

impl Renderable for CategorySummary {
    fn to_node(&self, config: &ViewConfig) -> RenderedNode {
        RenderedNode::Item {
            title: self.name.clone(),
            href: category_href(&config.category_page, &self.name),
            date: self.latest_date.clone(),
            badges: vec![self.count.to_string()],
        }
    }
}

/// 分类详情页链接
pub fn category_href(category_page: &str, name: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!("{}?name={}", category_page, encoded)
}

/// 从查询字符串中读取分类名 (`?name=...`)
pub fn category_name_from_query(query: &str) -> Result<String, ViewError> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == "name")
        .map(|(_, value)| value.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(ViewError::MissingCategory)
}

/// 计数文字
pub fn count_text(shown: usize, total: usize) -> String {
    format!("shown {} / total {}", shown, total)
}

/// 渲染目标
pub trait Container {
    /// 整体替换子节点
    fn replace_children(&mut self, nodes: Vec<RenderedNode>);
    fn set_count(&mut self, text: String);
}

/// 加载失败：只留下一条失败提示，计数保持不变
pub fn render_failure<C: Container + ?Sized>(container: &mut C) {
    container.replace_children(vec![RenderedNode::placeholder(LOAD_FAILED)]);
}

/// 输出 HTML 的容器
#[derive(Debug, Default, Clone)]
pub struct HtmlContainer {
    children: Vec<RenderedNode>,
    count: Option<String>,
}

impl HtmlContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children(&self) -> &[RenderedNode] {
        &self.children
    }

    pub fn count(&self) -> Option<&str> {
        self.count.as_deref()
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for node in &self.children {
            match node {
                RenderedNode::Item {
                    title,
                    href,
                    date,
                    badges,
                } => {
                    html.push_str(&format!(
                        r#"<li class="post-item"><a href="{}">{}</a><span class="post-date">{}</span>"#,
                        escape_html(href),
                        escape_html(title),
                        escape_html(date)
                    ));
                    for badge in badges {
                        html.push_str(&format!(
                            r#"<span class="post-tag">{}</span>"#,
                            escape_html(badge)
                        ));
                    }
                    html.push_str("</li>");
                }
                RenderedNode::Placeholder { message } => {
                    html.push_str(&format!(
                        r#"<li class="placeholder">{}</li>"#,
                        escape_html(message)
                    ));
                }
            }
        }
        html
    }
}

impl Container for HtmlContainer {
    fn replace_children(&mut self, nodes: Vec<RenderedNode>) {
        self.children = nodes;
    }

    fn set_count(&mut self, text: String) {
        self.count = Some(text);
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 一个可搜索、可排序的列表视图，持有自己的查询和排序状态
#[derive(Debug, Clone)]
pub struct ListView<T> {
    items: Vec<T>,
    query: String,
    sort: SortState,
    config: ViewConfig,
}

impl<T: Renderable + Clone> ListView<T> {
    pub fn new(items: Vec<T>, config: ViewConfig) -> Self {
        Self {
            items,
            query: String::new(),
            sort: SortState::default(),
            config,
        }
    }

    pub fn with_sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn visible(&self) -> Vec<T> {
        engine::visible(&self.items, &self.query, self.sort)
    }

    /// 搜索框输入
    pub fn set_query<C: Container + ?Sized>(&mut self, query: &str, container: &mut C) -> usize {
        self.query = query.to_string();
        self.render(container)
    }

    /// 点击排序方向按钮
    pub fn toggle_direction<C: Container + ?Sized>(&mut self, container: &mut C) -> usize {
        self.sort = self.sort.toggle_direction();
        self.render(container)
    }

    /// 点击排序方式按钮
    pub fn set_mode<C: Container + ?Sized>(&mut self, mode: SortMode, container: &mut C) -> usize {
        self.sort = self.sort.with_mode(mode);
        self.render(container)
    }

    /// 重新计算并渲染，返回可见条目数
    pub fn render<C: Container + ?Sized>(&self, container: &mut C) -> usize {
        let visible = self.visible();
        let shown = visible.len();

        let nodes = if visible.is_empty() {
            vec![RenderedNode::placeholder(NO_RESULTS)]
        } else {
            visible.iter().map(|item| item.to_node(&self.config)).collect()
        };
        container.replace_children(nodes);
        container.set_count(count_text(shown, self.total()));
        shown
    }
}
