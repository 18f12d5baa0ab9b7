use serde::Serialize;
use site_common::{Post, SiteIndex};
use thiserror::Error;
use tracing::debug;
use wasm_bindgen::prelude::*;
use web_sys::console;

// 导出模块
pub mod builder;
pub mod engine;
pub mod models;
pub mod render;

pub use builder::{apply_scope, build_index, CategoryBuilder};
pub use site_common::scope_matches;
pub use engine::{compare_titles, leading_number, normalize, visible, Sortable};
pub use models::{
    CategoryEntry, CategoryIndex, CategorySummary, SortDirection, SortMode, SortState, ViewConfig,
};
pub use render::{
    category_name_from_query, count_text, render_failure, Container, HtmlContainer, ListView,
    RenderedNode, Renderable, LOAD_FAILED, NO_RESULTS,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// 初始化函数 - 设置错误处理
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// 视图错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("缺少分类名称参数 (name)")]
    MissingCategory,
    #[error("站点索引无效: {0}")]
    InvalidIndex(String),
    #[error("视图配置无效: {0}")]
    InvalidConfig(String),
}

enum ViewKind {
    /// 分类列表页
    Categories(ListView<CategorySummary>),
    /// 分类详情页
    Detail { name: String, view: ListView<Post> },
}

/// 分类页面视图 - 持有数据、查询和排序状态，渲染到任意容器
pub struct CategoryView {
    kind: ViewKind,
}

impl CategoryView {
    /// 分类列表视图
    pub fn categories(index: &SiteIndex, config: ViewConfig) -> Self {
        let categories = Self::index_posts(&index.posts, &config);
        debug!("分类列表包含 {} 个分类", categories.len());
        Self {
            kind: ViewKind::Categories(ListView::new(categories.summaries(), config)),
        }
    }

    /// 分类详情视图；分类名来自查询字符串
    pub fn detail(index: &SiteIndex, config: ViewConfig, query: &str) -> Result<Self, ViewError> {
        let name = category_name_from_query(query)?;
        Ok(Self::for_category(index, config, name))
    }

    /// 指定分类名的详情视图；分类不存在时列表为空
    pub fn for_category(index: &SiteIndex, config: ViewConfig, name: impl Into<String>) -> Self {
        let name = name.into();
        let categories = Self::index_posts(&index.posts, &config);
        let posts = categories.get(&name).map(<[Post]>::to_vec).unwrap_or_default();
        debug!("分类 {} 包含 {} 篇文章", name, posts.len());
        Self {
            kind: ViewKind::Detail {
                name,
                view: ListView::new(posts, config),
            },
        }
    }

    /// 设置初始排序状态
    pub fn with_sort(self, sort: SortState) -> Self {
        let kind = match self.kind {
            ViewKind::Categories(view) => ViewKind::Categories(view.with_sort(sort)),
            ViewKind::Detail { name, view } => ViewKind::Detail {
                name,
                view: view.with_sort(sort),
            },
        };
        Self { kind }
    }

    /// 从 JSON 文本构建；带 `name` 查询参数时为详情视图
    pub fn from_json(index_json: &str, config: ViewConfig, query: Option<&str>) -> Result<Self, ViewError> {
        let index: SiteIndex = serde_json::from_str(index_json)
            .map_err(|e| ViewError::InvalidIndex(e.to_string()))?;
        match query {
            Some(query) => Self::detail(&index, config, query),
            None => Ok(Self::categories(&index, config)),
        }
    }

    fn index_posts(posts: &[Post], config: &ViewConfig) -> CategoryIndex {
        let mut builder = CategoryBuilder::new();
        if let Some(prefix) = &config.scope_prefix {
            builder = builder.with_scope(prefix.clone());
        }
        builder.add_posts(posts.iter().cloned());
        builder.build_index()
    }

    /// 详情视图的分类名
    pub fn category_name(&self) -> Option<&str> {
        match &self.kind {
            ViewKind::Categories(_) => None,
            ViewKind::Detail { name, .. } => Some(name),
        }
    }

    pub fn config(&self) -> &ViewConfig {
        match &self.kind {
            ViewKind::Categories(view) => view.config(),
            ViewKind::Detail { view, .. } => view.config(),
        }
    }

    pub fn sort_state(&self) -> SortState {
        match &self.kind {
            ViewKind::Categories(view) => view.sort_state(),
            ViewKind::Detail { view, .. } => view.sort_state(),
        }
    }

    pub fn render<C: Container + ?Sized>(&self, container: &mut C) -> usize {
        match &self.kind {
            ViewKind::Categories(view) => view.render(container),
            ViewKind::Detail { view, .. } => view.render(container),
        }
    }

    pub fn set_query<C: Container + ?Sized>(&mut self, query: &str, container: &mut C) -> usize {
        match &mut self.kind {
            ViewKind::Categories(view) => view.set_query(query, container),
            ViewKind::Detail { view, .. } => view.set_query(query, container),
        }
    }

    pub fn toggle_direction<C: Container + ?Sized>(&mut self, container: &mut C) -> usize {
        match &mut self.kind {
            ViewKind::Categories(view) => view.toggle_direction(container),
            ViewKind::Detail { view, .. } => view.toggle_direction(container),
        }
    }

    pub fn set_mode<C: Container + ?Sized>(&mut self, mode: SortMode, container: &mut C) -> usize {
        match &mut self.kind {
            ViewKind::Categories(view) => view.set_mode(mode, container),
            ViewKind::Detail { view, .. } => view.set_mode(mode, container),
        }
    }
}

/// 分类视图JS接口 - 页面脚本在事件回调中调用，返回新的列表 HTML
#[wasm_bindgen]
pub struct CategoryViewJS {
    view: CategoryView,
    container: HtmlContainer,
}

/// 每次交互后返回给页面脚本的结果；`target` 与 `countDisplay` 原样带回页面配置的选择器
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct RenderOutput<'a> {
    html: String,
    count: Option<&'a str>,
    shown: usize,
    target: Option<&'a str>,
    count_display: Option<&'a str>,
}

#[wasm_bindgen]
impl CategoryViewJS {
    /// 用站点索引 JSON 和视图配置 JSON 初始化；`search` 为 location.search
    #[wasm_bindgen(constructor)]
    pub fn new(index_json: &str, config_json: &str, search: Option<String>) -> Result<CategoryViewJS, JsValue> {
        console_error_panic_hook::set_once();

        let config: ViewConfig = if config_json.trim().is_empty() {
            ViewConfig::default()
        } else {
            serde_json::from_str(config_json)
                .map_err(|e| to_js_error(ViewError::InvalidConfig(e.to_string())))?
        };
        let view = CategoryView::from_json(index_json, config, search.as_deref())
            .map_err(to_js_error)?;

        let mut container = HtmlContainer::new();
        view.render(&mut container);
        Ok(CategoryViewJS { view, container })
    }

    /// 加载失败时使用的 HTML
    pub fn failure_html() -> String {
        let mut container = HtmlContainer::new();
        render_failure(&mut container);
        container.to_html()
    }

    #[wasm_bindgen(getter)]
    pub fn html(&self) -> String {
        self.container.to_html()
    }

    #[wasm_bindgen(getter)]
    pub fn count(&self) -> Option<String> {
        self.container.count().map(str::to_string)
    }

    /// 需要绑定输入事件的搜索框选择器
    #[wasm_bindgen(getter)]
    pub fn filter_input(&self) -> Option<String> {
        self.view.config().filter_input.clone()
    }

    pub fn set_query(&mut self, query: &str) -> Result<JsValue, JsValue> {
        let shown = self.view.set_query(query, &mut self.container);
        self.output(shown)
    }

    pub fn toggle_direction(&mut self) -> Result<JsValue, JsValue> {
        let shown = self.view.toggle_direction(&mut self.container);
        self.output(shown)
    }

    pub fn set_mode(&mut self, mode: &str) -> Result<JsValue, JsValue> {
        let mode: SortMode = mode
            .parse()
            .map_err(|e: String| to_js_error(ViewError::InvalidConfig(e)))?;
        let shown = self.view.set_mode(mode, &mut self.container);
        self.output(shown)
    }
}

impl CategoryViewJS {
    fn render_output(&self, shown: usize) -> RenderOutput<'_> {
        let config = self.view.config();
        RenderOutput {
            html: self.container.to_html(),
            count: self.container.count(),
            shown,
            target: config.filter_target.as_deref(),
            count_display: config.count_display.as_deref(),
        }
    }

    fn output(&self, shown: usize) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.render_output(shown))
            .map_err(|e| JsValue::from_str(&format!("序列化渲染结果失败: {}", e)))
    }
}

fn to_js_error(error: ViewError) -> JsValue {
    let message = error.to_string();
    console::error_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}
