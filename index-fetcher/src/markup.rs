//! 文章页面解析 - 从 HTML 中提取标题、日期与标签

use crate::FetchError;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use once_cell::sync::Lazy;
use regex::Regex;

/// 不属于文章的页面
pub const EXCLUDED_PAGES: [&str; 4] = ["index.html", "categories.html", "category.html", "cpp.html"];

/// 标签元素的 class
pub const TAG_CLASS: &str = "post-tag";
/// 日期元素的 class
pub const DATE_CLASS: &str = "meta-value";

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("DATE_RE 是合法的正则"));

/// 从页面中提取的文章信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMarkup {
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
}

impl ArticleMarkup {
    /// 带有标签元素的页面才是文章
    pub fn is_article(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// 是否属于排除页面
pub fn is_excluded_page(file_name: &str) -> bool {
    EXCLUDED_PAGES.contains(&file_name)
}

/// 解析文章页面
pub fn parse_article(html: &str) -> Result<ArticleMarkup, FetchError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| FetchError::Parse(format!("解析HTML时出错: {}", e)))?;

    Ok(ArticleMarkup {
        title: extract_title(&dom.document),
        date: extract_date(&dom.document),
        tags: extract_tags(&dom.document),
    })
}

// 优先使用 <h1>，其次 <title>
fn extract_title(document: &Handle) -> String {
    for tag in ["h1", "title"] {
        if let Some(node) = find_first(document, &|h: &Handle| is_element(h, tag)) {
            let text = text_of(&node);
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

fn extract_date(document: &Handle) -> String {
    let mut spans = Vec::new();
    collect(
        document,
        &|h: &Handle| is_element(h, "span") && has_class(h, DATE_CLASS),
        &mut spans,
    );
    spans
        .iter()
        .map(text_of)
        .find(|text| DATE_RE.is_match(text))
        .unwrap_or_default()
}

// 去重并保持出现顺序
fn extract_tags(document: &Handle) -> Vec<String> {
    let mut nodes = Vec::new();
    collect(document, &|h: &Handle| has_class(h, TAG_CLASS), &mut nodes);

    let mut tags: Vec<String> = Vec::new();
    for tag in nodes.iter().map(text_of) {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    match handle.data {
        NodeData::Element { ref name, .. } => name.local.as_ref() == tag,
        _ => false,
    }
}

fn has_class(handle: &Handle, class: &str) -> bool {
    match handle.data {
        NodeData::Element { ref attrs, .. } => attrs.borrow().iter().any(|attr| {
            attr.name.local.as_ref() == "class"
                && attr.value.split_whitespace().any(|c| c == class)
        }),
        _ => false,
    }
}

fn find_first(handle: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    if pred(handle) {
        return Some(handle.clone());
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_first(child, pred))
}

fn collect(handle: &Handle, pred: &dyn Fn(&Handle) -> bool, out: &mut Vec<Handle>) {
    if pred(handle) {
        out.push(handle.clone());
        return;
    }
    for child in handle.children.borrow().iter() {
        collect(child, pred, out);
    }
}

// 节点文本，合并空白
fn text_of(handle: &Handle) -> String {
    let mut raw = String::new();
    push_text(handle, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_text(handle: &Handle, text: &mut String) {
    match handle.data {
        NodeData::Text { ref contents } => {
            text.push_str(&contents.borrow());
            text.push(' ');
        }
        _ => {
            for child in handle.children.borrow().iter() {
                push_text(child, text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r##"<!doctype html>
<html><head><title>Page Title</title></head>
<body>
  <header><h1>
     Smart   Pointers
  </h1></header>
  <div class="post-meta">
    <span class="meta-label">作者</span><span class="meta-value">me</span>
    <span class="meta-label">日期</span><span class="meta-value"> 2024-06-01 </span>
  </div>
  <a class="post-tag" href="#">C++</a>
  <a class="post-tag link" href="#">memory</a>
  <a class="post-tag" href="#">C++</a>
</body></html>"##;

    #[test]
    fn extracts_title_date_and_unique_tags() {
        let markup = parse_article(ARTICLE).unwrap();
        assert_eq!(markup.title, "Smart Pointers");
        assert_eq!(markup.date, "2024-06-01");
        assert_eq!(markup.tags, ["C++", "memory"]);
        assert!(markup.is_article());
    }

    #[test]
    fn falls_back_to_document_title() {
        let html = r#"<html><head><title> Only Title </title></head><body><p>x</p></body></html>"#;
        let markup = parse_article(html).unwrap();
        assert_eq!(markup.title, "Only Title");
        assert_eq!(markup.date, "");
        assert!(!markup.is_article());
    }

    #[test]
    fn excluded_pages() {
        assert!(is_excluded_page("index.html"));
        assert!(is_excluded_page("category.html"));
        assert!(!is_excluded_page("pointers.html"));
    }
}
