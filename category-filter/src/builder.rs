use crate::models::CategoryIndex;
use site_common::{scope_matches, Post};
use tracing::debug;

/// 按路径前缀筛选文章
pub fn apply_scope(posts: &[Post], prefix: &str) -> Vec<Post> {
    posts
        .iter()
        .filter(|post| scope_matches(&post.path, prefix))
        .cloned()
        .collect()
}

/// 按标签分组；每个分类中文章保持原顺序，无标签的文章不进入任何分类
pub fn build_index(posts: &[Post]) -> CategoryIndex {
    let mut index = CategoryIndex::default();
    for post in posts {
        for tag in &post.tags {
            index
                .tag_index
                .entry(tag.clone())
                .or_default()
                .push(post.clone());
        }
    }
    index
}

/// 分类索引构建器
#[derive(Debug, Default)]
pub struct CategoryBuilder {
    posts: Vec<Post>,
    scope: Option<String>,
}

impl CategoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只收录该前缀下的文章
    pub fn with_scope(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.scope = (!prefix.is_empty()).then_some(prefix);
        self
    }

    pub fn add_post(&mut self, post: Post) {
        self.posts.push(post);
    }

    pub fn add_posts(&mut self, posts: impl IntoIterator<Item = Post>) {
        self.posts.extend(posts);
    }

    /// 构建分类索引
    pub fn build_index(&self) -> CategoryIndex {
        let index = match &self.scope {
            Some(prefix) => build_index(&apply_scope(&self.posts, prefix)),
            None => build_index(&self.posts),
        };
        debug!(
            "分类索引构建完成，文章数量: {}，分类数量: {}",
            self.posts.len(),
            index.len()
        );
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, date: &str, path: &str, tags: &[&str]) -> Post {
        Post {
            title: title.to_string(),
            date: date.to_string(),
            path: path.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            folder: None,
        }
    }

    fn titles(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn groups_posts_by_tag_in_input_order() {
        let posts = [
            post("B", "2024-01-01", "b.html", &["x"]),
            post("A", "2024-06-01", "a.html", &["x", "y"]),
        ];

        let index = build_index(&posts);

        assert_eq!(index.len(), 2);
        assert_eq!(titles(index.get("x").unwrap()), ["B", "A"]);
        assert_eq!(titles(index.get("y").unwrap()), ["A"]);
    }

    #[test]
    fn post_appears_exactly_under_its_tags() {
        let posts = [
            post("one", "2024-01-01", "1.html", &["a", "b"]),
            post("two", "2024-01-02", "2.html", &[]),
            post("three", "2024-01-03", "3.html", &["b", "c"]),
        ];
        let index = build_index(&posts);

        for p in &posts {
            for (tag, bucket) in &index.tag_index {
                let present = bucket.iter().any(|b| b.path == p.path);
                assert_eq!(present, p.tags.contains(tag), "{} / {}", p.title, tag);
            }
        }
        assert!(index.tag_index.values().flatten().all(|p| p.title != "two"));
    }

    #[test]
    fn summaries_count_and_latest_date() {
        let posts = [
            post("B", "2024-01-01", "b.html", &["x"]),
            post("A", "2024-06-01", "a.html", &["x", "y"]),
        ];
        let summaries = build_index(&posts).summaries();

        assert_eq!(summaries[0].name, "x");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].latest_date, "2024-06-01");
        assert_eq!(summaries[1].count, 1);
    }

    #[test]
    fn builder_applies_scope_before_indexing() {
        let mut builder = CategoryBuilder::new().with_scope("cpp-notes/");
        builder.add_posts([
            post("in", "2024-01-01", "cpp-notes/a.html", &["x"]),
            post("out", "2024-01-02", "misc/b.html", &["x", "z"]),
        ]);
        builder.add_post(post("in2", "2024-01-03", "cpp-notes/c.html", &["x"]));

        let index = builder.build_index();

        assert_eq!(titles(index.get("x").unwrap()), ["in", "in2"]);
        assert!(index.get("z").is_none());
    }

    #[test]
    fn empty_scope_keeps_everything() {
        let mut builder = CategoryBuilder::new().with_scope("");
        builder.add_post(post("any", "2024-01-01", "misc/a.html", &["x"]));
        assert_eq!(builder.build_index().len(), 1);
    }
}
