//! 最近更新 - 来自站点索引或仓库提交记录

use crate::paginate::{link_next, Paginator};
use crate::transport::Transport;
use crate::FetchError;
use chrono::DateTime;
use serde::Deserialize;
use site_common::{Post, RecentUpdate};
use tracing::debug;

/// 站点索引中日期最新的若干篇文章 (同日期保持原顺序)
pub fn from_posts(posts: &[Post], limit: usize) -> Vec<RecentUpdate> {
    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
        .into_iter()
        .take(limit)
        .map(|post| RecentUpdate {
            title: post.title.clone(),
            date: post.date.clone(),
            url: post.path.clone(),
        })
        .collect()
}

#[derive(Deserialize)]
struct CommitItem {
    html_url: String,
    commit: CommitBody,
}

#[derive(Deserialize)]
struct CommitBody {
    message: String,
    #[serde(default)]
    author: Option<Signature>,
    #[serde(default)]
    committer: Option<Signature>,
}

#[derive(Deserialize)]
struct Signature {
    date: String,
}

impl CommitItem {
    fn into_update(self) -> RecentUpdate {
        let title = self
            .commit
            .message
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        let date = self
            .commit
            .author
            .or(self.commit.committer)
            .map(|sig| format_commit_date(&sig.date))
            .unwrap_or_default();
        RecentUpdate {
            title,
            date,
            url: self.html_url,
        }
    }
}

// 2024-06-01T12:30:00Z -> 2024-06-01 12:30
fn format_commit_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// 从提交记录接口读取最近的更新，凑够 `limit` 条即停止翻页
pub async fn from_commits<T: Transport + ?Sized>(
    transport: &T,
    commits_url: &str,
    limit: usize,
) -> Result<Vec<RecentUpdate>, FetchError> {
    let mut updates = Vec::new();
    let mut pager = Paginator::new(transport, commits_url, link_next);
    while updates.len() < limit {
        let Some(page) = pager.next_page().await else {
            break;
        };
        let items: Vec<CommitItem> = serde_json::from_str(&page?.body)?;
        debug!("提交记录分页包含 {} 条", items.len());
        updates.extend(items.into_iter().map(CommitItem::into_update));
    }
    updates.truncate(limit);
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::HttpResponse;

    fn post(title: &str, date: &str) -> Post {
        Post {
            title: title.to_string(),
            date: date.to_string(),
            path: format!("{}.html", title),
            tags: vec![],
            folder: None,
        }
    }

    fn commits_page(messages: &[&str], next: Option<&str>) -> HttpResponse {
        let items: Vec<_> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "sha": "0",
                    "html_url": format!("https://git.test/c/{}", m.len()),
                    "commit": {"message": m, "author": {"date": "2024-06-01T12:30:00Z"}}
                })
            })
            .collect();
        HttpResponse {
            status: 200,
            link: next.map(|url| format!(r#"<{}>; rel="next""#, url)),
            body: serde_json::to_string(&items).unwrap(),
        }
    }

    #[test]
    fn newest_posts_first() {
        let posts = [post("a", "2024-01-01"), post("b", "2024-03-01"), post("c", "2024-02-01")];
        let recent = from_posts(&posts, 2);
        let titles: Vec<_> = recent.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["b", "c"]);
        assert_eq!(recent[0].url, "b.html");
    }

    #[tokio::test]
    async fn commits_stop_paging_once_limit_is_reached() {
        let transport = MockTransport::new()
            .route(
                "https://api.test/commits",
                commits_page(&["add pointers\n\nlong body", "fix typo"], Some("https://api.test/commits?page=2")),
            )
            .route(
                "https://api.test/commits?page=2",
                commits_page(&["third", "fourth"], Some("https://api.test/commits?page=3")),
            );

        let updates = from_commits(&transport, "https://api.test/commits", 3).await.unwrap();

        let titles: Vec<_> = updates.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(titles, ["add pointers", "fix typo", "third"]);
        assert_eq!(updates[0].date, "2024-06-01 12:30");
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn commits_error_propagates() {
        let transport = MockTransport::new();
        let err = from_commits(&transport, "https://api.test/commits", 5).await.unwrap_err();
        assert_eq!(err, FetchError::Status(404));
    }
}
