//! 生成 site-index.json

use crate::IndexerError;
use chrono::{DateTime, SecondsFormat, Utc};
use index_fetcher::markup::{is_excluded_page, parse_article};
use index_fetcher::paths::{encode_path, folder_of};
use site_common::{Post, SiteIndex};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("html"))
}

/// 扫描目录生成站点索引
pub fn generate_site_index(
    source_dir: &Path,
    count_root: &str,
    now: DateTime<Utc>,
) -> Result<SiteIndex, IndexerError> {
    let posts = scan_posts(source_dir)?;
    info!("扫描完成，找到 {} 篇文章", posts.len());

    let folder_counts = count_folders(source_dir, count_root)?;

    Ok(SiteIndex {
        posts,
        generated_at: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        build_id: Some(now.format("%Y%m%d%H%M%S").to_string()),
        folder_counts: Some(folder_counts),
    })
}

/// 写入 JSON 文件
pub fn write_site_index(index: &SiteIndex, output: &Path) -> Result<(), IndexerError> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, serde_json::to_string_pretty(index)?)?;
    info!("已写入 {}，文章数量: {}", output.display(), index.posts.len());
    Ok(())
}

// 扫描HTML文件并提取文章数据
fn scan_posts(source_dir: &Path) -> Result<Vec<Post>, IndexerError> {
    let mut posts = Vec::new();

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_html(path) {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if is_excluded_page(&file_name) {
            continue;
        }

        let relative = match path.strip_prefix(source_dir) {
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };
        let html = match fs::read_to_string(path) {
            Ok(html) => html,
            Err(e) => {
                debug!("无法读取 {}: {}", path.display(), e);
                continue;
            }
        };
        let markup = match parse_article(&html) {
            Ok(markup) if markup.is_article() => markup,
            Ok(_) => continue,
            Err(e) => {
                debug!("解析 {} 失败: {}", path.display(), e);
                continue;
            }
        };

        debug!("处理: {}", relative);
        posts.push(Post {
            title: markup.title,
            date: markup.date,
            path: encode_path(&relative),
            tags: markup.tags,
            folder: folder_of(&relative),
        });
    }

    Ok(posts)
}

// 统计 count_root 下每个子目录的文章数量，键为该目录的 index.html 路径
fn count_folders(source_dir: &Path, count_root: &str) -> Result<BTreeMap<String, usize>, IndexerError> {
    let mut counts = BTreeMap::new();
    let root = source_dir.join(count_root);
    if !root.is_dir() {
        return Ok(counts);
    }

    for folder in fs::read_dir(&root)? {
        let folder = folder?;
        if !folder.file_type()?.is_dir() {
            continue;
        }

        let mut count = 0;
        for entry in WalkDir::new(folder.path()).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if !entry.file_type().is_file()
                || !is_html(path)
                || entry.file_name().eq_ignore_ascii_case("index.html")
            {
                continue;
            }
            let is_article = fs::read_to_string(path)
                .ok()
                .and_then(|html| parse_article(&html).ok())
                .map_or(false, |markup| markup.is_article());
            if is_article {
                count += 1;
            }
        }

        let name = folder.file_name().to_string_lossy().to_string();
        counts.insert(
            format!("{}/{}/index.html", count_root, encode_path(&name)),
            count,
        );
    }

    Ok(counts)
}
