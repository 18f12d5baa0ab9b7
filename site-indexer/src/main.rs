use std::path::{Path, PathBuf};

use category_filter::{SortDirection, SortMode, SortState, ViewError};
use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command};
use index_fetcher::{FetchError, ReqwestTransport};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod browse;
mod generate;

use browse::{RecentSource, ViewArgs};

/// 命令行错误
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("遍历目录失败: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error("源目录不存在或不是有效目录 '{0}'")]
    MissingSource(String),
    #[error("无效的参数: {0}")]
    InvalidArgument(String),
}

fn view_args() -> Vec<Arg> {
    vec![
        Arg::new("cache")
            .long("cache")
            .value_name("FILE")
            .help("本地缓存文件")
            .default_value(".site-cache.json"),
        Arg::new("scope")
            .long("scope")
            .value_name("PREFIX")
            .help("只统计该路径前缀下的文章"),
        Arg::new("name")
            .short('n')
            .long("name")
            .value_name("CATEGORY")
            .help("显示某个分类下的文章"),
        Arg::new("query")
            .short('q')
            .long("query")
            .value_name("TEXT")
            .help("按标题筛选")
            .default_value(""),
        Arg::new("sort")
            .long("sort")
            .value_name("MODE")
            .help("排序方式")
            .value_parser(["time", "alpha"])
            .default_value("time"),
        Arg::new("order")
            .long("order")
            .value_name("DIRECTION")
            .help("排序方向")
            .value_parser(["asc", "desc"])
            .default_value("desc"),
        Arg::new("html")
            .long("html")
            .help("输出 HTML 片段")
            .action(ArgAction::SetTrue),
        Arg::new("folders")
            .long("folders")
            .help("列出各目录的文章数量")
            .action(ArgAction::SetTrue),
    ]
}

fn cli() -> Command {
    Command::new("站点索引工具")
        .version(env!("CARGO_PKG_VERSION"))
        .about("生成站点索引并在终端中浏览分类")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("显示详细信息")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("build")
                .about("扫描 HTML 目录生成 site-index.json")
                .arg(
                    Arg::new("source")
                        .short('s')
                        .long("source")
                        .value_name("SOURCE_DIR")
                        .help("站点源目录路径")
                        .required(true),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("OUTPUT_FILE")
                        .help("索引输出文件")
                        .default_value("site-index.json"),
                )
                .arg(
                    Arg::new("count_root")
                        .long("count-root")
                        .value_name("DIR")
                        .help("统计该目录下每个子目录的文章数量")
                        .default_value("cpp-notes"),
                ),
        )
        .subcommand(
            Command::new("categories")
                .about("通过站点索引浏览分类")
                .arg(
                    Arg::new("index")
                        .long("index")
                        .value_name("URL")
                        .env("SITE_INDEX_URL")
                        .help("站点索引地址")
                        .required(true),
                )
                .args(view_args()),
        )
        .subcommand(
            Command::new("tree")
                .about("遍历仓库目录抓取文章并浏览分类")
                .arg(
                    Arg::new("repo")
                        .long("repo")
                        .value_name("OWNER/NAME")
                        .help("仓库，由此推出目录列表与原始内容地址"),
                )
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_name("DIR")
                        .help("仓库中的目录")
                        .requires("repo"),
                )
                .arg(
                    Arg::new("listing")
                        .long("listing")
                        .value_name("URL")
                        .help("目录列表接口地址")
                        .requires("raw_base"),
                )
                .arg(
                    Arg::new("raw_base")
                        .long("raw-base")
                        .value_name("URL")
                        .help("原始内容地址前缀")
                        .requires("listing"),
                )
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .value_name("PATH")
                        .help("只抓取该路径前缀下的文件")
                        .default_value(""),
                )
                .args(view_args()),
        )
        .subcommand(
            Command::new("recent")
                .about("列出最近更新")
                .arg(
                    Arg::new("index")
                        .long("index")
                        .value_name("URL")
                        .env("SITE_INDEX_URL")
                        .help("从站点索引读取"),
                )
                .arg(
                    Arg::new("commits")
                        .long("commits")
                        .value_name("URL")
                        .help("从提交记录接口读取"),
                )
                .arg(
                    Arg::new("cache")
                        .long("cache")
                        .value_name("FILE")
                        .help("本地缓存文件")
                        .default_value(".site-cache.json"),
                )
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .value_name("N")
                        .help("最多显示条数")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                ),
        )
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn string_arg(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

// 只在部分子命令中定义的参数
fn optional_arg(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.try_get_one::<String>(id).ok().flatten().cloned()
}

fn parse_view_args(matches: &ArgMatches) -> Result<ViewArgs, IndexerError> {
    let mode: SortMode = string_arg(matches, "sort")
        .parse()
        .map_err(IndexerError::InvalidArgument)?;
    let direction: SortDirection = string_arg(matches, "order")
        .parse()
        .map_err(IndexerError::InvalidArgument)?;

    Ok(ViewArgs {
        scope: matches.get_one::<String>("scope").cloned(),
        name: matches.get_one::<String>("name").cloned(),
        query: string_arg(matches, "query"),
        sort: SortState::new(mode, direction),
        html: matches.get_flag("html"),
        folders: matches.get_flag("folders"),
        repo: optional_arg(matches, "repo"),
        path: optional_arg(matches, "path"),
    })
}

fn cache_path(matches: &ArgMatches) -> PathBuf {
    PathBuf::from(string_arg(matches, "cache"))
}

fn run_build(matches: &ArgMatches) -> Result<(), IndexerError> {
    let source_dir = string_arg(matches, "source");
    let output = string_arg(matches, "output");
    let count_root = string_arg(matches, "count_root");

    let source_path = Path::new(&source_dir);
    if !source_path.is_dir() {
        return Err(IndexerError::MissingSource(source_dir));
    }

    info!("源目录: {}", source_dir);
    info!("输出文件: {}", output);

    let index = generate::generate_site_index(source_path, &count_root, Utc::now())?;
    generate::write_site_index(&index, Path::new(&output))
}

async fn run(matches: ArgMatches) -> Result<(), IndexerError> {
    match matches.subcommand() {
        Some(("build", sub)) => run_build(sub),
        Some(("categories", sub)) => {
            let args = parse_view_args(sub)?;
            let index_url = string_arg(sub, "index");
            browse::run_categories(ReqwestTransport::new()?, &index_url, &cache_path(sub), &args).await
        }
        Some(("tree", sub)) => {
            let args = parse_view_args(sub)?;
            let config = browse::tree_config(
                optional_arg(sub, "listing").as_deref(),
                optional_arg(sub, "raw_base").as_deref(),
                &string_arg(sub, "prefix"),
                &args.view_config(),
            )?;
            browse::run_tree(ReqwestTransport::new()?, config, &cache_path(sub), &args).await
        }
        Some(("recent", sub)) => {
            let source = match (sub.get_one::<String>("commits"), sub.get_one::<String>("index")) {
                (Some(url), _) => RecentSource::Commits(url.clone()),
                (None, Some(url)) => RecentSource::SiteIndex(url.clone()),
                (None, None) => {
                    return Err(IndexerError::InvalidArgument(
                        "需要 --index 或 --commits".to_string(),
                    ))
                }
            };
            let limit = sub.get_one::<usize>("limit").copied().unwrap_or(10);
            browse::run_recent(ReqwestTransport::new()?, &source, &cache_path(sub), limit).await
        }
        _ => Err(IndexerError::InvalidArgument("未知的子命令".to_string())),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    if let Err(e) = run(matches).await {
        eprintln!("错误: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn view_args_are_parsed() {
        let matches = cli()
            .try_get_matches_from([
                "site-indexer-cli",
                "categories",
                "--index",
                "https://example.com/site-index.json",
                "--name",
                "rust",
                "--sort",
                "alpha",
                "--order",
                "asc",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let args = parse_view_args(sub).unwrap();

        assert_eq!(args.name.as_deref(), Some("rust"));
        assert_eq!(args.sort, SortState::new(SortMode::Alpha, SortDirection::Asc));
        assert_eq!(args.query, "");
        assert!(!args.html);
        assert_eq!(cache_path(sub), PathBuf::from(".site-cache.json"));
    }

    #[test]
    fn tree_accepts_repository_shorthand() {
        let matches = cli()
            .try_get_matches_from([
                "site-indexer-cli",
                "tree",
                "--repo",
                "me/notes",
                "--path",
                "cpp-notes",
                "--folders",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let args = parse_view_args(sub).unwrap();

        assert_eq!(args.repo.as_deref(), Some("me/notes"));
        assert_eq!(args.path.as_deref(), Some("cpp-notes"));
        assert!(args.folders);
        assert_eq!(optional_arg(sub, "listing"), None);

        let partial = cli().try_get_matches_from([
            "site-indexer-cli",
            "tree",
            "--listing",
            "https://api.test/listing",
        ]);
        assert!(partial.is_err());
    }

    #[test]
    fn build_rejects_missing_source() {
        let matches = cli()
            .try_get_matches_from(["site-indexer-cli", "build", "-s", "/definitely/not/here"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert!(matches!(run_build(sub), Err(IndexerError::MissingSource(_))));
    }

    #[test]
    fn rejects_unknown_sort_mode() {
        let result = cli().try_get_matches_from([
            "site-indexer-cli",
            "categories",
            "--index",
            "x",
            "--sort",
            "size",
        ]);
        assert!(result.is_err());
    }
}
