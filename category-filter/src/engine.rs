//! 排序与筛选 - 纯函数，不修改输入

use crate::models::{CategorySummary, SortDirection, SortMode, SortState};
use once_cell::sync::Lazy;
use regex::Regex;
use site_common::Post;
use std::cmp::Ordering;

static LEADING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)").expect("LEADING_NUMBER_RE 是合法的正则"));

/// 可排序、可筛选的条目
pub trait Sortable {
    fn sort_title(&self) -> &str;
    fn sort_date(&self) -> &str;
}

impl Sortable for Post {
    fn sort_title(&self) -> &str {
        &self.title
    }

    fn sort_date(&self) -> &str {
        &self.date
    }
}

impl Sortable for CategorySummary {
    fn sort_title(&self) -> &str {
        &self.name
    }

    fn sort_date(&self) -> &str {
        &self.latest_date
    }
}

/// 去除首尾空白并转小写
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// 标题开头的数字，例如 "12. Title" -> 12
pub fn leading_number(title: &str) -> Option<u64> {
    LEADING_NUMBER_RE
        .captures(title)
        .and_then(|caps| caps[1].parse().ok())
}

/// 标题比较：都有数字前缀时先比数字；有数字前缀的排在没有的前面；
/// 其余按忽略大小写的文本比较
///
/// 不做区域化排序：小写后按码点比较，中日韩标题按码点顺序而不是拼音或笔画排列。
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| compare_text(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_text(a, b),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// 升序比较
pub fn compare<T: Sortable>(a: &T, b: &T, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Time => a.sort_date().cmp(b.sort_date()),
        SortMode::Alpha => compare_titles(a.sort_title(), b.sort_title()),
    }
}

/// 计算可见条目：先筛选，再按升序稳定排序，降序时整体反转
pub fn visible<T: Sortable + Clone>(items: &[T], query: &str, state: SortState) -> Vec<T> {
    let query = normalize(query);
    let mut result: Vec<T> = items
        .iter()
        .filter(|item| query.is_empty() || normalize(item.sort_title()).contains(&query))
        .cloned()
        .collect();

    result.sort_by(|a, b| compare(a, b, state.mode));
    if state.direction == SortDirection::Desc {
        result.reverse();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, date: &str) -> Post {
        Post {
            title: title.to_string(),
            date: date.to_string(),
            path: format!("{}.html", title),
            tags: vec!["x".to_string()],
            folder: None,
        }
    }

    fn titles(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.title.as_str()).collect()
    }

    const TIME_DESC: SortState = SortState {
        mode: SortMode::Time,
        direction: SortDirection::Desc,
    };
    const ALPHA_ASC: SortState = SortState {
        mode: SortMode::Alpha,
        direction: SortDirection::Asc,
    };

    #[test]
    fn newest_first_under_time_desc() {
        let posts = [post("B", "2024-01-01"), post("A", "2024-06-01")];
        assert_eq!(titles(&visible(&posts, "", TIME_DESC)), ["A", "B"]);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let posts = [
            post("Alpha", "2024-01-01"),
            post("Beta", "2024-01-02"),
            post("gamma", "2024-01-03"),
            post("Rust", "2024-01-04"),
        ];
        let result = visible(&posts, "a", ALPHA_ASC);
        assert_eq!(titles(&result), ["Alpha", "Beta", "gamma"]);

        let result = visible(&posts, "  ALP ", ALPHA_ASC);
        assert_eq!(titles(&result), ["Alpha"]);
    }

    #[test]
    fn leading_numbers_sort_numerically_before_plain_titles() {
        let posts = [
            post("10. Ten", "2024-01-01"),
            post("2. Two", "2024-01-01"),
            post("Intro", "2024-01-01"),
        ];
        assert_eq!(
            titles(&visible(&posts, "", ALPHA_ASC)),
            ["2. Two", "10. Ten", "Intro"]
        );
    }

    #[test]
    fn alpha_ignores_case() {
        let posts = [post("banana", "x"), post("Apple", "x"), post("cherry", "x")];
        assert_eq!(
            titles(&visible(&posts, "", ALPHA_ASC)),
            ["Apple", "banana", "cherry"]
        );
    }

    #[test]
    fn descending_is_exact_reversal_of_ascending() {
        let posts = [
            post("a", "2024-02-01"),
            post("b", "2024-01-01"),
            post("c", "2024-02-01"),
            post("d", "2024-03-01"),
        ];
        for mode in [SortMode::Time, SortMode::Alpha] {
            let mut asc = visible(&posts, "", SortState::new(mode, SortDirection::Asc));
            let desc = visible(&posts, "", SortState::new(mode, SortDirection::Desc));
            asc.reverse();
            assert_eq!(asc, desc);
        }
        // 同日期保持升序中的相对顺序后整体反转
        assert_eq!(titles(&visible(&posts, "", TIME_DESC)), ["d", "c", "a", "b"]);
    }

    #[test]
    fn deterministic_and_input_untouched() {
        let posts = vec![post("z", "2024-01-01"), post("y", "2023-01-01")];
        let before = posts.clone();
        let first = visible(&posts, "", ALPHA_ASC);
        let second = visible(&posts, "", ALPHA_ASC);
        assert_eq!(first, second);
        assert_eq!(posts, before);
    }

    #[test]
    fn summaries_sort_by_latest_date() {
        let rows = [
            CategorySummary {
                name: "old".into(),
                count: 3,
                latest_date: "2023-01-01".into(),
            },
            CategorySummary {
                name: "new".into(),
                count: 1,
                latest_date: "2024-01-01".into(),
            },
        ];
        let names: Vec<_> = visible(&rows, "", TIME_DESC)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["new", "old"]);
    }

    #[test]
    fn cjk_titles_follow_code_point_order() {
        assert_eq!(compare_titles("指针", "引用"), "指针".cmp("引用"));
        assert_eq!(compare_titles("Zeta", "指针"), Ordering::Less);
    }

    #[test]
    fn leading_number_parsing() {
        assert_eq!(leading_number("12. Title"), Some(12));
        assert_eq!(leading_number("  7 notes"), Some(7));
        assert_eq!(leading_number("Title 12"), None);
    }
}
