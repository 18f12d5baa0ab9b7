//! 路径前缀匹配

/// 路径是否位于前缀之下
///
/// 来源中的路径有时编码空格 (`%20`)、有时不编码，三种写法都要匹配。
pub fn scope_matches(path: &str, prefix: &str) -> bool {
    path.starts_with(prefix)
        || path.starts_with(&prefix.replace(' ', "%20"))
        || path.starts_with(&prefix.replace("%20", " "))
}
