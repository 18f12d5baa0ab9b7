use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// 路径段中保留原样的字符: 字母、数字和 `_.-~`
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// 将相对文件路径转换为URL路径 (逐段百分号编码，保留 `/`)
pub fn encode_path(relative: &str) -> String {
    relative
        .replace('\\', "/")
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// 文件所在目录；根目录下的文件返回 None
pub fn folder_of(relative: &str) -> Option<String> {
    let normalized = relative.replace('\\', "/");
    normalized
        .rsplit_once('/')
        .map(|(folder, _)| folder.to_string())
}

/// 路径的文件名部分
pub fn file_name(relative: &str) -> &str {
    relative
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_spaces_and_non_ascii_per_segment() {
        assert_eq!(
            encode_path("cpp-notes/01 基礎/pointers.html"),
            "cpp-notes/01%20%E5%9F%BA%E7%A4%8E/pointers.html"
        );
        assert_eq!(encode_path("notes\\a b.html"), "notes/a%20b.html");
        assert_eq!(encode_path("plain.html"), "plain.html");
    }

    #[test]
    fn reserved_characters_are_encoded() {
        assert_eq!(
            encode_path("C++ notes/a(1)&b%.html"),
            "C%2B%2B%20notes/a%281%29%26b%25.html"
        );
        assert_eq!(encode_path("v1.2_x-y~z.html"), "v1.2_x-y~z.html");
        assert_ne!(encode_path("a%20b.html"), encode_path("a b.html"));
    }

    #[test]
    fn folder_and_file_name() {
        assert_eq!(folder_of("a/b/c.html").as_deref(), Some("a/b"));
        assert_eq!(folder_of("c.html"), None);
        assert_eq!(file_name("a/b/c.html"), "c.html");
        assert_eq!(file_name("c.html"), "c.html");
    }
}
