//! Cleanup of search-result snippets

use regex::Regex;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static MARKDOWN: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"),
        Regex::new(r"__(.*?)__").expect("valid regex"),
        Regex::new(r"~~(.*?)~~").expect("valid regex"),
        Regex::new(r"`(.*?)`").expect("valid regex"),
        Regex::new(r"\[(.*?)\]\(.*?\)").expect("valid regex"),
    ]
});

/// Strip HTML tags, decode entities and drop inline markdown emphasis
#[must_use]
pub fn clean_html(raw: &str) -> String {
    let stripped = HTML_TAG.replace_all(raw, "");
    let unescaped = match quick_xml::escape::unescape(&stripped) {
        Ok(text) => text.into_owned(),
        Err(_) => stripped.into_owned(),
    };
    strip_markdown(&unescaped).trim().to_string()
}

/// Remove `**x**`, `__x__`, `~~x~~`, `` `x` `` and `[x](url)` markup, keeping `x`
#[must_use]
pub fn strip_markdown(text: &str) -> String {
    MARKDOWN
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, "${1}").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("<b>경복궁</b> 야간개장", "경복궁 야간개장")]
    #[case("봄꽃 &amp; 축제 &quot;진해&quot;", "봄꽃 & 축제 \"진해\"")]
    #[case("**강력 추천** 코스", "강력 추천 코스")]
    #[case("__밑줄__ ~~취소~~ `코드`", "밑줄 취소 코드")]
    #[case("[블로그](https://blog.naver.com/x) 후기", "블로그 후기")]
    #[case("  plain text  ", "plain text")]
    fn test_clean_html(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_html(raw), expected);
    }

    #[test]
    fn test_unknown_entity_keeps_text() {
        let cleaned = clean_html("a &unknown; b");
        assert!(cleaned.contains('a'));
        assert!(cleaned.contains('b'));
    }
}
