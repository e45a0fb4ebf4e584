//! 工具函数模块
//!
//! 提供时间戳转换、消息内容规范化等通用工具函数

pub mod helpers;

pub use helpers::ServiceHelper;

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

// 只匹配常见的 HTML 标签名，`<hello>` 这类纯文本尖括号保持原样
static HTML_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)</?(?:a|b|i|u|s|p|br|hr|div|span|strong|em|img|ul|ol|li|h[1-6]|blockquote|pre|code|table|thead|tbody|tr|td|th|font|sub|sup)\b[^>]*>",
    )
    .expect("html tag pattern is valid")
});

/// 毫秒数转换为 DateTime
pub fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// 去除 HTML 标签和常见实体后的纯文本
///
/// 客服编辑器提交的内容可能只包含空标签（如 `<p><br></p>`），
/// 判断内容是否为空时需要先去掉标签。
pub fn strip_html(content: &str) -> String {
    HTML_TAG
        .replace_all(content, "")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}

/// 去掉标签后内容是否为空
pub fn is_blank_content(content: &str) -> bool {
    strip_html(content).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_removes_tags() {
        assert_eq!(strip_html("<p>hello <b>world</b></p>"), "hello world");
        assert_eq!(strip_html("plain"), "plain");
    }

    #[test]
    fn empty_markup_is_blank() {
        assert!(is_blank_content(""));
        assert!(is_blank_content("   "));
        assert!(is_blank_content("<p><br></p>"));
        assert!(is_blank_content("<p>&nbsp;</p>"));
        assert!(!is_blank_content("<p>hi</p>"));
    }

    #[test]
    fn multiline_tags_are_stripped() {
        assert_eq!(strip_html("<img\n src=\"a.png\">caption"), "caption");
    }

    #[test]
    fn angle_bracket_text_is_not_markup() {
        assert_eq!(strip_html("<hello>"), "<hello>");
        assert_eq!(strip_html("a < b > c"), "a < b > c");
        assert_eq!(strip_html("<bold>text</bold>"), "<bold>text</bold>");
        assert!(!is_blank_content("<hello>"));
        assert_eq!(strip_html("<BR/><A href=\"x\">link</A>"), "link");
    }

    #[test]
    fn millis_roundtrip_keeps_precision() {
        let now = Utc::now().timestamp_millis();
        let dt = millis_to_datetime(now).unwrap();
        assert_eq!(dt.timestamp_millis(), now);
    }
}
