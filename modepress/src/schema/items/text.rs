//! Text and HTML items

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_MAX_CHARACTERS: usize = 10000;

// 1: closing slash, 2: tag name, 3: attribute text
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)([^>]*)>")
        .expect("text: invalid tag pattern regex")
});

// 1: name, 2-4: double quoted, single quoted or bare value
static ATTRIBUTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("text: invalid attribute pattern regex")
});

static DISCARDED_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("text: invalid script/style pattern regex")
});

/// Tags an `HtmlItem` keeps by default
pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "p", "a", "ul", "ol", "nl", "li", "b",
    "i", "strong", "em", "strike", "code", "hr", "br", "div", "table", "thead", "caption",
    "tbody", "tr", "th", "td", "pre", "img", "span", "u", "sub", "sup", "figure",
    "figcaption", "video", "source",
];

/// Attributes an `HtmlItem` keeps by default, per tag
pub const DEFAULT_ALLOWED_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "name", "target", "title", "rel"]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("video", &["src", "poster", "controls", "width", "height"]),
    ("source", &["src", "type"]),
    ("td", &["colspan", "rowspan"]),
    ("th", &["colspan", "rowspan"]),
];

/// Attributes whose value is loaded or navigated to by the browser
const URL_ATTRIBUTES: &[&str] = &[
    "href", "src", "poster", "action", "formaction", "background", "cite", "xlink:href",
];

const UNSAFE_SCHEMES: &[&str] = &["javascript", "vbscript", "data"];

/// Whether a URL attribute value would run script when followed
///
/// Whitespace and control characters are ignored the way browsers ignore
/// them, and a character entity ahead of the path is treated as unsafe.
pub(crate) fn is_unsafe_url(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_lowercase();
    // Scheme candidates end at the first path, query or fragment delimiter
    let head = normalized
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    if head.contains('&') {
        return true;
    }

    let Some((scheme, _)) = head.split_once(':') else {
        return false;
    };
    UNSAFE_SCHEMES.contains(&scheme)
}

/// Remove every tag, keeping the text between them
pub fn strip_tags(input: &str) -> String {
    let without_blocks = DISCARDED_BLOCKS.replace_all(input, "");
    TAG_PATTERN.replace_all(&without_blocks, "").into_owned()
}

/// Read a JSON value as text; numbers and booleans are stringified
pub(crate) fn coerce_text(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::validation(name, "expected a text value")),
    }
}

pub(crate) fn check_length(name: &str, text: &str, min: usize, max: usize) -> Result<()> {
    let length = text.chars().count();
    if length < min {
        return Err(Error::validation(
            name,
            format!("must be at least {} characters", min),
        ));
    }
    if length > max {
        return Err(Error::validation(
            name,
            format!("must be no more than {} characters", max),
        ));
    }
    Ok(())
}

/// Plain text with a length window
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub value: String,
    pub min_characters: usize,
    pub max_characters: usize,
    /// Remove markup before the length check
    pub strip_html: bool,
}

impl Default for TextItem {
    fn default() -> Self {
        Self {
            value: String::new(),
            min_characters: 0,
            max_characters: DEFAULT_MAX_CHARACTERS,
            strip_html: false,
        }
    }
}

impl TextItem {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn min_characters(mut self, min: usize) -> Self {
        self.min_characters = min;
        self
    }

    pub fn max_characters(mut self, max: usize) -> Self {
        self.max_characters = max;
        self
    }

    pub fn strip_html(mut self) -> Self {
        self.strip_html = true;
        self
    }

    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.value = coerce_text(name, value)?;
        Ok(())
    }

    pub(crate) fn validate(&mut self, name: &str) -> Result<()> {
        if self.strip_html {
            self.value = strip_tags(&self.value);
        }
        check_length(name, &self.value, self.min_characters, self.max_characters)
    }
}

/// Text that may carry a restricted set of HTML tags
///
/// `<script>` and `<style>` blocks are always dropped. Tags outside
/// `allowed_tags`, attributes outside `allowed_attributes` for their tag,
/// `on*` handlers and script-bearing URLs are an error when
/// `error_bad_html` is set and are stripped otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlItem {
    pub value: String,
    pub allowed_tags: Vec<String>,
    /// Tag name to the attributes it may carry
    pub allowed_attributes: HashMap<String, Vec<String>>,
    pub error_bad_html: bool,
    pub min_characters: usize,
    pub max_characters: usize,
}

impl Default for HtmlItem {
    fn default() -> Self {
        Self {
            value: String::new(),
            allowed_tags: DEFAULT_ALLOWED_TAGS.iter().map(|t| t.to_string()).collect(),
            allowed_attributes: DEFAULT_ALLOWED_ATTRIBUTES
                .iter()
                .map(|(tag, attributes)| {
                    (
                        tag.to_string(),
                        attributes.iter().map(|a| a.to_string()).collect(),
                    )
                })
                .collect(),
            error_bad_html: true,
            min_characters: 0,
            max_characters: DEFAULT_MAX_CHARACTERS,
        }
    }
}

impl HtmlItem {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn allowed_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tags = tags.into_iter().map(|t| t.into().to_lowercase()).collect();
        self
    }

    /// Replace the attributes `tag` may carry
    pub fn allowed_attributes<I, S>(mut self, tag: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_attributes.insert(
            tag.to_lowercase(),
            attributes.into_iter().map(|a| a.into().to_lowercase()).collect(),
        );
        self
    }

    /// Strip disallowed markup instead of rejecting the value
    pub fn strip_bad_html(mut self) -> Self {
        self.error_bad_html = false;
        self
    }

    pub fn min_characters(mut self, min: usize) -> Self {
        self.min_characters = min;
        self
    }

    pub fn max_characters(mut self, max: usize) -> Self {
        self.max_characters = max;
        self
    }

    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.value = coerce_text(name, value)?;
        Ok(())
    }

    fn is_allowed(&self, tag: &str) -> bool {
        self.allowed_tags.iter().any(|t| t == tag)
    }

    fn is_attribute_allowed(&self, tag: &str, attribute: &str) -> bool {
        !attribute.starts_with("on")
            && self
                .allowed_attributes
                .get(tag)
                .is_some_and(|allowed| allowed.iter().any(|a| a == attribute))
    }

    /// Rebuild one tag from its allowed parts, recording what was left out
    fn rewrite_tag(&self, caps: &Captures, dropped: &mut Vec<String>) -> String {
        let tag = &caps[2];
        let lower = tag.to_lowercase();
        if !self.is_allowed(&lower) {
            dropped.push(format!("the disallowed HTML tag <{}>", lower));
            return String::new();
        }
        if !caps[1].is_empty() {
            return format!("</{}>", tag);
        }

        let attributes = caps.get(3).map_or("", |m| m.as_str());
        let mut html = format!("<{}", tag);
        for attribute in ATTRIBUTE_PATTERN.captures_iter(attributes) {
            let attribute_name = attribute[1].to_lowercase();
            let value = attribute
                .get(2)
                .or_else(|| attribute.get(3))
                .or_else(|| attribute.get(4))
                .map(|m| m.as_str());

            if !self.is_attribute_allowed(&lower, &attribute_name) {
                dropped.push(format!(
                    "the disallowed attribute '{}' on <{}>",
                    attribute_name, lower
                ));
                continue;
            }
            let is_url = URL_ATTRIBUTES.contains(&attribute_name.as_str());
            if is_url && value.is_some_and(is_unsafe_url) {
                dropped.push(format!(
                    "an unsafe URL in '{}' on <{}>",
                    attribute_name, lower
                ));
                continue;
            }

            match value {
                Some(value) => html.push_str(&format!(
                    " {}=\"{}\"",
                    attribute_name,
                    value.replace('"', "&quot;")
                )),
                None => {
                    html.push(' ');
                    html.push_str(&attribute_name);
                }
            }
        }
        if attributes.trim_end().ends_with('/') {
            html.push_str(" /");
        }
        html.push('>');
        html
    }

    pub(crate) fn validate(&mut self, name: &str) -> Result<()> {
        let cleaned = DISCARDED_BLOCKS.replace_all(&self.value, "");

        let mut dropped = Vec::new();
        let sanitized = TAG_PATTERN
            .replace_all(&cleaned, |caps: &Captures| self.rewrite_tag(caps, &mut dropped))
            .into_owned();

        if self.error_bad_html {
            if let Some(reason) = dropped.first() {
                return Err(Error::validation(name, format!("contains {}", reason)));
            }
        }
        self.value = sanitized;

        check_length(name, &self.value, self.min_characters, self.max_characters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_length_window() {
        let mut item = TextItem::new("").max_characters(10);
        item.set("content", &json!("1234567890")).unwrap();
        assert!(item.validate("content").is_ok());

        item.set("content", &json!("12345678901")).unwrap();
        let err = item.validate("content").unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "content"));

        let mut short = TextItem::new("ab").min_characters(3);
        assert!(short.validate("name").is_err());
    }

    #[test]
    fn test_text_counts_characters_not_bytes() {
        let mut item = TextItem::new("héllo").max_characters(5);
        assert!(item.validate("title").is_ok());
    }

    #[test]
    fn test_text_coercion() {
        let mut item = TextItem::default();
        item.set("title", &json!(42)).unwrap();
        assert_eq!(item.value, "42");
        item.set("title", &Value::Null).unwrap();
        assert_eq!(item.value, "");
        assert!(item.set("title", &json!({"a": 1})).is_err());
    }

    #[test]
    fn test_text_strip_html() {
        let mut item = TextItem::new("<b>bold</b><script>alert(1)</script> text").strip_html();
        item.validate("brief").unwrap();
        assert_eq!(item.value, "bold text");
    }

    #[test]
    fn test_html_rejects_disallowed_tags() {
        let mut item = HtmlItem::new("<p>hi</p><iframe src=\"x\"></iframe>");
        let err = item.validate("content").unwrap_err();
        assert!(err.to_string().contains("<iframe>"));
    }

    #[test]
    fn test_html_always_drops_script_and_style() {
        let mut item = HtmlItem::new("<p>hi</p><script>evil()</script><style>p{}</style>");
        item.validate("content").unwrap();
        assert_eq!(item.value, "<p>hi</p>");
    }

    #[test]
    fn test_html_strip_mode() {
        let mut item = HtmlItem::new("<P>keep</P><marquee>drop tag</marquee>").strip_bad_html();
        item.validate("content").unwrap();
        assert_eq!(item.value, "<P>keep</P>drop tag");
    }

    #[test]
    fn test_html_custom_allow_list() {
        let mut item = HtmlItem::new("<b>x</b>").allowed_tags(["I"]);
        assert!(item.validate("content").is_err());
        let mut item = HtmlItem::new("<i>x</i>").allowed_tags(["I"]);
        assert!(item.validate("content").is_ok());
    }

    const HOSTILE_MARKUP: &str = concat!(
        r#"<img src="x" onerror="alert(1)">"#,
        r#"<a href="javascript:alert(1)">x</a>"#,
        r#"<p onclick="y()">y</p>"#,
    );

    #[test]
    fn test_html_rejects_event_handlers() {
        let mut item = HtmlItem::new(HOSTILE_MARKUP);
        let err = item.validate("content").unwrap_err();
        assert!(err.to_string().contains("onerror"), "{}", err);
        assert_eq!(item.value, HOSTILE_MARKUP);
    }

    #[test]
    fn test_html_rejects_script_urls() {
        let mut item = HtmlItem::new(r#"<a href="javascript:alert(1)">x</a>"#);
        let err = item.validate("content").unwrap_err();
        assert!(err.to_string().contains("unsafe URL in 'href'"), "{}", err);
    }

    #[test]
    fn test_html_strip_mode_drops_unsafe_attributes() {
        let mut item = HtmlItem::new(HOSTILE_MARKUP).strip_bad_html();
        item.validate("content").unwrap();
        assert_eq!(item.value, r#"<img src="x"><a>x</a><p>y</p>"#);

        let mut item = HtmlItem::new("<img src=x onerror=alert(1)>").strip_bad_html();
        item.validate("content").unwrap();
        assert_eq!(item.value, r#"<img src="x">"#);
    }

    #[test]
    fn test_html_obfuscated_schemes_are_unsafe() {
        for href in [
            "JavaScript:alert(1)",
            " java\tscript:alert(1)",
            "&#106;avascript:alert(1)",
            "javascript&colon;alert(1)",
            "javascript&#58;alert(1)",
            "data:text/html;base64,PHNjcmlwdD4=",
            "vbscript:msgbox(1)",
        ] {
            assert!(is_unsafe_url(href), "{}", href);
        }
        for href in ["https://example.com/a?b=c:d", "/posts/1", "mailto:ada@example.com", "#top"] {
            assert!(!is_unsafe_url(href), "{}", href);
        }
    }

    #[test]
    fn test_html_keeps_allowed_attributes() {
        let mut item = HtmlItem::new(
            r#"<a href="https://example.com" title='Home' target=_blank>x</a><br/><td colspan="2">c</td>"#,
        );
        item.validate("content").unwrap();
        assert_eq!(
            item.value,
            r#"<a href="https://example.com" title="Home" target="_blank">x</a><br /><td colspan="2">c</td>"#
        );

        let mut item = HtmlItem::new(r#"<p class="lead">x</p>"#).allowed_attributes("P", ["Class"]);
        item.validate("content").unwrap();
        assert_eq!(item.value, r#"<p class="lead">x</p>"#);
    }
}
