//! Shared helpers for markup scraping and JSON decoding.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.\[\]]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>`]+))"#,
    )
});

static CDATA_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)^\s*<!\[CDATA\[(.*?)\]\]>\s*$"));

/// Decodes the HTML character references that appear in form values and
/// descriptor paths. Unknown named entities are left untouched.
#[must_use]
pub(crate) fn decode_html_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    ENTITY_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Parses the attribute section of a start tag into lowercase-name → value
/// pairs, decoding entities in values.
#[must_use]
pub(crate) fn parse_attributes(raw: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .or_else(|| caps.get(4).map(|m| m.as_str().trim_end_matches('/')))
                .unwrap_or_default();
            Some((name, decode_html_entities(value)))
        })
        .collect()
}

/// Text content of an XML element: CDATA sections are returned verbatim,
/// other text is trimmed and entity-decoded.
#[must_use]
pub(crate) fn element_text(raw: &str) -> String {
    match CDATA_RE.captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim().to_string(),
        None => decode_html_entities(raw.trim()),
    }
}

/// Returns the extension (with leading dot) of the last path segment of `url`.
///
/// Falls back to the raw string when it does not parse as a URL. Returns an
/// empty string when the last segment has no extension.
#[must_use]
pub(crate) fn url_extension(url: &str) -> String {
    let last_segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string(),
    };
    match last_segment.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < last_segment.len() => last_segment[idx..].to_string(),
        _ => String::new(),
    }
}

/// Deserializes a JSON id given either as a number or as a string.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(D::Error::custom(format!("expected numeric or string id, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Item {
        #[serde(deserialize_with = "deserialize_id")]
        id: String,
    }

    #[test]
    fn test_deserialize_id_accepts_number_and_string() {
        let numeric: Item = serde_json::from_str(r#"{"id": 1234}"#).unwrap();
        let text: Item = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(numeric.id, "1234");
        assert_eq!(text.id, "abc");
        assert!(serde_json::from_str::<Item>(r#"{"id": null}"#).is_err());
    }

    #[test]
    fn test_decode_html_entities_named_and_numeric() {
        assert_eq!(
            decode_html_entities("a&amp;b&lt;c&gt;&quot;&#39;&#x41;"),
            "a&b<c>\"'A"
        );
    }

    #[test]
    fn test_decode_html_entities_keeps_unknown() {
        assert_eq!(decode_html_entities("x&bogus;y"), "x&bogus;y");
        assert_eq!(decode_html_entities("no entities"), "no entities");
    }

    #[test]
    fn test_parse_attributes_quoting_styles() {
        let attrs = parse_attributes(r#" ID="main" target='all' value=plain/ data-x="a&amp;b""#);
        assert_eq!(attrs.get("id").map(String::as_str), Some("main"));
        assert_eq!(attrs.get("target").map(String::as_str), Some("all"));
        assert_eq!(attrs.get("value").map(String::as_str), Some("plain"));
        assert_eq!(attrs.get("data-x").map(String::as_str), Some("a&b"));
    }

    #[test]
    fn test_element_text_decodes_only_outside_cdata() {
        assert_eq!(element_text(" a &amp; b "), "a & b");
        assert_eq!(element_text("<![CDATA[a &amp; b]]>"), "a &amp; b");
    }

    #[test]
    fn test_url_extension_from_path() {
        assert_eq!(url_extension("https://cdn.example.com/media/lecture01.mp4"), ".mp4");
        assert_eq!(url_extension("https://lcms.example.com/a/b/notes.pdf?dl=1"), ".pdf");
        assert_eq!(url_extension("https://lcms.example.com/stream/abc"), "");
    }

    #[test]
    fn test_url_extension_relative_fallback() {
        assert_eq!(url_extension("/contents/slides.pptx"), ".pptx");
    }
}
