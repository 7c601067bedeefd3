//! Content descriptors served by the legacy content host.
//!
//! A descriptor is an XML document keyed by a content id. Its
//! `content_playing_info/content_type` names how the media is packaged, and
//! each packaging has its own place for the fetchable URL.

use crate::util::{decode_html_entities, element_text, parse_attributes, url_extension};

use super::{Material, MaterialKind};

const MEDIA_FILE_PLACEHOLDER: &str = "[MEDIA_FILE]";

/// Packaging kinds a descriptor can declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// Shared document; the download path is relative to the content host.
    SharedDocument,
    /// Packaged media; a URL template with a file-name placeholder.
    PackagedMedia,
    /// Plain video with a literal media URL.
    DirectVideo,
    /// Any kind without an extraction strategy.
    Unresolved(String),
}

impl ContentKind {
    /// Maps the descriptor's `content_type` text to a kind.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "sharedocs" => Self::SharedDocument,
            "upf" => Self::PackagedMedia,
            "video1" => Self::DirectVideo,
            other => Self::Unresolved(other.to_string()),
        }
    }
}

/// Result of reading a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// A fetchable material.
    Resolved(Material),
    /// A kind this resolver does not handle.
    Unresolved {
        /// The declared `content_type`.
        kind: String,
    },
}

/// Element path that was absent from a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingElement(pub &'static str);

const CONTENT_TYPE_PATH: &[&str] = &["content_playing_info", "content_type"];
const DOWNLOAD_URI_PATH: &[&str] = &["content_playing_info", "content_download_uri"];
const MAIN_MEDIA_PATH: &[&str] = &["story_list", "story", "main_media_list", "main_media"];
const MEDIA_URI_TEMPLATE_PATH: &[&str] = &["service_root", "media", "media_uri[target=all]"];
const DIRECT_MEDIA_URI_PATH: &[&str] = &["main_media", "desktop", "html5", "media_uri"];
const TITLE_PATH: &[&str] = &["content_metadata", "title"];

/// Reads a descriptor body.
///
/// `content_base` is prefixed to shared-document paths.
///
/// # Errors
///
/// Returns the path of the first required element that is missing.
pub fn parse_descriptor(body: &str, content_base: &str) -> Result<Descriptor, MissingElement> {
    let kind_tag = text_at(body, CONTENT_TYPE_PATH).ok_or(MissingElement("content_playing_info/content_type"))?;
    let (url, kind) = match ContentKind::from_tag(&kind_tag) {
        ContentKind::SharedDocument => (shared_document_url(body, content_base)?, MaterialKind::Document),
        ContentKind::PackagedMedia => (packaged_media_url(body)?, MaterialKind::Video),
        ContentKind::DirectVideo => (direct_video_url(body)?, MaterialKind::Video),
        ContentKind::Unresolved(kind) => return Ok(Descriptor::Unresolved { kind }),
    };
    let title = text_at(body, TITLE_PATH).ok_or(MissingElement("content_metadata/title"))?;
    let name = format!("{title}{}", url_extension(&url));
    Ok(Descriptor::Resolved(Material::new(name, kind, url)))
}

fn shared_document_url(body: &str, content_base: &str) -> Result<String, MissingElement> {
    let raw = text_at(body, DOWNLOAD_URI_PATH).ok_or(MissingElement("content_playing_info/content_download_uri"))?;
    let unquoted = urlencoding::decode(&raw).map_or_else(|_| raw.clone(), |path| path.into_owned());
    Ok(format!("{content_base}{}", decode_html_entities(&unquoted)))
}

fn packaged_media_url(body: &str) -> Result<String, MissingElement> {
    let file = text_at(body, MAIN_MEDIA_PATH).ok_or(MissingElement("story_list/story/main_media_list/main_media"))?;
    let template =
        text_at(body, MEDIA_URI_TEMPLATE_PATH).ok_or(MissingElement("service_root/media/media_uri[target=all]"))?;
    Ok(template.replace(MEDIA_FILE_PLACEHOLDER, &file))
}

fn direct_video_url(body: &str) -> Result<String, MissingElement> {
    text_at(body, DIRECT_MEDIA_URI_PATH).ok_or(MissingElement("main_media/desktop/html5/media_uri"))
}

/// Text of the first element matching `path`.
fn text_at(body: &str, path: &[&str]) -> Option<String> {
    select(body, path).map(element_text)
}

/// Finds the inner markup of the first element reached by descending
/// through `path`. Each step may carry one `[attr=value]` filter. Every
/// candidate at each level is tried, so a step that fails under the first
/// match can still succeed under a later sibling.
fn select<'a>(scope: &'a str, path: &[&str]) -> Option<&'a str> {
    let (step, rest) = path.split_first()?;
    let (tag, filter) = split_filter(step);
    elements(scope, tag)
        .filter(|(attrs, _)| filter.is_none_or(|(name, value)| {
            parse_attributes(attrs).get(name).is_some_and(|v| v == value)
        }))
        .find_map(|(_, inner)| if rest.is_empty() { Some(inner) } else { select(inner, rest) })
}

fn split_filter(step: &str) -> (&str, Option<(&str, &str)>) {
    match step.split_once('[') {
        Some((tag, filter)) => {
            let filter = filter.trim_end_matches(']').split_once('=');
            (tag, filter)
        }
        None => (step, None),
    }
}

/// Iterates `(attributes, inner markup)` of every `<tag>` element in
/// `scope`. Same-name nesting is not supported.
fn elements<'a>(scope: &'a str, tag: &str) -> impl Iterator<Item = (&'a str, &'a str)> + use<'a> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut offset = 0;
    std::iter::from_fn(move || {
        loop {
            let start = offset + scope.get(offset..)?.find(&open)?;
            let name_end = start + open.len();
            let after = scope.get(name_end..)?;
            let boundary = after.chars().next()?;
            if !(boundary == '>' || boundary == '/' || boundary.is_whitespace()) {
                offset = name_end;
                continue;
            }
            let tag_end = name_end + after.find('>')?;
            let attrs = &scope[name_end..tag_end];
            if attrs.trim_end().ends_with('/') {
                offset = tag_end + 1;
                return Some((attrs.trim_end().trim_end_matches('/'), ""));
            }
            let inner_start = tag_end + 1;
            let inner_end = inner_start + scope.get(inner_start..)?.find(&close)?;
            offset = inner_end + close.len();
            return Some((attrs, &scope[inner_start..inner_end]));
        }
    })
}
