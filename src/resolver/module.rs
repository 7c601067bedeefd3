//! Module-based materials: opened module items whose content lives on the
//! legacy content host.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::descriptor::{Descriptor, parse_descriptor};
use super::{Material, MaterialSource, ResolveError, first_failure, get_json};
use crate::auth::Credential;
use crate::config::EngineConfig;
use crate::pool::clamp_workers;
use crate::transport::Transport;
use crate::util::compile_static_regex;

static CONTENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^[0-9a-z]{13}$"));

/// Item content types that are backed by a content descriptor.
const RECOGNIZED_CONTENT_TYPES: [&str; 2] = ["pdf", "everlec"];

#[derive(Debug, Deserialize)]
struct RawModule {
    #[serde(default)]
    module_items: Vec<Value>,
}

/// A module item that passed filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ContentItem {
    content_id: String,
    content_type: String,
}

/// Lists materials reachable through course modules.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    transport: Transport,
    lms_base: String,
    content_base: String,
    workers: usize,
    diagnostics_dir: Option<PathBuf>,
}

impl ModuleSource {
    /// Creates a module source sharing `transport`.
    #[must_use]
    pub fn new(transport: Transport, config: &EngineConfig) -> Self {
        Self {
            transport,
            lms_base: config.endpoints.lms.clone(),
            content_base: config.endpoints.content.clone(),
            workers: clamp_workers(config.workers),
            diagnostics_dir: config.diagnostics_dir.clone(),
        }
    }

    async fn list_items(&self, credential: &Credential, course_id: &str) -> Result<Vec<ContentItem>, ResolveError> {
        let url = format!(
            "{}/learningx/api/v1/courses/{course_id}/modules?include_detail=true",
            self.lms_base
        );
        let modules: Vec<RawModule> = get_json(&self.transport, "module-list", &url, credential).await?;
        let items: Vec<ContentItem> = modules
            .iter()
            .flat_map(|module| module.module_items.iter())
            .filter_map(content_item)
            .collect();
        debug!(course_id, items = items.len(), "module items selected");
        Ok(items)
    }

    async fn resolve_item(&self, item: &ContentItem) -> Result<Option<Material>, ResolveError> {
        const STEP: &str = "content-descriptor";
        let url = format!(
            "{}/viewer/ssplayer/uniplayer_support/content.php?content_id={}",
            self.content_base, item.content_id
        );
        let response = self.transport.send(STEP, self.transport.get(&url)).await?;
        let response = Transport::expect_status(STEP, response, StatusCode::OK)?;
        let body = Transport::text(STEP, response).await?;

        match parse_descriptor(&body, &self.content_base) {
            Ok(Descriptor::Resolved(material)) => {
                debug!(
                    content_id = %item.content_id,
                    content_type = %item.content_type,
                    name = %material.name,
                    "descriptor resolved"
                );
                Ok(Some(material))
            }
            Ok(Descriptor::Unresolved { kind }) => {
                warn!(
                    content_id = %item.content_id,
                    kind = %kind,
                    descriptor = %body,
                    "unsupported content kind; skipping item"
                );
                Ok(None)
            }
            Err(missing) => {
                let saved = match &self.diagnostics_dir {
                    Some(dir) => persist_descriptor(dir, &item.content_id, &body)
                        .await
                        .inspect_err(|error| warn!(error = %error, "could not keep unparsable descriptor"))
                        .ok(),
                    None => None,
                };
                Err(ResolveError::parse_saved(
                    url,
                    format!("missing element '{}'", missing.0),
                    saved,
                ))
            }
        }
    }
}

#[async_trait]
impl MaterialSource for ModuleSource {
    fn name(&self) -> &'static str {
        "modules"
    }

    #[instrument(skip(self, credential))]
    async fn discover(&self, credential: &Credential, course_id: &str) -> Result<Vec<Material>, ResolveError> {
        let items = self.list_items(credential, course_id).await?;

        let mut results: Vec<(usize, Result<Option<Material>, ResolveError>)> = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| async move { (index, self.resolve_item(&item).await) })
            .buffer_unordered(self.workers)
            .collect()
            .await;
        results.sort_by_key(|(index, _)| *index);

        let resolved = first_failure("module-item", results.into_iter().map(|(_, result)| result).collect())?;
        Ok(resolved.into_iter().flatten().collect())
    }
}

/// Applies the opened/content-id/content-type filter to one raw module item.
fn content_item(item: &Value) -> Option<ContentItem> {
    let content_data = item.get("content_data")?.as_object()?;
    if !content_data.get("opened").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    let details = content_data.get("item_content_data")?.as_object()?;
    let content_id = details.get("content_id")?.as_str()?.trim();
    if !CONTENT_ID_RE.is_match(content_id) {
        return None;
    }
    let content_type = details.get("content_type")?.as_str()?.trim();
    if !RECOGNIZED_CONTENT_TYPES.contains(&content_type) {
        return None;
    }
    Some(ContentItem {
        content_id: content_id.to_string(),
        content_type: content_type.to_string(),
    })
}

async fn persist_descriptor(dir: &Path, content_id: &str, body: &str) -> Result<PathBuf, ResolveError> {
    let path = dir.join(format!("parse_failed_{content_id}.xml"));
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ResolveError::diagnostics(dir, source))?;
    tokio::fs::write(&path, body)
        .await
        .map_err(|source| ResolveError::diagnostics(&path, source))?;
    Ok(path)
}
