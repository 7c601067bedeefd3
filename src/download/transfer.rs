//! Single-material transfer: a plain 200 body, or a 206 range loop that
//! appends fixed-size chunks to a part file and renames it once complete.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use futures_util::StreamExt;
use regex::Regex;
use reqwest::header::{CONTENT_RANGE, HeaderValue, RANGE};
use reqwest::{Response, StatusCode};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::constants::WRITE_BUFFER_BYTES;
use super::error::DownloadError;
use super::filename::part_path;
use super::profile::HeaderProfile;
use super::ProgressCallback;
use crate::resolver::Material;
use crate::transport::{Transport, TransportError};
use crate::util::compile_static_regex;

const STEP: &str = "download";

static CONTENT_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^\s*bytes\s+(\d+)-(\d+)/(\d+)\s*$"));

/// Parsed `Content-Range: bytes start-end/total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First byte of this chunk.
    pub start: u64,
    /// Last byte of this chunk (inclusive).
    pub end: u64,
    /// Full resource length.
    pub total: u64,
}

impl ContentRange {
    /// Parses a header value. An unknown total (`*`) is rejected.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let caps = CONTENT_RANGE_RE.captures(value)?;
        let start = caps[1].parse().ok()?;
        let end = caps[2].parse().ok()?;
        let total = caps[3].parse().ok()?;
        (start <= end && end < total).then_some(Self { start, end, total })
    }

    /// True once the last byte of the resource has been received.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.end + 1 >= self.total
    }

    /// Share of the resource received so far, as a whole percentage.
    #[must_use]
    pub fn percent(&self) -> u8 {
        let received = u128::from(self.end) + 1;
        let percent = received * 100 / u128::from(self.total);
        u8::try_from(percent.min(100)).unwrap_or(100)
    }
}

/// Downloads `material` into `final_path`.
#[instrument(skip(transport, progress), fields(url = %material.url, kind = %material.kind))]
pub(crate) async fn fetch_material(
    transport: &Transport,
    material: &Material,
    final_path: &Path,
    chunk_size: u64,
    progress: Option<&ProgressCallback>,
) -> Result<PathBuf, DownloadError> {
    let profile = HeaderProfile::for_kind(material.kind);
    let request = transport.get(&material.url).headers(profile.header_map());
    let response = transport.send(STEP, request).await?;

    match response.status() {
        StatusCode::OK => {
            let mut file = create(final_path).await?;
            let written = write_body(response, &mut file, final_path).await?;
            finish(file, final_path).await?;
            debug!(bytes = written, path = %final_path.display(), "full body written");
            Ok(final_path.to_path_buf())
        }
        StatusCode::PARTIAL_CONTENT => {
            ranged_transfer(transport, material, profile, response, final_path, chunk_size, progress).await
        }
        status => Err(DownloadError::http_status(&material.url, status.as_u16())),
    }
}

async fn ranged_transfer(
    transport: &Transport,
    material: &Material,
    profile: HeaderProfile,
    first: Response,
    final_path: &Path,
    chunk_size: u64,
    progress: Option<&ProgressCallback>,
) -> Result<PathBuf, DownloadError> {
    let part = part_path(final_path);
    let mut range = content_range(&material.url, &first)?;
    let mut file = create(&part).await?;
    let mut written = write_body(first, &mut file, &part).await?;

    while !range.is_complete() {
        if let Some(callback) = progress {
            callback(range.percent());
        }
        let start = range.end + 1;
        let end = start.saturating_add(chunk_size.max(1) - 1).min(range.total - 1);
        let mut headers = profile.header_map();
        headers.insert(RANGE, range_header(start, end));
        let request = transport.get(&material.url).headers(headers);
        let response = transport.send(STEP, request).await?;
        if response.status() != StatusCode::PARTIAL_CONTENT {
            finish(file, &part).await?;
            return Err(DownloadError::partial_transfer(
                &material.url,
                response.status().as_u16(),
                written,
            ));
        }
        let next = content_range(&material.url, &response)?;
        if next.start != start || next.total != range.total {
            finish(file, &part).await?;
            return Err(DownloadError::malformed_range(
                &material.url,
                format!("bytes {}-{}/{}", next.start, next.end, next.total),
            ));
        }
        written += write_body(response, &mut file, &part).await?;
        range = next;
    }

    finish(file, &part).await?;
    tokio::fs::rename(&part, final_path)
        .await
        .map_err(|e| DownloadError::io(final_path, e))?;
    debug!(bytes = written, total = range.total, path = %final_path.display(), "ranged transfer complete");
    Ok(final_path.to_path_buf())
}

fn range_header(start: u64, end: u64) -> HeaderValue {
    HeaderValue::from_str(&format!("bytes={start}-{end}"))
        .unwrap_or_else(|_| HeaderValue::from_static("bytes=0-"))
}

fn content_range(url: &str, response: &Response) -> Result<ContentRange, DownloadError> {
    let raw = response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    ContentRange::parse(raw).ok_or_else(|| DownloadError::malformed_range(url, raw))
}

async fn create(path: &Path) -> Result<BufWriter<File>, DownloadError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    Ok(BufWriter::with_capacity(WRITE_BUFFER_BYTES, file))
}

async fn write_body(response: Response, file: &mut BufWriter<File>, path: &Path) -> Result<u64, DownloadError> {
    let url = response.url().to_string();
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransportError::from_reqwest(STEP, &url, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        written += chunk.len() as u64;
    }
    Ok(written)
}

async fn finish(mut file: BufWriter<File>, path: &Path) -> Result<(), DownloadError> {
    file.flush().await.map_err(|e| DownloadError::io(path, e))?;
    file.into_inner()
        .sync_all()
        .await
        .map_err(|e| DownloadError::io(path, e))
}
