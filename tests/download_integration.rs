//! Integration tests for the download manager.
//!
//! Ranged transfers are served by a responder that honours the `Range`
//! header the way the media host does.

mod support;

use std::sync::{Arc, Mutex};

use lecture_core::{DownloadManager, DownloadRequest, Material, MaterialKind};
use support::{mock_config, start_mock_server_or_skip, transport};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const CHUNK: u64 = 1000;

fn media_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| u8::try_from(i % 251).unwrap()).collect()
}

/// Serves `body` in 206 slices; answers `fail_status` for ranges starting at
/// or after `fail_from`.
struct RangeResponder {
    body: Vec<u8>,
    fail_from: Option<(u64, u16)>,
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let total = self.body.len() as u64;
        let range = request
            .headers
            .get("range")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("bytes="))
            .unwrap_or("0-");
        let (start, end) = range.split_once('-').unwrap();
        let start: u64 = start.parse().unwrap();
        let end: u64 = if end.is_empty() {
            (start + CHUNK - 1).min(total - 1)
        } else {
            end.parse::<u64>().unwrap().min(total - 1)
        };
        if let Some((from, status)) = self.fail_from {
            if start >= from {
                return ResponseTemplate::new(status);
            }
        }
        let slice = self.body[usize::try_from(start).unwrap()..=usize::try_from(end).unwrap()].to_vec();
        ResponseTemplate::new(206)
            .insert_header("content-range", format!("bytes {start}-{end}/{total}").as_str())
            .set_body_bytes(slice)
    }
}

async fn mount_video(server: &MockServer, route: &str, body: Vec<u8>, fail_from: Option<(u64, u16)>) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header_exists("range"))
        .respond_with(RangeResponder { body, fail_from })
        .mount(server)
        .await;
}

fn manager(server: &MockServer) -> DownloadManager {
    let config = mock_config(&server.uri());
    DownloadManager::new(transport(&config), &config).with_chunk_size(CHUNK)
}

#[tokio::test]
async fn test_ranged_video_is_assembled_in_chunks() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let body = media_bytes(3500);
    mount_video(&server, "/media/lecture01.mp4", body.clone(), None).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let request = DownloadRequest::new(Material::new(
        "Lecture 01.mp4",
        MaterialKind::Video,
        format!("{}/media/lecture01.mp4", server.uri()),
    ))
    .with_progress(Arc::new(move |percent| recorder.lock().unwrap().push(percent)));

    let dest = tempfile::tempdir().unwrap();
    let outcomes = manager(&server).download(vec![request], dest.path()).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status_text(), "OK");
    let written = outcomes[0].result.as_ref().unwrap();
    assert_eq!(written, &dest.path().join("Lecture 01.mp4"));
    assert_eq!(std::fs::read(written).unwrap(), body);
    assert!(!dest.path().join("Lecture 01.mp4.part").exists());
    // One report before each follow-up request: four chunks, three reports.
    assert_eq!(*seen.lock().unwrap(), vec![28, 57, 85]);
}

#[tokio::test]
async fn test_mid_transfer_rejection_fails_only_that_material() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_video(&server, "/media/broken.mp4", media_bytes(3500), Some((2000, 403))).await;
    let good = media_bytes(2500);
    mount_video(&server, "/media/good.mp4", good.clone(), None).await;

    let requests = vec![
        DownloadRequest::new(Material::new(
            "broken.mp4",
            MaterialKind::Video,
            format!("{}/media/broken.mp4", server.uri()),
        )),
        DownloadRequest::new(Material::new(
            "good.mp4",
            MaterialKind::Video,
            format!("{}/media/good.mp4", server.uri()),
        )),
    ];
    let dest = tempfile::tempdir().unwrap();
    let outcomes = manager(&server).download(requests, dest.path()).await;

    assert_eq!(outcomes[0].name, "broken.mp4");
    assert_eq!(outcomes[0].status_text(), "PARTIAL 403");
    assert!(!dest.path().join("broken.mp4").exists());
    let part = std::fs::read(dest.path().join("broken.mp4.part")).unwrap();
    assert_eq!(part.len(), 2000);

    assert_eq!(outcomes[1].name, "good.mp4");
    assert!(outcomes[1].success());
    assert_eq!(std::fs::read(dest.path().join("good.mp4")).unwrap(), good);
}

#[tokio::test]
async fn test_document_full_body_and_status_rows() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = "%PDF-1.7 lecture notes".as_bytes().to_vec();
    Mock::given(method("GET"))
        .and(path("/files/notes.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let requests = vec![
        DownloadRequest::new(Material::new(
            "notes.pdf",
            MaterialKind::Document,
            format!("{}/files/notes.pdf", server.uri()),
        )),
        DownloadRequest::new(Material::new(
            "notes.pdf",
            MaterialKind::Document,
            format!("{}/files/missing.pdf", server.uri()),
        )),
    ];
    let dest = tempfile::tempdir().unwrap();
    let outcomes = manager(&server)
        .download(requests, &dest.path().join("nested/out"))
        .await;

    assert_eq!(outcomes[0].status_text(), "OK");
    assert_eq!(
        std::fs::read(dest.path().join("nested/out/notes.pdf")).unwrap(),
        content
    );
    assert_eq!(outcomes[1].name, "notes_2.pdf");
    assert_eq!(outcomes[1].status_text(), "HTTP 404");
}

#[tokio::test]
async fn test_malformed_content_range_is_reported() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/media/odd.mp4"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "bytes 0-99/*")
                .set_body_bytes(vec![0u8; 100]),
        )
        .mount(&server)
        .await;

    let dest = tempfile::tempdir().unwrap();
    let outcomes = manager(&server)
        .download(
            vec![DownloadRequest::new(Material::new(
                "odd.mp4",
                MaterialKind::Video,
                format!("{}/media/odd.mp4", server.uri()),
            ))],
            dest.path(),
        )
        .await;
    assert_eq!(outcomes[0].status_text(), "RANGE");
}
