//! Board-based materials: attachments of posts on the course's lecture
//! materials board.

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{Material, MaterialKind, MaterialSource, ResolveError, first_failure, get_json};
use crate::auth::Credential;
use crate::config::EngineConfig;
use crate::pool::clamp_workers;
use crate::transport::Transport;
use crate::util::deserialize_id;

/// Title of the board that holds lecture materials.
pub const MATERIALS_BOARD_TITLE: &str = "강의자료실";

#[derive(Debug, Deserialize)]
struct RawBoard {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct RawPostPage {
    #[serde(default)]
    items: Vec<RawPostRef>,
    #[serde(default)]
    pagination: RawPagination,
}

#[derive(Debug, Deserialize)]
struct RawPostRef {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawPagination {
    #[serde(default)]
    last_page: u32,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    #[serde(default)]
    attachments: Vec<RawAttachment>,
}

#[derive(Debug, Deserialize)]
struct RawAttachment {
    filename: String,
    url: String,
}

/// Lists attachments on the course's lecture materials board.
#[derive(Debug, Clone)]
pub struct BoardSource {
    transport: Transport,
    api_base: String,
    workers: usize,
}

impl BoardSource {
    /// Creates a board source sharing `transport`.
    #[must_use]
    pub fn new(transport: Transport, config: &EngineConfig) -> Self {
        Self {
            transport,
            api_base: format!("{}/learningx/api/v1/learningx_board", config.endpoints.lms),
            workers: clamp_workers(config.workers),
        }
    }

    async fn find_board(&self, credential: &Credential, course_id: &str) -> Result<Option<String>, ResolveError> {
        let url = format!("{}/courses/{course_id}/boards", self.api_base);
        let boards: Vec<RawBoard> = get_json(&self.transport, "board-list", &url, credential).await?;
        Ok(boards
            .into_iter()
            .find(|board| board.title == MATERIALS_BOARD_TITLE)
            .map(|board| board.id))
    }

    async fn fetch_page(
        &self,
        credential: &Credential,
        course_id: &str,
        board_id: &str,
        page: u32,
    ) -> Result<RawPostPage, ResolveError> {
        let url = format!("{}/courses/{course_id}/boards/{board_id}/posts?page={page}", self.api_base);
        get_json(&self.transport, "board-page", &url, credential).await
    }

    async fn fetch_attachments(
        &self,
        credential: &Credential,
        course_id: &str,
        board_id: &str,
        post_id: &str,
    ) -> Result<Vec<Material>, ResolveError> {
        let url = format!("{}/courses/{course_id}/boards/{board_id}/posts/{post_id}", self.api_base);
        let post: RawPost = get_json(&self.transport, "board-post", &url, credential).await?;
        Ok(post
            .attachments
            .into_iter()
            .map(|attachment| Material::new(attachment.filename, MaterialKind::Document, attachment.url))
            .collect())
    }
}

#[async_trait]
impl MaterialSource for BoardSource {
    fn name(&self) -> &'static str {
        "board"
    }

    #[instrument(skip(self, credential))]
    async fn discover(&self, credential: &Credential, course_id: &str) -> Result<Vec<Material>, ResolveError> {
        let Some(board_id) = self.find_board(credential, course_id).await? else {
            info!(course_id, "course has no lecture materials board");
            return Ok(Vec::new());
        };

        let first = self.fetch_page(credential, course_id, &board_id, 1).await?;
        let last_page = first.pagination.last_page.max(1);
        let rest: Vec<Result<RawPostPage, ResolveError>> = stream::iter(2..=last_page)
            .map(|page| self.fetch_page(credential, course_id, &board_id, page))
            .buffer_unordered(self.workers)
            .collect()
            .await;
        let mut pages = vec![first];
        pages.extend(first_failure("board-page", rest)?);

        let post_ids: Vec<String> = pages
            .into_iter()
            .flat_map(|page| page.items.into_iter().map(|post| post.id))
            .collect();
        debug!(board_id = %board_id, pages = last_page, posts = post_ids.len(), "board posts listed");

        let attachments: Vec<Result<Vec<Material>, ResolveError>> = stream::iter(post_ids)
            .map(|post_id| {
                let board_id = board_id.clone();
                async move {
                    self.fetch_attachments(credential, course_id, &board_id, &post_id)
                        .await
                }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;
        Ok(first_failure("board-post", attachments)?.into_iter().flatten().collect())
    }
}
