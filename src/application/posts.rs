//! Post creation.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError, UsersRepo};
use crate::application::revalidate::{ProfileRevalidator, spawn_revalidation};
use crate::domain::entities::FeedEntry;
use crate::domain::error::DomainError;
use crate::domain::posts::PostContent;
use crate::domain::types::{PostId, UserId};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("a caller identity is required")]
    NotAuthenticated,
    #[error("invalid content: {0}")]
    InvalidContent(#[from] DomainError),
    #[error("author `{0}` does not exist")]
    UnknownAuthor(UserId),
    #[error("entity store unavailable: {0}")]
    StoreUnavailable(#[source] RepoError),
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsWriteRepo>,
    users: Arc<dyn UsersRepo>,
    revalidator: Arc<dyn ProfileRevalidator>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsWriteRepo>,
        users: Arc<dyn UsersRepo>,
        revalidator: Arc<dyn ProfileRevalidator>,
    ) -> Self {
        Self {
            posts,
            users,
            revalidator,
        }
    }

    /// Publish a post and return it in feed shape so callers can patch held views.
    pub async fn create_post(
        &self,
        caller: Option<&UserId>,
        content: &str,
    ) -> Result<FeedEntry, PostError> {
        let caller = caller.ok_or(PostError::NotAuthenticated)?;
        let content = PostContent::parse(content)?;

        let author = self
            .users
            .find_user(caller)
            .await
            .map_err(PostError::StoreUnavailable)?
            .ok_or_else(|| PostError::UnknownAuthor(caller.clone()))?;

        let record = self
            .posts
            .create_post(CreatePostParams {
                id: PostId::generate(),
                author_id: caller.clone(),
                content: content.into_inner(),
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound | RepoError::InvalidInput { .. } => {
                    PostError::UnknownAuthor(caller.clone())
                }
                other => PostError::StoreUnavailable(other),
            })?;

        info!(post_id = %record.id, author_id = %caller, "post created");
        spawn_revalidation(&self.revalidator, [caller.clone()]);

        Ok(FeedEntry::fresh(record, &author))
    }
}
