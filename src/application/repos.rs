//! Repository traits describing the entity store.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::FeedCursor;
use crate::domain::entities::{Edge, FeedEntry, PostRecord, ProfileRecord, UserRecord};
use crate::domain::types::{EdgeState, PostId, UserId};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Store-level predicate for a feed scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    All,
    /// Posts whose author is followed by the given user.
    FollowedBy(UserId),
    Author(UserId),
}

/// Bounded range scan over posts.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub scope: FeedScope,
    /// Exclusive bound; rows must sort strictly after it.
    pub after: Option<FeedCursor>,
    /// Maximum number of rows to return.
    pub take: u32,
    /// When set, `liked_by_me` is computed for this user; otherwise it is false.
    pub viewer: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
}

#[async_trait]
pub trait FeedRepo: Send + Sync {
    /// Rows ordered by `created_at DESC, id DESC`, enriched with like data.
    async fn scan_feed(&self, query: &FeedQuery) -> Result<Vec<FeedEntry>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Insert a post stamped with the store's current time.
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user(&self, id: &UserId) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait ProfilesRepo: Send + Sync {
    async fn find_profile(
        &self,
        id: &UserId,
        viewer: Option<&UserId>,
    ) -> Result<Option<ProfileRecord>, RepoError>;
}

#[async_trait]
pub trait EdgesRepo: Send + Sync {
    /// Atomically delete the edge if present, otherwise create it.
    ///
    /// The store keeps at most one edge per pair. An insert that loses a race
    /// against an identical concurrent insert fails with
    /// [`RepoError::Duplicate`]; a missing endpoint fails with
    /// [`RepoError::NotFound`] or [`RepoError::InvalidInput`].
    async fn toggle_edge(&self, edge: &Edge) -> Result<EdgeState, RepoError>;
}
