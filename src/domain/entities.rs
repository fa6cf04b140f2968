//! Domain entities mirrored from persistent storage, plus the derived feed shapes.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::{EdgeKind, PostId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A post enriched with author fields and like state, computed per query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: PostId,
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub like_count: u64,
    pub liked_by_me: bool,
}

impl FeedEntry {
    /// Entry for a post that was just created by `author`.
    pub fn fresh(post: PostRecord, author: &UserRecord) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            author_name: author.name.clone(),
            author_avatar: author.image.clone(),
            content: post.content,
            created_at: post.created_at,
            like_count: 0,
            liked_by_me: false,
        }
    }
}

/// Public profile with relationship counts as seen by an optional viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: UserId,
    pub name: Option<String>,
    pub image: Option<String>,
    pub followers_count: u64,
    pub follows_count: u64,
    pub posts_count: u64,
    pub is_following: bool,
}

/// A like or follow relation instance keyed by its participant pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    Like { user: UserId, post: PostId },
    Follow { follower: UserId, followee: UserId },
}

impl Edge {
    pub fn like(user: UserId, post: PostId) -> Self {
        Self::Like { user, post }
    }

    pub fn follow(follower: UserId, followee: UserId) -> Self {
        Self::Follow { follower, followee }
    }

    pub fn kind(&self) -> EdgeKind {
        match self {
            Edge::Like { .. } => EdgeKind::Like,
            Edge::Follow { .. } => EdgeKind::Follow,
        }
    }

    /// The user on the acting side of the edge.
    pub fn actor(&self) -> &UserId {
        match self {
            Edge::Like { user, .. } => user,
            Edge::Follow { follower, .. } => follower,
        }
    }

    /// Target identifier rendered as a string for logs and errors.
    pub fn target(&self) -> &str {
        match self {
            Edge::Like { post, .. } => post.as_str(),
            Edge::Follow { followee, .. } => followee.as_str(),
        }
    }
}
