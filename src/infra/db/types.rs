use time::OffsetDateTime;

use crate::application::repos::RepoError;
use crate::domain::entities::{FeedEntry, PostRecord, ProfileRecord, UserRecord};
use crate::domain::types::{PostId, UserId};

use super::PostgresRepositories;

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: UserId,
    pub(crate) name: Option<String>,
    pub(crate) image: Option<String>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image: row.image,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: PostId,
    pub(crate) author_id: UserId,
    pub(crate) content: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct FeedRow {
    pub(crate) id: PostId,
    pub(crate) author_id: UserId,
    pub(crate) author_name: Option<String>,
    pub(crate) author_avatar: Option<String>,
    pub(crate) content: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) like_count: i64,
    pub(crate) liked_by_me: bool,
}

impl TryFrom<FeedRow> for FeedEntry {
    type Error = RepoError;

    fn try_from(row: FeedRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            author_id: row.author_id,
            author_name: row.author_name,
            author_avatar: row.author_avatar,
            content: row.content,
            created_at: row.created_at,
            like_count: PostgresRepositories::convert_count(row.like_count)?,
            liked_by_me: row.liked_by_me,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ProfileRow {
    pub(crate) id: UserId,
    pub(crate) name: Option<String>,
    pub(crate) image: Option<String>,
    pub(crate) followers_count: i64,
    pub(crate) follows_count: i64,
    pub(crate) posts_count: i64,
    pub(crate) is_following: bool,
}

impl TryFrom<ProfileRow> for ProfileRecord {
    type Error = RepoError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            image: row.image,
            followers_count: PostgresRepositories::convert_count(row.followers_count)?,
            follows_count: PostgresRepositories::convert_count(row.follows_count)?,
            posts_count: PostgresRepositories::convert_count(row.posts_count)?,
            is_following: row.is_following,
        })
    }
}
