use serde::{Deserialize, Serialize};

use crate::application::feed::FeedFilter;
use crate::domain::types::UserId;

use super::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQueryParams {
    pub filter: Option<String>,
    pub author: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

impl FeedQueryParams {
    pub fn feed_filter(&self) -> Result<FeedFilter, ApiError> {
        match self.filter.as_deref().unwrap_or("all") {
            "all" => Ok(FeedFilter::All),
            "following" => Ok(FeedFilter::FollowingOnly),
            "author" => self
                .author
                .as_deref()
                .map(str::trim)
                .filter(|author| !author.is_empty())
                .map(|author| FeedFilter::ByAuthor(UserId::new(author)))
                .ok_or_else(|| {
                    ApiError::bad_request(
                        "author filter requires an author",
                        Some("pass ?filter=author&author=<user id>".to_string()),
                    )
                }),
            other => Err(ApiError::bad_request(
                "unknown feed filter",
                Some(format!("`{other}` is not one of all, following, author")),
            )),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePostRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ToggleResponse {
    pub active: bool,
}
