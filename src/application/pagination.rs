//! Opaque cursor codec and page envelopes for feed pagination.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::FeedEntry;
use crate::domain::types::PostId;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeedCursorPayload {
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    id: PostId,
}

/// Position of the last entry of a previously served page.
///
/// `(created_at, id)` is a strict total order over posts: newer first, and
/// for equal timestamps the larger id first. A cursor is an exclusive bound,
/// so the next page starts at the first post strictly below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    created_at: OffsetDateTime,
    id: PostId,
}

impl FeedCursor {
    pub fn new(created_at: OffsetDateTime, id: PostId) -> Self {
        Self { created_at, id }
    }

    pub fn from_entry(entry: &FeedEntry) -> Self {
        Self::new(entry.created_at, entry.id.clone())
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn id(&self) -> &PostId {
        &self.id
    }

    pub fn encode(&self) -> String {
        let payload = FeedCursorPayload {
            created_at: self.created_at,
            id: self.id.clone(),
        };
        let serialized =
            serde_json::to_vec(&payload).expect("serializing feed cursor payload should succeed");
        URL_SAFE_NO_PAD.encode(serialized)
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: FeedCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        if payload.id.as_str().is_empty() {
            return Err(PaginationError::InvalidCursor(
                "cursor id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            created_at: payload.created_at,
            id: payload.id,
        })
    }
}

/// Cursor-aware page result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    pub entries: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn new(entries: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { entries, next_cursor }
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}
