//! Identifiers and small value types shared across layers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user identifier as issued by the identity layer.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(String);

/// Opaque post identifier.
///
/// Ordering is bytewise on the underlying string; feeds rely on it as the
/// tie-break after `created_at`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct PostId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PostId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fresh random identifier for a newly created post.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&str> for PostId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Which relation an edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Like,
    Follow,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Like => "like",
            EdgeKind::Follow => "follow",
        }
    }
}

/// Presence state of an edge after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeState {
    Active,
    Inactive,
}

impl EdgeState {
    pub fn from_active(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }

    pub fn is_active(self) -> bool {
        matches!(self, EdgeState::Active)
    }

    /// Counter adjustment implied by arriving in this state.
    pub fn delta(self) -> i64 {
        match self {
            EdgeState::Active => 1,
            EdgeState::Inactive => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeState::Active => "active",
            EdgeState::Inactive => "inactive",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_ids_order_bytewise() {
        assert!(PostId::from("b") > PostId::from("a"));
        assert!(PostId::from("B") < PostId::from("a"));
    }

    #[test]
    fn generated_post_ids_are_distinct() {
        assert_ne!(PostId::generate(), PostId::generate());
    }

    #[test]
    fn edge_state_delta_tracks_direction() {
        assert_eq!(EdgeState::from_active(true).delta(), 1);
        assert_eq!(EdgeState::from_active(false).delta(), -1);
        assert!(EdgeState::Active.is_active());
    }
}
