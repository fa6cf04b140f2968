//! Post content rules.

use crate::domain::error::DomainError;

pub const MAX_CONTENT_CHARS: usize = 280;

/// Validated post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent(String);

impl PostContent {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyContent);
        }
        let actual = trimmed.chars().count();
        if actual > MAX_CONTENT_CHARS {
            return Err(DomainError::ContentTooLong {
                max: MAX_CONTENT_CHARS,
                actual,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
