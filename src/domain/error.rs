use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("post content must not be empty")]
    EmptyContent,
    #[error("post content is {actual} characters; the limit is {max}")]
    ContentTooLong { max: usize, actual: usize },
}
