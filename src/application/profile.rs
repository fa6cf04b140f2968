use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{ProfilesRepo, RepoError};
use crate::domain::entities::ProfileRecord;
use crate::domain::types::UserId;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("entity store unavailable: {0}")]
    StoreUnavailable(#[from] RepoError),
}

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfilesRepo>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfilesRepo>) -> Self {
        Self { profiles }
    }

    /// Profile with relationship counts; `None` when the user does not exist.
    pub async fn get_profile(
        &self,
        id: &UserId,
        caller: Option<&UserId>,
    ) -> Result<Option<ProfileRecord>, ProfileError> {
        Ok(self.profiles.find_profile(id, caller).await?)
    }
}
