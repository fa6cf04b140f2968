use async_trait::async_trait;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::UserRecord;
use crate::domain::types::UserId;

use super::PostgresRepositories;
use super::types::UserRow;
use crate::infra::db::map_sqlx_error;

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_user(&self, id: &UserId) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, name, image FROM users WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }
}
