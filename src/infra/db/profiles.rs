use async_trait::async_trait;
use sqlx::QueryBuilder;

use crate::application::repos::{ProfilesRepo, RepoError};
use crate::domain::entities::ProfileRecord;
use crate::domain::types::UserId;

use super::PostgresRepositories;
use super::types::ProfileRow;
use crate::infra::db::map_sqlx_error;

#[async_trait]
impl ProfilesRepo for PostgresRepositories {
    async fn find_profile(
        &self,
        id: &UserId,
        viewer: Option<&UserId>,
    ) -> Result<Option<ProfileRecord>, RepoError> {
        let mut qb = QueryBuilder::new(
            "SELECT u.id, u.name, u.image, \
             (SELECT COUNT(*) FROM follows f WHERE f.followee_id = u.id) AS followers_count, \
             (SELECT COUNT(*) FROM follows f WHERE f.follower_id = u.id) AS follows_count, \
             (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id) AS posts_count, ",
        );

        match viewer {
            Some(viewer) => {
                qb.push(
                    "EXISTS (SELECT 1 FROM follows f WHERE f.followee_id = u.id AND f.follower_id = ",
                );
                qb.push_bind(viewer.as_str());
                qb.push(") AS is_following ");
            }
            None => {
                qb.push("FALSE AS is_following ");
            }
        }

        qb.push("FROM users u WHERE u.id = ");
        qb.push_bind(id.as_str());

        let row = qb
            .build_query_as::<ProfileRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(ProfileRecord::try_from).transpose()
    }
}
