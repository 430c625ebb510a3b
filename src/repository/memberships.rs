//! User ↔ library links

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::membership::{CreateMembership, Membership},
};

use super::libraries::LibrariesRepository;

#[derive(Clone)]
pub struct MembershipsRepository {
    pool: Pool<Postgres>,
}

impl MembershipsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a link; an existing pair is left untouched
    pub async fn link_on(conn: &mut PgConnection, user_id: i32, library_id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_libraries (user_id, library_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, library_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(library_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Link an existing user to an existing library
    pub async fn create(&self, membership: &CreateMembership) -> AppResult<Membership> {
        let mut tx = self.pool.begin().await?;

        let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(membership.user_id)
            .fetch_one(&mut *tx)
            .await?;
        if !user_exists {
            return Err(AppError::NotFound(format!("User with id {} not found", membership.user_id)));
        }

        if !LibrariesRepository::exists_on(&mut tx, membership.library_id).await? {
            return Err(AppError::NotFound(format!(
                "Library with id {} not found",
                membership.library_id
            )));
        }

        Self::link_on(&mut tx, membership.user_id, membership.library_id).await?;
        tx.commit().await?;

        Ok(Membership {
            user_id: membership.user_id,
            library_id: membership.library_id,
        })
    }

    /// Check whether a user belongs to a library
    pub async fn is_member(&self, user_id: i32, library_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_libraries WHERE user_id = $1 AND library_id = $2)",
        )
        .bind(user_id)
        .bind(library_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
