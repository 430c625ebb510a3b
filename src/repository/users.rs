//! Users repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::{
        library::Library,
        user::{NewUser, Role, User},
    },
};

use super::{libraries::LibrariesRepository, memberships::MembershipsRepository};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (login identifier, case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Check whether at least one account has the given role
    pub async fn role_exists(&self, role: Role) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = $1)")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_on(conn: &mut PgConnection, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, contact, role, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.contact)
        .bind(user.role)
        .bind(&user.password)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email already exists".to_string())
            } else {
                e.into()
            }
        })
    }

    /// Create a user without library links
    pub async fn create(&self, user: &NewUser) -> AppResult<User> {
        Self::insert_on(&mut *self.pool.acquire().await?, user).await
    }

    /// Create a user and link it to every given library, all or nothing
    pub async fn create_with_libraries(
        &self,
        user: &NewUser,
        library_ids: &[i32],
    ) -> AppResult<(User, Vec<Library>)> {
        let mut tx = self.pool.begin().await?;

        let created = Self::insert_on(&mut tx, user).await?;

        for &library_id in library_ids {
            if !LibrariesRepository::exists_on(&mut tx, library_id).await? {
                // dropping the transaction rolls the user back
                return Err(AppError::Validation(format!("Library ID {} not found", library_id)));
            }
            MembershipsRepository::link_on(&mut tx, created.id, library_id).await?;
        }

        let libraries = LibrariesRepository::list_for_user_on(&mut tx, created.id).await?;
        tx.commit().await?;

        Ok((created, libraries))
    }
}
