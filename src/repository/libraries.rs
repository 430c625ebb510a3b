//! Libraries repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::library::{CreateLibrary, Library, UpdateLibrary},
};

#[derive(Clone)]
pub struct LibrariesRepository {
    pool: Pool<Postgres>,
}

impl LibrariesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all libraries
    pub async fn list(&self) -> AppResult<Vec<Library>> {
        let libraries = sqlx::query_as::<_, Library>("SELECT * FROM libraries ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(libraries)
    }

    /// Get library by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Library> {
        sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        Self::exists_on(&mut *self.pool.acquire().await?, id).await
    }

    /// Check existence on a caller-provided connection (usually a transaction)
    pub async fn exists_on(conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM libraries WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }

    /// Libraries a user is a member of
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<Library>> {
        Self::list_for_user_on(&mut *self.pool.acquire().await?, user_id).await
    }

    pub async fn list_for_user_on(conn: &mut PgConnection, user_id: i32) -> AppResult<Vec<Library>> {
        let libraries = sqlx::query_as::<_, Library>(
            r#"
            SELECT l.*
            FROM libraries l
            JOIN user_libraries ul ON ul.library_id = l.id
            WHERE ul.user_id = $1
            ORDER BY l.id
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?;
        Ok(libraries)
    }

    /// Create a new library
    pub async fn create(&self, library: &CreateLibrary) -> AppResult<Library> {
        let created = sqlx::query_as::<_, Library>(
            r#"
            INSERT INTO libraries (name, address, city, contact)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&library.name)
        .bind(&library.address)
        .bind(&library.city)
        .bind(&library.contact)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Update the provided fields of a library
    pub async fn update(&self, id: i32, library: &UpdateLibrary) -> AppResult<Library> {
        sqlx::query_as::<_, Library>(
            r#"
            UPDATE libraries SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                city = COALESCE($4, city),
                contact = COALESCE($5, contact)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&library.name)
        .bind(&library.address)
        .bind(&library.city)
        .bind(&library.contact)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", id)))
    }

    /// Delete a library (its books and memberships cascade)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM libraries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Library with id {} not found", id)));
        }
        Ok(())
    }
}
