//! Owner profile repository.
//!
//! Profiles are mirrored from the identity platform at handoff time so the
//! wishlist search can match against owner fields. This service never
//! authenticates anyone itself.

use sqlx::PgPool;

use wishbox_core::caller::OwnerProfile;
use wishbox_core::types::UserId;

use super::RepositoryError;

/// Repository for owner profiles.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh the profile snapshot for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert(&self, id: UserId, profile: &OwnerProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO wishbox.users (id, email, login, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE \
             SET email = EXCLUDED.email, login = EXCLUDED.login, \
                 first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name, \
                 updated_at = NOW()",
        )
        .bind(id.as_i64())
        .bind(&profile.email)
        .bind(&profile.login)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Load the profile snapshot for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<OwnerProfile>, RepositoryError> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT email, login, first_name, last_name FROM wishbox.users WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(email, login, first_name, last_name)| OwnerProfile {
            email,
            login,
            first_name,
            last_name,
        }))
    }
}
