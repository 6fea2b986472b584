use std::time::Duration;

use {
    axum::async_trait,
    axum_login::{AuthnBackend, UserId},
    sqlx::{sqlite::SqlitePoolOptions, SqlitePool},
    tracing::debug,
};

use crate::{model::User, Error};

use super::Credentials;

#[derive(Debug, Clone)]
pub struct Backend {
    db: SqlitePool,
}

impl Backend {
    pub const fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Opens an in-memory principal store and runs the migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn in_memory() -> Result<Self, Error> {
        // A single long-lived connection; every new in-memory connection is a new database.
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await?;

        debug!("Running database migrations");
        sqlx::migrate!().run(&db).await?;

        Ok(Self::new(db))
    }

    /// Deletes the principal recorded for one login. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn remove(&self, user_id: i64) -> Result<bool, Error> {
        let result = sqlx::query("delete from principals where id = ?")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        debug!(user_id, removed = result.rows_affected(), "Principal removed");
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = User;
    type Credentials = Credentials;
    type Error = Error;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let user = sqlx::query_as(
            r"
            insert into principals (subject, name, session_id, id_token)
            values (?, ?, ?, ?)
            returning *
            ",
        )
        .bind(creds.subject)
        .bind(creds.name)
        .bind(creds.session_id)
        .bind(creds.id_token)
        .fetch_one(&self.db)
        .await
        .map_err(Self::Error::Sqlx)?;

        Ok(Some(user))
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        sqlx::query_as("select * from principals where id = ?")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(Self::Error::Sqlx)
    }
}
