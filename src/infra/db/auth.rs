use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AuthTokensRepo, IssueTokenParams, RepoError, SessionsRepo};
use crate::domain::entities::{AuthTokenRecord, SessionRecord};
use crate::domain::types::AuthTokenKind;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: Vec<u8>,
    expires_at: OffsetDateTime,
    created_at: OffsetDateTime,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuthTokenRow {
    id: Uuid,
    kind: AuthTokenKind,
    email: String,
    token_hash: Vec<u8>,
    expires_at: OffsetDateTime,
    created_at: OffsetDateTime,
}

impl From<AuthTokenRow> for AuthTokenRecord {
    fn from(row: AuthTokenRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            email: row.email,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl SessionsRepo for PostgresRepositories {
    async fn create_session(&self, session: SessionRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>, RepoError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, user_id, token_hash, expires_at, created_at \
             FROM sessions WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(SessionRecord::from))
    }

    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AuthTokensRepo for PostgresRepositories {
    async fn replace_token(&self, params: IssueTokenParams) -> Result<AuthTokenRecord, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM auth_tokens WHERE email = $1 AND kind = $2")
            .bind(&params.email)
            .bind(params.kind)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, AuthTokenRow>(
            "INSERT INTO auth_tokens (kind, email, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, kind, email, token_hash, expires_at, created_at",
        )
        .bind(params.kind)
        .bind(&params.email)
        .bind(&params.token_hash)
        .bind(params.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn consume_token(
        &self,
        kind: AuthTokenKind,
        token_hash: &[u8],
    ) -> Result<Option<AuthTokenRecord>, RepoError> {
        let row = sqlx::query_as::<_, AuthTokenRow>(
            "DELETE FROM auth_tokens WHERE kind = $1 AND token_hash = $2 \
             RETURNING id, kind, email, token_hash, expires_at, created_at",
        )
        .bind(kind)
        .bind(token_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(AuthTokenRecord::from))
    }

    async fn purge_expired_tokens(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}
