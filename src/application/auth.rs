//! Account registration, password login, cookie sessions and emailed tokens.

use std::sync::Arc;
use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use creatorhub_api_types::{LoginRequest, PasswordResetConfirmRequest, RegisterRequest};

use crate::application::ports::{Mailer, OutgoingEmail};
use crate::application::repos::{
    AuthTokensRepo, CreateUserParams, IssueTokenParams, RepoError, SessionsRepo, UsersRepo,
};
use crate::domain::entities::{AuthTokenRecord, SessionRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::types::{AuthTokenKind, UserRole};
use crate::domain::validation;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("authentication required")]
    Unauthenticated,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("email is already registered")]
    EmailTaken,
    #[error("token not found")]
    TokenNotFound,
    #[error("token expired")]
    TokenExpired,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_ttl: Duration,
    pub password_reset_ttl: Duration,
    pub email_verification_ttl: Duration,
    /// Base for links placed in outgoing email.
    pub public_url: Url,
}

impl AuthConfig {
    pub fn from_settings(auth: &crate::config::AuthSettings, public_url: Url) -> Self {
        Self {
            session_ttl: auth.session_ttl,
            password_reset_ttl: auth.password_reset_ttl,
            email_verification_ttl: auth.email_verification_ttl,
            public_url,
        }
    }
}

/// Opaque session token handed to the client once; only its hash is stored.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub sessions: u64,
    pub tokens: u64,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
    tokens: Arc<dyn AuthTokensRepo>,
    mailer: Arc<dyn Mailer>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        sessions: Arc<dyn SessionsRepo>,
        tokens: Arc<dyn AuthTokensRepo>,
        mailer: Arc<dyn Mailer>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            mailer,
            config,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.config.session_ttl
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserRecord, AuthError> {
        let username = validation::username(&request.username)?;
        let email = validation::email(&request.email)?;
        let password = validation::password(&request.password)?;

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(password)?;
        let user = self
            .users
            .create_user(CreateUserParams {
                username,
                email,
                password_hash,
                role: UserRole::Creator,
            })
            .await
            .map_err(|err| {
                if err.is_duplicate_of("username") {
                    AuthError::UsernameTaken
                } else if err.is_duplicate_of("email") {
                    AuthError::EmailTaken
                } else {
                    AuthError::Repo(err)
                }
            })?;

        info!(
            target = "creatorhub::auth",
            user_id = %user.id,
            username = %user.username,
            "User registered"
        );

        self.send_verification(&user.email).await?;
        Ok(user)
    }

    pub async fn login(
        &self,
        request: LoginRequest,
    ) -> Result<(UserRecord, IssuedSession), AuthError> {
        let identifier = request.identifier.trim();
        let user = if identifier.contains('@') {
            self.users.find_by_email(&identifier.to_lowercase()).await?
        } else {
            self.users.find_by_username(identifier).await?
        };

        let user = user.ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.issue_session(user.id).await?;
        Ok((user, session))
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete_session(&hash_token(token)).await?;
        Ok(())
    }

    /// Resolve the user behind a session cookie value.
    pub async fn authenticate(&self, token: &str) -> Result<UserRecord, AuthError> {
        let token_hash = hash_token(token);
        let session = self
            .sessions
            .find_session(&token_hash)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if session.expires_at <= OffsetDateTime::now_utc() {
            self.sessions.delete_session(&token_hash).await?;
            return Err(AuthError::Unauthenticated);
        }

        self.users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    /// Always succeeds for well-formed addresses so callers cannot probe for accounts.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = validation::email(email)?;
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Ok(());
        };

        let token = self
            .issue_token(
                AuthTokenKind::PasswordReset,
                &user.email,
                self.config.password_reset_ttl,
            )
            .await?;
        let link = self.link("/reset-password", &token);
        self.deliver(OutgoingEmail {
            to: user.email.clone(),
            subject: "Reset your password".to_string(),
            body: format!(
                "Someone asked to reset the password for {}.\n\nOpen this link within {} minutes to choose a new one:\n{link}\n\nIf this wasn't you, ignore this email.",
                user.username,
                self.config.password_reset_ttl.as_secs() / 60,
            ),
        })
        .await;
        Ok(())
    }

    pub async fn reset_password(&self, request: PasswordResetConfirmRequest) -> Result<(), AuthError> {
        let password = validation::password(&request.password)?;
        let token = self
            .consume_token(AuthTokenKind::PasswordReset, &request.token)
            .await?;

        let user = self
            .users
            .find_by_email(&token.email)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let password_hash = hash_password(password)?;
        self.users.update_password(user.id, &password_hash).await?;
        let revoked = self.sessions.delete_user_sessions(user.id).await?;

        info!(
            target = "creatorhub::auth",
            user_id = %user.id,
            revoked_sessions = revoked,
            "Password reset"
        );
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> Result<UserRecord, AuthError> {
        let token = self
            .consume_token(AuthTokenKind::EmailVerification, token)
            .await?;
        let user = self
            .users
            .find_by_email(&token.email)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let now = OffsetDateTime::now_utc();
        self.users.mark_email_verified(user.id, now).await?;
        Ok(UserRecord {
            email_verified_at: Some(now),
            ..user
        })
    }

    /// Delete expired sessions and tokens.
    pub async fn purge_expired(&self, now: OffsetDateTime) -> Result<PurgeReport, RepoError> {
        let sessions = self.sessions.purge_expired_sessions(now).await?;
        let tokens = self.tokens.purge_expired_tokens(now).await?;
        Ok(PurgeReport { sessions, tokens })
    }

    async fn issue_session(&self, user_id: Uuid) -> Result<IssuedSession, AuthError> {
        let token = generate_secret();
        let now = OffsetDateTime::now_utc();
        let expires_at = now + self.config.session_ttl;

        self.sessions
            .create_session(SessionRecord {
                id: Uuid::new_v4(),
                user_id,
                token_hash: hash_token(&token),
                expires_at,
                created_at: now,
            })
            .await?;

        Ok(IssuedSession { token, expires_at })
    }

    async fn issue_token(
        &self,
        kind: AuthTokenKind,
        email: &str,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let token = generate_secret();
        self.tokens
            .replace_token(IssueTokenParams {
                kind,
                email: email.to_string(),
                token_hash: hash_token(&token),
                expires_at: OffsetDateTime::now_utc() + ttl,
            })
            .await?;
        Ok(token)
    }

    /// Single-use lookup: the token is deleted whether it is used or found expired.
    async fn consume_token(
        &self,
        kind: AuthTokenKind,
        token: &str,
    ) -> Result<AuthTokenRecord, AuthError> {
        let record = self
            .tokens
            .consume_token(kind, &hash_token(token.trim()))
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        if record.expires_at <= OffsetDateTime::now_utc() {
            return Err(AuthError::TokenExpired);
        }
        Ok(record)
    }

    async fn send_verification(&self, email: &str) -> Result<(), AuthError> {
        let token = self
            .issue_token(
                AuthTokenKind::EmailVerification,
                email,
                self.config.email_verification_ttl,
            )
            .await?;
        let link = self.link("/api/auth/verify-email", &token);
        self.deliver(OutgoingEmail {
            to: email.to_string(),
            subject: "Confirm your email address".to_string(),
            body: format!("Welcome to the hub!\n\nConfirm your email address by opening:\n{link}\n"),
        })
        .await;
        Ok(())
    }

    /// Mail failures are logged and never fail the request.
    async fn deliver(&self, email: OutgoingEmail) {
        if let Err(err) = self.mailer.send(&email).await {
            warn!(
                target = "creatorhub::auth",
                error = %err,
                subject = %email.subject,
                "Failed to deliver email"
            );
        }
    }

    fn link(&self, path: &str, token: &str) -> Url {
        let mut link = self.config.public_url.clone();
        link.set_path(path);
        link.query_pairs_mut().clear().append_pair("token", token);
        link
    }
}

pub(crate) fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hash(err.to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(password_hash).map_err(|err| AuthError::Hash(err.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(AuthError::Hash(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn secrets_are_unique_hex() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn token_hash_is_sha256() {
        assert_eq!(hash_token("abc").len(), 32);
        assert_eq!(hash_token("abc"), hash_token("abc"));
    }
}
