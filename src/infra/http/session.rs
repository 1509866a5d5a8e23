//! Cookie sessions, caller identity and the cron key guard.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use subtle::ConstantTimeEq;

use crate::application::auth::{AuthError, IssuedSession};
use crate::domain::entities::UserRecord;

use super::error::{ApiError, codes};
use super::state::HttpState;

pub const SESSION_COOKIE: &str = "hub_session";
pub const CRON_KEY_HEADER: &str = "x-cron-key";

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(
    session: &IssuedSession,
    ttl: std::time::Duration,
    secure: bool,
) -> Cookie<'static> {
    let max_age = time::Duration::try_from(ttl).unwrap_or(time::Duration::days(30));
    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// The signed-in user; rejects with 401 otherwise.
pub struct CurrentUser(pub UserRecord);

impl FromRequestParts<HttpState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(ApiError::unauthorized)?;
        let user = state.services.auth.authenticate(&token).await?;
        Ok(Self(user))
    }
}

/// The signed-in user when there is one. Invalid sessions read as anonymous.
pub struct MaybeUser(pub Option<UserRecord>);

impl MaybeUser {
    pub fn id(&self) -> Option<uuid::Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl FromRequestParts<HttpState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Self(None));
        };
        match state.services.auth.authenticate(&token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(AuthError::Unauthenticated) => Ok(Self(None)),
            Err(err) => Err(err.into()),
        }
    }
}

/// Caller address for rate limiting.
///
/// The socket peer, unless that peer is a trusted proxy; then the right-most
/// `x-forwarded-for` hop that is not itself a trusted proxy.
pub struct ClientAddr(pub String);

impl ClientAddr {
    fn resolve(peer: Option<IpAddr>, forwarded: Option<&str>, trusted: &[IpAddr]) -> String {
        let Some(peer) = peer else {
            return "anonymous".to_string();
        };
        if !trusted.contains(&peer) {
            return peer.to_string();
        }

        forwarded
            .into_iter()
            .flat_map(|value| value.rsplit(','))
            .map(str::trim)
            .filter_map(|hop| hop.parse::<IpAddr>().ok())
            .find(|hop| !trusted.contains(hop))
            .unwrap_or(peer)
            .to_string()
    }
}

impl FromRequestParts<HttpState> for ClientAddr {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok());
        Ok(Self(Self::resolve(
            peer,
            forwarded,
            &state.config.trusted_proxies,
        )))
    }
}

/// Compare the `x-cron-key` header in constant time.
pub fn verify_cron_key(headers: &HeaderMap, secret: Option<&str>) -> Result<(), ApiError> {
    let Some(secret) = secret.filter(|secret| !secret.is_empty()) else {
        return Err(ApiError::new(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            codes::NOT_CONFIGURED,
            "Cron endpoint not configured",
            None,
        ));
    };
    let provided = headers
        .get(CRON_KEY_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if bool::from(provided.ct_eq(secret.as_bytes())) {
        Ok(())
    } else {
        Err(ApiError::new(
            axum::http::StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Invalid cron key",
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode, header::COOKIE};

    use super::*;

    #[test]
    fn reads_session_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; hub_session=abc123"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        headers.insert(COOKIE, HeaderValue::from_static("hub_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cron_key_must_match() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            verify_cron_key(&headers, None).unwrap_err().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            verify_cron_key(&headers, Some("s3cret")).unwrap_err().status(),
            StatusCode::UNAUTHORIZED
        );

        headers.insert(CRON_KEY_HEADER, HeaderValue::from_static("wrong!"));
        assert!(verify_cron_key(&headers, Some("s3cret")).is_err());

        headers.insert(CRON_KEY_HEADER, HeaderValue::from_static("s3cret"));
        assert!(verify_cron_key(&headers, Some("s3cret")).is_ok());
    }

    #[test]
    fn forwarded_for_is_only_read_behind_a_trusted_proxy() {
        let proxy: IpAddr = "10.0.0.1".parse().unwrap();
        let client: IpAddr = "203.0.113.9".parse().unwrap();
        let spoofed = Some("198.51.100.7, 203.0.113.9");

        assert_eq!(ClientAddr::resolve(Some(client), spoofed, &[]), "203.0.113.9");
        assert_eq!(
            ClientAddr::resolve(Some(client), spoofed, &[proxy]),
            "203.0.113.9"
        );
        assert_eq!(
            ClientAddr::resolve(Some(proxy), spoofed, &[proxy]),
            "203.0.113.9"
        );
        assert_eq!(
            ClientAddr::resolve(Some(proxy), Some("garbage, 10.0.0.1"), &[proxy]),
            "10.0.0.1"
        );
        assert_eq!(ClientAddr::resolve(None, spoofed, &[]), "anonymous");
    }
}
