//! Input validation shared by the application services.

use url::Url;

use crate::domain::error::DomainError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;
pub const DISPLAY_NAME_MAX: usize = 60;
pub const BIO_MAX: usize = 500;
pub const SHORT_TEXT_MAX: usize = 120;
pub const NOTES_MAX: usize = 1000;

const DISCORD_WEBHOOK_HOSTS: &[&str] = &["discord.com", "discordapp.com", "ptb.discord.com"];

/// Usernames are `[A-Za-z0-9_]`, 3–30 chars. Case is preserved for display,
/// uniqueness and lookups are case-insensitive.
pub fn username(raw: &str) -> Result<String, DomainError> {
    let value = raw.trim();
    let len = value.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(DomainError::validation(
            "username",
            format!("must be {USERNAME_MIN}-{USERNAME_MAX} characters"),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DomainError::validation(
            "username",
            "may only contain letters, digits and underscores",
        ));
    }
    Ok(value.to_string())
}

pub fn email(raw: &str) -> Result<String, DomainError> {
    let value = raw.trim().to_lowercase();
    let Some((local, domain)) = value.split_once('@') else {
        return Err(DomainError::validation("email", "missing `@`"));
    };
    if local.is_empty()
        || domain.len() < 3
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || value.chars().any(char::is_whitespace)
        || domain.contains('@')
    {
        return Err(DomainError::validation("email", "not a valid address"));
    }
    Ok(value)
}

pub fn password(raw: &str) -> Result<&str, DomainError> {
    let len = raw.chars().count();
    if len < PASSWORD_MIN {
        return Err(DomainError::validation(
            "password",
            format!("must be at least {PASSWORD_MIN} characters"),
        ));
    }
    if len > PASSWORD_MAX {
        return Err(DomainError::validation(
            "password",
            format!("must be at most {PASSWORD_MAX} characters"),
        ));
    }
    Ok(raw)
}

/// Trim and bound a required free-text field.
pub fn required_text(field: &'static str, raw: &str, max: usize) -> Result<String, DomainError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(value.to_string())
}

/// Trim and bound an optional text field; blank input becomes `None`.
pub fn optional_text(
    field: &'static str,
    raw: Option<&str>,
    max: usize,
) -> Result<Option<String>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.chars().count() > max => Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        )),
        Some(value) => Ok(Some(value.to_string())),
    }
}

/// Absolute `http`/`https` URL.
pub fn http_url(field: &'static str, raw: &str) -> Result<String, DomainError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|err| DomainError::validation(field, format!("not a valid URL: {err}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed.to_string()),
        _ => Err(DomainError::validation(field, "must be an http(s) URL")),
    }
}

pub fn optional_http_url(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<String>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => http_url(field, value).map(Some),
    }
}

pub fn discord_webhook(raw: &str) -> Result<String, DomainError> {
    let url = http_url("discord_webhook_url", raw)?;
    let parsed = Url::parse(&url)
        .map_err(|err| DomainError::validation("discord_webhook_url", err.to_string()))?;
    let host_ok = parsed
        .host_str()
        .is_some_and(|host| DISCORD_WEBHOOK_HOSTS.contains(&host));
    if parsed.scheme() != "https" || !host_ok || !parsed.path().starts_with("/api/webhooks/") {
        return Err(DomainError::validation(
            "discord_webhook_url",
            "must be a Discord webhook URL",
        ));
    }
    Ok(url)
}

/// Twitch logins are 4–25 chars of `[a-z0-9_]`; stored lower-cased.
pub fn twitch_login(raw: &str) -> Result<String, DomainError> {
    let value = raw.trim().to_lowercase();
    let len = value.len();
    if !(4..=25).contains(&len)
        || !value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(DomainError::validation(
            "twitch_login",
            "not a valid Twitch login",
        ));
    }
    Ok(value)
}

/// YouTube channel ids are `UC` followed by 22 URL-safe base64 characters.
pub fn youtube_channel_id(raw: &str) -> Result<String, DomainError> {
    let value = raw.trim();
    let valid = value.len() == 24
        && value.starts_with("UC")
        && value[2..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(DomainError::validation(
            "youtube_channel_id",
            "not a valid YouTube channel id",
        ));
    }
    Ok(value.to_string())
}
