//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::{IpAddr, SocketAddr},
    num::{NonZeroU32, NonZeroU64, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use apalis_cron::Schedule;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;
#[cfg(test)]
mod tests;

pub use cli::{CliArgs, Command, DatabaseOverride, OneShotArgs, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "creatorhub";
const ENV_PREFIX: &str = "CREATORHUB";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u64 = 30;
const DEFAULT_CACHE_CAPACITY: usize = 10_000;
const DEFAULT_CACHE_CONSUME_BATCH_LIMIT: usize = 100;
const DEFAULT_SESSION_TTL_DAYS: u64 = 30;
const DEFAULT_PASSWORD_RESET_TTL_MINUTES: u64 = 60;
const DEFAULT_EMAIL_VERIFICATION_TTL_HOURS: u64 = 48;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3/";
const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500/";
const DEFAULT_JIKAN_BASE_URL: &str = "https://api.jikan.moe/v4/";
const DEFAULT_IGDB_BASE_URL: &str = "https://api.igdb.com/v4/";
const DEFAULT_TWITCH_AUTH_URL: &str = "https://id.twitch.tv/oauth2/token";
const DEFAULT_TWITCH_API_URL: &str = "https://api.twitch.tv/helix/";
const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";
const DEFAULT_YOUTUBE_SYNC_SCHEDULE: &str = "0 0 */6 * * *";
const DEFAULT_TOKEN_PURGE_SCHEDULE: &str = "0 15 * * * *";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
    pub uploads: UploadSettings,
    pub auth: AuthSettings,
    pub integrations: IntegrationSettings,
    pub cron: CronSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    /// Externally reachable base URL, used for links in outgoing email.
    pub public_url: Url,
    /// Peers whose `x-forwarded-for` header is believed.
    pub trusted_proxies: Vec<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub capacity: NonZeroUsize,
    pub consume_batch_limit: NonZeroUsize,
    pub profile_ttl: Duration,
    pub overlay_ttl: Duration,
    pub schedule_ttl: Duration,
    pub watchlist_ttl: Duration,
    pub follows_ttl: Duration,
    pub sponsors_ttl: Duration,
    pub socials_ttl: Duration,
    pub twitch_live_ttl: Duration,
    pub search_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub window_seconds: NonZeroU32,
    pub max_requests: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub directory: PathBuf,
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub session_ttl: Duration,
    pub password_reset_ttl: Duration,
    pub email_verification_ttl: Duration,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct IntegrationSettings {
    pub http_timeout: Duration,
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: Url,
    pub tmdb_image_base_url: Url,
    pub jikan_base_url: Url,
    pub igdb_base_url: Url,
    pub twitch: Option<TwitchCredentials>,
    pub twitch_auth_url: Url,
    pub twitch_api_url: Url,
    pub youtube_api_key: Option<String>,
    pub youtube_base_url: Url,
    pub discord_default_webhook: Option<String>,
    pub email: Option<EmailSettings>,
}

#[derive(Debug, Clone)]
pub struct TwitchCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_url: Url,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct CronSettings {
    pub enabled: bool,
    /// Shared secret for `POST /api/cron/*`; the endpoints answer 503 without it.
    pub secret: Option<String>,
    pub youtube_sync: Schedule,
    pub token_purge: Schedule,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::SyncYoutube(args)) | Some(Command::PurgeTokens(args)) => {
            raw.apply_database_override(&args.database)
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    rate_limit: RawRateLimitSettings,
    uploads: RawUploadSettings,
    auth: RawAuthSettings,
    integrations: RawIntegrationSettings,
    cron: RawCronSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(url) = overrides.server_public_url.as_ref() {
            self.server.public_url = Some(url.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(directory) = overrides.uploads_directory.as_ref() {
            self.uploads.directory = Some(directory.clone());
        }
        if let Some(limit) = overrides.uploads_max_request_bytes {
            self.uploads.max_request_bytes = Some(limit);
        }
        if let Some(window) = overrides.rate_limit_window_seconds {
            self.rate_limit.window_seconds = Some(window);
        }
        if let Some(max) = overrides.rate_limit_max_requests {
            self.rate_limit.max_requests = Some(max);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(capacity) = overrides.cache_capacity {
            self.cache.capacity = Some(capacity);
        }
        if let Some(secure) = overrides.auth_cookie_secure {
            self.auth.cookie_secure = Some(secure);
        }
        if let Some(enabled) = overrides.cron_enabled {
            self.cron.enabled = Some(enabled);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            rate_limit,
            uploads,
            auth,
            integrations,
            cron,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            rate_limit: build_rate_limit_settings(rate_limit)?,
            uploads: build_upload_settings(uploads)?,
            auth: build_auth_settings(auth)?,
            integrations: build_integration_settings(integrations)?,
            cron: build_cron_settings(cron)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }
    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let public_url = parse_url(
        server.public_url.as_deref().unwrap_or(DEFAULT_PUBLIC_URL),
        "server.public_url",
    )?;

    let trusted_proxies = parse_ip_list(server.trusted_proxies.as_deref().unwrap_or_default())
        .map_err(|reason| LoadError::invalid("server.trusted_proxies", reason))?;

    Ok(ServerSettings {
        addr,
        public_url,
        trusted_proxies,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url: non_blank(database.url),
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = NonZeroUsize::new(cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY))
        .ok_or_else(|| LoadError::invalid("cache.capacity", "must be greater than zero"))?;
    let consume_batch_limit = NonZeroUsize::new(
        cache
            .consume_batch_limit
            .unwrap_or(DEFAULT_CACHE_CONSUME_BATCH_LIMIT),
    )
    .ok_or_else(|| LoadError::invalid("cache.consume_batch_limit", "must be greater than zero"))?;

    let defaults = crate::cache::CacheConfig::default();
    let ttl = |value: Option<u64>, default: u64| Duration::from_secs(value.unwrap_or(default));

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        capacity,
        consume_batch_limit,
        profile_ttl: ttl(cache.profile_ttl_seconds, defaults.profile_ttl_secs),
        overlay_ttl: ttl(cache.overlay_ttl_seconds, defaults.overlay_ttl_secs),
        schedule_ttl: ttl(cache.schedule_ttl_seconds, defaults.schedule_ttl_secs),
        watchlist_ttl: ttl(cache.watchlist_ttl_seconds, defaults.watchlist_ttl_secs),
        follows_ttl: ttl(cache.follows_ttl_seconds, defaults.follows_ttl_secs),
        sponsors_ttl: ttl(cache.sponsors_ttl_seconds, defaults.sponsors_ttl_secs),
        socials_ttl: ttl(cache.socials_ttl_seconds, defaults.socials_ttl_secs),
        twitch_live_ttl: ttl(cache.twitch_live_ttl_seconds, defaults.twitch_live_ttl_secs),
        search_ttl: ttl(cache.search_ttl_seconds, defaults.search_ttl_secs),
    })
}

fn build_rate_limit_settings(
    rate_limit: RawRateLimitSettings,
) -> Result<RateLimitSettings, LoadError> {
    let window_seconds = non_zero_u32(
        rate_limit
            .window_seconds
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        "rate_limit.window_seconds",
    )?;
    let max_requests = non_zero_u32(
        rate_limit
            .max_requests
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS),
        "rate_limit.max_requests",
    )?;

    Ok(RateLimitSettings {
        window_seconds,
        max_requests,
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let directory = uploads
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));

    let max_request_bytes_value = uploads
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("uploads.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(UploadSettings {
        directory,
        max_request_bytes,
    })
}

fn build_auth_settings(auth: RawAuthSettings) -> Result<AuthSettings, LoadError> {
    let session_days = positive(
        auth.session_ttl_days.unwrap_or(DEFAULT_SESSION_TTL_DAYS),
        "auth.session_ttl_days",
    )?;
    let reset_minutes = positive(
        auth.password_reset_ttl_minutes
            .unwrap_or(DEFAULT_PASSWORD_RESET_TTL_MINUTES),
        "auth.password_reset_ttl_minutes",
    )?;
    let verification_hours = positive(
        auth.email_verification_ttl_hours
            .unwrap_or(DEFAULT_EMAIL_VERIFICATION_TTL_HOURS),
        "auth.email_verification_ttl_hours",
    )?;

    Ok(AuthSettings {
        session_ttl: Duration::from_secs(session_days * 86_400),
        password_reset_ttl: Duration::from_secs(reset_minutes * 60),
        email_verification_ttl: Duration::from_secs(verification_hours * 3_600),
        cookie_secure: auth.cookie_secure.unwrap_or(false),
    })
}

fn build_integration_settings(
    raw: RawIntegrationSettings,
) -> Result<IntegrationSettings, LoadError> {
    let timeout_secs = positive(
        raw.http_timeout_seconds.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        "integrations.http_timeout_seconds",
    )?;

    let twitch = match (non_blank(raw.twitch_client_id), non_blank(raw.twitch_client_secret)) {
        (Some(client_id), Some(client_secret)) => Some(TwitchCredentials {
            client_id,
            client_secret,
        }),
        (None, None) => None,
        _ => {
            return Err(LoadError::invalid(
                "integrations.twitch_client_id",
                "client id and secret must be configured together",
            ));
        }
    };

    let email = match (non_blank(raw.email_api_url), non_blank(raw.email_api_key)) {
        (Some(url), Some(api_key)) => Some(EmailSettings {
            api_url: parse_url(&url, "integrations.email_api_url")?,
            api_key,
            from: non_blank(raw.email_from).ok_or_else(|| {
                LoadError::invalid("integrations.email_from", "required when email is configured")
            })?,
        }),
        (None, None) => None,
        _ => {
            return Err(LoadError::invalid(
                "integrations.email_api_url",
                "url and api key must be configured together",
            ));
        }
    };

    let discord_default_webhook = match non_blank(raw.discord_default_webhook_url) {
        Some(url) => Some(
            crate::domain::validation::discord_webhook(&url).map_err(|err| {
                LoadError::invalid("integrations.discord_default_webhook_url", err.to_string())
            })?,
        ),
        None => None,
    };

    Ok(IntegrationSettings {
        http_timeout: Duration::from_secs(timeout_secs),
        tmdb_api_key: non_blank(raw.tmdb_api_key),
        tmdb_base_url: base_url(raw.tmdb_base_url, DEFAULT_TMDB_BASE_URL, "integrations.tmdb_base_url")?,
        tmdb_image_base_url: base_url(
            raw.tmdb_image_base_url,
            DEFAULT_TMDB_IMAGE_BASE_URL,
            "integrations.tmdb_image_base_url",
        )?,
        jikan_base_url: base_url(
            raw.jikan_base_url,
            DEFAULT_JIKAN_BASE_URL,
            "integrations.jikan_base_url",
        )?,
        igdb_base_url: base_url(raw.igdb_base_url, DEFAULT_IGDB_BASE_URL, "integrations.igdb_base_url")?,
        twitch,
        twitch_auth_url: parse_url(
            raw.twitch_auth_url.as_deref().unwrap_or(DEFAULT_TWITCH_AUTH_URL),
            "integrations.twitch_auth_url",
        )?,
        twitch_api_url: base_url(
            raw.twitch_api_url,
            DEFAULT_TWITCH_API_URL,
            "integrations.twitch_api_url",
        )?,
        youtube_api_key: non_blank(raw.youtube_api_key),
        youtube_base_url: base_url(
            raw.youtube_base_url,
            DEFAULT_YOUTUBE_BASE_URL,
            "integrations.youtube_base_url",
        )?,
        discord_default_webhook,
        email,
    })
}

fn build_cron_settings(cron: RawCronSettings) -> Result<CronSettings, LoadError> {
    let youtube_sync = parse_schedule(
        cron.youtube_sync_schedule
            .as_deref()
            .unwrap_or(DEFAULT_YOUTUBE_SYNC_SCHEDULE),
        "cron.youtube_sync_schedule",
    )?;
    let token_purge = parse_schedule(
        cron.token_purge_schedule
            .as_deref()
            .unwrap_or(DEFAULT_TOKEN_PURGE_SCHEDULE),
        "cron.token_purge_schedule",
    )?;

    Ok(CronSettings {
        enabled: cron.enabled.unwrap_or(true),
        secret: non_blank(cron.secret),
        youtube_sync,
        token_purge,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    public_url: Option<String>,
    /// Comma-separated proxy addresses.
    trusted_proxies: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    capacity: Option<usize>,
    consume_batch_limit: Option<usize>,
    profile_ttl_seconds: Option<u64>,
    overlay_ttl_seconds: Option<u64>,
    schedule_ttl_seconds: Option<u64>,
    watchlist_ttl_seconds: Option<u64>,
    follows_ttl_seconds: Option<u64>,
    sponsors_ttl_seconds: Option<u64>,
    socials_ttl_seconds: Option<u64>,
    twitch_live_ttl_seconds: Option<u64>,
    search_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRateLimitSettings {
    window_seconds: Option<u64>,
    max_requests: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    directory: Option<PathBuf>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    session_ttl_days: Option<u64>,
    password_reset_ttl_minutes: Option<u64>,
    email_verification_ttl_hours: Option<u64>,
    cookie_secure: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawIntegrationSettings {
    http_timeout_seconds: Option<u64>,
    tmdb_api_key: Option<String>,
    tmdb_base_url: Option<String>,
    tmdb_image_base_url: Option<String>,
    jikan_base_url: Option<String>,
    igdb_base_url: Option<String>,
    twitch_client_id: Option<String>,
    twitch_client_secret: Option<String>,
    twitch_auth_url: Option<String>,
    twitch_api_url: Option<String>,
    youtube_api_key: Option<String>,
    youtube_base_url: Option<String>,
    discord_default_webhook_url: Option<String>,
    email_api_url: Option<String>,
    email_api_key: Option<String>,
    email_from: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCronSettings {
    enabled: Option<bool>,
    secret: Option<String>,
    youtube_sync_schedule: Option<String>,
    token_purge_schedule: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_ip_list(value: &str) -> Result<Vec<IpAddr>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse()
                .map_err(|err| format!("invalid address `{item}`: {err}"))
        })
        .collect()
}

fn parse_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    Url::parse(value.trim()).map_err(|err| LoadError::invalid(key, format!("invalid url: {err}")))
}

/// Base URLs are joined with relative paths, so they must end in `/`.
fn base_url(value: Option<String>, default: &str, key: &'static str) -> Result<Url, LoadError> {
    let mut raw = value.unwrap_or_else(|| default.to_string());
    if !raw.ends_with('/') {
        raw.push('/');
    }
    parse_url(&raw, key)
}

fn parse_schedule(value: &str, key: &'static str) -> Result<Schedule, LoadError> {
    Schedule::from_str(value)
        .map_err(|err| LoadError::invalid(key, format!("invalid cron expression: {err}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn positive(value: u64, key: &'static str) -> Result<u64, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
