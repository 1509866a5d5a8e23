use std::{net::SocketAddr, process, sync::Arc, time::Duration};

use apalis::prelude::{Data, Monitor, WorkerBuilder, WorkerFactoryFn};
use apalis_cron::CronStream;
use creatorhub::{
    application::{
        auth::AuthConfig,
        error::AppError,
        jobs::{
            PurgeTokensContext, YoutubeSyncContext, process_purge_tokens_job,
            process_youtube_sync_job,
        },
        services::{Repositories, Services},
    },
    cache::{CacheConfig, CacheState},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpConfig, HttpState, InMemoryRateLimiter},
        integrations::{self, InMemoryTokenCache},
        telemetry,
        uploads::UploadStorage,
    },
};
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::SyncYoutube(_) => run_sync_youtube(settings).await,
        config::Command::PurgeTokens(_) => run_purge_tokens(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let services = build_services(repositories.clone(), &settings)?;

    let monitor_handle = settings
        .cron
        .enabled
        .then(|| spawn_cron_monitor(services.clone(), &settings.cron));

    let result = serve_http(&settings, repositories, services).await;

    if let Some(handle) = monitor_handle {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn run_sync_youtube(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let services = build_services(repositories, &settings)?;

    let report = services
        .channel_stats
        .sync_youtube()
        .await
        .map_err(|err| AppError::unexpected(err.to_string()))?;
    info!(
        target = "creatorhub::sync_youtube",
        checked = report.checked,
        updated = report.updated,
        failed = report.failed,
        "YouTube sync completed"
    );
    Ok(())
}

async fn run_purge_tokens(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let services = build_services(repositories, &settings)?;

    let report = services
        .auth
        .purge_expired(OffsetDateTime::now_utc())
        .await?;
    info!(
        target = "creatorhub::purge_tokens",
        sessions = report.sessions,
        tokens = report.tokens,
        "Expired credentials purged"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_services(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<Services, AppError> {
    let integrations = integrations::build(
        &settings.integrations,
        Arc::new(InMemoryTokenCache::default()),
    )?;
    let cache = CacheState::new(CacheConfig::from(&settings.cache));

    Ok(Services::new(
        Repositories::shared(repositories),
        integrations,
        AuthConfig::from_settings(&settings.auth, settings.server.public_url.clone()),
        settings.integrations.discord_default_webhook.clone(),
        cache,
    ))
}

fn spawn_cron_monitor(
    services: Services,
    cron: &config::CronSettings,
) -> tokio::task::JoinHandle<()> {
    let youtube_worker = WorkerBuilder::new("youtube-sync-worker")
        .data(YoutubeSyncContext {
            channel_stats: services.channel_stats.clone(),
        })
        .backend(CronStream::new(cron.youtube_sync.clone()))
        .build_fn(process_youtube_sync_job);
    let purge_worker = WorkerBuilder::new("purge-tokens-worker")
        .data(PurgeTokensContext {
            auth: services.auth.clone(),
        })
        .backend(CronStream::new(cron.token_purge.clone()))
        .build_fn(process_purge_tokens_job);

    let monitor = Monitor::new().register(youtube_worker).register(purge_worker);

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    })
}

async fn serve_http(
    settings: &config::Settings,
    repositories: Arc<PostgresRepositories>,
    services: Services,
) -> Result<(), AppError> {
    let uploads = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );
    let limiter = InMemoryRateLimiter::new(
        Duration::from_secs(u64::from(settings.rate_limit.window_seconds.get())),
        settings.rate_limit.max_requests.get(),
    );

    let state = HttpState {
        services,
        limiter: Arc::new(limiter),
        uploads,
        health: repositories,
        config: Arc::new(HttpConfig::from_settings(settings)),
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "creatorhub::http",
        addr = %settings.server.addr,
        "Listening"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}
