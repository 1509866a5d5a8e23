//! Wiring of repositories and integrations into the application services.

use std::sync::Arc;

use crate::application::analytics::AnalyticsService;
use crate::application::auth::{AuthConfig, AuthService};
use crate::application::channel_stats::ChannelStatsService;
use crate::application::follows::FollowService;
use crate::application::listings::{SocialService, SponsorService};
use crate::application::media::MediaService;
use crate::application::overlay::OverlayService;
use crate::application::ports::{
    Announcer, ChannelStatsSource, LiveStatusSource, Mailer, MediaCatalog,
};
use crate::application::profile::ProfileService;
use crate::application::repos::{
    AnalyticsRepo, AuthTokensRepo, FollowsRepo, MediaRepo, ScheduleRepo, SessionsRepo,
    SocialsRepo, SponsorsRepo, UsersRepo,
};
use crate::application::schedule::ScheduleService;
use crate::application::search::SearchService;
use crate::application::users::UserDirectory;
use crate::cache::CacheState;

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UsersRepo>,
    pub sessions: Arc<dyn SessionsRepo>,
    pub tokens: Arc<dyn AuthTokensRepo>,
    pub media: Arc<dyn MediaRepo>,
    pub schedule: Arc<dyn ScheduleRepo>,
    pub follows: Arc<dyn FollowsRepo>,
    pub sponsors: Arc<dyn SponsorsRepo>,
    pub socials: Arc<dyn SocialsRepo>,
    pub analytics: Arc<dyn AnalyticsRepo>,
}

impl Repositories {
    /// Use one store for every repository trait.
    pub fn shared<R>(store: Arc<R>) -> Self
    where
        R: UsersRepo
            + SessionsRepo
            + AuthTokensRepo
            + MediaRepo
            + ScheduleRepo
            + FollowsRepo
            + SponsorsRepo
            + SocialsRepo
            + AnalyticsRepo
            + 'static,
    {
        Self {
            users: store.clone(),
            sessions: store.clone(),
            tokens: store.clone(),
            media: store.clone(),
            schedule: store.clone(),
            follows: store.clone(),
            sponsors: store.clone(),
            socials: store.clone(),
            analytics: store,
        }
    }
}

#[derive(Clone)]
pub struct Integrations {
    pub catalog: Arc<dyn MediaCatalog>,
    pub live: Arc<dyn LiveStatusSource>,
    pub channel_stats: Arc<dyn ChannelStatsSource>,
    pub announcer: Arc<dyn Announcer>,
    pub mailer: Arc<dyn Mailer>,
}

#[derive(Clone)]
pub struct Services {
    pub cache: CacheState,
    pub directory: UserDirectory,
    pub auth: AuthService,
    pub profile: ProfileService,
    pub media: MediaService,
    pub schedule: ScheduleService,
    pub follows: FollowService,
    pub sponsors: SponsorService,
    pub socials: SocialService,
    pub analytics: AnalyticsService,
    pub search: SearchService,
    pub channel_stats: ChannelStatsService,
    pub overlay: OverlayService,
}

impl Services {
    pub fn new(
        repos: Repositories,
        integrations: Integrations,
        auth: AuthConfig,
        default_webhook: Option<String>,
        cache: CacheState,
    ) -> Self {
        let directory = UserDirectory::new(repos.users.clone(), cache.clone());
        let media = MediaService::new(repos.media.clone(), directory.clone(), cache.clone());
        let analytics = AnalyticsService::new(repos.analytics.clone(), directory.clone());
        let search = SearchService::new(
            integrations.catalog.clone(),
            integrations.live.clone(),
            cache.clone(),
        );

        Self {
            auth: AuthService::new(
                repos.users.clone(),
                repos.sessions.clone(),
                repos.tokens.clone(),
                integrations.mailer.clone(),
                auth,
            ),
            profile: ProfileService::new(
                directory.clone(),
                repos.follows.clone(),
                repos.socials.clone(),
                cache.clone(),
            ),
            schedule: ScheduleService::new(
                repos.schedule.clone(),
                media.clone(),
                directory.clone(),
                integrations.announcer.clone(),
                default_webhook,
                cache.clone(),
            ),
            follows: FollowService::new(repos.follows.clone(), directory.clone(), cache.clone()),
            sponsors: SponsorService::new(
                repos.sponsors.clone(),
                directory.clone(),
                cache.clone(),
            ),
            socials: SocialService::new(repos.socials.clone(), directory.clone(), cache.clone()),
            channel_stats: ChannelStatsService::new(
                repos.users.clone(),
                integrations.channel_stats.clone(),
                cache.clone(),
            ),
            overlay: OverlayService::new(
                directory.clone(),
                repos.schedule.clone(),
                repos.media.clone(),
                repos.sponsors.clone(),
                search.clone(),
                analytics.clone(),
                cache.clone(),
            ),
            media,
            analytics,
            search,
            directory,
            cache,
        }
    }
}
