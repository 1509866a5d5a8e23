//! JSON API over axum.

pub mod error;
pub mod handlers;
mod middleware;
pub mod rate_limit;
pub mod session;
pub mod state;

pub use error::{ApiError, codes};
pub use rate_limit::InMemoryRateLimiter;
pub use state::{HealthProbe, HttpConfig, HttpState};

use axum::extract::DefaultBodyLimit;
use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};

use handlers::{
    analytics, auth, listings, media, overlay, profile, schedule, search, system, users,
};
use middleware::{log_responses, set_request_context};

pub fn build_router(state: HttpState) -> Router {
    let upload_limit = state.config.upload_limit_bytes;

    let uploads = Router::new()
        .route("/api/profile/avatar", post(profile::upload_avatar))
        .route("/api/profile/banner", post(profile::upload_banner))
        .layer(DefaultBodyLimit::max(upload_limit));

    let limited = Router::new()
        .route("/api/search/{kind}", get(search::search))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_requests,
        ));

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/password-reset", post(auth::request_password_reset))
        .route(
            "/api/auth/password-reset/confirm",
            post(auth::confirm_password_reset),
        )
        .route("/api/auth/verify-email", get(auth::verify_email))
        .route(
            "/api/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route("/api/users/{username}", get(users::public_profile))
        .route("/api/users/{username}/watchlist", get(users::watchlist))
        .route("/api/users/{username}/schedule", get(users::schedule))
        .route("/api/users/{username}/sponsors", get(users::sponsors))
        .route("/api/users/{username}/socials", get(users::socials))
        .route("/api/users/{username}/followers", get(users::followers))
        .route(
            "/api/users/{username}/followers/count",
            get(users::follow_counts),
        )
        .route(
            "/api/users/{username}/follow",
            get(users::follow_status)
                .put(users::follow)
                .delete(users::unfollow),
        )
        .route(
            "/api/users/{username}/follow/toggle",
            post(users::toggle_follow),
        )
        .route(
            "/api/media",
            get(media::list_media).post(media::track_media),
        )
        .route(
            "/api/media/{media_id}",
            patch(media::update_media).delete(media::untrack_media),
        )
        .route(
            "/api/media/{media_id}/seasons/{season}",
            put(media::set_season),
        )
        .route(
            "/api/schedule",
            get(schedule::own_week).post(schedule::create_item),
        )
        .route("/api/schedule/announce-week", post(schedule::announce_week))
        .route("/api/schedule/{id}", delete(schedule::delete_item))
        .route("/api/schedule/{id}/complete", post(schedule::complete_item))
        .route("/api/schedule/{id}/announce", post(schedule::announce_item))
        .route(
            "/api/sponsors",
            get(listings::list_sponsors).post(listings::create_sponsor),
        )
        .route(
            "/api/sponsors/{id}",
            patch(listings::update_sponsor).delete(listings::delete_sponsor),
        )
        .route(
            "/api/socials",
            get(listings::list_socials).post(listings::create_social),
        )
        .route(
            "/api/socials/{id}",
            patch(listings::update_social).delete(listings::delete_social),
        )
        .route("/api/analytics", post(analytics::record_event))
        .route("/api/analytics/summary", get(analytics::summary))
        .route("/api/twitch/live/{login}", get(search::twitch_live))
        .route("/api/cron/youtube-stats", post(system::youtube_stats))
        .route("/api/overlay/{username}", get(overlay::overlay))
        .route("/uploads/{*path}", get(system::serve_upload))
        .route("/health", get(system::health))
        .merge(uploads)
        .merge(limited)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
