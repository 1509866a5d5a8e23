//! Record → response DTO conversions shared by the services.

use creatorhub_api_types::{
    ChannelStatsView, FollowerView, MediaView, ScheduleItemView, SocialItemView, SponsorView,
    TrackedMediaView, UserView,
};

use crate::domain::entities::{
    FollowerRecord, MediaRecord, ScheduleEntryRecord, SocialItemRecord, SponsorRecord,
    TrackedMediaRecord, UserRecord,
};

pub fn user_view(user: &UserRecord) -> UserView {
    UserView {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        bio: user.bio.clone(),
        avatar_url: user.avatar_url.clone(),
        banner_url: user.banner_url.clone(),
        role: user.role,
        is_public: user.is_public,
        show_watchlist: user.show_watchlist,
        show_schedule: user.show_schedule,
        email_verified: user.email_verified_at.is_some(),
        twitch_login: user.twitch_login.clone(),
        youtube_channel_id: user.youtube_channel_id.clone(),
        has_discord_webhook: user.discord_webhook_url.is_some(),
        created_at: user.created_at,
    }
}

/// Last synced YouTube snapshot, when the user has one.
pub fn channel_stats_view(user: &UserRecord) -> Option<ChannelStatsView> {
    match (
        user.youtube_subscribers,
        user.youtube_views,
        user.youtube_videos,
        user.youtube_synced_at,
    ) {
        (Some(subscribers), Some(views), Some(videos), Some(synced_at)) => {
            Some(ChannelStatsView {
                subscribers,
                views,
                videos,
                synced_at,
            })
        }
        _ => None,
    }
}

pub fn media_view(media: &MediaRecord) -> MediaView {
    MediaView {
        id: media.id,
        media_type: media.media_type,
        source: media.source,
        external_id: media.external_id.clone(),
        title: media.title.clone(),
        poster_url: media.poster_url.clone(),
        total_seasons: media.total_seasons,
        release_year: media.release_year,
    }
}

pub fn tracked_view(tracked: &TrackedMediaRecord) -> TrackedMediaView {
    TrackedMediaView {
        media: media_view(&tracked.media),
        status: tracked.status.status,
        watched_seasons: tracked.status.watched_seasons.clone(),
        rating: tracked.status.rating,
        updated_at: tracked.status.updated_at,
    }
}

pub fn schedule_item_view(entry: &ScheduleEntryRecord) -> ScheduleItemView {
    ScheduleItemView {
        id: entry.item.id,
        media: media_view(&entry.media),
        scheduled_at: entry.item.scheduled_at,
        season: entry.item.season,
        episode: entry.item.episode,
        notes: entry.item.notes.clone(),
        completed_at: entry.item.completed_at,
        announced_at: entry.item.announced_at,
    }
}

pub fn sponsor_view(sponsor: &SponsorRecord) -> SponsorView {
    SponsorView {
        id: sponsor.id,
        name: sponsor.name.clone(),
        url: sponsor.url.clone(),
        logo_url: sponsor.logo_url.clone(),
        description: sponsor.description.clone(),
        position: sponsor.position,
        active: sponsor.active,
    }
}

pub fn social_view(social: &SocialItemRecord) -> SocialItemView {
    SocialItemView {
        id: social.id,
        platform: social.platform,
        url: social.url.clone(),
        label: social.label.clone(),
        position: social.position,
    }
}

pub fn follower_view(follower: &FollowerRecord) -> FollowerView {
    FollowerView {
        username: follower.username.clone(),
        display_name: follower.display_name.clone(),
        avatar_url: follower.avatar_url.clone(),
        followed_at: follower.followed_at,
    }
}
