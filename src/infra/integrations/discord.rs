//! Discord webhook announcements.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;

use crate::application::ports::{Announcement, AnnouncementItem, Announcer, IntegrationError};

use super::client::send_unit;

const SERVICE: &str = "discord";
/// Discord rejects messages carrying more than ten embeds.
const EMBEDS_PER_MESSAGE: usize = 10;
const EMBED_COLOR: u32 = 0x9146FF;

#[derive(Clone)]
pub struct DiscordAnnouncer {
    http: Client,
}

impl DiscordAnnouncer {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Announcer for DiscordAnnouncer {
    async fn announce(
        &self,
        webhook_url: &str,
        announcement: &Announcement,
    ) -> Result<(), IntegrationError> {
        for payload in payloads(announcement) {
            send_unit(SERVICE, self.http.post(webhook_url).json(&payload)).await?;
        }
        Ok(())
    }
}

fn payloads(announcement: &Announcement) -> Vec<Value> {
    let embeds: Vec<Value> = announcement
        .items
        .iter()
        .map(|item| embed(announcement, item))
        .collect();

    embeds
        .chunks(EMBEDS_PER_MESSAGE)
        .enumerate()
        .map(|(index, chunk)| {
            let mut payload = json!({ "embeds": chunk });
            if index == 0 {
                payload["content"] = Value::String(headline(announcement));
            }
            payload
        })
        .collect()
}

fn headline(announcement: &Announcement) -> String {
    match announcement.items.len() {
        1 => format!("**{}** scheduled a stream", announcement.creator),
        count => format!("**{}** scheduled {count} streams", announcement.creator),
    }
}

fn embed(announcement: &Announcement, item: &AnnouncementItem) -> Value {
    let mut description = item.media_type.as_str().to_string();
    if let Some(label) = episode_label(item.season, item.episode) {
        description.push_str(" · ");
        description.push_str(&label);
    }
    if let Some(notes) = item.notes.as_deref() {
        description.push_str("\n\n");
        description.push_str(notes);
    }

    let mut embed = json!({
        "title": item.title,
        "description": description,
        "color": EMBED_COLOR,
        "timestamp": item.scheduled_at.format(&Rfc3339).unwrap_or_default(),
    });
    if let Some(login) = announcement.twitch_login.as_deref() {
        embed["url"] = Value::String(format!("https://twitch.tv/{login}"));
    }
    if let Some(poster) = item.poster_url.as_deref() {
        embed["thumbnail"] = json!({ "url": poster });
    }
    embed
}

fn episode_label(season: Option<i32>, episode: Option<i32>) -> Option<String> {
    match (season, episode) {
        (Some(season), Some(episode)) => Some(format!("S{season:02}E{episode:02}")),
        (Some(season), None) => Some(format!("Season {season}")),
        (None, Some(episode)) => Some(format!("Episode {episode}")),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::types::MediaType;

    fn item(title: &str) -> AnnouncementItem {
        AnnouncementItem {
            title: title.to_string(),
            media_type: MediaType::Series,
            poster_url: Some("https://img/poster.jpg".to_string()),
            scheduled_at: datetime!(2026-03-02 20:00 UTC),
            season: Some(2),
            episode: Some(5),
            notes: None,
        }
    }

    fn announcement(count: usize) -> Announcement {
        Announcement {
            creator: "Ana".to_string(),
            twitch_login: Some("ana".to_string()),
            items: (0..count).map(|i| item(&format!("Show {i}"))).collect(),
        }
    }

    #[test]
    fn single_item_payload_links_the_channel() {
        let payloads = payloads(&announcement(1));
        assert_eq!(payloads.len(), 1);

        let payload = &payloads[0];
        assert_eq!(payload["content"], "**Ana** scheduled a stream");
        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "Show 0");
        assert_eq!(embed["url"], "https://twitch.tv/ana");
        assert_eq!(embed["thumbnail"]["url"], "https://img/poster.jpg");
        assert_eq!(embed["timestamp"], "2026-03-02T20:00:00Z");
        assert!(embed["description"].as_str().unwrap().contains("S02E05"));
    }

    #[test]
    fn large_weeks_are_split_across_messages() {
        let payloads = payloads(&announcement(12));
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0]["embeds"].as_array().unwrap().len(), 10);
        assert_eq!(payloads[1]["embeds"].as_array().unwrap().len(), 2);
        assert!(payloads[1].get("content").is_none());
    }

    #[test]
    fn episode_labels_cover_partial_progress() {
        assert_eq!(episode_label(Some(1), None).as_deref(), Some("Season 1"));
        assert_eq!(episode_label(None, Some(3)).as_deref(), Some("Episode 3"));
        assert_eq!(episode_label(None, None), None);
    }
}
