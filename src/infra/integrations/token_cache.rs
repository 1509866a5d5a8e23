use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::application::ports::AppTokenCache;

/// Tokens are treated as expired this long before the provider says so.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
pub struct InMemoryTokenCache {
    tokens: DashMap<String, (String, Instant)>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AppTokenCache for InMemoryTokenCache {
    fn get(&self, provider: &str, now: Instant) -> Option<String> {
        let entry = self.tokens.get(provider)?;
        let (token, valid_until) = entry.value();
        (now < *valid_until).then(|| token.clone())
    }

    fn put(&self, provider: &str, token: String, expires_in: Duration, now: Instant) {
        let valid_until = now + expires_in.saturating_sub(EXPIRY_MARGIN);
        self.tokens.insert(provider.to_string(), (token, valid_until));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_expire_a_minute_early() {
        let cache = InMemoryTokenCache::new();
        let now = Instant::now();
        cache.put("twitch", "abc".to_string(), Duration::from_secs(3600), now);

        assert_eq!(cache.get("twitch", now).as_deref(), Some("abc"));
        assert_eq!(
            cache
                .get("twitch", now + Duration::from_secs(3539))
                .as_deref(),
            Some("abc")
        );
        assert!(cache.get("twitch", now + Duration::from_secs(3540)).is_none());
        assert!(cache.get("youtube", now).is_none());
    }

    #[test]
    fn short_lived_tokens_are_never_served() {
        let cache = InMemoryTokenCache::new();
        let now = Instant::now();
        cache.put("twitch", "abc".to_string(), Duration::from_secs(30), now);
        assert!(cache.get("twitch", now).is_none());
    }
}
