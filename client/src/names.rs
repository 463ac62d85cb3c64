use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::BattleApi;

/// Localized move names, fetched once per key.
///
/// Failed lookups fall back to the raw key and are not cached, so a later
/// lookup gets another chance once the server recovers. A lookup that
/// outlasts the timeout counts as failed.
#[derive(Debug)]
pub struct MoveNameCache {
    locale: String,
    timeout: Duration,
    names: RwLock<HashMap<String, String>>,
}

impl MoveNameCache {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            names: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Cached name for a key, if one was resolved earlier
    pub async fn cached(&self, key: &str) -> Option<String> {
        self.names.read().await.get(key).cloned()
    }

    pub async fn resolve<A: BattleApi>(&self, api: &A, key: &str) -> String {
        if let Some(name) = self.cached(key).await {
            return name;
        }

        let lookup = api.move_name(key, &self.locale);
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(name)) if !name.trim().is_empty() => {
                self.names
                    .write()
                    .await
                    .insert(key.to_string(), name.clone());
                name
            }
            Ok(Ok(_)) => key.to_string(),
            Ok(Err(e)) => {
                tracing::warn!(key, error = %e, "Failed to localize move name");
                key.to_string()
            }
            Err(_) => {
                tracing::warn!(key, after = ?self.timeout, "Move name lookup timed out");
                key.to_string()
            }
        }
    }
}
