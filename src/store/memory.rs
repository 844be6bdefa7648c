use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::SeenStore;
use crate::error::StoreError;
use crate::model::{ListingLink, SeenEntry};

/// Process-local store for dry runs. Forgets everything on exit.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<ListingLink, SeenEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seen<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        let entries = links
            .into_iter()
            .map(|l| {
                let link = ListingLink::new(l);
                let entry = SeenEntry {
                    link: link.clone(),
                    seen_at: now,
                };
                (link, entry)
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn entry(&self, link: &ListingLink) -> Option<SeenEntry> {
        self.lock().get(link).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ListingLink, SeenEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SeenStore for MemoryStore {
    async fn ensure_ready(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn has(&self, link: &ListingLink) -> Result<bool, StoreError> {
        Ok(self.lock().contains_key(link))
    }

    async fn add(&self, link: &ListingLink) -> Result<(), StoreError> {
        self.lock().entry(link.clone()).or_insert_with(|| SeenEntry {
            link: link.clone(),
            seen_at: Utc::now(),
        });
        Ok(())
    }
}
