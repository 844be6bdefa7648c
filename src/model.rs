use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Absolute URL of a listing detail page. Used verbatim as the dedupe key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingLink(String);

impl ListingLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ListingLink {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Raw detail-page fields as extracted. Absent elements leave empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemCandidate {
    pub title: String,
    pub price_text: String,
    pub numeric_price: Option<f64>,
    pub size: String,
    pub link: String,
}

impl ItemCandidate {
    /// Promote to a record when every required field is present.
    pub fn validate(self) -> Option<ItemRecord> {
        if self.title.is_empty()
            || self.price_text.is_empty()
            || self.size.is_empty()
            || self.link.is_empty()
        {
            return None;
        }
        let numeric_price = self.numeric_price?;

        Some(ItemRecord {
            title: self.title,
            price_text: self.price_text,
            numeric_price,
            size: self.size,
            link: ListingLink::new(self.link),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub title: String,
    pub price_text: String,
    pub numeric_price: f64,
    pub size: String,
    pub link: ListingLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenEntry {
    pub link: ListingLink,
    pub seen_at: DateTime<Utc>,
}
