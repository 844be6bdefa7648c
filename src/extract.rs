//! Extraction rules: pure functions over rendered page snapshots.
//!
//! Selector strings live here and nowhere else. Each field carries an ordered
//! list of fallbacks; the first selector that yields non-empty text wins.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::model::{ItemCandidate, ListingLink};

pub const DEFAULT_UNDESIRABLE_KEYWORDS: &[&str] = &[
    "flaw", "flaws", "flawed", "polartec", "vest", "stain", "damaged",
];

static DOLLAR_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?\d[\d,]*(?:\.\d+)?").expect("dollar amount pattern is valid")
});

/// CSS selectors for the listing grid and the detail page.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub listing_link: Vec<String>,
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub size: Vec<String>,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            listing_link: vec!["a.tile__covershot".to_string()],
            title: vec![
                "h1.listing__title-container".to_string(),
                "h1[class*='listing__title']".to_string(),
            ],
            price: vec!["p.h1".to_string(), "[class*='listing__ipad-price']".to_string()],
            size: vec![
                "button.size-selector__size-option".to_string(),
                "[class*='size-selector__size-option']".to_string(),
            ],
        }
    }
}

/// Selector set plus the undesirable-title keyword list.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    selectors: Selectors,
    undesirable: Vec<String>,
    base_url: Url,
}

impl ExtractionRules {
    pub fn new(selectors: Selectors, undesirable: Vec<String>, base_url: Url) -> Self {
        let undesirable = undesirable
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            selectors,
            undesirable,
            base_url,
        }
    }

    /// Rules with the default selectors and keyword set.
    pub fn with_defaults(base_url: Url) -> Self {
        Self::new(
            Selectors::default(),
            DEFAULT_UNDESIRABLE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            base_url,
        )
    }

    /// Listing links in document order. Duplicates are kept.
    pub fn extract_listing_links(&self, html: &str) -> Vec<ListingLink> {
        let document = Html::parse_document(html);
        let mut links = Vec::new();

        for sel_str in &self.selectors.listing_link {
            let Ok(selector) = Selector::parse(sel_str) else {
                continue;
            };
            for element in document.select(&selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                if let Some(url) = resolve_href(&self.base_url, href) {
                    links.push(ListingLink::new(url));
                }
            }
            if !links.is_empty() {
                break;
            }
        }

        links
    }

    /// One candidate from a detail page; missing elements yield empty fields.
    pub fn extract_item_detail(&self, html: &str, link: &ListingLink) -> ItemCandidate {
        let document = Html::parse_document(html);

        let title = get_text_from_selectors(&document, &self.selectors.title);
        let raw_price = get_text_from_selectors(&document, &self.selectors.price);
        let size = get_text_from_selectors(&document, &self.selectors.size);

        let price_text = first_dollar_amount(&raw_price).unwrap_or_default();
        let numeric_price = parse_price(&price_text);

        ItemCandidate {
            title,
            price_text,
            numeric_price,
            size,
            link: link.to_string(),
        }
    }

    pub fn is_undesirable(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.undesirable.iter().any(|k| title.contains(k.as_str()))
    }
}

/// First `$N` substring of the surrounding text, e.g. "$35" out of "$35 $120 Size: M".
pub fn first_dollar_amount(text: &str) -> Option<String> {
    DOLLAR_AMOUNT
        .find(text)
        .map(|m| m.as_str().split_whitespace().collect::<String>())
}

/// Numeric value of a currency string; `None` on format drift.
pub fn parse_price(price_text: &str) -> Option<f64> {
    let digits: String = price_text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    digits.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

fn get_text_from_selectors(html: &Html, selectors: &[String]) -> String {
    for sel_str in selectors {
        if let Ok(selector) = Selector::parse(sel_str) {
            if let Some(element) = html.select(&selector).next() {
                let text: String = element.text().collect::<Vec<_>>().join(" ");
                let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !cleaned.is_empty() {
                    return cleaned;
                }
            }
        }
    }
    String::new()
}
