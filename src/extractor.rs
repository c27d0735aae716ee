//! Ruleset-driven article extraction from raw markup.
//!
//! One algorithm serves every source: locate candidate nodes with the
//! ruleset's `articles` selector, then pull the fields out of each candidate.
//! A candidate without a usable headline or link is skipped silently; missing
//! summaries, images and timestamps are simply left empty.
//!
//! The only hard failure is a body that is not markup at all (binary data or
//! a payload with no tags), reported as a [`ParseError`]. Broken but
//! recognizable HTML is repaired by the HTML5 parser and processed normally.
//!
//! Extraction is pure and synchronous: the parsed document never leaves this
//! module, so the same page and ruleset always yield the same articles.

use crate::error::ParseError;
use crate::fetcher::RawPage;
use crate::models::Article;
use crate::sources::{Ruleset, Source};
use crate::utils::{clean_text, looks_like_markup, truncate_for_log};
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, instrument};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Extract every article the source's ruleset can find on `page`.
///
/// Articles come back in document order, at most `max_articles` of them, with
/// duplicate links on the same page collapsed to their first occurrence.
///
/// # Errors
///
/// Returns [`ParseError::BinaryContent`] if the body contains NUL bytes and
/// [`ParseError::NotMarkup`] if it contains no tags. Finding no articles in
/// valid markup is not an error.
#[instrument(level = "info", skip_all, fields(source = %source.name, url = %page.url))]
pub fn extract(page: &RawPage, source: &Source) -> Result<Vec<Article>, ParseError> {
    if page.body.contains('\0') {
        return Err(ParseError::BinaryContent);
    }
    if !looks_like_markup(&page.body) {
        debug!(preview = %truncate_for_log(&page.body, 120), "Body has no tags");
        return Err(ParseError::NotMarkup);
    }

    let document = Html::parse_document(&page.body);
    let rules = &source.rules;

    let mut articles = Vec::new();
    let mut seen = HashSet::new();
    let mut candidates = 0usize;

    for element in document.select(&rules.articles) {
        if articles.len() >= rules.max_articles {
            break;
        }
        candidates += 1;

        let Some(article) = extract_candidate(element, &page.url, source) else {
            continue;
        };
        if seen.insert(article.url.clone()) {
            articles.push(article);
        }
    }

    debug!(
        candidates,
        accepted = articles.len(),
        "Extracted articles from page"
    );
    Ok(articles)
}

/// Build an article from one candidate node, or `None` if it has no usable
/// title or link.
fn extract_candidate(element: ElementRef<'_>, base: &Url, source: &Source) -> Option<Article> {
    let rules = &source.rules;

    let title = element
        .select(&rules.title)
        .next()
        .map(node_text)
        .filter(|t| !t.is_empty() && t.chars().count() >= rules.min_title_chars)?;

    let url = find_link(element, rules, base)?;

    let summary = rules
        .summary
        .as_ref()
        .and_then(|sel| element.select(sel).map(node_text).find(|t| !t.is_empty()))
        .filter(|s| *s != title);

    // Lazy-loaded images carry a placeholder (often a `data:` URI) in `src`.
    let image_url = element.select(&rules.image).find_map(|img| {
        let value = img.value();
        value
            .attr("src")
            .and_then(|src| resolve_url(base, src))
            .or_else(|| value.attr("data-src").and_then(|src| resolve_url(base, src)))
    });

    let published_at = rules
        .published
        .as_ref()
        .and_then(|sel| element.select(sel).next())
        .and_then(published_value);

    Some(Article {
        title,
        url,
        summary,
        image_url,
        published_at,
        source_name: source.name.clone(),
        category: source.category,
    })
}

/// Link lookup order: the ruleset's link selector, the candidate itself when
/// it is an anchor, then any anchor inside the candidate.
fn find_link(element: ElementRef<'_>, rules: &Ruleset, base: &Url) -> Option<String> {
    let href = element
        .select(&rules.link)
        .find_map(|e| e.value().attr("href"))
        .or_else(|| {
            if element.value().name() == "a" {
                element.value().attr("href")
            } else {
                None
            }
        })
        .or_else(|| element.select(&ANCHOR).find_map(|a| a.value().attr("href")))?;

    resolve_url(base, href)
}

/// Resolve `href` against `base`, keeping only absolute http(s) links without
/// a fragment.
///
/// # Examples
///
/// ```ignore
/// let base = Url::parse("https://example.com/news/").unwrap();
/// assert_eq!(resolve_url(&base, "../world/a1#top").as_deref(), Some("https://example.com/world/a1"));
/// assert_eq!(resolve_url(&base, "javascript:void(0)"), None);
/// ```
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.into())
}

fn node_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Prefer a machine-readable `datetime` attribute, normalized to UTC when it
/// is RFC 3339; otherwise keep whatever text the source shows.
fn published_value(element: ElementRef<'_>) -> Option<String> {
    let raw = element
        .value()
        .attr("datetime")
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| node_text(element));

    if raw.is_empty() {
        return None;
    }

    match DateTime::parse_from_rfc3339(&raw) {
        Ok(dt) => Some(
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        Err(_) => Some(raw),
    }
}
