//! Static registry of scraped news sites and their extraction rules.
//!
//! Each [`Source`] pairs a site with a category, one or more seed pages, and a
//! [`Ruleset`] describing where headlines live in that site's markup. The
//! extractor is a single generic algorithm; adding a site means adding a row
//! here (or in a YAML table), never a new code path.
//!
//! # Built-in Sources
//!
//! | Source | Category | Seed page |
//! |--------|----------|-----------|
//! | Hindustan Times | national | `hindustantimes.com` |
//! | The Times of India | national | `timesofindia.indiatimes.com` |
//! | The Indian Express | national | `indianexpress.com/latest-news/` |
//! | News18 | national | `news18.com/news/` |
//! | BBC News | international | `bbc.com/news` |
//! | Reuters | international | `reuters.com/world/` |
//! | CNN | international | `edition.cnn.com` |
//!
//! Table order is priority order: when two sources list the same story, the
//! earlier one wins during deduplication.
//!
//! # YAML Format
//!
//! ```yaml
//! sources:
//!   - name: Example Daily
//!     category: national
//!     urls: ["https://example.com/"]
//!     selectors:
//!       articles: "div.story"
//!       title: "h2"
//!       summary: "p"          # optional
//!       published: "time"     # optional
//! ```

use crate::error::ConfigError;
use crate::models::Category;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};
use url::Url;

const DEFAULT_LINK_SELECTOR: &str = "a";
const DEFAULT_IMAGE_SELECTOR: &str = "img";
const DEFAULT_MAX_ARTICLES: usize = 10;
const DEFAULT_MIN_TITLE_CHARS: usize = 10;

fn default_link() -> String {
    DEFAULT_LINK_SELECTOR.to_string()
}

fn default_image() -> String {
    DEFAULT_IMAGE_SELECTOR.to_string()
}

fn default_max_articles() -> usize {
    DEFAULT_MAX_ARTICLES
}

fn default_min_title_chars() -> usize {
    DEFAULT_MIN_TITLE_CHARS
}

/// Uncompiled extraction rules, as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesetSpec {
    /// Selector matching one node per candidate article.
    pub articles: String,
    /// Headline, searched inside each candidate.
    pub title: String,
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
    #[serde(default = "default_min_title_chars")]
    pub min_title_chars: usize,
}

impl RulesetSpec {
    /// Rules with the usual defaults for link, image and limits.
    pub fn new(articles: &str, title: &str) -> Self {
        Self {
            articles: articles.to_string(),
            title: title.to_string(),
            link: default_link(),
            summary: None,
            image: default_image(),
            published: None,
            max_articles: DEFAULT_MAX_ARTICLES,
            min_title_chars: DEFAULT_MIN_TITLE_CHARS,
        }
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn with_published(mut self, published: &str) -> Self {
        self.published = Some(published.to_string());
        self
    }
}

/// One configured site, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    pub category: Category,
    pub urls: Vec<String>,
    pub selectors: RulesetSpec,
}

impl SourceSpec {
    pub fn new(name: &str, category: Category, url: &str, selectors: RulesetSpec) -> Self {
        Self {
            name: name.to_string(),
            category,
            urls: vec![url.to_string()],
            selectors,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourceTable {
    sources: Vec<SourceSpec>,
}

/// Compiled extraction rules for one source.
#[derive(Debug, Clone)]
pub struct Ruleset {
    pub articles: Selector,
    pub title: Selector,
    pub link: Selector,
    pub summary: Option<Selector>,
    pub image: Selector,
    pub published: Option<Selector>,
    pub max_articles: usize,
    pub min_title_chars: usize,
}

impl Ruleset {
    fn compile(source_name: &str, spec: &RulesetSpec) -> Result<Self, ConfigError> {
        let parse = |field: &'static str, selector: &str| {
            Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
                source_name: source_name.to_string(),
                field,
                selector: selector.to_string(),
                reason: e.to_string(),
            })
        };

        Ok(Self {
            articles: parse("articles", &spec.articles)?,
            title: parse("title", &spec.title)?,
            link: parse("link", &spec.link)?,
            summary: spec
                .summary
                .as_deref()
                .map(|s| parse("summary", s))
                .transpose()?,
            image: parse("image", &spec.image)?,
            published: spec
                .published
                .as_deref()
                .map(|s| parse("published", s))
                .transpose()?,
            max_articles: spec.max_articles,
            min_title_chars: spec.min_title_chars,
        })
    }
}

/// A validated news site. Immutable once the registry is built.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub category: Category,
    pub urls: Vec<Url>,
    pub rules: Ruleset,
}

impl Source {
    #[instrument(level = "debug", skip_all, fields(source = %spec.name))]
    pub fn from_spec(spec: &SourceSpec) -> Result<Self, ConfigError> {
        if spec.urls.is_empty() {
            return Err(ConfigError::NoSeedUrls(spec.name.clone()));
        }

        let urls = spec
            .urls
            .iter()
            .map(|raw| {
                let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
                    source_name: spec.name.clone(),
                    url: raw.clone(),
                    reason: e.to_string(),
                })?;
                match url.scheme() {
                    "http" | "https" => Ok(url),
                    other => Err(ConfigError::InvalidUrl {
                        source_name: spec.name.clone(),
                        url: raw.clone(),
                        reason: format!("unsupported scheme `{other}`"),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rules = Ruleset::compile(&spec.name, &spec.selectors)?;
        debug!(seeds = urls.len(), "Compiled source rules");

        Ok(Self {
            name: spec.name.clone(),
            category: spec.category,
            urls,
            rules,
        })
    }
}

/// Read-only table of every configured source, in priority order.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Validate and compile a source table.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any selector or seed URL is invalid, or if
    /// either category ends up with no sources at all.
    pub fn from_specs(specs: &[SourceSpec]) -> Result<Self, ConfigError> {
        let sources = specs
            .iter()
            .map(Source::from_spec)
            .collect::<Result<Vec<_>, _>>()?;

        for category in Category::ALL {
            if !sources.iter().any(|s| s.category == category) {
                return Err(ConfigError::EmptyCategory(category.to_string()));
            }
        }

        info!(count = sources.len(), "Source registry loaded");
        Ok(Self { sources })
    }

    /// The compiled-in table of Indian and international outlets.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_specs(&builtin_specs())
    }

    /// Parse and validate a YAML source table.
    ///
    /// # Arguments
    ///
    /// * `yaml` - A document with a top-level `sources` list (see the module docs)
    ///
    /// # Returns
    ///
    /// The compiled registry, or [`ConfigError::Yaml`] for malformed YAML and
    /// the usual validation errors from [`SourceRegistry::from_specs`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let table: SourceTable = serde_yaml::from_str(yaml)?;
        Self::from_specs(&table.sources)
    }

    /// Read a YAML source table from disk.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the table, as given by `--sources`
    ///
    /// # Returns
    ///
    /// The compiled registry, or [`ConfigError::Io`] if the file cannot be read.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    /// Sources of one category, in priority order.
    pub fn list_sources(&self, category: Category) -> Vec<&Source> {
        self.sources
            .iter()
            .filter(|s| s.category == category)
            .collect()
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }
}

/// Built-in source table.
pub fn builtin_specs() -> Vec<SourceSpec> {
    use Category::{International, National};

    vec![
        SourceSpec::new(
            "Hindustan Times",
            National,
            "https://www.hindustantimes.com/",
            RulesetSpec::new("div[data-vars-storyid]", "h3, h2").with_summary("p"),
        ),
        SourceSpec::new(
            "The Times of India",
            National,
            "https://timesofindia.indiatimes.com/",
            RulesetSpec::new("div.list8, div.w_tle", "a").with_summary("p"),
        ),
        SourceSpec::new(
            "The Indian Express",
            National,
            "https://indianexpress.com/latest-news/",
            RulesetSpec::new("div.articles", "h2 a")
                .with_summary("p")
                .with_published("div.date"),
        ),
        SourceSpec::new(
            "News18",
            National,
            "https://www.news18.com/news/",
            RulesetSpec::new("div.blog-list-blog", "h2 a").with_summary("p"),
        ),
        SourceSpec::new(
            "BBC News",
            International,
            "https://www.bbc.com/news",
            RulesetSpec::new(
                "article, .media__content, .gs-c-promo",
                "h3, .media__title, .gs-c-promo-heading__title",
            )
            .with_summary(".media__summary, .gs-c-promo-summary")
            .with_published("time"),
        ),
        SourceSpec::new(
            "Reuters",
            International,
            "https://www.reuters.com/world/",
            RulesetSpec::new(
                "[data-testid='MediaStoryCard'], .story-card",
                "[data-testid='Heading'], .story-card__headline",
            )
            .with_summary("[data-testid='Body'], .story-card__summary")
            .with_published("time"),
        ),
        SourceSpec::new(
            "CNN",
            International,
            "https://edition.cnn.com/",
            RulesetSpec::new(".container__item, .card", ".container__headline, .card__headline")
                .with_summary(".container__summary, .card__summary"),
        ),
    ]
}
