//! Page-rendering collaborators
//!
//! The description fetcher only depends on [`PageRenderer`]. Two providers are
//! shipped: a ScrapingBee client for JavaScript-heavy storefronts and a plain
//! GET renderer for sites that serve their product copy in the initial HTML.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::enrichment::error::EnrichError;
use crate::http::SiteClient;

/// Default ScrapingBee endpoint
pub const SCRAPINGBEE_BASE_URL: &str = "https://app.scrapingbee.com";

/// What a renderer returns for one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedPage {
    /// Meta description derived by the provider, if any
    pub meta_description: Option<String>,

    /// Rendered body HTML, if any
    pub body: Option<String>,
}

/// Renders a product page into HTML plus an optional meta description
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<RenderedPage, EnrichError>;
}

/// JSON body returned by ScrapingBee with `json_response=true`
#[derive(Debug, Deserialize)]
struct ScrapingBeeResponse {
    #[serde(default)]
    body: Option<String>,

    #[serde(default)]
    meta_description: Option<String>,
}

/// Renders pages through the ScrapingBee HTML API
#[derive(Debug, Clone)]
pub struct ScrapingBeeRenderer {
    client: SiteClient,
    api_key: String,
    base_url: String,
}

impl ScrapingBeeRenderer {
    pub fn new(client: SiteClient, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, SCRAPINGBEE_BASE_URL)
    }

    /// Point the renderer at another endpoint, e.g. a local stub
    pub fn with_base_url(
        client: SiteClient,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PageRenderer for ScrapingBeeRenderer {
    #[instrument(skip(self), level = "debug")]
    async fn render(&self, url: &str) -> Result<RenderedPage, EnrichError> {
        let endpoint = format!("{}/api/v1/", self.base_url.trim_end_matches('/'));
        let response: ScrapingBeeResponse = self
            .client
            .get_json(
                &endpoint,
                &[
                    ("api_key", self.api_key.as_str()),
                    ("url", url),
                    ("json_response", "true"),
                ],
            )
            .await?;

        Ok(RenderedPage {
            meta_description: response.meta_description.filter(|d| !d.trim().is_empty()),
            body: response.body.filter(|b| !b.is_empty()),
        })
    }
}

/// Renders pages with a plain GET, reading the meta description from the HTML
#[derive(Debug, Clone)]
pub struct DirectRenderer {
    client: SiteClient,
}

impl DirectRenderer {
    pub fn new(client: SiteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for DirectRenderer {
    #[instrument(skip(self), level = "debug")]
    async fn render(&self, url: &str) -> Result<RenderedPage, EnrichError> {
        let html = self.client.get_text(url).await?;
        if html.trim().is_empty() {
            return Ok(RenderedPage::default());
        }

        let meta_description = extract_meta_description(&html)?;
        debug!("Meta description present: {}", meta_description.is_some());
        Ok(RenderedPage {
            meta_description,
            body: Some(html),
        })
    }
}

/// Extract `<meta name="description">`, falling back to `og:description`
pub fn extract_meta_description(html: &str) -> Result<Option<String>, EnrichError> {
    let document = Html::parse_document(html);

    for selector_str in [
        "meta[name='description']",
        "meta[property='og:description']",
    ] {
        let selector = Selector::parse(selector_str).map_err(|e| {
            EnrichError::HtmlParse(format!("Failed to parse selector '{}': {}", selector_str, e))
        })?;

        let description = document
            .select(&selector)
            .filter_map(|element| element.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty());

        if let Some(description) = description {
            return Ok(Some(description.to_string()));
        }
    }

    Ok(None)
}
