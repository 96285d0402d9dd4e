//! Product description extraction

use std::sync::Arc;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::enrichment::error::EnrichError;
use crate::enrichment::outcome::{Degradation, Enriched};
use crate::enrichment::render::{PageRenderer, RenderedPage};

/// Default number of paragraphs used when a page has no meta description
pub const DEFAULT_PARAGRAPH_LIMIT: usize = 10;

/// Where a description came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionSource {
    MetaDescription,
    Paragraphs,
}

/// Description text for one product page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub text: String,
    pub source: DescriptionSource,
}

impl AsRef<str> for Description {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Result of describing one product page; never an error
pub type DescriptionResult = Enriched<Description>;

/// Join the text of the first `limit` `<p>` elements, one per line
pub fn extract_paragraphs(html: &str, limit: usize) -> Result<String, EnrichError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p")
        .map_err(|e| EnrichError::HtmlParse(format!("Failed to parse paragraph selector: {}", e)))?;

    let mut paragraphs = String::new();
    for element in document.select(&selector).take(limit) {
        paragraphs.extend(element.text());
        paragraphs.push('\n');
    }

    Ok(paragraphs.trim().to_string())
}

/// Pick a description from a rendered page
///
/// Priority: the provider's meta description, then paragraph text from the
/// body. A page without a body, or whose body has no paragraph text, degrades.
pub fn describe_rendered_page(page: &RenderedPage, paragraph_limit: usize) -> DescriptionResult {
    if let Some(meta) = page
        .meta_description
        .as_deref()
        .map(str::trim)
        .filter(|meta| !meta.is_empty())
    {
        return Enriched::Value(Description {
            text: meta.to_string(),
            source: DescriptionSource::MetaDescription,
        });
    }

    let Some(body) = page.body.as_deref() else {
        return Enriched::Degraded(Degradation::NoHtmlBody);
    };

    match extract_paragraphs(body, paragraph_limit) {
        Ok(text) if !text.is_empty() => Enriched::Value(Description {
            text,
            source: DescriptionSource::Paragraphs,
        }),
        Ok(_) => Enriched::Degraded(Degradation::NoSuitableDescription),
        Err(e) => Enriched::Degraded(Degradation::FetchFailed {
            detail: e.to_string(),
        }),
    }
}

/// Fetches a product page through a [`PageRenderer`] and derives its description
#[derive(Clone)]
pub struct PageDescriptionFetcher {
    renderer: Arc<dyn PageRenderer>,
    paragraph_limit: usize,
}

impl PageDescriptionFetcher {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            renderer,
            paragraph_limit: DEFAULT_PARAGRAPH_LIMIT,
        }
    }

    /// Set how many paragraphs are used when there is no meta description
    pub fn with_paragraph_limit(mut self, paragraph_limit: usize) -> Self {
        self.paragraph_limit = paragraph_limit;
        self
    }

    /// Describe the page at `url`
    ///
    /// Render and parse failures are returned as [`Degradation::FetchFailed`].
    #[instrument(skip(self))]
    pub async fn fetch_description(&self, url: Option<&str>) -> DescriptionResult {
        let Some(url) = url else {
            warn!("Product has no location to describe");
            return Enriched::Degraded(Degradation::FetchFailed {
                detail: EnrichError::MissingLocation.to_string(),
            });
        };

        match self.renderer.render(url).await {
            Ok(page) => {
                let description = describe_rendered_page(&page, self.paragraph_limit);
                match &description {
                    Enriched::Value(d) => debug!("Description from {:?}: {} chars", d.source, d.text.len()),
                    Enriched::Degraded(reason) => debug!("Description degraded: {}", reason.reason_code()),
                }
                description
            }
            Err(e) => {
                warn!("Error fetching description for {}: {}", url, e);
                Enriched::Degraded(Degradation::FetchFailed {
                    detail: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::FetchError;
    use async_trait::async_trait;

    struct StaticRenderer(RenderedPage);

    #[async_trait]
    impl PageRenderer for StaticRenderer {
        async fn render(&self, _url: &str) -> Result<RenderedPage, EnrichError> {
            Ok(self.0.clone())
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl PageRenderer for FailingRenderer {
        async fn render(&self, url: &str) -> Result<RenderedPage, EnrichError> {
            Err(EnrichError::Fetch(FetchError::Status {
                url: url.to_string(),
                status_code: 500,
                message: "provider down".to_string(),
            }))
        }
    }

    fn page(meta: Option<&str>, body: Option<&str>) -> RenderedPage {
        RenderedPage {
            meta_description: meta.map(str::to_string),
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn test_meta_description_wins() {
        let result = describe_rendered_page(
            &page(Some("Cast iron kettle"), Some("<p>Body copy</p>")),
            DEFAULT_PARAGRAPH_LIMIT,
        );
        assert_eq!(
            result,
            Enriched::Value(Description {
                text: "Cast iron kettle".to_string(),
                source: DescriptionSource::MetaDescription,
            })
        );
    }

    #[test]
    fn test_paragraph_fallback() {
        let html = "<html><body><p>First line.</p><div><p> Second <b>bold</b> line. </p></div></body></html>";
        let result = describe_rendered_page(&page(Some("  "), Some(html)), DEFAULT_PARAGRAPH_LIMIT);
        assert_eq!(result.display_text(), "First line.\n Second bold line.");
        assert_eq!(result.value().unwrap().source, DescriptionSource::Paragraphs);
    }

    #[test]
    fn test_paragraph_limit() {
        let html: String = (1..=12).map(|i| format!("<p>p{i}</p>")).collect();
        let text = extract_paragraphs(&html, 10).unwrap();
        assert_eq!(text.lines().count(), 10);
        assert!(text.ends_with("p10"));
        assert!(!text.contains("p11"));
    }

    #[test]
    fn test_no_paragraphs() {
        let result = describe_rendered_page(
            &page(None, Some("<html><body><div>No paragraphs</div></body></html>")),
            DEFAULT_PARAGRAPH_LIMIT,
        );
        assert_eq!(result, Enriched::Degraded(Degradation::NoSuitableDescription));
        assert_eq!(result.display_text(), "No suitable description found");
    }

    #[test]
    fn test_no_body() {
        let result = describe_rendered_page(&page(None, None), DEFAULT_PARAGRAPH_LIMIT);
        assert_eq!(result, Enriched::Degraded(Degradation::NoHtmlBody));
        assert_eq!(result.display_text(), "No HTML body found in the response");
    }

    #[tokio::test]
    async fn test_provider_failure_degrades() {
        let fetcher = PageDescriptionFetcher::new(Arc::new(FailingRenderer));
        let result = fetcher.fetch_description(Some("https://x.com/p1")).await;
        assert!(matches!(
            result,
            Enriched::Degraded(Degradation::FetchFailed { .. })
        ));
        assert_eq!(result.display_text(), "Failed to fetch description");
    }

    #[tokio::test]
    async fn test_missing_location_degrades() {
        let fetcher = PageDescriptionFetcher::new(Arc::new(StaticRenderer(page(
            Some("unused"),
            None,
        ))));
        let result = fetcher.fetch_description(None).await;
        assert_eq!(result.display_text(), "Failed to fetch description");
    }

    #[tokio::test]
    async fn test_fetch_uses_paragraph_limit() {
        let html: String = (1..=5).map(|i| format!("<p>p{i}</p>")).collect();
        let fetcher = PageDescriptionFetcher::new(Arc::new(StaticRenderer(page(None, Some(&html)))))
            .with_paragraph_limit(2);
        let result = fetcher.fetch_description(Some("https://x.com/p1")).await;
        assert_eq!(result.display_text(), "p1\np2");
    }
}
