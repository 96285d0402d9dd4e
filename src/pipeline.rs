//! # Catalog Digest Pipeline
//!
//! Orchestrates discovery and enrichment for one site:
//!
//! 1. resolve the sitemap declared in `robots.txt`
//! 2. fetch the sitemap index and select its first sitemap
//! 3. fetch and parse the product sitemap
//! 4. enrich the first `limit` products concurrently (describe, then summarize)
//! 5. join the enriched records in sitemap order
//!
//! Steps 1–3 are all-or-nothing and surface a single [`Error`](crate::Error). Step 4 is
//! best-effort: a product whose page or summary cannot be produced carries a
//! [`Degradation`] and the rest of the batch is unaffected.

mod config;

pub use config::{DEFAULT_LIMIT, PipelineConfig, PipelineConfigBuilder};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tracing::{Instrument, debug, error, info, info_span, instrument};

use crate::discovery::{DiscoveredCatalog, ProductRecord, SiteTarget, SitemapChain, SitemapLocator};
use crate::enrichment::{
    Degradation, DescriptionResult, Enriched, PageDescriptionFetcher, PageRenderer, Summarizer,
    TextGenerator,
};
use crate::error::Result;
use crate::http::SiteClient;

/// Message returned with every successful digest
pub const DIGEST_MESSAGE: &str = "Products fetched successfully!";

/// A product record with its description and summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProductRecord {
    #[serde(flatten)]
    pub product: ProductRecord,

    pub description: DescriptionResult,

    pub summary: Enriched<String>,
}

impl EnrichedProductRecord {
    /// Whether either the description or the summary degraded
    pub fn is_degraded(&self) -> bool {
        self.description.is_degraded() || self.summary.is_degraded()
    }
}

/// Full result of one digest call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDigest {
    pub site: String,

    #[serde(flatten)]
    pub chain: SitemapChain,

    /// Number of products listed in the product sitemap
    pub discovered: usize,

    /// Enriched products, in sitemap order
    pub products: Vec<EnrichedProductRecord>,

    pub message: String,

    pub generated_at: DateTime<Utc>,
}

/// Sent once per product as enrichment finishes
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentProgress {
    /// Position of the product in the batch
    pub index: usize,

    pub location: Option<String>,

    pub degraded: bool,
}

/// Discovers a site's products and enriches a bounded batch of them
#[derive(Clone)]
pub struct CatalogPipeline {
    locator: SitemapLocator,
    describer: PageDescriptionFetcher,
    summarizer: Summarizer,
    config: PipelineConfig,
}

impl CatalogPipeline {
    /// Create a pipeline with an HTTP client built from `config`
    pub fn new(
        config: PipelineConfig,
        renderer: Arc<dyn PageRenderer>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let client = SiteClient::new(&config.user_agent, config.request_timeout())?;
        Ok(Self::with_client(client, config, renderer, generator))
    }

    /// Create a pipeline that shares an existing HTTP client
    pub fn with_client(
        client: SiteClient,
        config: PipelineConfig,
        renderer: Arc<dyn PageRenderer>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let describer =
            PageDescriptionFetcher::new(renderer).with_paragraph_limit(config.paragraph_limit);
        let summarizer =
            Summarizer::new(generator).with_instruction(config.summary_instruction.clone());
        Self {
            locator: SitemapLocator::new(client),
            describer,
            summarizer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn describer(&self) -> &PageDescriptionFetcher {
        &self.describer
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Resolve the product sitemap for `site` without fetching it
    pub async fn locate_product_sitemap(&self, site: &SiteTarget) -> Result<SitemapChain> {
        self.locator.locate_product_sitemap(site).await
    }

    /// Resolve the sitemap chain and parse every product entry
    pub async fn discover_products(&self, site: &SiteTarget) -> Result<DiscoveredCatalog> {
        self.locator.discover_products(site).await
    }

    /// Enrich `products` concurrently, preserving their order
    ///
    /// At most `config.concurrency` products are in flight at once. A failure
    /// for one product, including a panicked task, degrades that product only.
    pub async fn enrich_products(
        &self,
        products: Vec<ProductRecord>,
        progress: Option<mpsc::Sender<EnrichmentProgress>>,
    ) -> Vec<EnrichedProductRecord> {
        let concurrency = self.config.effective_concurrency(products.len());
        debug!(
            "Enriching {} products with concurrency {}",
            products.len(),
            concurrency
        );
        let semaphore = Arc::new(Semaphore::new(concurrency));

        let tasks = products
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, product)| {
                let permit = semaphore.clone().acquire_owned();
                let describer = self.describer.clone();
                let summarizer = self.summarizer.clone();
                let progress = progress.clone();
                let span = info_span!("enrich_product", index, location = ?product.location);

                tokio::spawn(
                    async move {
                        let _permit = permit.await;

                        let description = describer
                            .fetch_description(product.location.as_deref())
                            .await;
                        let summary = summarizer.summarize_description(&description).await;

                        let enriched = EnrichedProductRecord {
                            product,
                            description,
                            summary,
                        };

                        if let Some(progress) = progress {
                            let _ = progress
                                .send(EnrichmentProgress {
                                    index,
                                    location: enriched.product.location.clone(),
                                    degraded: enriched.is_degraded(),
                                })
                                .await;
                        }

                        enriched
                    }
                    .instrument(span),
                )
            })
            .collect::<Vec<_>>();

        // Wait for all tasks to complete
        let results = future::join_all(tasks).await;

        results
            .into_iter()
            .zip(products)
            .map(|(result, product)| match result {
                Ok(enriched) => enriched,
                Err(e) => {
                    error!("Enrichment task failed for {:?}: {}", product.location, e);
                    EnrichedProductRecord {
                        product,
                        description: Enriched::Degraded(Degradation::FetchFailed {
                            detail: format!("Task failed: {}", e),
                        }),
                        summary: Enriched::Degraded(Degradation::DescriptionUnavailable),
                    }
                }
            })
            .collect()
    }

    /// Discover `site`'s products and enrich the first `limit` of them
    #[instrument(skip(self), fields(site = %site))]
    pub async fn aggregate(
        &self,
        site: &SiteTarget,
        limit: usize,
    ) -> Result<Vec<EnrichedProductRecord>> {
        self.aggregate_with_progress(site, limit, None).await
    }

    /// Like [`aggregate`](Self::aggregate), reporting each finished product on `progress`
    #[instrument(skip(self, progress), fields(site = %site))]
    pub async fn aggregate_with_progress(
        &self,
        site: &SiteTarget,
        limit: usize,
        progress: Option<mpsc::Sender<EnrichmentProgress>>,
    ) -> Result<Vec<EnrichedProductRecord>> {
        let catalog = self.discover_products(site).await?;
        let batch = catalog.products.into_iter().take(limit).collect();
        Ok(self.enrich_products(batch, progress).await)
    }

    /// Run the whole pipeline with the configured limit and wrap the result
    #[instrument(skip(self, progress), fields(site = %site))]
    pub async fn digest(
        &self,
        site: &SiteTarget,
        progress: Option<mpsc::Sender<EnrichmentProgress>>,
    ) -> Result<CatalogDigest> {
        let catalog = self.discover_products(site).await?;
        let discovered = catalog.products.len();
        let batch: Vec<_> = catalog
            .products
            .into_iter()
            .take(self.config.limit)
            .collect();

        let products = self.enrich_products(batch, progress).await;
        let degraded = products.iter().filter(|p| p.is_degraded()).count();
        info!(
            "Enriched {} of {} products ({} degraded)",
            products.len(),
            discovered,
            degraded
        );

        Ok(CatalogDigest {
            site: site.to_string(),
            chain: catalog.chain,
            discovered,
            products,
            message: DIGEST_MESSAGE.to_string(),
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ResolutionError;
    use crate::enrichment::{DescriptionSource, EnrichError, RenderedPage};
    use crate::error::Error;
    use async_trait::async_trait;
    use mockito::{Server, ServerGuard};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Renders `https://x.com/p{i}` with a meta description; later products answer faster
    #[derive(Default)]
    struct CatalogRenderer {
        fail_on: Option<String>,
        panic_on: Option<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl PageRenderer for CatalogRenderer {
        async fn render(&self, url: &str) -> std::result::Result<RenderedPage, EnrichError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let index: u64 = url.rsplit('p').next().and_then(|i| i.parse().ok()).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(60u64.saturating_sub(index * 10))).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.panic_on.as_deref() == Some(url) {
                panic!("renderer crashed on {url}");
            }
            if self.fail_on.as_deref() == Some(url) {
                return Err(EnrichError::Generation("provider down".to_string()));
            }
            Ok(RenderedPage {
                meta_description: Some(format!("About {url}")),
                body: Some("<p>body</p>".to_string()),
            })
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> std::result::Result<String, EnrichError> {
            let subject = prompt.rsplit("About ").next().unwrap_or_default();
            Ok(format!("Here you go:\n\n- {subject}"))
        }
    }

    async fn catalog_server(product_count: usize) -> ServerGuard {
        let mut server = Server::new_async().await;
        let base = server.url();

        server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body(format!(
                "User-agent: *\nDisallow: /checkout\nSitemap: {base}/sitemap.xml\nSitemap: {base}/other.xml"
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(format!(
                "<sitemapindex>\
                   <sitemap><loc>{base}/sitemap_products_1.xml</loc></sitemap>\
                   <sitemap><loc>{base}/sitemap_pages_1.xml</loc></sitemap>\
                 </sitemapindex>"
            ))
            .create_async()
            .await;

        let entries: String = (0..product_count)
            .map(|i| {
                format!(
                    "<url><loc>https://x.com/p{i}</loc>\
                     <image:image><image:loc>https://cdn.x.com/p{i}.jpg</image:loc></image:image></url>"
                )
            })
            .collect();
        server
            .mock("GET", "/sitemap_products_1.xml")
            .with_status(200)
            .with_body(format!(
                r#"<urlset xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">{entries}</urlset>"#
            ))
            .create_async()
            .await;

        server
    }

    fn pipeline(config: PipelineConfig, renderer: Arc<CatalogRenderer>) -> CatalogPipeline {
        CatalogPipeline::new(config, renderer, Arc::new(EchoGenerator)).unwrap()
    }

    #[tokio::test]
    async fn test_aggregate_takes_limit_in_order() {
        let server = catalog_server(10).await;
        let pipeline = pipeline(PipelineConfig::default(), Arc::new(CatalogRenderer::default()));
        let site = SiteTarget::parse(&server.url()).unwrap();

        let products = pipeline.aggregate(&site, 6).await.unwrap();

        assert_eq!(products.len(), 6);
        for (i, product) in products.iter().enumerate() {
            let location = format!("https://x.com/p{i}");
            assert_eq!(product.product.location.as_deref(), Some(location.as_str()));
            assert_eq!(product.product.images.len(), 1);
            assert_eq!(product.description.display_text(), format!("About {location}"));
            assert_eq!(
                product.description.value().unwrap().source,
                DescriptionSource::MetaDescription
            );
            assert_eq!(product.summary.display_text(), format!("- {location}"));
        }
    }

    #[tokio::test]
    async fn test_limit_larger_than_catalog() {
        let server = catalog_server(3).await;
        let pipeline = pipeline(PipelineConfig::default(), Arc::new(CatalogRenderer::default()));
        let site = SiteTarget::parse(&server.url()).unwrap();

        let products = pipeline.aggregate(&site, 6).await.unwrap();
        assert_eq!(products.len(), 3);
    }

    #[tokio::test]
    async fn test_item_failure_is_contained() {
        let server = catalog_server(6).await;
        let renderer = Arc::new(CatalogRenderer {
            fail_on: Some("https://x.com/p2".to_string()),
            ..Default::default()
        });
        let pipeline = pipeline(PipelineConfig::default(), renderer);
        let site = SiteTarget::parse(&server.url()).unwrap();

        let products = pipeline.aggregate(&site, 6).await.unwrap();

        assert_eq!(products.len(), 6);
        assert_eq!(products[2].description.display_text(), "Failed to fetch description");
        assert_eq!(
            products[2].summary,
            Enriched::Degraded(Degradation::DescriptionUnavailable)
        );
        assert!(products[2].is_degraded());
        assert_eq!(products.iter().filter(|p| p.is_degraded()).count(), 1);
    }

    #[tokio::test]
    async fn test_panicked_task_is_contained() {
        let server = catalog_server(4).await;
        let renderer = Arc::new(CatalogRenderer {
            panic_on: Some("https://x.com/p1".to_string()),
            ..Default::default()
        });
        let pipeline = pipeline(PipelineConfig::default(), renderer);
        let site = SiteTarget::parse(&server.url()).unwrap();

        let products = pipeline.aggregate(&site, 4).await.unwrap();

        assert_eq!(products.len(), 4);
        assert_eq!(products[1].product.location.as_deref(), Some("https://x.com/p1"));
        assert_eq!(
            products[1].description.degradation().map(Degradation::reason_code),
            Some("fetch_failed")
        );
        assert!(!products[0].is_degraded());
        assert!(!products[3].is_degraded());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let server = catalog_server(6).await;
        let renderer = Arc::new(CatalogRenderer::default());
        let config = PipelineConfig::builder().concurrency(2).build();
        let pipeline = pipeline(config, renderer.clone());
        let site = SiteTarget::parse(&server.url()).unwrap();

        let products = pipeline.aggregate(&site, 6).await.unwrap();

        assert_eq!(products.len(), 6);
        assert!(renderer.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_missing_sitemap_declaration_aborts() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nDisallow: /")
            .create_async()
            .await;
        let pipeline = pipeline(PipelineConfig::default(), Arc::new(CatalogRenderer::default()));
        let site = SiteTarget::parse(&server.url()).unwrap();

        let result = pipeline.aggregate(&site, 6).await;
        assert!(matches!(
            result,
            Err(Error::Resolution(ResolutionError::MissingSitemapDeclaration { .. }))
        ));
    }

    #[tokio::test]
    async fn test_malformed_index_aborts() {
        let mut server = Server::new_async().await;
        let base = server.url();
        server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body(format!("Sitemap: {base}/sitemap.xml"))
            .create_async()
            .await;
        server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body("<sitemapindex><sitemap><loc>broken</sitemap>")
            .create_async()
            .await;
        let pipeline = pipeline(PipelineConfig::default(), Arc::new(CatalogRenderer::default()));
        let site = SiteTarget::parse(&base).unwrap();

        let result = pipeline.aggregate(&site, 6).await;
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_product_sitemap_aborts() {
        let mut server = Server::new_async().await;
        let base = server.url();
        server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body(format!("Sitemap: {base}/sitemap.xml"))
            .create_async()
            .await;
        server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(format!(
                "<sitemapindex><sitemap><loc>{base}/gone.xml</loc></sitemap></sitemapindex>"
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/gone.xml")
            .with_status(404)
            .create_async()
            .await;
        let pipeline = pipeline(PipelineConfig::default(), Arc::new(CatalogRenderer::default()));
        let site = SiteTarget::parse(&base).unwrap();

        let result = pipeline.aggregate(&site, 6).await;
        assert!(matches!(
            result,
            Err(Error::Resolution(ResolutionError::SitemapUnavailable { .. }))
        ));
    }

    #[tokio::test]
    async fn test_locate_product_sitemap() {
        let server = catalog_server(1).await;
        let pipeline = pipeline(PipelineConfig::default(), Arc::new(CatalogRenderer::default()));
        let site = SiteTarget::parse(&server.url()).unwrap();

        let chain = pipeline.locate_product_sitemap(&site).await.unwrap();
        assert_eq!(
            chain.sitemap_url.as_str(),
            format!("{}/sitemap.xml", server.url())
        );
        assert_eq!(
            chain.product_sitemap_url.as_str(),
            format!("{}/sitemap_products_1.xml", server.url())
        );
    }

    #[tokio::test]
    async fn test_digest_reports_progress() {
        let server = catalog_server(10).await;
        let config = PipelineConfig::builder().limit(4).build();
        let pipeline = pipeline(config, Arc::new(CatalogRenderer::default()));
        let site = SiteTarget::parse(&server.url()).unwrap();

        let (sender, mut receiver) = mpsc::channel(16);
        let digest = pipeline.digest(&site, Some(sender)).await.unwrap();

        assert_eq!(digest.discovered, 10);
        assert_eq!(digest.products.len(), 4);
        assert_eq!(digest.message, DIGEST_MESSAGE);

        let mut seen = Vec::new();
        while let Some(update) = receiver.recv().await {
            assert!(!update.degraded);
            seen.push(update.index);
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);

        let json = serde_json::to_value(&digest).unwrap();
        assert_eq!(json["products"][0]["location"], "https://x.com/p0");
        assert_eq!(json["products"][0]["summary"]["status"], "value");
        assert!(json["product_sitemap_url"].as_str().unwrap().ends_with("sitemap_products_1.xml"));
    }
}
