//! Sitemap chain traversal: robots.txt, then the sitemap index, then the
//! product sitemap

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::discovery::error::ResolutionError;
use crate::discovery::{
    ProductRecord, RobotsResolver, SiteTarget, SitemapReference, parse_index, parse_products,
};
use crate::error::Result;
use crate::http::SiteClient;

/// Sitemap chain resolved for a site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapChain {
    /// Sitemap declared in robots.txt
    pub sitemap_url: SitemapReference,

    /// First sitemap listed in that index
    pub product_sitemap_url: SitemapReference,
}

/// Products discovered for a site, before enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredCatalog {
    pub chain: SitemapChain,
    pub products: Vec<ProductRecord>,
}

/// Follows a site's sitemap chain down to its product records
#[derive(Debug, Clone)]
pub struct SitemapLocator {
    client: SiteClient,
    resolver: RobotsResolver,
}

impl SitemapLocator {
    pub fn new(client: SiteClient) -> Self {
        Self {
            resolver: RobotsResolver::new(client.clone()),
            client,
        }
    }

    async fn fetch_sitemap(
        &self,
        sitemap: &SitemapReference,
    ) -> std::result::Result<String, ResolutionError> {
        self.client
            .get_text(sitemap.as_str())
            .await
            .map_err(|source| ResolutionError::SitemapUnavailable {
                url: sitemap.to_string(),
                source,
            })
    }

    /// Resolve the product sitemap for `site` without fetching it
    #[instrument(skip(self), fields(site = %site))]
    pub async fn locate_product_sitemap(&self, site: &SiteTarget) -> Result<SitemapChain> {
        let sitemap_url = self.resolver.resolve(site).await?;

        let index_xml = self.fetch_sitemap(&sitemap_url).await?;
        let product_sitemap_url = parse_index(&index_xml)?;
        info!("Product sitemap URL: {}", product_sitemap_url);

        Ok(SitemapChain {
            sitemap_url,
            product_sitemap_url,
        })
    }

    /// Resolve the sitemap chain and parse every product entry
    #[instrument(skip(self), fields(site = %site))]
    pub async fn discover_products(&self, site: &SiteTarget) -> Result<DiscoveredCatalog> {
        let chain = self.locate_product_sitemap(site).await?;

        let products_xml = self.fetch_sitemap(&chain.product_sitemap_url).await?;
        let products = parse_products(&products_xml)?;
        info!("Discovered {} products", products.len());

        Ok(DiscoveredCatalog { chain, products })
    }
}
