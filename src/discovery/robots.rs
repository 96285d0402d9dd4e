//! Sitemap resolution from a site's robots.txt

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::discovery::error::ResolutionError;
use crate::discovery::{SiteTarget, SitemapReference};
use crate::http::SiteClient;

/// First `Sitemap: <url>` declaration; field names in robots.txt are case-insensitive
static SITEMAP_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Sitemap:[ \t]*(\S+)").expect("sitemap declaration pattern is valid")
});

/// Return the URL of the first sitemap declared in `robots_txt`, if any
pub fn find_sitemap_declaration(robots_txt: &str) -> Option<&str> {
    SITEMAP_DECLARATION
        .captures(robots_txt)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Resolves a site's sitemap location from its robots policy
#[derive(Debug, Clone)]
pub struct RobotsResolver {
    client: SiteClient,
}

impl RobotsResolver {
    pub fn new(client: SiteClient) -> Self {
        Self { client }
    }

    /// Fetch `{site}/robots.txt` and return the first declared sitemap
    ///
    /// There is no retry: a missing or broken robots.txt is reported to the
    /// caller as a [`ResolutionError`].
    #[instrument(skip(self), fields(site = %site))]
    pub async fn resolve(&self, site: &SiteTarget) -> Result<SitemapReference, ResolutionError> {
        let robots_url = site.robots_url();
        let robots_txt = self.client.get_text(&robots_url).await.map_err(|source| {
            ResolutionError::RobotsUnavailable {
                url: robots_url.clone(),
                source,
            }
        })?;
        debug!("Fetched robots.txt ({} bytes)", robots_txt.len());

        match find_sitemap_declaration(&robots_txt) {
            Some(sitemap) => {
                info!("Sitemap declared at {}", sitemap);
                Ok(SitemapReference::new(sitemap))
            }
            None => {
                warn!("Sitemap URL not found in robots.txt");
                Err(ResolutionError::MissingSitemapDeclaration { url: robots_url })
            }
        }
    }
}
