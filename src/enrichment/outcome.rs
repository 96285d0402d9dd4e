//! Tagged per-product enrichment outcomes

use serde::{Deserialize, Serialize};

/// Why a product's description or summary could not be produced
///
/// A degradation never aborts a batch. It replaces the value for one product
/// and keeps a machine-readable reason next to the legacy placeholder text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Degradation {
    /// The page rendered but had neither a meta description nor paragraph text
    NoSuitableDescription,

    /// The renderer returned no HTML body
    NoHtmlBody,

    /// The page could not be rendered
    FetchFailed {
        /// Underlying failure
        detail: String,
    },

    /// The text generator failed or returned nothing usable
    SummarizeFailed {
        /// Underlying failure
        detail: String,
    },

    /// Summarization was skipped because the description was degraded
    DescriptionUnavailable,
}

impl Degradation {
    /// Stable reason code for callers and logs
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NoSuitableDescription => "no_suitable_description",
            Self::NoHtmlBody => "no_html_body",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::SummarizeFailed { .. } => "summarize_failed",
            Self::DescriptionUnavailable => "description_unavailable",
        }
    }

    /// Placeholder text shown in place of the missing value
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::NoSuitableDescription => "No suitable description found",
            Self::NoHtmlBody => "No HTML body found in the response",
            Self::FetchFailed { .. } => "Failed to fetch description",
            Self::SummarizeFailed { .. } | Self::DescriptionUnavailable => {
                "Failed to summarize description"
            }
        }
    }
}

/// Either an enrichment value or the degradation that replaced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Enriched<T> {
    Value(T),
    Degraded(Degradation),
}

impl<T> Enriched<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Degraded(_) => None,
        }
    }

    pub fn degradation(&self) -> Option<&Degradation> {
        match self {
            Self::Value(_) => None,
            Self::Degraded(degradation) => Some(degradation),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

impl<T: AsRef<str>> Enriched<T> {
    /// The value's text, or the degradation's placeholder text
    pub fn display_text(&self) -> &str {
        match self {
            Self::Value(value) => value.as_ref(),
            Self::Degraded(degradation) => degradation.sentinel(),
        }
    }
}
