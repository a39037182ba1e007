//! DOI full-text verification.
//!
//! Resolves a DOI through each configured endpoint in order, takes the
//! first HTTP 200 response whose body is larger than the configured floor,
//! strips the markup and scores the text with the full-text RCT scorer.
//! Every failure collapses to [`Verification::Unknown`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use trialscreen_core::rules::rct_scorer;
use trialscreen_core::Verification;

use crate::cache::VerificationCache;
use crate::config::VerificationConfig;

/// Errors from fetching a document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("fetch failed: {0}")]
    Http(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// A fetched document.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    pub status: u16,
    pub body: String,
}

/// Retrieves documents by URL.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError>;
}

/// reqwest-backed fetcher with browser-like headers. Redirects are followed.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &VerificationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: config.timeout,
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;
        Ok(FetchedDocument { status, body })
    }
}

impl HttpFetcher {
    fn map_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Http(error.to_string())
        }
    }
}

lazy_static! {
    static ref SCRIPT: Regex = Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap();
    static ref STYLE: Regex = Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap();
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref TAG: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
    static ref ENTITY: Regex = Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

fn decode_entity(entity: &str) -> Option<String> {
    let named = match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "ndash" => Some('-'),
        "mdash" => Some('-'),
        _ => None,
    };
    if let Some(c) = named {
        return Some(c.to_string());
    }

    let code = entity.strip_prefix('#')?;
    let value = match code.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse::<u32>().ok()?,
    };
    char::from_u32(value).map(|c| c.to_string())
}

/// Visible text of an HTML document: scripts, styles, comments and tags
/// removed, entities decoded, whitespace collapsed.
pub fn strip_markup(html: &str) -> String {
    let text = SCRIPT.replace_all(html, " ");
    let text = STYLE.replace_all(&text, " ");
    let text = COMMENT.replace_all(&text, " ");
    let text = TAG.replace_all(&text, " ");
    let text = ENTITY.replace_all(&text, |caps: &regex::Captures| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Bare DOI from a DOI or resolver URL.
///
/// URLs keep their last two path segments; a `doi:` prefix is dropped.
pub fn normalize_doi(doi: &str) -> String {
    let doi = doi.trim();
    if doi.starts_with("http://") || doi.starts_with("https://") {
        let segments: Vec<&str> = doi.split('/').filter(|s| !s.is_empty()).collect();
        return match segments.as_slice() {
            [.., prefix, suffix] if segments.len() > 2 => format!("{}/{}", prefix, suffix),
            _ => String::new(),
        };
    }
    doi.strip_prefix("doi:")
        .or_else(|| doi.strip_prefix("DOI:"))
        .unwrap_or(doi)
        .trim()
        .to_string()
}

/// Verifies RCT design from a DOI's full text.
pub struct DoiVerifier {
    fetcher: Arc<dyn DocumentFetcher>,
    config: VerificationConfig,
    cache: VerificationCache,
}

impl DoiVerifier {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, config: VerificationConfig) -> Self {
        let cache = VerificationCache::new(config.cache_capacity, config.cache_ttl);
        Self {
            fetcher,
            config,
            cache,
        }
    }

    /// Verifier over HTTP with the configured endpoints.
    pub fn http(config: VerificationConfig) -> Self {
        let fetcher = Arc::new(HttpFetcher::new(&config));
        Self::new(fetcher, config)
    }

    pub fn cache(&self) -> &VerificationCache {
        &self.cache
    }

    /// Verify one DOI. Never fails.
    pub async fn verify(&self, doi: &str) -> Verification {
        let doi = normalize_doi(doi);
        if doi.is_empty() {
            return Verification::Unknown;
        }

        if let Some(cached) = self.cache.get(&doi).await {
            tracing::debug!(doi = %doi, verification = ?cached, "verification cache hit");
            return cached;
        }

        for endpoint in &self.config.endpoints {
            let url = format!("{}/{}", endpoint.trim_end_matches('/'), doi);
            match self.fetcher.fetch(&url).await {
                Ok(doc) if doc.status == 200 && doc.body.len() > self.config.min_body_bytes => {
                    let verification = self.score(&doc.body);
                    tracing::debug!(doi = %doi, url = %url, verification = ?verification, "document verified");
                    self.cache.insert(doi, verification).await;
                    return verification;
                }
                Ok(doc) => {
                    tracing::debug!(url = %url, status = doc.status, bytes = doc.body.len(), "no usable content");
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "fetch failed");
                }
            }
        }

        Verification::Unknown
    }

    fn score(&self, html: &str) -> Verification {
        let text = strip_markup(html).to_lowercase();
        let score = rct_scorer::score(&text);
        if score.is_rct() {
            Verification::ConfirmedRct
        } else {
            Verification::ConfirmedNonRct
        }
    }
}

impl std::fmt::Debug for DoiVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoiVerifier")
            .field("endpoints", &self.config.endpoints)
            .field("cache", &self.cache)
            .finish()
    }
}
