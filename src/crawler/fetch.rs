//! Page fetching over HTTP

use std::future::Future;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::{Attempt, Policy};
use tracing::{debug, warn};
use url::Url;

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::FetchError;

/// A retrieved HTML document
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL that was requested
    pub url: Url,

    /// URL after redirects; relative links resolve against it
    pub final_url: Url,

    /// Raw response body
    pub html: String,
}

/// Retrieves one document by URL
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedDocument, FetchError>> + Send;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

const MAX_REDIRECTS: usize = 10;

/// Follow redirects only while they stay on allowed hosts
fn redirect_policy(config: &CrawlerConfig) -> Policy {
    let config = config.clone();
    Policy::custom(move |attempt: Attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let allowed = attempt
            .url()
            .host_str()
            .is_some_and(|host| config.allows_host(host));
        if allowed {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .redirect(redirect_policy(config))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        debug!("Fetching {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        // A redirect response only reaches here when the policy stopped it
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            warn!("Not following redirect from {} to {}", url, location);
            return Err(FetchError::OffsiteRedirect {
                url: url.to_string(),
                location,
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // A missing content-type is tolerated; an explicit non-HTML one is not
        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.to_ascii_lowercase().contains("html") {
                return Err(FetchError::NotHtml {
                    url: url.to_string(),
                    content_type: content_type.to_string(),
                });
            }
        }

        let final_url = response.url().clone();
        let html = response.text().await?;

        Ok(FetchedDocument {
            url: url.clone(),
            final_url,
            html,
        })
    }
}
