use crate::config::Config;
use crate::error::MediaError;
use crate::logw;
use crate::quote::{sanitize_quote, QuoteSource};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct StoicResponse {
    #[serde(default)]
    data: Option<StoicData>,
}

#[derive(Debug, Deserialize)]
struct StoicData {
    #[serde(default)]
    quote: Option<String>,
}

/// Returns the sanitised quote in `body` when it is present and short enough.
fn accept_quote(body: &str, max_len: usize) -> Option<String> {
    let parsed: StoicResponse = serde_json::from_str(body).ok()?;
    let quote = parsed.data?.quote?;
    if quote.is_empty() || quote.chars().count() > max_len {
        return None;
    }
    Some(sanitize_quote(&quote))
}

/// Client for the stoic quote API.
pub struct StoicQuotes {
    client: Client,
    url: String,
    max_len: usize,
    attempts: u32,
}

impl StoicQuotes {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            url: cfg.quote_api_url.clone(),
            max_len: cfg.max_quote_len,
            attempts: cfg.quote_attempts.max(1),
        }
    }

    async fn fetch_once(&self) -> Result<String> {
        let resp = self
            .client
            .get(&self.url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl QuoteSource for StoicQuotes {
    async fn next_quote(&self) -> Result<String> {
        for _ in 0..self.attempts {
            match self.fetch_once().await {
                Ok(body) => {
                    if let Some(quote) = accept_quote(&body, self.max_len) {
                        return Ok(quote);
                    }
                    logw("Quote too long or missing, trying again");
                }
                Err(err) => logw(format!("Quote request failed: {}", err)),
            }
        }
        Err(MediaError::NoQuote(self.attempts).into())
    }
}
