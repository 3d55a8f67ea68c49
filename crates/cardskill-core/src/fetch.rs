use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::info;

use crate::error::CardError;

/// Source of upstream JSON documents.
pub trait Fetcher {
    fn fetch_json(&self, url: &str) -> Result<Value, CardError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch_json(&self, url: &str) -> Result<Value, CardError> {
        (**self).fetch_json(url)
    }
}

/// Single blocking GET per call; no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, CardError> {
        let client = Client::builder()
            .user_agent(concat!("cardskill/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value, CardError> {
        info!(url, "Fetching card data");
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(CardError::fetch(format!(
                "{url} responded with {}",
                response.status()
            )));
        }

        let payload: Value = response.json()?;
        Ok(payload)
    }
}
