use anyhow::{Error, Result, anyhow};
use rand::{Rng, seq::IndexedRandom};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
    endpoint: String,
}

impl QuoteClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Fetch the quote list and pick one entry uniformly at random.
    #[instrument(name = "fetch_quote", skip(self), fields(endpoint = %self.endpoint))]
    pub async fn fetch_random(&self) -> Result<Quote, Error> {
        let quotes: Vec<Quote> = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(count = quotes.len(), "quotes received");
        pick_random(&quotes, &mut rand::rng())
    }
}

//
// Match ZenQuotes JSON
// https://docs.zenquotes.io/zenquotes-documentation/
//
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Quote {
    #[serde(rename = "q")]
    pub text: String,

    #[serde(rename = "a")]
    pub author: String,
}

impl Quote {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }

    /// Used whenever no quote could be fetched.
    pub fn fallback() -> Self {
        Self::new("Stay positive!", "Unknown")
    }
}

/// Uniform choice over the whole list; an empty list is an error.
pub fn pick_random<R: Rng + ?Sized>(quotes: &[Quote], rng: &mut R) -> Result<Quote> {
    quotes
        .choose(rng)
        .cloned()
        .ok_or_else(|| anyhow!("quote list is empty"))
}
