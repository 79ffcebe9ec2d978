//! Reference-data source abstraction and HTTP implementation.

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::Snapshot;
use crate::error::{Error, Result};

/// External source of market/reference-data snapshots, polled by the
/// background refresher. Never called from the request path.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Fetch the current snapshot.
    async fn fetch_snapshot(&self) -> Result<Snapshot>;
}

/// Fetches snapshots from an HTTP endpoint returning JSON.
pub struct HttpReferenceSource {
    client: Client,
    url: String,
}

impl HttpReferenceSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ReferenceSource for HttpReferenceSource {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let snapshot = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::ReferenceData(e.to_string()))?
            .json::<Snapshot>()
            .await?;
        Ok(snapshot)
    }
}
