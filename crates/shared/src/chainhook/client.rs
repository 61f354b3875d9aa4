use std::time::Duration;

use log::{debug, info};
use reqwest::{Client, Response};
use url::Url;
use uuid::Uuid;

use super::error::ChainhookError;
use crate::models::predicate::Predicate;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the Chainhook node's predicate management API.
#[derive(Debug, Clone)]
pub struct ChainhookClient {
    base_url: Url,
    client: Client,
}

impl ChainhookClient {
    pub fn new(base_url: &str) -> Result<Self, ChainhookError> {
        let mut base_url = Url::parse(base_url)?;
        // Keep any path prefix when joining endpoint paths onto the base.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ChainhookError> {
        Ok(self.base_url.join(path)?)
    }

    /// Checks the node is reachable.
    pub async fn ping(&self) -> Result<(), ChainhookError> {
        let response = self.client.get(self.endpoint("ping")?).send().await?;
        ensure_success(response).await?;
        debug!("Chainhook node at {} is reachable", self.base_url);
        Ok(())
    }

    pub async fn register_predicate(&self, predicate: &Predicate) -> Result<(), ChainhookError> {
        let response = self
            .client
            .post(self.endpoint("v1/chainhooks")?)
            .json(predicate)
            .send()
            .await?;
        ensure_success(response).await?;
        info!("Registered predicate {} ({})", predicate.name, predicate.uuid);
        Ok(())
    }

    pub async fn deregister_predicate(&self, chain: &str, uuid: Uuid) -> Result<(), ChainhookError> {
        let path = format!("v1/chainhooks/{chain}/{uuid}");
        let response = self.client.delete(self.endpoint(&path)?).send().await?;
        ensure_success(response).await?;
        info!("Deregistered predicate {uuid}");
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ChainhookError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ChainhookError::Rejected { status, body })
}
