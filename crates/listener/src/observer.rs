use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};
use shared::chainhook::ChainhookClient;
use shared::models::predicate::Predicate;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::aggregator::Aggregator;
use crate::api::server::{start_server, AppState};

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub auth_token: String,
}

/// Owns the listener lifecycle: predicate registration, the callback server
/// and the final flush on shutdown.
pub struct ChainhookObserver {
    client: ChainhookClient,
    predicates: Vec<Predicate>,
    aggregator: Arc<Mutex<Aggregator>>,
    server: ServerOptions,
}

impl ChainhookObserver {
    pub fn new(
        client: ChainhookClient,
        predicates: Vec<Predicate>,
        aggregator: Aggregator,
        server: ServerOptions,
    ) -> Self {
        Self {
            client,
            predicates,
            aggregator: Arc::new(Mutex::new(aggregator)),
            server,
        }
    }

    /// Registers every predicate with the node. On failure, predicates that
    /// were already accepted are removed again before the error is returned.
    pub async fn register_predicates(&self) -> Result<()> {
        self.client
            .ping()
            .await
            .with_context(|| format!("chainhook node {} is unreachable", self.client.base_url()))?;

        for (registered, predicate) in self.predicates.iter().enumerate() {
            if let Err(e) = self.client.register_predicate(predicate).await {
                self.deregister(&self.predicates[..registered]).await;
                return Err(e)
                    .with_context(|| format!("failed to register predicate {}", predicate.name));
            }
        }
        Ok(())
    }

    async fn deregister(&self, predicates: &[Predicate]) {
        for predicate in predicates {
            if let Err(e) = self
                .client
                .deregister_predicate(&predicate.chain, predicate.uuid)
                .await
            {
                warn!("Failed to deregister predicate {}: {e}", predicate.name);
            }
        }
    }

    /// Writes the final snapshot and removes the predicates from the node.
    pub async fn shutdown(&self) {
        info!("👋 Shutting down gracefully...");
        if let Err(e) = self.aggregator.lock().await.persist() {
            error!("Failed to save final analytics: {e}");
        }
        self.deregister(&self.predicates).await;
    }

    pub async fn run(self, cancellation_token: CancellationToken) -> Result<()> {
        self.register_predicates().await?;
        info!("✅ Observer started successfully!");
        info!("Waiting for events...");

        let app_state = AppState {
            aggregator: self.aggregator.clone(),
        };
        let served = start_server(
            &self.server.host,
            self.server.port,
            app_state,
            self.server.auth_token.clone(),
            cancellation_token,
        )
        .await;

        self.shutdown().await;
        served.context("callback server failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::snapshot::{AnalyticsSnapshot, SnapshotWriter};
    use crate::aggregator::tests::{batch, contract_call};
    use crate::aggregator::NoAmounts;
    use crate::predicates::{build_predicates, PredicateSettings};
    use mockito::{Matcher, Server};
    use shared::models::predicate::Network;
    use std::path::Path;
    use std::time::Duration;

    fn predicates() -> Vec<Predicate> {
        build_predicates(&PredicateSettings {
            contract_identifier: "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.nft-marketplace"
                .to_string(),
            external_base_url: "http://127.0.0.1:3000".to_string(),
            auth_token: "secret".to_string(),
            start_block: 0,
            network: Network::Testnet,
        })
    }

    fn observer(node_url: &str, snapshot_path: &Path, port: u16) -> ChainhookObserver {
        ChainhookObserver::new(
            ChainhookClient::new(node_url).unwrap(),
            predicates(),
            Aggregator::new(SnapshotWriter::new(snapshot_path), Box::new(NoAmounts)),
            ServerOptions {
                host: "127.0.0.1".to_string(),
                port,
                auth_token: "secret".to_string(),
            },
        )
    }

    fn read_snapshot(path: &Path) -> AnalyticsSnapshot {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_registers_all_predicates() {
        let mut node = Server::new_async().await;
        let ping = node.mock("GET", "/ping").with_status(200).create_async().await;
        let register = node
            .mock("POST", "/v1/chainhooks")
            .with_status(200)
            .expect(4)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let observer = observer(&node.url(), &dir.path().join("a.json"), 0);
        observer.register_predicates().await.unwrap();

        ping.assert_async().await;
        register.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_node_fails_startup() {
        let mut node = Server::new_async().await;
        let _ping = node.mock("GET", "/ping").with_status(503).create_async().await;
        let register = node
            .mock("POST", "/v1/chainhooks")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let observer = observer(&node.url(), &dir.path().join("a.json"), 0);
        assert!(observer.register_predicates().await.is_err());
        register.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_registration_removes_accepted_predicates() {
        let mut node = Server::new_async().await;
        let _ping = node.mock("GET", "/ping").with_status(200).create_async().await;
        let _listing = node
            .mock("POST", "/v1/chainhooks")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "name": "nft-listing-events" }),
            ))
            .with_status(200)
            .create_async()
            .await;
        let _rest = node
            .mock("POST", "/v1/chainhooks")
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let observer = observer(&node.url(), &dir.path().join("a.json"), 0);
        let listing_uuid = observer.predicates[0].uuid;
        let cleanup = node
            .mock(
                "DELETE",
                format!("/v1/chainhooks/stacks/{listing_uuid}").as_str(),
            )
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let err = observer.register_predicates().await.unwrap_err();
        assert!(err.to_string().contains("nft-sale-events"));
        cleanup.assert_async().await;
    }

    #[tokio::test]
    async fn test_shutdown_flushes_sales_and_deregisters() {
        let mut node = Server::new_async().await;
        let deregister = node
            .mock("DELETE", Matcher::Regex(r"^/v1/chainhooks/stacks/.+$".to_string()))
            .with_status(200)
            .expect(4)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics-data.json");
        let observer = observer(&node.url(), &path, 0);
        {
            let mut aggregator = observer.aggregator.lock().await;
            for n in 0..3u64 {
                aggregator.handle(
                    "sale",
                    &batch(n, vec![contract_call("ST1BUYER", &format!("0x{n}"), "buy-nft")]),
                );
            }
        }
        std::fs::remove_file(&path).unwrap();

        observer.shutdown().await;

        assert_eq!(read_snapshot(&path).total_sales, 3);
        deregister.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_serves_callbacks_until_cancelled() {
        let mut node = Server::new_async().await;
        let _ping = node.mock("GET", "/ping").with_status(200).create_async().await;
        let _register = node
            .mock("POST", "/v1/chainhooks")
            .with_status(200)
            .create_async()
            .await;
        let _deregister = node
            .mock("DELETE", Matcher::Regex(r"^/v1/chainhooks/stacks/.+$".to_string()))
            .with_status(200)
            .create_async()
            .await;

        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics-data.json");
        let cancellation_token = CancellationToken::new();
        let running = observer(&node.url(), &path, port).run(cancellation_token.clone());

        let deliver = async {
            let http = reqwest::Client::new();
            let callback = format!("http://127.0.0.1:{port}/chainhook/sale");
            let payload = batch(30, vec![contract_call("ST1BUYER", "0x30", "buy-nft")]);

            let mut delivered = false;
            for _ in 0..50 {
                match http
                    .post(&callback)
                    .bearer_auth("secret")
                    .json(&payload)
                    .send()
                    .await
                {
                    Ok(resp) => {
                        assert!(resp.status().is_success());
                        delivered = true;
                        break;
                    }
                    Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
                }
            }

            let unauthorized = http
                .post(&callback)
                .bearer_auth("wrong")
                .json(&payload)
                .send()
                .await
                .map(|resp| resp.status().as_u16());

            cancellation_token.cancel();
            (delivered, unauthorized)
        };

        let (result, (delivered, unauthorized)) = tokio::join!(running, deliver);
        result.unwrap();
        assert!(delivered, "callback server never came up");
        assert_eq!(unauthorized.unwrap(), 401);

        let snapshot = read_snapshot(&path);
        assert_eq!(snapshot.total_sales, 1);
        assert_eq!(snapshot.users, vec!["ST1BUYER"]);
    }
}
