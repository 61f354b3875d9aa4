//! Running marketplace analytics built from Chainhook deliveries.
//!
//! The aggregate only grows: lists are append-only and counters never go
//! down. Rollback blocks are reported but not reconciled.

pub mod extractor;
pub mod snapshot;

use chrono::{SecondsFormat, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use shared::models::payload::{ChainhookPayload, Transaction};
use std::collections::HashSet;
use std::io;

use crate::predicates::{BUY_METHOD, LIST_METHOD, OFFER_METHOD, PLATFORM_FEE_MARKER};
pub use extractor::{AmountExtractor, NoAmounts};
use snapshot::{AnalyticsSnapshot, ListingRecord, OfferRecord, SaleRecord, SnapshotWriter};

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Default, Clone)]
struct AnalyticsState {
    users: Vec<String>,
    seen_users: HashSet<String>,
    total_volume: u64,
    total_sales: u64,
    platform_fees: u64,
    royalty_fees: u64,
    listings: Vec<ListingRecord>,
    sales: Vec<SaleRecord>,
    offers: Vec<OfferRecord>,
}

impl AnalyticsState {
    fn record_user(&mut self, sender: &str) -> bool {
        if self.seen_users.insert(sender.to_string()) {
            self.users.push(sender.to_string());
            return true;
        }
        false
    }
}

/// What a single delivery contributed to the aggregate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub blocks: usize,
    pub transactions: usize,
    pub new_users: usize,
    pub listings: usize,
    pub sales: usize,
    pub offers: usize,
    pub fee_events: usize,
    pub rollback_blocks: usize,
}

pub struct Aggregator {
    state: AnalyticsState,
    writer: SnapshotWriter,
    extractor: Box<dyn AmountExtractor>,
}

impl Aggregator {
    pub fn new(writer: SnapshotWriter, extractor: Box<dyn AmountExtractor>) -> Self {
        Self {
            state: AnalyticsState::default(),
            writer,
            extractor,
        }
    }

    pub fn unique_users(&self) -> usize {
        self.state.users.len()
    }

    pub fn total_sales(&self) -> u64 {
        self.state.total_sales
    }

    /// Applies one delivery and persists the result when it carried any
    /// forward blocks. Persistence failures are logged, never returned: the
    /// batch counts as handled either way.
    pub fn handle(&mut self, batch_id: &str, payload: &ChainhookPayload) -> BatchSummary {
        info!("🔔 Event received: {batch_id}");

        let summary = self.apply(payload);
        if summary.rollback_blocks > 0 {
            warn!(
                "Batch {batch_id} carries {} rollback block(s); rollbacks are not applied to analytics",
                summary.rollback_blocks
            );
        }

        if summary.blocks > 0 {
            if let Err(e) = self.persist() {
                error!(
                    "Failed to save analytics to {}: {e}",
                    self.writer.path().display()
                );
            }
        }

        summary
    }

    fn apply(&mut self, payload: &ChainhookPayload) -> BatchSummary {
        let mut summary = BatchSummary {
            rollback_blocks: payload.rollback_blocks().len(),
            ..Default::default()
        };

        for block in payload.apply_blocks() {
            info!("📦 Block {}", block.block_identifier.index);
            summary.blocks += 1;

            for tx in &block.transactions {
                summary.transactions += 1;
                if self.state.record_user(tx.sender()) {
                    summary.new_users += 1;
                }
                self.apply_contract_call(tx, &mut summary);
                self.apply_fee_events(tx, &mut summary);
            }
        }

        summary
    }

    fn apply_contract_call(&mut self, tx: &Transaction, summary: &mut BatchSummary) {
        let Some(method) = tx.contract_call_method() else {
            return;
        };
        let sender = tx.sender();
        info!("  → {sender} called {method}");

        match method {
            LIST_METHOD => {
                self.state.listings.push(ListingRecord {
                    seller: sender.to_string(),
                    timestamp: iso_now(),
                    txid: tx.hash().to_string(),
                });
                summary.listings += 1;
            }
            BUY_METHOD => {
                let price = self.extractor.sale_amount(tx);
                if let Some(amount) = price {
                    self.state.total_volume = self.state.total_volume.saturating_add(amount);
                }
                self.state.sales.push(SaleRecord {
                    buyer: sender.to_string(),
                    timestamp: iso_now(),
                    txid: tx.hash().to_string(),
                    price,
                });
                self.state.total_sales += 1;
                summary.sales += 1;
            }
            OFFER_METHOD => {
                self.state.offers.push(OfferRecord {
                    offerer: sender.to_string(),
                    timestamp: iso_now(),
                    txid: tx.hash().to_string(),
                });
                summary.offers += 1;
            }
            other => debug!("Ignoring call to {other}"),
        }
    }

    fn apply_fee_events(&mut self, tx: &Transaction, summary: &mut BatchSummary) {
        for event in tx.receipt_events() {
            if !event.is_smart_contract_event() || !event.value_contains(PLATFORM_FEE_MARKER) {
                continue;
            }
            info!("  💰 Platform fee collected in {}", tx.hash());
            summary.fee_events += 1;

            if let Some(fee) = self.extractor.platform_fee(event) {
                self.state.platform_fees = self.state.platform_fees.saturating_add(fee);
            }
            if let Some(royalty) = self.extractor.royalty_fee(event) {
                self.state.royalty_fees = self.state.royalty_fees.saturating_add(royalty);
            }
        }
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            users: self.state.users.clone(),
            total_volume: self.state.total_volume,
            total_sales: self.state.total_sales,
            platform_fees: self.state.platform_fees,
            royalty_fees: self.state.royalty_fees,
            listings: self.state.listings.clone(),
            sales: self.state.sales.clone(),
            offers: self.state.offers.clone(),
            timestamp: iso_now(),
            unique_users: self.state.users.len(),
        }
    }

    /// Writes the current aggregate to the snapshot file.
    pub fn persist(&self) -> io::Result<AnalyticsSnapshot> {
        let snapshot = self.snapshot();
        self.writer.write(&snapshot)?;
        Ok(snapshot)
    }
}
