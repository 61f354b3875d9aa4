//! Inbound Chainhook delivery payloads.
//!
//! Only the fields the listener reads are modelled; everything else the node
//! sends is ignored during deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Receipt event type emitted for Clarity `print` calls.
pub const SMART_CONTRACT_EVENT: &str = "SmartContractEvent";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChainhookPayload {
    #[serde(default)]
    pub apply: Option<Vec<Block>>,
    #[serde(default)]
    pub rollback: Option<Vec<Block>>,
    #[serde(default)]
    pub chainhook: Option<ChainhookInfo>,
}

impl ChainhookPayload {
    pub fn apply_blocks(&self) -> &[Block] {
        self.apply.as_deref().unwrap_or_default()
    }

    pub fn rollback_blocks(&self) -> &[Block] {
        self.rollback.as_deref().unwrap_or_default()
    }

    /// Predicate uuid that triggered this delivery, if the node included it.
    pub fn predicate_uuid(&self) -> Option<&str> {
        self.chainhook.as_ref().map(|info| info.uuid.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainhookInfo {
    pub uuid: String,
    #[serde(default)]
    pub is_streaming_blocks: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub block_identifier: BlockIdentifier,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockIdentifier {
    pub index: u64,
    #[serde(default)]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_identifier: TransactionIdentifier,
    pub metadata: TransactionMetadata,
}

impl Transaction {
    pub fn hash(&self) -> &str {
        &self.transaction_identifier.hash
    }

    pub fn sender(&self) -> &str {
        &self.metadata.sender
    }

    /// Name of the contract function this transaction invoked, if any.
    pub fn contract_call_method(&self) -> Option<&str> {
        self.metadata
            .kind
            .as_ref()?
            .data
            .as_ref()?
            .contract_call
            .as_ref()
            .map(|call| call.function_name.as_str())
    }

    pub fn receipt_events(&self) -> &[ReceiptEvent] {
        self.metadata
            .receipt
            .as_ref()
            .and_then(|receipt| receipt.events.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionIdentifier {
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionMetadata {
    pub sender: String,
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionKind {
    #[serde(default, rename = "type")]
    pub kind_type: Option<String>,
    #[serde(default)]
    pub data: Option<TransactionKindData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionKindData {
    #[serde(default)]
    pub contract_call: Option<ContractCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractCall {
    pub function_name: String,
    #[serde(default)]
    pub contract_identifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    #[serde(default)]
    pub events: Option<Vec<ReceiptEvent>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiptEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

impl ReceiptEvent {
    pub fn is_smart_contract_event(&self) -> bool {
        self.event_type == SMART_CONTRACT_EVENT
    }

    /// Whether the printed value contains `marker`. Non-string values are
    /// matched against their JSON text.
    pub fn value_contains(&self, marker: &str) -> bool {
        match self.data.get("value") {
            Some(Value::String(value)) => value.contains(marker),
            Some(Value::Null) | None => false,
            Some(other) => other.to_string().contains(marker),
        }
    }
}
