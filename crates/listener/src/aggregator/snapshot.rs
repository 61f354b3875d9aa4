use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingRecord {
    pub seller: String,
    pub timestamp: String,
    pub txid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleRecord {
    pub buyer: String,
    pub timestamp: String,
    pub txid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferRecord {
    pub offerer: String,
    pub timestamp: String,
    pub txid: String,
}

/// Point-in-time view of the aggregate, as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub users: Vec<String>,
    pub total_volume: u64,
    pub total_sales: u64,
    pub platform_fees: u64,
    pub royalty_fees: u64,
    pub listings: Vec<ListingRecord>,
    pub sales: Vec<SaleRecord>,
    pub offers: Vec<OfferRecord>,
    pub timestamp: String,
    pub unique_users: usize,
}

/// Writes snapshots to a fixed path, replacing the previous file.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "analytics".to_string());
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }

    /// Serializes `snapshot` next to the target and renames it into place, so
    /// readers never observe a half-written file.
    pub fn write(&self, snapshot: &AnalyticsSnapshot) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(snapshot)?;
        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        info!(
            "📊 Analytics saved - Users: {}, Volume: {} uSTX, Sales: {}",
            snapshot.unique_users, snapshot.total_volume, snapshot.total_sales
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn snapshot() -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            users: vec!["ST1A".to_string(), "ST1B".to_string()],
            total_volume: 0,
            total_sales: 1,
            platform_fees: 0,
            royalty_fees: 0,
            listings: vec![ListingRecord {
                seller: "ST1A".to_string(),
                timestamp: "2024-01-01T00:00:00.000Z".to_string(),
                txid: "0x01".to_string(),
            }],
            sales: vec![SaleRecord {
                buyer: "ST1B".to_string(),
                timestamp: "2024-01-01T00:00:01.000Z".to_string(),
                txid: "0x02".to_string(),
                price: None,
            }],
            offers: vec![],
            timestamp: "2024-01-01T00:00:02.000Z".to_string(),
            unique_users: 2,
        }
    }

    #[test]
    fn test_snapshot_uses_camel_case_keys() {
        let value = serde_json::to_value(snapshot()).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        for key in [
            "users",
            "totalVolume",
            "totalSales",
            "platformFees",
            "royaltyFees",
            "listings",
            "sales",
            "offers",
            "timestamp",
            "uniqueUsers",
        ] {
            assert!(keys.contains(&key.to_string()), "missing key {key}");
        }
        assert_eq!(keys.len(), 10);
        assert!(value["sales"][0].get("price").is_none());
    }

    #[test]
    fn test_write_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics-data.json");
        fs::write(&path, "stale contents that are not json").unwrap();

        let writer = SnapshotWriter::new(&path);
        writer.write(&snapshot()).unwrap();

        let written: AnalyticsSnapshot =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, snapshot());
        assert!(!writer.temp_path().exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out").join("analytics.json");

        SnapshotWriter::new(&path).write(&snapshot()).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["uniqueUsers"], 2);
        assert!(value["users"].is_array());
    }
}
