use std::path::Path;

use anyhow::{Context, Result};
use time::{format_description::well_known, OffsetDateTime};
use tokio::sync::RwLock;

use crate::types::DeviceSnapshot;

/// Single-slot holder of the most recent completed snapshot.
///
/// Many readers, one writer at a time: reads clone the current value, a
/// finishing job swaps in the whole replacement. Failed and cancelled scans
/// never touch the slot.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    slot: RwLock<DeviceSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published snapshot; the default empty one until a scan has
    /// completed.
    pub async fn current(&self) -> DeviceSnapshot {
        self.slot.read().await.clone()
    }

    /// Replace the snapshot atomically. Devices are ordered by address
    /// before the swap so every reader sees the same stable order.
    pub async fn publish(&self, mut snapshot: DeviceSnapshot) {
        snapshot.devices.sort_by_key(|d| u32::from(d.ip));
        let mut guard = self.slot.write().await;
        *guard = snapshot;
    }
}

/// RFC 3339 UTC timestamp for snapshot metadata.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// Write the snapshot as pretty-printed JSON, overwriting any previous file.
pub fn save_snapshot(path: &Path, snapshot: &DeviceSnapshot) -> Result<()> {
    let f = std::fs::File::create(path)
        .with_context(|| format!("failed to create snapshot file: {}", path.display()))?;
    serde_json::to_writer_pretty(f, snapshot).context("failed to serialize snapshot")?;
    Ok(())
}
