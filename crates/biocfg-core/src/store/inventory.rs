// ── Device inventory ──
//
// The authoritative in-memory device set, grouped by biotype. State is
// an immutable snapshot behind a `watch` channel: readers clone the
// `Arc`, writers publish a new snapshot, subscribers get notified.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use strum::IntoEnumIterator;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::ServiceClient;
use crate::error::CoreError;
use crate::model::{BIOTYPE_COUNT, Biotype, DeviceId, DeviceRecord};
use crate::stream::InventoryStream;

/// Point-in-time view of the inventory: exactly four groups in biotype
/// order, each in service response order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    groups: [Vec<DeviceRecord>; BIOTYPE_COUNT],
}

impl InventorySnapshot {
    pub fn devices_of(&self, biotype: Biotype) -> &[DeviceRecord] {
        &self.groups[biotype.index()]
    }

    /// First record with the given short name in the biotype group.
    pub fn find_by_name(&self, biotype: Biotype, short_name: &str) -> Option<&DeviceRecord> {
        self.devices_of(biotype)
            .iter()
            .find(|d| d.short_name == short_name)
    }

    pub fn find_by_id(&self, id: DeviceId) -> Option<&DeviceRecord> {
        self.iter().find(|d| d.id == id)
    }

    /// All records, flattened in biotype order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.groups.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(Vec::is_empty)
    }

    fn find_by_name_mut(&mut self, biotype: Biotype, short_name: &str) -> Option<&mut DeviceRecord> {
        self.groups[biotype.index()]
            .iter_mut()
            .find(|d| d.short_name == short_name)
    }
}

/// Device inventory shared between the controller and presentation code.
pub struct DeviceInventory {
    snapshot: watch::Sender<Arc<InventorySnapshot>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for DeviceInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceInventory {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(InventorySnapshot::default()));
        let (last_refresh, _) = watch::channel(None);
        Self {
            snapshot,
            last_refresh,
        }
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch the full device list and rebuild all four groups from it.
    ///
    /// Returns the number of records placed. On failure the inventory is
    /// left empty and `ServiceUnavailable` is returned.
    pub async fn refresh(&self, service: &impl ServiceClient) -> Result<usize, CoreError> {
        let list = match service.fetch_device_list().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "device list fetch failed; clearing inventory");
                self.snapshot
                    .send_replace(Arc::new(InventorySnapshot::default()));
                return Err(match e {
                    e @ CoreError::ServiceUnavailable { .. } => e,
                    other => CoreError::ServiceUnavailable {
                        message: other.to_string(),
                    },
                });
            }
        };

        let reported = usize::try_from(list.count).unwrap_or(0);
        if reported != list.entries.len() {
            warn!(
                reported,
                received = list.entries.len(),
                "device count disagrees with entries"
            );
        }

        let mut next = InventorySnapshot::default();
        for entry in list.entries.iter().take(reported) {
            let Some(record) = entry.to_record() else {
                warn!(
                    id = entry.id,
                    name = %entry.short_name,
                    biotype = entry.biotype,
                    "skipping device with unknown biotype"
                );
                continue;
            };
            debug!(id = %record.id, name = %record.short_name, biotype = %record.biotype, "device");
            next.groups[record.biotype.index()].push(record);
        }

        let count = next.len();
        self.snapshot.send_replace(Arc::new(next));
        self.last_refresh.send_replace(Some(Utc::now()));
        info!(count, "inventory refreshed");
        Ok(count)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<InventorySnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn devices_of(&self, biotype: Biotype) -> Vec<DeviceRecord> {
        self.snapshot.borrow().devices_of(biotype).to_vec()
    }

    pub fn find_by_name(&self, biotype: Biotype, short_name: &str) -> Option<DeviceRecord> {
        self.snapshot
            .borrow()
            .find_by_name(biotype, short_name)
            .cloned()
    }

    pub fn find_by_id(&self, id: DeviceId) -> Option<DeviceRecord> {
        self.snapshot.borrow().find_by_id(id).cloned()
    }

    /// All records, flattened in biotype order.
    pub fn all(&self) -> Vec<DeviceRecord> {
        self.snapshot.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.borrow().is_empty()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// Biotypes in group order, paired with their current devices.
    pub fn groups(&self) -> Vec<(Biotype, Vec<DeviceRecord>)> {
        let snap = self.snapshot();
        Biotype::iter()
            .map(|b| (b, snap.devices_of(b).to_vec()))
            .collect()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Set a device's availability in place. No-op if the device is absent.
    pub fn set_availability(&self, biotype: Biotype, short_name: &str, value: i32) {
        let changed = self.snapshot.send_if_modified(|snap| {
            if snap.find_by_name(biotype, short_name).is_none() {
                return false;
            }
            if let Some(record) = Arc::make_mut(snap).find_by_name_mut(biotype, short_name) {
                record.available = value;
            }
            true
        });
        if changed {
            debug!(%biotype, name = short_name, value, "availability updated");
        } else {
            debug!(%biotype, name = short_name, "availability update for absent device ignored");
        }
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> InventoryStream {
        InventoryStream::new(self.snapshot.subscribe())
    }
}
