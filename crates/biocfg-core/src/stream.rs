// ── Reactive inventory stream ──
//
// Subscription handle for consuming inventory changes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::InventorySnapshot;

/// A subscription to the device inventory.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct InventoryStream {
    current: Arc<InventorySnapshot>,
    receiver: watch::Receiver<Arc<InventorySnapshot>>,
}

impl InventoryStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<InventorySnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<InventorySnapshot> {
        &self.current
    }

    /// Latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<InventorySnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the inventory has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<InventorySnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> InventoryWatchStream {
        InventoryWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a snapshot each time the inventory changes.
pub struct InventoryWatchStream {
    inner: WatchStream<Arc<InventorySnapshot>>,
}

impl Stream for InventoryWatchStream {
    type Item = Arc<InventorySnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
