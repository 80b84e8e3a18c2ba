// ── Reactive device storage ──

mod inventory;

pub use inventory::{DeviceInventory, InventorySnapshot};
