//! Device inventory and service synchronization for the biometric
//! authentication panel.
//!
//! This crate sits between `biocfg-api` and the CLI:
//!
//! - **[`DeviceInventory`]**: the in-memory device set, grouped by
//!   [`Biotype`]. Every mutation publishes an immutable
//!   [`InventorySnapshot`] on a `watch` channel; [`InventoryStream`] is the
//!   subscription handle presentation code redraws from.
//!
//! - **[`SyncController`]**: orchestrates user-triggered changes (toggle a
//!   device driver, restart the service, toggle verification) and enforces
//!   the restart / refresh / confirmation-poll protocol. Its collaborators
//!   are injected through the traits in [`backend`]; the D-Bus and
//!   helper-process implementations live in [`backend::system`].
//!
//! - **Domain model** ([`model`]): [`DeviceRecord`], [`Biotype`],
//!   [`ResultCode`], [`StatusResponse`], [`VerificationState`].
//!
//! Core never reads configuration files; the CLI builds a [`SyncConfig`]
//! and hands it in.

pub mod backend;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{
    ExitOutcome, PrivilegedRunner, RestartDecision, RestartPrompt, ServiceClient, ServiceManager,
};
pub use backend::system::{DbusService, FixedPrompt, HelperCommands, SystemdManager};
pub use config::{ApiVersion, HelperConfig, SyncConfig};
pub use controller::{ChangeOutcome, SyncController, SystemSyncController};
pub use error::CoreError;
pub use store::{DeviceInventory, InventorySnapshot};
pub use stream::InventoryStream;

pub use model::{
    BiotypeSummary, Biotype, DeviceId, DeviceList, DeviceRecord, DeviceSummary, RawDeviceEntry,
    ResultCode, StatusResponse, VerificationState,
};
