//! Static asset delivery: scan, plan against the server, transfer.

pub mod planner;
pub mod scan;

pub use planner::{AssetSyncPlanner, SyncPlan, SyncReport};
pub use scan::{AssetFile, scan_assets};
