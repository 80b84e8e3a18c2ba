use serde::Serialize;

use super::Biotype;

/// Per-biotype counts for the dashboard view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiotypeSummary {
    pub biotype: Biotype,
    pub total: usize,
    pub available: usize,
    /// `(short_name, available)` in inventory order.
    pub devices: Vec<(String, bool)>,
}

/// All four groups, in biotype order, including empty ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub groups: Vec<BiotypeSummary>,
    pub verification_enabled: bool,
}

impl DeviceSummary {
    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.total).sum()
    }

    pub fn available(&self) -> usize {
        self.groups.iter().map(|g| g.available).sum()
    }
}
