use crate::policy::{Disposition, Step};
use serde::{Deserialize, Serialize};

/// Where the walker is in the category × jurisdiction cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkState {
    Idle,
    CategorySelected,
    JurisdictionSelected,
    PrintTriggered,
    TableVisible,
    Extracted,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultReport {
    pub step: Step,
    pub disposition: Disposition,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairReport {
    pub category: String,
    pub jurisdiction: String,
    /// Last state reached for this pair.
    pub reached: WalkState,
    pub rows: usize,
    pub faults: Vec<FaultReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedCategory {
    pub category: String,
    pub fault: FaultReport,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub categories_walked: Vec<String>,
    pub skipped_categories: Vec<SkippedCategory>,
    pub pairs: Vec<PairReport>,
    #[serde(default)]
    pub aborted: Option<FaultReport>,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.pairs.iter().map(|p| p.rows).sum()
    }

    pub fn visited(&self) -> Vec<(&str, &str)> {
        self.pairs
            .iter()
            .map(|p| (p.category.as_str(), p.jurisdiction.as_str()))
            .collect()
    }
}
