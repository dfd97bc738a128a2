use serde::{Deserialize, Serialize};
use std::fmt;

/// Walker steps that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    OpenCategory,
    ListJurisdictions,
    SelectJurisdiction,
    TriggerPrint,
    EnterFrame,
    AwaitTable,
    Extract,
    Merge,
    CloseDialogs,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OpenCategory => "open category",
            Self::ListJurisdictions => "list jurisdictions",
            Self::SelectJurisdiction => "select jurisdiction",
            Self::TriggerPrint => "trigger print preview",
            Self::EnterFrame => "enter print frame",
            Self::AwaitTable => "await results table",
            Self::Extract => "extract table",
            Self::Merge => "merge rows",
            Self::CloseDialogs => "close dialogs",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    NotFound,
    Timeout,
    Intercepted,
    Script,
    SessionLost,
    /// The table was read but could not be parsed.
    Malformed,
    Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Keep going with the next step of the same pair.
    Proceed,
    SkipPair,
    SkipCategory,
    AbortRun,
}

pub fn decide(step: Step, kind: FaultKind) -> Disposition {
    if kind == FaultKind::SessionLost {
        return Disposition::AbortRun;
    }
    match step {
        Step::OpenCategory | Step::ListJurisdictions => Disposition::SkipCategory,
        Step::SelectJurisdiction | Step::TriggerPrint | Step::Merge => Disposition::SkipPair,
        Step::EnterFrame | Step::AwaitTable | Step::Extract | Step::CloseDialogs => {
            Disposition::Proceed
        }
    }
}
