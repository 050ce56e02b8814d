//! Advisory messages surfaced for display
//!
//! Nothing that happens during a step is fatal. When a contribution has to
//! be skipped or trimmed, the step carries on and reports one of these.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Advisory {
    /// m-1 or more axes deactivated; nuking skipped this step
    TooManyAxesRemoved,
    /// Some deactivated axes were linear combinations of others
    RedundantAxesRemoved,
    /// The integrated projection was not finite; state was reset
    NonFiniteState,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyAxesRemoved => write!(f, "Error: too many axes removed"),
            Self::RedundantAxesRemoved => write!(f, "Note: redundant axes removed"),
            Self::NonFiniteState => write!(f, "Error: projection became non-finite, reset"),
        }
    }
}

/// Join advisories into the single display string shown under the plot.
pub fn message(advisories: &[Advisory]) -> String {
    advisories
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
