//! Console access levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Privilege required to run a dispatcher's commands.
///
/// Levels are ordered: `Operator < Programmer < Administrator`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Operator,
    Programmer,
    Administrator,
}

impl AccessLevel {
    /// Whether a session at this level may use something that requires `required`.
    pub fn permits(self, required: AccessLevel) -> bool {
        self >= required
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Operator => "Operator",
            Self::Programmer => "Programmer",
            Self::Administrator => "Administrator",
        };
        f.write_str(name)
    }
}
