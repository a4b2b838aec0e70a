//! Override registries: "who wins" resolution for layouts and UI slots.
//!
//! Two behaviorally distinct registries share the removal-by-source idea:
//!
//! - [`SingleWinnerRegistry`] picks one winning candidate per id by source
//!   rank (`plugin > theme > core`), used for layout resolution.
//! - [`MultiOccupancyRegistry`] accumulates every registered component per
//!   slot for simultaneous rendering, removing by owning extension only on
//!   deactivation.

pub mod single_winner;
pub mod slots;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use single_winner::{OverrideEntry, SingleWinnerRegistry};
pub use slots::{MultiOccupancyRegistry, SlotEntry};

/// Rank of a registration source. The derived `Ord` gives the override
/// chain: core defaults, themes customize, plugins take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRank {
    /// Host-provided default implementation.
    Core,
    /// Contributed by the active theme.
    Theme,
    /// Contributed by a plugin.
    Plugin,
}

impl SourceRank {
    /// Returns the string form used in logs and serialized manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Theme => "theme",
            Self::Plugin => "plugin",
        }
    }
}

impl fmt::Display for SourceRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
