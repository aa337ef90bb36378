//! The five-level priority scale shared by components and messages.

use std::fmt;

/// Delivery priority.
///
/// Used twice by the broker: a component's priority orders *who* is
/// served first within a batch, and a message's priority orders *which*
/// of that component's queued messages it sees first. `Highest` is
/// served first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    /// Served before everything else.
    Highest = 0,
    /// Above normal.
    Higher = 1,
    /// The default level.
    #[default]
    Normal = 2,
    /// Below normal.
    Lower = 3,
    /// Served last.
    Lowest = 4,
}

impl Priority {
    /// Number of priority levels.
    pub const COUNT: usize = 5;

    /// All levels in service order, highest first.
    pub const ALL: [Priority; Priority::COUNT] = [
        Priority::Highest,
        Priority::Higher,
        Priority::Normal,
        Priority::Lower,
        Priority::Lowest,
    ];

    /// Array index of this level; `0` is served first.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`index`](Self::index).
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Priority::Highest),
            1 => Some(Priority::Higher),
            2 => Some(Priority::Normal),
            3 => Some(Priority::Lower),
            4 => Some(Priority::Lowest),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Highest => "highest",
            Priority::Higher => "higher",
            Priority::Normal => "normal",
            Priority::Lower => "lower",
            Priority::Lowest => "lowest",
        };
        f.write_str(name)
    }
}
