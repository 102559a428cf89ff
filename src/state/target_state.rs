/// Target state definitions for the retry protocol
use std::fmt;

/// Represents where a failed target is in the retry protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    /// Waiting for retry round `n + 1`; `Pending(0)` means the main pass failed
    Pending(u32),

    /// A retry attempt succeeded and its record was merged into the report
    Succeeded,

    /// The retry rounds ran out (or the run was cancelled) while the target still failed
    Failed,
}

impl TargetState {
    /// Returns true if no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }

    /// Returns true if the target is waiting for a retry round
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// The round the target last failed in, if it is still pending
    pub fn round(&self) -> Option<u32> {
        match self {
            Self::Pending(round) => Some(*round),
            _ => None,
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(round) => write!(f, "pending({})", round),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
        }
    }
}
