// Shared scalar types and constants for the economic simulation

use std::fmt;

/// Index of a monthly reward interval (0..num_intervals)
pub type Interval = usize;

/// Serial number of a node, unique within one interval
pub type NodeSerial = usize;

/// Token amounts are modelled as real numbers
pub type Token = f64;

pub const SECONDS_PER_MONTH: f64 = 3600.0 * 24.0 * 30.0;

/// One sampling decision per hour of a 30-day interval
pub const EPOCHS_PER_MONTH: usize = 30 * 24;

/// Packets per second of loop cover traffic every mix emits, even without users
pub const DUMMY_PACKETS_PER_SECOND: f64 = 4000.0;

/// Absolute tolerance for the pool + circulating + unvested == total check
pub const CONSERVATION_TOLERANCE: Token = 0.5;

// ============================================================================
// Size classes
// ============================================================================

/// How a candidate node's pledge was chosen during population generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// Pledge equals the stake saturation threshold
    Saturated,

    /// Pledge equals the configured minimum pledge
    Minimum,

    /// Minimum pledge plus a heavy-tailed random excess
    RandomPledge,
}

impl SizeClass {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Saturated => "SAT",
            Self::Minimum => "MIN",
            Self::RandomPledge => "RND",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Role of a node during a single epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochRole {
    Active,
    Reserve,
    Unselected,
}
