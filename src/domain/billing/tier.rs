//! Plan tier definitions.
//!
//! Represents the subscription plan levels a subscriber can purchase.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Subscription plan tier.
///
/// Tiers are totally ordered by [`PlanTier::rank`]; a webhook-driven
/// activation never moves a subscriber to a lower rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Default tier for subscribers who never purchased.
    Free,

    /// Entry paid tier.
    Starter,

    /// Full paid tier.
    Professional,

    /// Organisation tier.
    Enterprise,
}

impl PlanTier {
    /// Wire/storage name of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Starter => "starter",
            PlanTier::Professional => "professional",
            PlanTier::Enterprise => "enterprise",
        }
    }

    /// Returns the display name for this tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanTier::Free => "Free",
            PlanTier::Starter => "Starter",
            PlanTier::Professional => "Professional",
            PlanTier::Enterprise => "Enterprise",
        }
    }

    /// Returns the numeric rank of this tier for comparison.
    ///
    /// Higher rank = more features. Used for the no-downgrade policy.
    pub fn rank(&self) -> u8 {
        match self {
            PlanTier::Free => 0,
            PlanTier::Starter => 1,
            PlanTier::Professional => 2,
            PlanTier::Enterprise => 3,
        }
    }

    /// Returns true if `self` ranks strictly above `other`.
    pub fn dominates(&self, other: &PlanTier) -> bool {
        self.rank() > other.rank()
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Error returned when a tier name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan tier: {0}")]
pub struct UnknownPlanTier(pub String);

impl FromStr for PlanTier {
    type Err = UnknownPlanTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanTier::Free),
            "starter" => Ok(PlanTier::Starter),
            "professional" => Ok(PlanTier::Professional),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(UnknownPlanTier(other.to_string())),
        }
    }
}
