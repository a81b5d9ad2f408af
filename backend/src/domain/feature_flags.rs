//! Named feature toggles and the per-session flag set.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Flags the client knows how to gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureFlag {
    /// League tiers and leaderboards.
    Leagues,
    /// Team quests.
    Teams,
    /// Streak shields and XP boosts.
    PowerUps,
    /// Random reward drops after quest completion.
    SurpriseDrops,
    /// Streak milestone rewards.
    MilestoneRewards,
    /// Premium subscription surfaces and reminders.
    Premium,
}

impl FeatureFlag {
    /// Every known flag, in display order.
    pub const ALL: [Self; 6] = [
        Self::Leagues,
        Self::Teams,
        Self::PowerUps,
        Self::SurpriseDrops,
        Self::MilestoneRewards,
        Self::Premium,
    ];

    /// Name of the flag as stored by the platform.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Leagues => "enable_leagues",
            Self::Teams => "enable_teams",
            Self::PowerUps => "enable_power_ups",
            Self::SurpriseDrops => "enable_surprise_drops",
            Self::MilestoneRewards => "enable_milestone_rewards",
            Self::Premium => "enable_premium",
        }
    }
}

impl AsRef<str> for FeatureFlag {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for FeatureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mapping of flag name to enabled state for one session.
///
/// Lookups never fail: a name that is missing from the set is disabled.
///
/// # Examples
/// ```
/// use questline::domain::{FeatureFlag, FeatureFlagSet};
///
/// let flags = FeatureFlagSet::from_pairs([("enable_leagues", true)]);
/// assert!(flags.is_enabled(FeatureFlag::Leagues));
/// assert!(!flags.is_enabled("enable_teams"));
/// assert!(!flags.is_enabled("enable_something_new"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureFlagSet {
    flags: BTreeMap<String, bool>,
}

impl FeatureFlagSet {
    /// The fail-safe set: every known flag present and disabled.
    pub fn all_disabled() -> Self {
        let flags = FeatureFlag::ALL
            .iter()
            .map(|flag| (flag.name().to_owned(), false))
            .collect();
        Self { flags }
    }

    /// Build a set from fetched pairs layered over [`Self::all_disabled`].
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        let mut set = Self::all_disabled();
        for (name, enabled) in pairs {
            set.flags.insert(name.into(), enabled);
        }
        set
    }

    /// Whether `name` is switched on.
    pub fn is_enabled(&self, name: impl AsRef<str>) -> bool {
        self.flags.get(name.as_ref()).copied().unwrap_or(false)
    }

    /// Names of the enabled flags, sorted.
    pub fn enabled_names(&self) -> impl Iterator<Item = &str> {
        self.flags
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
    }

    /// Number of flags carried by the set.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether the set carries no flags at all.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl Default for FeatureFlagSet {
    fn default() -> Self {
        Self::all_disabled()
    }
}
