//! League tiers, leaderboards and rank lookup.
//!
//! Ordering is the platform's responsibility. The client only locates the
//! current user in the list it was given.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use futures_util::TryFutureExt;
use mockable::Clock;
use serde::{Deserialize, Serialize};

use crate::domain::ports::LeagueRepository;
use crate::domain::{UserId, safe_call};

/// Name of a league tier, e.g. `bronze` or `diamond`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueTier(String);

impl LeagueTier {
    /// Wrap a tier name as sent by the platform.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the tier name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeagueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Competitor.
    pub user_id: UserId,
    /// Public display name.
    pub display_name: String,
    /// XP earned in the scoring period.
    pub weekly_xp: u64,
}

/// 1-based position of `user_id` in a leaderboard, or `None` when absent.
///
/// The first matching row wins.
///
/// # Examples
/// ```
/// use questline::domain::{LeaderboardEntry, UserId, compute_rank};
///
/// let me = UserId::random();
/// let board = vec![
///     LeaderboardEntry { user_id: UserId::random(), display_name: "ana".into(), weekly_xp: 900 },
///     LeaderboardEntry { user_id: me.clone(), display_name: "me".into(), weekly_xp: 400 },
/// ];
/// assert_eq!(compute_rank(&board, &me), Some(2));
/// assert_eq!(compute_rank(&board, &UserId::random()), None);
/// ```
pub fn compute_rank(leaderboard: &[LeaderboardEntry], user_id: &UserId) -> Option<usize> {
    leaderboard
        .iter()
        .position(|entry| &entry.user_id == user_id)
        .map(|index| index + 1)
}

/// Start of the scoring period containing `now`: Monday 00:00 UTC.
pub fn scoring_period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - Duration::days(days_since_monday);
    monday.and_time(NaiveTime::MIN).and_utc()
}

/// A user's place in their league.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueStanding {
    /// Tier the user competes in.
    pub tier: LeagueTier,
    /// 1-based rank, `None` when the user is not on the board yet.
    pub rank: Option<usize>,
    /// Number of competitors on the board.
    pub competitors: usize,
    /// Start of the scoring period the board covers.
    pub period_start: DateTime<Utc>,
}

/// Fetches tier and leaderboard and derives the user's rank.
pub struct LeagueStandings {
    repository: Arc<dyn LeagueRepository>,
    clock: Arc<dyn Clock>,
}

impl LeagueStandings {
    /// Build the lookup.
    pub fn new(repository: Arc<dyn LeagueRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Current standing of `user_id`, or `None` when the user has no tier or
    /// the platform could not be read.
    pub async fn standing(&self, user_id: &UserId) -> Option<LeagueStanding> {
        let tier = safe_call("load_league_tier", self.repository.league_tier(user_id), None).await?;
        let period_start = scoring_period_start(self.clock.utc());
        let leaderboard = safe_call(
            "load_leaderboard",
            self.repository.leaderboard(&tier, period_start).map_ok(Some),
            None,
        )
        .await?;
        Some(LeagueStanding {
            rank: compute_rank(&leaderboard, user_id),
            competitors: leaderboard.len(),
            tier,
            period_start,
        })
    }
}
