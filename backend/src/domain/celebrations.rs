//! One-off milestone celebrations, remembered per device.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError, NotificationSink};
use crate::domain::{Notification, NotificationKind, UserId};

/// A celebration that plays once per device per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Celebration {
    /// First badge earned.
    FirstBadge,
    /// Level two reached.
    Level2,
    /// Seven-day streak reached.
    Streak7,
}

impl Celebration {
    /// Notification shown for this celebration.
    pub fn notification(self) -> Notification {
        let (title, message) = match self {
            Self::FirstBadge => ("First Badge!", "You earned your very first badge."),
            Self::Level2 => ("Level 2!", "You levelled up. New quests are unlocked."),
            Self::Streak7 => ("7-Day Streak!", "A whole week of quests. Keep it going!"),
        };
        Notification::new(NotificationKind::Celebration, title, message)
    }
}

/// Progress figures the celebrations are triggered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserProgress {
    /// Badges earned so far.
    pub badges: u32,
    /// Current level.
    pub level: u32,
    /// Current streak in days.
    pub streak: u32,
}

/// Which celebrations this device has already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MilestoneCelebrationState {
    /// First badge celebration shown.
    pub first_badge: bool,
    /// Level two celebration shown.
    pub level2: bool,
    /// Seven-day streak celebration shown.
    pub streak7: bool,
}

impl MilestoneCelebrationState {
    fn mark(&mut self, progress: &UserProgress) -> Vec<Celebration> {
        let mut due = Vec::new();
        if progress.badges >= 1 && !self.first_badge {
            self.first_badge = true;
            due.push(Celebration::FirstBadge);
        }
        if progress.level >= 2 && !self.level2 {
            self.level2 = true;
            due.push(Celebration::Level2);
        }
        if progress.streak >= 7 && !self.streak7 {
            self.streak7 = true;
            due.push(Celebration::Streak7);
        }
        due
    }
}

fn storage_key(user_id: &UserId) -> String {
    format!("milestone_celebrations:{user_id}")
}

/// Decides which celebrations are due and remembers them.
pub struct CelebrationTracker {
    store: Arc<dyn KeyValueStore>,
    notifications: Arc<dyn NotificationSink>,
}

impl CelebrationTracker {
    /// Build a tracker over the device store.
    pub fn new(store: Arc<dyn KeyValueStore>, notifications: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Celebrations due for `progress`, marked as shown.
    ///
    /// Returns nothing when the device store cannot be read or written, so a
    /// broken store never replays celebrations.
    pub fn pending(&self, user_id: &UserId, progress: &UserProgress) -> Vec<Celebration> {
        match self.try_pending(user_id, progress) {
            Ok(due) => due,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "celebration state unavailable");
                Vec::new()
            }
        }
    }

    /// Show every due celebration and return them.
    pub fn celebrate(&self, user_id: &UserId, progress: &UserProgress) -> Vec<Celebration> {
        let due = self.pending(user_id, progress);
        for celebration in &due {
            self.notifications.notify(celebration.notification());
        }
        due
    }

    fn try_pending(
        &self,
        user_id: &UserId,
        progress: &UserProgress,
    ) -> Result<Vec<Celebration>, KeyValueStoreError> {
        let key = storage_key(user_id);
        let mut state = match self.store.get(&key)? {
            Some(raw) => serde_json::from_str::<MilestoneCelebrationState>(&raw)
                .map_err(|err| KeyValueStoreError::corrupt(key.as_str(), err.to_string()))?,
            None => MilestoneCelebrationState::default(),
        };
        let due = state.mark(progress);
        if !due.is_empty() {
            let encoded = serde_json::to_string(&state)
                .map_err(|err| KeyValueStoreError::corrupt(key.as_str(), err.to_string()))?;
            self.store.set(&key, &encoded)?;
        }
        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{InMemoryKeyValueStore, MockKeyValueStore};
    use crate::test_support::RecordingNotificationSink;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> Arc<InMemoryKeyValueStore> {
        Arc::new(InMemoryKeyValueStore::new())
    }

    fn progress(badges: u32, level: u32, streak: u32) -> UserProgress {
        UserProgress {
            badges,
            level,
            streak,
        }
    }

    #[rstest]
    fn each_celebration_plays_once(store: Arc<InMemoryKeyValueStore>) {
        let sink = Arc::new(RecordingNotificationSink::default());
        let tracker = CelebrationTracker::new(store.clone(), sink.clone());
        let user = UserId::random();

        let first = tracker.celebrate(&user, &progress(1, 1, 3));
        let second = tracker.celebrate(&user, &progress(2, 2, 7));
        let third = tracker.celebrate(&user, &progress(5, 4, 12));

        assert_eq!(first, vec![Celebration::FirstBadge]);
        assert_eq!(second, vec![Celebration::Level2, Celebration::Streak7]);
        assert!(third.is_empty());
        assert_eq!(
            sink.titles(),
            vec!["First Badge!", "Level 2!", "7-Day Streak!"]
        );
    }

    #[rstest]
    fn state_is_scoped_per_user(store: Arc<InMemoryKeyValueStore>) {
        let tracker = CelebrationTracker::new(store.clone(), Arc::new(RecordingNotificationSink::default()));
        let alice = UserId::random();
        let bob = UserId::random();

        assert_eq!(tracker.pending(&alice, &progress(1, 0, 0)).len(), 1);
        assert_eq!(tracker.pending(&bob, &progress(1, 0, 0)).len(), 1);
        let stored = store
            .get(&storage_key(&alice))
            .expect("read")
            .expect("state stored");
        assert_eq!(stored, r#"{"firstBadge":true,"level2":false,"streak7":false}"#);
    }

    #[rstest]
    fn corrupt_state_suppresses_celebrations(store: Arc<InMemoryKeyValueStore>) {
        let user = UserId::random();
        store.set(&storage_key(&user), "{not json").expect("seed");
        let tracker = CelebrationTracker::new(store, Arc::new(RecordingNotificationSink::default()));

        assert!(tracker.pending(&user, &progress(3, 3, 30)).is_empty());
    }

    #[rstest]
    fn failed_write_suppresses_celebrations() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .times(1)
            .returning(|_, _| Err(KeyValueStoreError::io("disk full")));
        let sink = Arc::new(RecordingNotificationSink::default());
        let tracker = CelebrationTracker::new(Arc::new(store), sink.clone());

        assert!(tracker.celebrate(&UserId::random(), &progress(1, 2, 7)).is_empty());
        assert!(sink.notifications().is_empty());
    }

    #[rstest]
    fn partial_state_from_older_builds_is_accepted(store: Arc<InMemoryKeyValueStore>) {
        let user = UserId::random();
        store
            .set(&storage_key(&user), r#"{"firstBadge":true}"#)
            .expect("seed");
        let tracker = CelebrationTracker::new(store, Arc::new(RecordingNotificationSink::default()));

        assert_eq!(
            tracker.pending(&user, &progress(1, 2, 0)),
            vec![Celebration::Level2]
        );
    }
}
