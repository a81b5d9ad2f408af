//! Test utilities for the questline crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests or
//! when the `test-support` feature is enabled.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::NotificationSink;
use crate::domain::{Notification, Sleeper};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex poisoned"),
    }
}

/// Clock whose time only moves when a test says so.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *lock(&self.0, "clock") += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.0, "clock") = now;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl Sleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0, "sleeper").clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0, "sleeper").push(duration);
    }
}

/// Notification sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingNotificationSink(Mutex<Vec<Notification>>);

impl RecordingNotificationSink {
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.0, "notifications").clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|notification| notification.title)
            .collect()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, notification: Notification) {
        lock(&self.0, "notifications").push(notification);
    }
}

pub mod device_store {
    //! Temporary on-disk device stores.

    use std::io;

    use tempfile::TempDir;

    use crate::outbound::device_store::DeviceFileStore;

    /// Open a [`DeviceFileStore`] in a fresh temporary directory.
    ///
    /// Keep the returned [`TempDir`] alive for as long as the store is used.
    pub fn temp_device_store() -> io::Result<(TempDir, DeviceFileStore)> {
        let dir = tempfile::tempdir()?;
        let store = DeviceFileStore::open(dir.path(), "device_store.json")?;
        Ok((dir, store))
    }
}
