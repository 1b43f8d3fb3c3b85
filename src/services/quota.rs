//! Daily Quota Tracker
//!
//! Two independent per-day budgets (general fact-checks and YouTube
//! fact-checks) persisted in the local storage scope. The day rolls over
//! eagerly: the first read on a new calendar day writes the reset back before
//! answering.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::models::response::LimitInfo;
use crate::storage::{KeyValueStore, Scope};
use crate::utils::error::AppResult;

pub const DAILY_REQUEST_LIMIT: u64 = 20;
pub const DAILY_YOUTUBE_LIMIT: u64 = 5;

/// Source of today's calendar-day key.
pub trait Clock: Send + Sync {
    /// Day key in local time, e.g. "Sat Oct 17 2026"
    fn today_key(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today_key(&self) -> String {
        chrono::Local::now().format("%a %b %d %Y").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaClass {
    General,
    YouTube,
}

impl QuotaClass {
    pub fn limit(&self) -> u64 {
        match self {
            QuotaClass::General => DAILY_REQUEST_LIMIT,
            QuotaClass::YouTube => DAILY_YOUTUBE_LIMIT,
        }
    }

    fn count_key(&self) -> &'static str {
        match self {
            QuotaClass::General => "dailyRequestCount",
            QuotaClass::YouTube => "dailyYouTubeCount",
        }
    }

    fn date_key(&self) -> &'static str {
        match self {
            QuotaClass::General => "lastRequestDate",
            QuotaClass::YouTube => "lastYouTubeDate",
        }
    }

    /// Message shown when the budget is spent.
    pub fn exhausted_message(&self, used: u64) -> String {
        match self {
            QuotaClass::General => format!(
                "Daily limit reached. You've used {}/{} requests today. Please try again tomorrow.",
                used,
                self.limit()
            ),
            QuotaClass::YouTube => format!(
                "Daily YouTube limit reached. You've used {}/{} video fact-checks today. Please try again tomorrow.",
                used,
                self.limit()
            ),
        }
    }
}

/// Result of a limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub class: QuotaClass,
    pub allowed: bool,
    pub remaining: u64,
    pub used: u64,
}

impl From<QuotaStatus> for LimitInfo {
    fn from(status: QuotaStatus) -> Self {
        LimitInfo {
            can_make_request: status.allowed,
            remaining_requests: status.remaining,
            total_requests: status.used,
        }
    }
}

pub struct QuotaTracker {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    general: Mutex<()>,
    youtube: Mutex<()>,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            general: Mutex::new(()),
            youtube: Mutex::new(()),
        }
    }

    fn lock_for(&self, class: QuotaClass) -> &Mutex<()> {
        match class {
            QuotaClass::General => &self.general,
            QuotaClass::YouTube => &self.youtube,
        }
    }

    /// Read today's count, resetting the stored pair on a new day.
    /// Callers must hold the class lock.
    async fn current_count(&self, class: QuotaClass, today: &str) -> AppResult<u64> {
        let stored = self
            .store
            .get_many(Scope::Local, &[class.count_key(), class.date_key()])
            .await?;

        let last_date = stored.get(class.date_key()).and_then(Value::as_str);
        if last_date != Some(today) {
            tracing::debug!(?class, today, "quota day rolled over");
            self.write(class, 0, today).await?;
            return Ok(0);
        }

        Ok(stored
            .get(class.count_key())
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    async fn write(&self, class: QuotaClass, count: u64, today: &str) -> AppResult<()> {
        let mut values = Map::new();
        values.insert(class.count_key().into(), Value::from(count));
        values.insert(class.date_key().into(), Value::from(today));
        self.store.set_many(Scope::Local, values).await
    }

    pub async fn check_limit(&self, class: QuotaClass) -> AppResult<QuotaStatus> {
        let _guard = self.lock_for(class).lock().await;
        let today = self.clock.today_key();
        let used = self.current_count(class, &today).await?;
        let limit = class.limit();

        Ok(QuotaStatus {
            class,
            allowed: used < limit,
            remaining: limit.saturating_sub(used),
            used,
        })
    }

    /// Record one successful request; returns the new count.
    pub async fn increment(&self, class: QuotaClass) -> AppResult<u64> {
        let _guard = self.lock_for(class).lock().await;
        let today = self.clock.today_key();
        let next = self.current_count(class, &today).await? + 1;
        self.write(class, next, &today).await?;
        tracing::debug!(?class, count = next, "quota incremented");
        Ok(next)
    }
}
