//! Active-hours window and daily quota gates

use autoseo_core::ScheduleConfig;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Weekday};
use std::time::Duration;

/// Longest the loop sleeps while outside active hours
pub const OFF_HOURS_POLL: Duration = Duration::from_secs(60);

/// Longest the loop sleeps once the daily quota is used up
pub const QUOTA_POLL: Duration = Duration::from_secs(3600);

/// Whether `now` falls inside the configured working window
pub fn is_active<Tz: TimeZone>(config: &ScheduleConfig, now: &DateTime<Tz>) -> bool {
    if config.exclude_weekends && matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let hour = now.hour();
    hour >= config.active_start_hour && hour < config.active_end_hour
}

/// Time until the top of the next hour, capped at [`OFF_HOURS_POLL`]
pub fn off_hours_wait<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let into_hour = now.minute() as u64 * 60 + now.second() as u64;
    Duration::from_secs(3600 - into_hour).min(OFF_HOURS_POLL)
}

/// Time until local midnight, capped at [`QUOTA_POLL`]
pub fn quota_wait<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let into_day = now.num_seconds_from_midnight() as u64;
    Duration::from_secs(86_400 - into_day).min(QUOTA_POLL)
}

/// Items processed per calendar day
#[derive(Debug, Clone, Default)]
pub struct DailyQuota {
    limit: u32,
    day: Option<NaiveDate>,
    used: u32,
}

impl DailyQuota {
    /// `limit == 0` disables the quota
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            day: None,
            used: 0,
        }
    }

    fn roll(&mut self, today: NaiveDate) {
        if self.day != Some(today) {
            self.day = Some(today);
            self.used = 0;
        }
    }

    pub fn is_exhausted(&mut self, today: NaiveDate) -> bool {
        self.roll(today);
        self.limit > 0 && self.used >= self.limit
    }

    pub fn record(&mut self, today: NaiveDate) {
        self.roll(today);
        self.used += 1;
    }

    pub fn used(&self) -> u32 {
        self.used
    }
}
