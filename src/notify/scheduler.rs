//! Notification scheduling and dispatch.
//!
//! `schedule_times` computes the distinct wall-clock instants at which any
//! user wants a notification, so an external trigger can fire exactly once
//! per distinct time instead of polling every minute. `dispatch_for_time`
//! runs at (or near) one of those instants: it matches users against the
//! target time across the three reminder categories, batches identical
//! messages into multicast sends, and purges tokens the delivery service
//! reports as dead.
//!
//! All wall-clock reasoning is in server-local naive time; callers pass the
//! current instant explicitly so the logic stays deterministic under test.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::Serialize;

use super::push::{PushDelivery, PushMessage, SendOutcome};
use super::store::{SettingsStore, SubscriptionStore};
use super::types::NotificationSettings;
use crate::dates;
use crate::error::ApiResult;
use crate::stats;
use crate::tracker::store::ChantingRecordStore;

/// Dispatch tolerates this much trigger jitter around the target minute.
const GUARD_WINDOW_SECS: i64 = 60;

pub const DAILY_TITLE: &str = "🕉️ Chanting Reminder";
pub const DAILY_BODY: &str =
    "It's time for your daily chanting practice! 🙏 Let's continue your spiritual journey.";
pub const STREAK_TITLE: &str = "🔥 Streak Protection Alert";
pub const STREAK_BODY: &str = "Your streak is about to end! Chant now to keep it going! 🙏";
pub const WEEKLY_TITLE: &str = "📊 Weekly Progress Summary";

/// Counters reported by a dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchCounters {
    pub success_count: u64,
    /// Qualifying (user, token) pairs before batching.
    pub total_attempted: u64,
    pub invalid_tokens_removed: u64,
}

/// Compute the sorted set of upcoming trigger instants.
///
/// Collects every enabled `HH:mm` trigger across all users' settings,
/// deduplicated, and maps each to today's instant when it has not yet
/// passed, otherwise tomorrow's. One entry per distinct time of day, no
/// matter how many users share it.
pub fn schedule_times(
    settings: &[NotificationSettings],
    now: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    let mut clock_strings: BTreeSet<String> = BTreeSet::new();

    for setting in settings {
        if setting.daily_reminders.enabled {
            clock_strings.extend(setting.daily_reminders.times.iter().cloned());
        }
        if setting.streak_protection.enabled {
            clock_strings.insert(setting.streak_protection.alert_time.clone());
        }
        if setting.weekly_summary.enabled {
            clock_strings.insert(setting.weekly_summary.time.clone());
        }
    }

    let mut instants: Vec<NaiveDateTime> = clock_strings
        .iter()
        .filter_map(|clock| {
            // Stored times are validated on input; skip anything unparseable.
            let time = dates::parse_clock(clock).ok()?;
            let today = now.date().and_time(time);
            Some(if today < now {
                today + Duration::days(1)
            } else {
                today
            })
        })
        .collect();
    instants.sort();
    instants
}

/// Dispatch notifications for one `HH:mm` target time.
///
/// A no-op (all counters zero) when the invocation instant is more than 60
/// seconds from the target — that absorbs trigger jitter and double fires
/// near the minute boundary. A failure in one delivery group is logged and
/// does not stop the remaining groups.
pub async fn dispatch_for_time(
    settings: &SettingsStore,
    subscriptions: &SubscriptionStore,
    records: &ChantingRecordStore,
    push: &dyn PushDelivery,
    time: &str,
    now: NaiveDateTime,
) -> ApiResult<DispatchCounters> {
    let target_clock = dates::parse_clock(time)?;
    let target = now.date().and_time(target_clock);

    let drift = (now - target).num_seconds().abs();
    if drift > GUARD_WINDOW_SECS {
        tracing::info!(time, drift_secs = drift, "Outside dispatch window, skipping");
        return Ok(DispatchCounters::default());
    }

    let time = dates::normalize_clock(time)?;
    let today = now.date();
    let today_str = dates::day_string(today);
    let weekday = now.date().weekday().num_days_from_sunday();

    // Collect qualifying (token, message) candidates. A user may qualify in
    // more than one category at the same time; each category emits its own
    // message.
    let mut candidates: Vec<(String, PushMessage)> = Vec::new();

    for setting in settings.enabled_settings() {
        let Some(token) = subscriptions.token_for(&setting.user_id) else {
            continue;
        };

        if setting.daily_reminders.enabled && setting.daily_reminders.times.contains(&time) {
            let body = setting
                .custom_message
                .clone()
                .unwrap_or_else(|| DAILY_BODY.to_string());
            candidates.push((
                token.clone(),
                PushMessage {
                    title: DAILY_TITLE.to_string(),
                    body,
                },
            ));
        }

        if setting.streak_protection.enabled
            && setting.streak_protection.alert_time == time
            && !records.has_activity_on(&setting.user_id, &today_str)
        {
            candidates.push((
                token.clone(),
                PushMessage {
                    title: STREAK_TITLE.to_string(),
                    body: STREAK_BODY.to_string(),
                },
            ));
        }

        if setting.weekly_summary.enabled
            && setting.weekly_summary.time == time
            && u32::from(setting.weekly_summary.day) == weekday
        {
            let week_start = dates::day_string(dates::week_start(today));
            let week_total: u64 = records
                .in_range(&setting.user_id, &week_start, &today_str)
                .iter()
                .map(|r| r.chant_count)
                .sum();
            let streak = stats::streak(&records.daily_totals(&setting.user_id), today);

            candidates.push((
                token.clone(),
                PushMessage {
                    title: WEEKLY_TITLE.to_string(),
                    body: weekly_summary_body(week_total, streak),
                },
            ));
        }
    }

    let mut counters = DispatchCounters {
        total_attempted: candidates.len() as u64,
        ..DispatchCounters::default()
    };
    if candidates.is_empty() {
        return Ok(counters);
    }

    // Batch by identical message content: one multicast per shared message.
    let mut groups: HashMap<PushMessage, Vec<String>> = HashMap::new();
    for (token, message) in candidates {
        groups.entry(message).or_default().push(token);
    }

    let mut invalid_tokens: HashSet<String> = HashSet::new();

    for (message, tokens) in groups {
        if let [token] = tokens.as_slice() {
            match push.send(token, &message).await {
                Ok(SendOutcome::Delivered) => counters.success_count += 1,
                Ok(SendOutcome::InvalidToken) => {
                    invalid_tokens.insert(token.clone());
                }
                Ok(SendOutcome::Failed(reason)) => {
                    tracing::warn!(reason, "Push send failed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Push send errored, continuing with next group");
                }
            }
        } else {
            match push.send_multicast(&tokens, &message).await {
                Ok(outcomes) => {
                    for (token, outcome) in tokens.iter().zip(outcomes) {
                        match outcome {
                            SendOutcome::Delivered => counters.success_count += 1,
                            SendOutcome::InvalidToken => {
                                invalid_tokens.insert(token.clone());
                            }
                            SendOutcome::Failed(reason) => {
                                tracing::warn!(reason, "Push send failed within multicast");
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Multicast errored, continuing with next group");
                }
            }
        }
    }

    counters.invalid_tokens_removed = subscriptions.remove_tokens(&invalid_tokens) as u64;

    tracing::info!(
        time = %time,
        success = counters.success_count,
        attempted = counters.total_attempted,
        purged = counters.invalid_tokens_removed,
        "Dispatch complete"
    );
    Ok(counters)
}

/// Weekly summary body from the week-to-date total and current streak.
pub fn weekly_summary_body(week_total: u64, streak: u32) -> String {
    format!(
        "Great week! You chanted {} times and maintained a {streak}-day streak! Keep up the amazing work! 🙏",
        format_count(week_total)
    )
}

/// Render a count with thousands separators (4200 → "4,200").
fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::notify::push::PushError;
    use crate::notify::types::DeviceInfo;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use std::sync::Mutex;

    // ── Test Doubles ─────────────────────────────────────────────────────

    #[derive(Default)]
    struct MockPush {
        single_calls: Mutex<Vec<(String, PushMessage)>>,
        multicast_calls: Mutex<Vec<(Vec<String>, PushMessage)>>,
        invalid_tokens: HashSet<String>,
        /// Message titles whose delivery group errors at transport level.
        failing_titles: HashSet<String>,
    }

    impl MockPush {
        fn outcome_for(&self, token: &str) -> SendOutcome {
            if self.invalid_tokens.contains(token) {
                SendOutcome::InvalidToken
            } else {
                SendOutcome::Delivered
            }
        }

        fn single_count(&self) -> usize {
            self.single_calls.lock().unwrap().len()
        }

        fn multicast_count(&self) -> usize {
            self.multicast_calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PushDelivery for MockPush {
        async fn send(
            &self,
            token: &str,
            message: &PushMessage,
        ) -> Result<SendOutcome, PushError> {
            if self.failing_titles.contains(&message.title) {
                return Err(PushError::Transport("connection refused".to_string()));
            }
            self.single_calls
                .lock()
                .unwrap()
                .push((token.to_string(), message.clone()));
            Ok(self.outcome_for(token))
        }

        async fn send_multicast(
            &self,
            tokens: &[String],
            message: &PushMessage,
        ) -> Result<Vec<SendOutcome>, PushError> {
            if self.failing_titles.contains(&message.title) {
                return Err(PushError::Transport("connection refused".to_string()));
            }
            self.multicast_calls
                .lock()
                .unwrap()
                .push((tokens.to_vec(), message.clone()));
            Ok(tokens.iter().map(|t| self.outcome_for(t)).collect())
        }
    }

    fn at(date: &str, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn daily_user(user_id: &str, times: &[&str]) -> NotificationSettings {
        let mut settings = NotificationSettings::defaults(user_id, Utc::now());
        settings.enabled = true;
        settings.daily_reminders.enabled = true;
        settings.daily_reminders.times = times.iter().map(|t| t.to_string()).collect();
        settings
    }

    struct Fixture {
        settings: SettingsStore,
        subscriptions: SubscriptionStore,
        records: ChantingRecordStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                settings: SettingsStore::new(None),
                subscriptions: SubscriptionStore::new(None),
                records: ChantingRecordStore::new(None),
            }
        }

        fn add_user(&self, settings: NotificationSettings, token: Option<&str>) {
            if let Some(token) = token {
                self.subscriptions.register(
                    &settings.user_id,
                    token,
                    DeviceInfo::default(),
                    Utc::now(),
                );
            }
            self.settings.upsert(settings, Utc::now());
        }

        async fn dispatch(
            &self,
            push: &MockPush,
            time: &str,
            now: NaiveDateTime,
        ) -> DispatchCounters {
            dispatch_for_time(
                &self.settings,
                &self.subscriptions,
                &self.records,
                push,
                time,
                now,
            )
            .await
            .unwrap()
        }
    }

    // ── schedule_times ───────────────────────────────────────────────────

    #[test]
    fn test_schedule_dedupes_shared_times() {
        let settings: Vec<NotificationSettings> = (0..50)
            .map(|i| daily_user(&format!("u{i}"), &["08:00"]))
            .collect();

        let now = at("2024-01-10", 6, 0, 0);
        let instants = schedule_times(&settings, now);
        assert_eq!(instants, vec![at("2024-01-10", 8, 0, 0)]);
    }

    #[test]
    fn test_schedule_rolls_past_times_to_tomorrow() {
        let settings = vec![daily_user("u1", &["06:00", "21:00"])];
        let now = at("2024-01-10", 12, 0, 0);

        let instants = schedule_times(&settings, now);
        // 21:00 is still ahead today; 06:00 has passed and lands tomorrow.
        assert_eq!(
            instants,
            vec![at("2024-01-10", 21, 0, 0), at("2024-01-11", 6, 0, 0)]
        );
    }

    #[test]
    fn test_schedule_collects_all_three_categories() {
        let mut settings = daily_user("u1", &["08:00"]);
        settings.streak_protection.enabled = true;
        settings.streak_protection.alert_time = "20:00".to_string();
        settings.weekly_summary.enabled = true;
        settings.weekly_summary.time = "10:00".to_string();

        let now = at("2024-01-10", 0, 0, 0);
        assert_eq!(schedule_times(&[settings], now).len(), 3);
    }

    #[test]
    fn test_schedule_ignores_disabled_sub_schedules() {
        let mut settings = daily_user("u1", &["08:00"]);
        settings.daily_reminders.enabled = false;

        let now = at("2024-01-10", 0, 0, 0);
        assert!(schedule_times(&[settings], now).is_empty());
    }

    // ── dispatch_for_time ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_guard_window_rejects_large_drift() {
        let fixture = Fixture::new();
        fixture.add_user(daily_user("u1", &["08:00"]), Some("token-1"));
        let push = MockPush::default();

        // 150 seconds past the target: no-op.
        let counters = fixture
            .dispatch(&push, "08:00", at("2024-01-10", 8, 2, 30))
            .await;
        assert_eq!(counters, DispatchCounters::default());
        assert_eq!(push.single_count() + push.multicast_count(), 0);
    }

    #[tokio::test]
    async fn test_guard_window_accepts_small_drift() {
        let fixture = Fixture::new();
        fixture.add_user(daily_user("u1", &["08:00"]), Some("token-1"));
        let push = MockPush::default();

        let counters = fixture
            .dispatch(&push, "08:00", at("2024-01-10", 8, 0, 45))
            .await;
        assert_eq!(counters.total_attempted, 1);
        assert_eq!(counters.success_count, 1);
        assert_eq!(push.single_count(), 1);
    }

    #[tokio::test]
    async fn test_shared_message_becomes_one_multicast() {
        let fixture = Fixture::new();
        fixture.add_user(daily_user("u1", &["08:00"]), Some("token-1"));
        fixture.add_user(daily_user("u2", &["08:00"]), Some("token-2"));
        fixture.add_user(daily_user("u3", &["08:00"]), Some("token-3"));
        let push = MockPush::default();

        let counters = fixture
            .dispatch(&push, "08:00", at("2024-01-10", 8, 0, 0))
            .await;
        assert_eq!(counters.total_attempted, 3);
        assert_eq!(counters.success_count, 3);
        assert_eq!(push.multicast_count(), 1);
        assert_eq!(push.single_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_message_splits_into_own_group() {
        let fixture = Fixture::new();
        fixture.add_user(daily_user("u1", &["08:00"]), Some("token-1"));
        fixture.add_user(daily_user("u2", &["08:00"]), Some("token-2"));
        let mut custom = daily_user("u3", &["08:00"]);
        custom.custom_message = Some("Rise and chant, devotee!".to_string());
        fixture.add_user(custom, Some("token-3"));
        let push = MockPush::default();

        let counters = fixture
            .dispatch(&push, "08:00", at("2024-01-10", 8, 0, 0))
            .await;
        assert_eq!(counters.success_count, 3);
        // Two default-message users share a multicast; the custom one goes alone.
        assert_eq!(push.multicast_count(), 1);
        assert_eq!(push.single_count(), 1);
    }

    #[tokio::test]
    async fn test_users_without_token_are_skipped() {
        let fixture = Fixture::new();
        fixture.add_user(daily_user("u1", &["08:00"]), None);
        let push = MockPush::default();

        let counters = fixture
            .dispatch(&push, "08:00", at("2024-01-10", 8, 0, 0))
            .await;
        assert_eq!(counters.total_attempted, 0);
        assert_eq!(push.single_count() + push.multicast_count(), 0);
    }

    #[tokio::test]
    async fn test_streak_alert_only_when_not_chanted_today() {
        let fixture = Fixture::new();

        let mut quiet = NotificationSettings::defaults("quiet", Utc::now());
        quiet.enabled = true;
        quiet.streak_protection.enabled = true;
        quiet.streak_protection.alert_time = "20:00".to_string();
        fixture.add_user(quiet, Some("token-quiet"));

        let mut diligent = NotificationSettings::defaults("diligent", Utc::now());
        diligent.enabled = true;
        diligent.streak_protection.enabled = true;
        diligent.streak_protection.alert_time = "20:00".to_string();
        fixture.add_user(diligent, Some("token-diligent"));
        fixture
            .records
            .upsert("diligent", "m1", "2024-01-10", 108, Utc::now());

        let push = MockPush::default();
        let counters = fixture
            .dispatch(&push, "20:00", at("2024-01-10", 20, 0, 0))
            .await;

        assert_eq!(counters.total_attempted, 1);
        let calls = push.single_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "token-quiet");
        assert_eq!(calls[0].1.title, STREAK_TITLE);
    }

    #[tokio::test]
    async fn test_weekly_summary_fires_on_matching_day_and_contains_numbers() {
        let fixture = Fixture::new();

        // 2024-01-07 is a Sunday (day 0).
        let mut settings = NotificationSettings::defaults("u1", Utc::now());
        settings.enabled = true;
        settings.weekly_summary.enabled = true;
        settings.weekly_summary.day = 0;
        settings.weekly_summary.time = "09:00".to_string();
        fixture.add_user(settings, Some("token-1"));

        // Week-to-date total 4200 (on the Sunday itself) and a 12-day streak.
        fixture
            .records
            .upsert("u1", "m1", "2024-01-07", 4200, Utc::now());
        for i in 1..12 {
            let day = dates::day_string(
                NaiveDate::from_ymd_opt(2024, 1, 7).unwrap() - Duration::days(i),
            );
            fixture.records.upsert("u1", "m1", &day, 16, Utc::now());
        }

        let push = MockPush::default();
        let counters = fixture
            .dispatch(&push, "09:00", at("2024-01-07", 9, 0, 0))
            .await;
        assert_eq!(counters.success_count, 1);

        let calls = push.single_calls.lock().unwrap();
        assert_eq!(calls[0].1.title, WEEKLY_TITLE);
        assert!(calls[0].1.body.contains("4,200"));
        assert!(calls[0].1.body.contains("12-day streak"));
    }

    #[tokio::test]
    async fn test_weekly_summary_skipped_on_wrong_day() {
        let fixture = Fixture::new();
        // 2024-01-10 is a Wednesday (day 3); settings ask for Sunday.
        let mut settings = NotificationSettings::defaults("u1", Utc::now());
        settings.enabled = true;
        settings.weekly_summary.enabled = true;
        settings.weekly_summary.day = 0;
        settings.weekly_summary.time = "09:00".to_string();
        fixture.add_user(settings, Some("token-1"));

        let push = MockPush::default();
        let counters = fixture
            .dispatch(&push, "09:00", at("2024-01-10", 9, 0, 0))
            .await;
        assert_eq!(counters.total_attempted, 0);
    }

    #[tokio::test]
    async fn test_coinciding_categories_emit_independent_messages() {
        let fixture = Fixture::new();
        // Daily reminder and streak alert both at 20:00, user has not chanted.
        let mut settings = daily_user("u1", &["20:00"]);
        settings.streak_protection.enabled = true;
        settings.streak_protection.alert_time = "20:00".to_string();
        fixture.add_user(settings, Some("token-1"));

        let push = MockPush::default();
        let counters = fixture
            .dispatch(&push, "20:00", at("2024-01-10", 20, 0, 0))
            .await;
        assert_eq!(counters.total_attempted, 2);
        assert_eq!(counters.success_count, 2);
        assert_eq!(push.single_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_tokens_are_purged() {
        let fixture = Fixture::new();
        fixture.add_user(daily_user("u1", &["08:00"]), Some("token-dead"));
        fixture.add_user(daily_user("u2", &["08:00"]), Some("token-live"));

        let push = MockPush {
            invalid_tokens: ["token-dead".to_string()].into_iter().collect(),
            ..MockPush::default()
        };

        let counters = fixture
            .dispatch(&push, "08:00", at("2024-01-10", 8, 0, 0))
            .await;
        assert_eq!(counters.success_count, 1);
        assert_eq!(counters.invalid_tokens_removed, 1);
        assert!(fixture.subscriptions.token_for("u1").is_none());
        assert!(fixture.subscriptions.token_for("u2").is_some());
    }

    #[tokio::test]
    async fn test_group_failure_does_not_abort_other_groups() {
        let fixture = Fixture::new();
        fixture.add_user(daily_user("u1", &["20:00"]), Some("token-1"));

        let mut streak_user = NotificationSettings::defaults("u2", Utc::now());
        streak_user.enabled = true;
        streak_user.streak_protection.enabled = true;
        streak_user.streak_protection.alert_time = "20:00".to_string();
        fixture.add_user(streak_user, Some("token-2"));

        // The streak-alert group errors at transport level; the daily group
        // must still be delivered.
        let push = MockPush {
            failing_titles: [STREAK_TITLE.to_string()].into_iter().collect(),
            ..MockPush::default()
        };

        let counters = fixture
            .dispatch(&push, "20:00", at("2024-01-10", 20, 0, 0))
            .await;
        assert_eq!(counters.total_attempted, 2);
        assert_eq!(counters.success_count, 1);
    }

    #[tokio::test]
    async fn test_bad_time_string_is_a_validation_error() {
        let fixture = Fixture::new();
        let push = MockPush::default();
        let result = dispatch_for_time(
            &fixture.settings,
            &fixture.subscriptions,
            &fixture.records,
            &push,
            "8am",
            at("2024-01-10", 8, 0, 0),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    // ── formatting ───────────────────────────────────────────────────────

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(4200), "4,200");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_weekly_summary_body() {
        let body = weekly_summary_body(4200, 12);
        assert!(body.contains("4,200"));
        assert!(body.contains("12-day streak"));
    }
}
