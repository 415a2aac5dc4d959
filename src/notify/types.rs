//! Notification settings and push subscription entity shapes.
//!
//! The settings wire format uses camelCase sub-objects (dailyReminders,
//! streakProtection, weeklySummary) — that is the contract the clients
//! already speak.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily reminder sub-schedule: an ordered set of `HH:mm` times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReminders {
    pub enabled: bool,
    pub times: Vec<String>,
}

/// Streak-protection sub-schedule: a single evening alert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakProtection {
    pub enabled: bool,
    /// `HH:mm`.
    pub alert_time: String,
}

/// Weekly-summary sub-schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub enabled: bool,
    /// Day of week, 0 = Sunday through 6 = Saturday.
    pub day: u8,
    /// `HH:mm`.
    pub time: String,
}

/// One settings document per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub user_id: String,
    /// Master switch; when false no sub-schedule fires.
    pub enabled: bool,
    #[serde(rename = "dailyReminders")]
    pub daily_reminders: DailyReminders,
    #[serde(rename = "streakProtection")]
    pub streak_protection: StreakProtection,
    #[serde(rename = "weeklySummary")]
    pub weekly_summary: WeeklySummary,
    /// Overrides the default daily-reminder body when set.
    #[serde(rename = "customMessage", skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationSettings {
    /// The defaults served to a user with no stored settings.
    pub fn defaults(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            enabled: false,
            daily_reminders: DailyReminders {
                enabled: false,
                times: vec!["09:00".to_string(), "18:00".to_string()],
            },
            streak_protection: StreakProtection {
                enabled: false,
                alert_time: "20:00".to_string(),
            },
            weekly_summary: WeeklySummary {
                enabled: false,
                day: 0,
                time: "09:00".to_string(),
            },
            custom_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Opaque device metadata attached to a push registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// The single live push token for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub user_id: String,
    pub fcm_token: String,
    #[serde(default)]
    pub device_info: DeviceInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
