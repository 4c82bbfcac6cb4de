//! Dashboard aggregation
//!
//! Folds per-day log statistics and the newest log entries into the
//! numbers shown on the dashboard. Days are UTC calendar days.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{DailyLogStats, WebhookLogEntry};
use crate::domain::value_objects::WebhookCounts;

/// Number of days covered by the weekly figures
pub const WINDOW_DAYS: i64 = 7;
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

const SUCCESS_COLOR: &str = "#22c55e";
const FAILED_COLOR: &str = "#ef4444";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_webhooks: i64,
    pub active_webhooks: i64,
    pub today_requests: i64,
    pub yesterday_requests: i64,
    /// Percentage of 2xx responses, one decimal
    pub success_rate: f64,
    /// Mean handling time in ms
    pub avg_response_time: i64,
    pub weekly_data: Vec<DayActivity>,
    pub status_distribution: Vec<StatusSlice>,
    pub recent_activity: Vec<RecentActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayActivity {
    /// Short weekday name
    pub name: String,
    pub date: NaiveDate,
    pub requests: i64,
    pub success: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSlice {
    pub name: String,
    pub value: i64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub method: String,
    pub success: bool,
    pub received_at: DateTime<Utc>,
    /// Relative label, e.g. "5 minutes ago"
    pub time: String,
}

/// Build dashboard figures
///
/// `daily` may contain any days; only the seven ending today are used.
/// `recent` is expected newest first.
pub fn summarize(
    now: DateTime<Utc>,
    counts: WebhookCounts,
    daily: &[DailyLogStats],
    recent: &[WebhookLogEntry],
) -> DashboardStats {
    let today = now.date_naive();
    let first_day = today - Duration::days(WINDOW_DAYS - 1);

    let for_day = |day: NaiveDate| daily.iter().find(|d| d.day == day);

    let weekly_data: Vec<DayActivity> = (0..WINDOW_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let (requests, success) = for_day(date).map_or((0, 0), |d| (d.total, d.success));
            DayActivity {
                name: date.format("%a").to_string(),
                date,
                requests,
                success,
                failed: requests - success,
            }
        })
        .collect();

    let in_window = daily.iter().filter(|d| d.day >= first_day && d.day <= today);
    let (total, success, weighted) = in_window.fold((0i64, 0i64, 0f64), |acc, d| {
        (
            acc.0 + d.total,
            acc.1 + d.success,
            acc.2 + d.avg_duration_ms * d.total as f64,
        )
    });

    let success_rate = if total == 0 {
        100.0
    } else {
        (success as f64 * 1000.0 / total as f64).round() / 10.0
    };
    let avg_response_time = if total == 0 {
        0
    } else {
        (weighted / total as f64).round() as i64
    };

    let day_total = |day: NaiveDate| for_day(day).map_or(0, |d| d.total);

    DashboardStats {
        total_webhooks: counts.total,
        active_webhooks: counts.active,
        today_requests: day_total(today),
        yesterday_requests: day_total(today - Duration::days(1)),
        success_rate,
        avg_response_time,
        weekly_data,
        status_distribution: vec![
            StatusSlice {
                name: "success".to_string(),
                value: success,
                color: SUCCESS_COLOR.to_string(),
            },
            StatusSlice {
                name: "failed".to_string(),
                value: total - success,
                color: FAILED_COLOR.to_string(),
            },
        ],
        recent_activity: recent
            .iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(|entry| RecentActivity {
                id: entry.log.id,
                name: entry.webhook_name.clone(),
                path: entry.webhook_path.clone(),
                method: entry.log.method.clone(),
                success: entry.log.is_success(),
                received_at: entry.log.received_at,
                time: relative_time(now, entry.log.received_at),
            })
            .collect(),
    }
}

/// Human label for how long ago `then` was
pub fn relative_time(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let (count, unit) = if elapsed < Duration::minutes(1) {
        return "just now".to_string();
    } else if elapsed < Duration::hours(1) {
        (elapsed.num_minutes(), "minute")
    } else if elapsed < Duration::days(1) {
        (elapsed.num_hours(), "hour")
    } else {
        (elapsed.num_days(), "day")
    };
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} {unit}{plural} ago")
}
