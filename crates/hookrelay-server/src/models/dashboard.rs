//! Dashboard DTOs - Receive statistics for the current user

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use hookrelay::domain::services::DashboardStats;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    pub total_webhooks: i64,
    pub active_webhooks: i64,
    pub today_requests: i64,
    pub yesterday_requests: i64,
    /// Percentage of 2xx responses over 7 days
    pub success_rate: f64,
    /// Mean handling time in ms over 7 days
    pub avg_response_time: i64,
    pub weekly_data: Vec<DayActivityResponse>,
    pub status_distribution: Vec<StatusSliceResponse>,
    pub recent_activity: Vec<RecentActivityResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DayActivityResponse {
    /// Weekday, e.g. "Mon"
    pub name: String,
    pub date: NaiveDate,
    pub requests: i64,
    pub success: i64,
    pub failed: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusSliceResponse {
    pub name: String,
    pub value: i64,
    pub color: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityResponse {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub method: String,
    pub success: bool,
    pub received_at: DateTime<Utc>,
    /// e.g. "5 minutes ago"
    pub time: String,
}

impl DashboardStatsResponse {
    pub fn from_domain(stats: DashboardStats) -> Self {
        Self {
            total_webhooks: stats.total_webhooks,
            active_webhooks: stats.active_webhooks,
            today_requests: stats.today_requests,
            yesterday_requests: stats.yesterday_requests,
            success_rate: stats.success_rate,
            avg_response_time: stats.avg_response_time,
            weekly_data: stats
                .weekly_data
                .into_iter()
                .map(|d| DayActivityResponse {
                    name: d.name,
                    date: d.date,
                    requests: d.requests,
                    success: d.success,
                    failed: d.failed,
                })
                .collect(),
            status_distribution: stats
                .status_distribution
                .into_iter()
                .map(|s| StatusSliceResponse {
                    name: s.name,
                    value: s.value,
                    color: s.color,
                })
                .collect(),
            recent_activity: stats
                .recent_activity
                .into_iter()
                .map(|a| RecentActivityResponse {
                    id: a.id,
                    name: a.name,
                    path: a.path,
                    method: a.method,
                    success: a.success,
                    received_at: a.received_at,
                    time: a.time,
                })
                .collect(),
        }
    }
}
