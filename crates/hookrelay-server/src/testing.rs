//! In-memory port implementations for service and route tests

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use hookrelay::{
    DailyLogStats, DomainError, ForwardConfig, ForwardRequest, ForwardResult, Forwarder, Page,
    User, UserRepository, Webhook, WebhookCounts, WebhookFilter, WebhookLog, WebhookLogEntry,
    WebhookLogRepository, WebhookRepository,
};

use crate::application::{AuthService, HookService, LogService, WebhookService};
use crate::auth::JwtKeys;
use crate::AppState;

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(DomainError::Conflict("Username already exists".into()));
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, DomainError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryWebhooks {
    webhooks: Mutex<Vec<Webhook>>,
}

impl InMemoryWebhooks {
    fn get(&self, id: Uuid) -> Option<Webhook> {
        let webhooks = self.webhooks.lock().unwrap();
        webhooks.iter().find(|w| w.id == id).cloned()
    }
}

#[async_trait]
impl WebhookRepository for InMemoryWebhooks {
    async fn find_by_id_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Webhook>, DomainError> {
        Ok(self.get(id).filter(|w| w.user_id == user_id))
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<Webhook>, DomainError> {
        let webhooks = self.webhooks.lock().unwrap();
        Ok(webhooks.iter().find(|w| w.path == path).cloned())
    }

    async fn list(
        &self,
        user_id: Uuid,
        filter: &WebhookFilter,
    ) -> Result<Page<Webhook>, DomainError> {
        let webhooks = self.webhooks.lock().unwrap();
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matching: Vec<Webhook> = webhooks
            .iter()
            .filter(|w| w.user_id == user_id)
            .filter(|w| {
                search
                    .as_ref()
                    .map_or(true, |s| w.name.to_lowercase().contains(s))
            })
            .filter(|w| filter.is_active.map_or(true, |active| w.is_active == active))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();
        Ok(Page {
            items,
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }

    async fn save(&self, webhook: &Webhook) -> Result<Webhook, DomainError> {
        let mut webhooks = self.webhooks.lock().unwrap();
        if webhooks
            .iter()
            .any(|w| w.path == webhook.path && w.id != webhook.id)
        {
            return Err(DomainError::Conflict("Webhook path already exists".into()));
        }
        match webhooks.iter_mut().find(|w| w.id == webhook.id) {
            Some(existing) => *existing = webhook.clone(),
            None => webhooks.push(webhook.clone()),
        }
        Ok(webhook.clone())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let mut webhooks = self.webhooks.lock().unwrap();
        let before = webhooks.len();
        webhooks.retain(|w| !(w.id == id && w.user_id == user_id));
        Ok(webhooks.len() < before)
    }

    async fn counts(&self, user_id: Uuid) -> Result<WebhookCounts, DomainError> {
        let webhooks = self.webhooks.lock().unwrap();
        let owned: Vec<&Webhook> = webhooks.iter().filter(|w| w.user_id == user_id).collect();
        Ok(WebhookCounts {
            total: owned.len() as i64,
            active: owned.iter().filter(|w| w.is_active).count() as i64,
        })
    }
}

/// Log store that resolves ownership through the webhook store
pub struct InMemoryLogs {
    logs: Mutex<Vec<WebhookLog>>,
    webhooks: Arc<InMemoryWebhooks>,
}

impl InMemoryLogs {
    pub fn new(webhooks: Arc<InMemoryWebhooks>) -> Self {
        Self {
            logs: Mutex::new(Vec::new()),
            webhooks,
        }
    }

    pub fn len(&self) -> usize {
        self.logs.lock().unwrap().len()
    }

    fn owned_by(&self, log: &WebhookLog, user_id: Uuid) -> Option<Webhook> {
        self.webhooks
            .get(log.webhook_id)
            .filter(|w| w.user_id == user_id)
    }

    fn newest_first(&self) -> Vec<WebhookLog> {
        let mut logs = self.logs.lock().unwrap().clone();
        logs.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        logs
    }
}

#[async_trait]
impl WebhookLogRepository for InMemoryLogs {
    async fn create(&self, log: &WebhookLog) -> Result<WebhookLog, DomainError> {
        self.logs.lock().unwrap().push(log.clone());
        Ok(log.clone())
    }

    async fn list_for_webhook(
        &self,
        webhook_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WebhookLog>, DomainError> {
        Ok(self
            .newest_first()
            .into_iter()
            .filter(|l| l.webhook_id == webhook_id)
            .take(limit as usize)
            .collect())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WebhookLogEntry>, DomainError> {
        Ok(self
            .newest_first()
            .into_iter()
            .filter_map(|log| {
                self.owned_by(&log, user_id).map(|w| WebhookLogEntry {
                    log,
                    webhook_name: w.name,
                    webhook_path: w.path,
                })
            })
            .take(limit as usize)
            .collect())
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        Ok(self.delete_many_for_user(&[id], user_id).await? > 0)
    }

    async fn delete_many_for_user(
        &self,
        ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<u64, DomainError> {
        let doomed: Vec<Uuid> = self
            .newest_first()
            .into_iter()
            .filter(|l| ids.contains(&l.id) && self.owned_by(l, user_id).is_some())
            .map(|l| l.id)
            .collect();
        self.logs.lock().unwrap().retain(|l| !doomed.contains(&l.id));
        Ok(doomed.len() as u64)
    }

    async fn delete_for_webhook(&self, webhook_id: Uuid) -> Result<u64, DomainError> {
        let mut logs = self.logs.lock().unwrap();
        let before = logs.len();
        logs.retain(|l| l.webhook_id != webhook_id);
        Ok((before - logs.len()) as u64)
    }

    async fn delete_before(
        &self,
        user_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let ids: Vec<Uuid> = self
            .newest_first()
            .into_iter()
            .filter(|l| l.received_at < before)
            .map(|l| l.id)
            .collect();
        self.delete_many_for_user(&ids, user_id).await
    }

    async fn daily_stats(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyLogStats>, DomainError> {
        let mut days: BTreeMap<NaiveDate, (i64, i64, i64)> = BTreeMap::new();
        for log in self.newest_first() {
            let day = log.received_at.date_naive();
            if day < since || self.owned_by(&log, user_id).is_none() {
                continue;
            }
            let entry = days.entry(day).or_default();
            entry.0 += 1;
            entry.1 += i64::from(log.is_success());
            entry.2 += log.duration_ms;
        }
        Ok(days
            .into_iter()
            .map(|(day, (total, success, duration))| DailyLogStats {
                day,
                total,
                success,
                avg_duration_ms: duration as f64 / total as f64,
            })
            .collect())
    }
}

/// Forwarder answering with a fixed result and remembering each request
pub struct StubForwarder {
    result: ForwardResult,
    calls: Mutex<Vec<ForwardRequest>>,
}

impl StubForwarder {
    pub fn new(result: ForwardResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ForwardRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forwarder for StubForwarder {
    async fn forward(&self, _config: &ForwardConfig, request: &ForwardRequest) -> ForwardResult {
        self.calls.lock().unwrap().push(request.clone());
        self.result.clone()
    }
}

/// Application state wired to in-memory fakes
pub struct TestApp {
    pub state: AppState,
    pub logs: Arc<InMemoryLogs>,
}

pub fn app() -> TestApp {
    let users = Arc::new(InMemoryUsers::default());
    let webhooks = Arc::new(InMemoryWebhooks::default());
    let logs = Arc::new(InMemoryLogs::new(webhooks.clone()));
    let forwarder = Arc::new(StubForwarder::new(ForwardResult::default()));
    let jwt = JwtKeys::new("test_secret", Duration::from_secs(3600));

    let state = AppState {
        jwt: jwt.clone(),
        auth_service: Arc::new(AuthService::new(users, jwt)),
        webhook_service: Arc::new(WebhookService::new(webhooks.clone())),
        log_service: Arc::new(LogService::new(logs.clone(), webhooks.clone())),
        hook_service: Arc::new(HookService::new(webhooks, logs.clone(), forwarder)),
    };
    TestApp { state, logs }
}
