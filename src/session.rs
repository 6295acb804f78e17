//! Per-login session state.
//!
//! A `SessionContext` is created at login and torn down at logout or after
//! sitting idle past the manager's timeout; nothing is global. Values are
//! last-write-wins. The lead-to-sale handoff is a
//! one-shot value: the first `take_lead_handoff` consumes it.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::{BooksError, Result};

pub const LEAD_HANDOFF_KEY: &str = "leadForSale";

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::minutes(30);

/// Lead details carried into a new sale form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadHandoff {
    pub lead_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct SessionContext {
    user: Arc<str>,
    last_seen: RwLock<OffsetDateTime>,
    values: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl SessionContext {
    pub fn new(user: impl Into<Arc<str>>) -> Self {
        Self {
            user: user.into(),
            last_seen: RwLock::new(OffsetDateTime::now_utc()),
            values: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    fn touch(&self, now: OffsetDateTime) {
        *self.last_seen.write().unwrap() = now;
    }

    fn idle_for(&self, now: OffsetDateTime) -> Duration {
        now - *self.last_seen.read().unwrap()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| BooksError::Validation(e.to_string()))?;
        self.values.write().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    /// `None` when the key is absent or holds a value of another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let values = self.values.read().unwrap();
        values.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn remove(&self, key: &str) -> bool {
        self.values.write().unwrap().remove(key).is_some()
    }

    /// Reads and clears in one step.
    pub fn take<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.write().unwrap().remove(key)?;
        serde_json::from_value(value).ok()
    }

    pub fn clear(&self) {
        self.values.write().unwrap().clear();
    }

    pub fn stash_lead_handoff(&self, handoff: &LeadHandoff) -> Result<()> {
        self.set(LEAD_HANDOFF_KEY, handoff)
    }

    pub fn take_lead_handoff(&self) -> Option<LeadHandoff> {
        self.take(LEAD_HANDOFF_KEY)
    }
}

pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<SessionContext>>>,
    idle_timeout: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Opens a session for `user` and returns its token.
    pub fn login(&self, user: &str) -> Result<(String, Arc<SessionContext>)> {
        let user = user.trim();
        if user.is_empty() {
            return Err(BooksError::Validation("user is required".to_string()));
        }
        self.purge_idle(OffsetDateTime::now_utc());
        let token = Uuid::new_v4().simple().to_string();
        let session = Arc::new(SessionContext::new(user));
        self.sessions.write().unwrap().insert(token.clone(), session.clone());
        tracing::info!(user, "Session opened");
        Ok((token, session))
    }

    /// Looks up a live session and marks it as used. A session idle past
    /// the timeout is closed and reads as not found.
    pub fn get(&self, token: &str) -> Result<Arc<SessionContext>> {
        self.get_at(token, OffsetDateTime::now_utc())
    }

    fn get_at(&self, token: &str, now: OffsetDateTime) -> Result<Arc<SessionContext>> {
        let session = self
            .sessions
            .read()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(BooksError::SessionNotFound)?;
        if session.idle_for(now) > self.idle_timeout {
            self.expire(token);
            return Err(BooksError::SessionNotFound);
        }
        session.touch(now);
        Ok(session)
    }

    /// Closes every session idle past the timeout at `now`. Returns how many
    /// were closed.
    pub fn purge_idle(&self, now: OffsetDateTime) -> usize {
        let expired: Vec<String> = self
            .sessions
            .read()
            .unwrap()
            .iter()
            .filter(|(_, s)| s.idle_for(now) > self.idle_timeout)
            .map(|(token, _)| token.clone())
            .collect();
        for token in &expired {
            self.expire(token);
        }
        expired.len()
    }

    fn expire(&self, token: &str) {
        if let Some(session) = self.sessions.write().unwrap().remove(token) {
            session.clear();
            tracing::info!(user = session.user(), "Idle session expired");
        }
    }

    pub fn logout(&self, token: &str) -> Result<()> {
        let session = self
            .sessions
            .write()
            .unwrap()
            .remove(token)
            .ok_or(BooksError::SessionNotFound)?;
        session.clear();
        tracing::info!(user = session.user(), "Session closed");
        Ok(())
    }

    pub fn active(&self) -> usize {
        self.sessions.read().unwrap().len()
    }
}
