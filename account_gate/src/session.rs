//! Sign-in sessions issued by identity providers and the per-request session context

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::config::{SESSION_MAX_AGE, SESSION_REMEMBER_MAX_AGE};
use crate::utils::{UtilError, gen_random_string};

/// A session issued by a successful password sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub email: String,
    /// Whether the session should outlive the browsing session
    pub remember: bool,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Seconds until expiry, never negative
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Session state of the current caller, passed explicitly into operations that need it
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session: Option<Session>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

struct StoredSession<T> {
    session: Session,
    data: T,
}

/// Sessions kept by a provider, keyed by session id
///
/// `T` is provider-specific data attached to each session, such as an access token.
pub struct SessionTable<T = ()> {
    entries: Mutex<HashMap<String, StoredSession<T>>>,
    max_age: u64,
    remember_max_age: u64,
}

impl<T: Send> SessionTable<T> {
    pub fn new() -> Self {
        Self::with_max_age(*SESSION_MAX_AGE, *SESSION_REMEMBER_MAX_AGE)
    }

    pub fn with_max_age(max_age: u64, remember_max_age: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_age,
            remember_max_age,
        }
    }

    /// Create a session for `email` and remember `data` alongside it
    pub async fn issue(&self, email: &str, remember: bool, data: T) -> Result<Session, UtilError> {
        let ttl = if remember {
            self.remember_max_age
        } else {
            self.max_age
        };
        let now = Utc::now();
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| UtilError::Expiry(format!("Session lifetime out of range: {ttl}s")))?;
        let session = Session {
            id: gen_random_string(32)?,
            email: email.to_string(),
            remember,
            expires_at,
        };

        let mut entries = self.entries.lock().await;
        // Sessions whose cookie never comes back are only dropped here
        entries.retain(|_, stored| stored.session.expires_at > now);
        entries.insert(
            session.id.clone(),
            StoredSession {
                session: session.clone(),
                data,
            },
        );

        tracing::debug!("Issued session for {} (remember: {})", email, remember);
        Ok(session)
    }

    /// Look up a live session; expired entries are dropped
    pub async fn resolve(&self, session_id: &str) -> Option<Session> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(session_id) {
            None => return None,
            Some(stored) => stored.session.expires_at <= Utc::now(),
        };
        if expired {
            tracing::debug!("Session expired, removing it");
            entries.remove(session_id);
            return None;
        }
        entries.get(session_id).map(|stored| stored.session.clone())
    }

    /// Remove a session and hand back its data
    pub async fn revoke(&self, session_id: &str) -> Option<T> {
        self.entries
            .lock()
            .await
            .remove(session_id)
            .map(|stored| stored.data)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

impl<T: Send> Default for SessionTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
