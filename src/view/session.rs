use crate::api::GalleryClient;
use crate::charts::{ChartRegistry, SharedCharts};
use crate::error::{AppError, AppResult};
use crate::view::DetailController;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MAX_SESSION_ID_LEN: usize = 64;

/// One dashboard client: its own detail panel, generation counter and
/// trend charts.
pub struct DetailSession {
    pub detail: DetailController,
    pub charts: SharedCharts,
    last_seen: Mutex<Instant>,
}

impl DetailSession {
    fn new(client: GalleryClient) -> Self {
        let charts: SharedCharts = Arc::new(ChartRegistry::new());
        Self {
            detail: DetailController::new(client, charts.clone()),
            charts,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_seen.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Detail sessions keyed by a client-chosen id. Idle sessions are evicted
/// lazily on insert; when still full, the longest-idle one goes.
pub struct SessionStore {
    client: GalleryClient,
    sessions: Mutex<HashMap<String, Arc<DetailSession>>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(client: GalleryClient, idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            client,
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn validate_id(sid: &str) -> AppResult<()> {
        let ok = !sid.is_empty()
            && sid.len() <= MAX_SESSION_ID_LEN
            && sid
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !ok {
            return Err(AppError::Validation(format!(
                "session id must be 1-{MAX_SESSION_ID_LEN} characters of [A-Za-z0-9_-]"
            )));
        }
        Ok(())
    }

    /// Existing session for `sid`, or a fresh one.
    pub fn get_or_create(&self, sid: &str) -> AppResult<Arc<DetailSession>> {
        Self::validate_id(sid)?;
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = sessions.get(sid) {
            session.touch();
            return Ok(session.clone());
        }

        let now = Instant::now();
        sessions.retain(|_, s| s.idle_for(now) < self.idle_ttl);
        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .max_by_key(|(_, s)| s.idle_for(now))
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                tracing::info!(session = %id, "evicting idle detail session");
                sessions.remove(&id);
            }
        }

        let session = Arc::new(DetailSession::new(self.client.clone()));
        sessions.insert(sid.to_string(), session.clone());
        tracing::debug!(session = %sid, live = sessions.len(), "created detail session");
        Ok(session)
    }

    pub fn get(&self, sid: &str) -> Option<Arc<DetailSession>> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let session = sessions.get(sid)?;
        session.touch();
        Some(session.clone())
    }

    /// Drop a session, invalidating any open still in flight for it.
    pub fn remove(&self, sid: &str) -> bool {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(sid);
        match removed {
            Some(session) => {
                session.detail.close();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
