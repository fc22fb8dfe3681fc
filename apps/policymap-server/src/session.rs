//! Per-session dashboard state
//!
//! Each browser session owns one [`Session`]: which screen is shown, the
//! loaded outline, an optional uploaded fact index and the last search
//! result. Screen changes go through [`ViewState::on`].
//!
//! Sessions live in memory only. Idle sessions are dropped and the store is
//! capped, evicting the least recently seen session when full.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use shared_types::{FactIndex, LoadedOutline, SearchResult};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::ServerError;

/// Screen currently shown to a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Main,
    MindMapFullscreen,
    FactsPopup,
}

/// User actions that move between screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewEvent {
    LoadMindMap,
    OpenFullscreen,
    CloseFullscreen,
    Regenerate,
    OpenFacts,
    CloseFacts,
}

impl ViewState {
    /// Next screen after `event`. The fullscreen map can only be opened
    /// once an outline is loaded.
    pub fn on(self, event: ViewEvent, outline_loaded: bool) -> ViewState {
        match event {
            ViewEvent::LoadMindMap => ViewState::MindMapFullscreen,
            ViewEvent::OpenFullscreen if outline_loaded => ViewState::MindMapFullscreen,
            ViewEvent::OpenFullscreen => self,
            ViewEvent::CloseFullscreen if self == ViewState::MindMapFullscreen => ViewState::Main,
            ViewEvent::CloseFullscreen => self,
            ViewEvent::Regenerate => ViewState::Main,
            ViewEvent::OpenFacts => ViewState::FactsPopup,
            ViewEvent::CloseFacts if self == ViewState::FactsPopup => ViewState::Main,
            ViewEvent::CloseFacts => self,
        }
    }
}

/// Default cap on concurrent sessions
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Default idle time after which a session is dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
pub struct Session {
    pub view: ViewState,
    pub outline: Option<LoadedOutline>,
    pub uploaded_facts: Option<FactIndex>,
    pub search_result: Option<SearchResult>,
    pub last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            view: ViewState::default(),
            outline: None,
            uploaded_facts: None,
            search_result: None,
            last_seen: Instant::now(),
        }
    }
}

impl Session {
    /// Apply a screen event. `LoadMindMap` should go through
    /// [`Session::load_outline`] so the outline is present.
    pub fn apply(&mut self, event: ViewEvent) -> ViewState {
        if event == ViewEvent::Regenerate {
            self.outline = None;
        }
        self.view = self.view.on(event, self.outline.is_some());
        self.view
    }

    pub fn load_outline(&mut self, loaded: LoadedOutline) -> ViewState {
        self.outline = Some(loaded);
        self.apply(ViewEvent::LoadMindMap)
    }
}

/// In-memory session map keyed by UUID
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS, DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    /// `max_sessions` is clamped to at least one
    pub fn new(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            max_sessions: max_sessions.max(1),
            idle_timeout,
        }
    }

    pub async fn create(&self) -> String {
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, s| s.last_seen.elapsed() < self.idle_timeout);
        if sessions.len() < before {
            debug!("Expired {} idle sessions", before - sessions.len());
        }

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_seen)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    debug!("Session limit reached, evicting {}", id);
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let id = Uuid::new_v4().to_string();
        sessions.insert(id.clone(), Session::default());
        id
    }

    /// Run `f` on a session. Counts as activity for idle expiry.
    pub async fn read<R>(&self, id: &str, f: impl FnOnce(&Session) -> R) -> Result<R, ServerError> {
        self.update(id, |s| f(s)).await
    }

    pub async fn update<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, ServerError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ServerError::SessionNotFound(id.to_string()))?;
        session.last_seen = Instant::now();
        Ok(f(session))
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_engine::outline;

    #[test]
    fn test_load_opens_fullscreen() {
        assert_eq!(
            ViewState::Main.on(ViewEvent::LoadMindMap, false),
            ViewState::MindMapFullscreen
        );
    }

    #[test]
    fn test_fullscreen_requires_outline() {
        assert_eq!(ViewState::Main.on(ViewEvent::OpenFullscreen, false), ViewState::Main);
        assert_eq!(
            ViewState::Main.on(ViewEvent::OpenFullscreen, true),
            ViewState::MindMapFullscreen
        );
    }

    #[test]
    fn test_close_only_leaves_its_own_screen() {
        assert_eq!(
            ViewState::FactsPopup.on(ViewEvent::CloseFullscreen, true),
            ViewState::FactsPopup
        );
        assert_eq!(
            ViewState::MindMapFullscreen.on(ViewEvent::CloseFacts, true),
            ViewState::MindMapFullscreen
        );
        assert_eq!(ViewState::FactsPopup.on(ViewEvent::CloseFacts, true), ViewState::Main);
        assert_eq!(
            ViewState::MindMapFullscreen.on(ViewEvent::CloseFullscreen, true),
            ViewState::Main
        );
    }

    #[test]
    fn test_regenerate_clears_outline() {
        let mut session = Session::default();
        session.load_outline(outline::load("## 📋 Doc\n".to_string()));
        assert_eq!(session.view, ViewState::MindMapFullscreen);

        assert_eq!(session.apply(ViewEvent::Regenerate), ViewState::Main);
        assert!(session.outline.is_none());
        assert_eq!(session.apply(ViewEvent::OpenFullscreen), ViewState::Main);
    }

    #[test]
    fn test_event_names() {
        let event: ViewEvent = serde_json::from_str(r#""open_facts""#).unwrap();
        assert_eq!(event, ViewEvent::OpenFacts);
        assert_eq!(
            serde_json::to_string(&ViewState::MindMapFullscreen).unwrap(),
            r#""mind_map_fullscreen""#
        );
    }

    #[tokio::test]
    async fn test_store_unknown_session() {
        let store = SessionStore::default();
        let err = store.read("missing", |_| ()).await.unwrap_err();
        assert!(matches!(err, ServerError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_store_update_persists() {
        let store = SessionStore::default();
        let id = store.create().await;
        store
            .update(&id, |s| s.apply(ViewEvent::OpenFacts))
            .await
            .unwrap();
        let view = store.read(&id, |s| s.view).await.unwrap();
        assert_eq!(view, ViewState::FactsPopup);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_is_capped() {
        let store = SessionStore::new(3, DEFAULT_IDLE_TIMEOUT);
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(store.create().await);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert_eq!(store.len().await, 3);
        // Least recently seen go first
        assert!(store.read(&ids[0], |_| ()).await.is_err());
        assert!(store.read(&ids[1], |_| ()).await.is_err());
        assert!(store.read(&ids[4], |_| ()).await.is_ok());
    }

    #[tokio::test]
    async fn test_activity_protects_from_eviction() {
        let store = SessionStore::new(2, DEFAULT_IDLE_TIMEOUT);
        let first = store.create().await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        let second = store.create().await;
        tokio::time::sleep(Duration::from_millis(2)).await;

        store.read(&first, |_| ()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        store.create().await;

        assert_eq!(store.len().await, 2);
        assert!(store.read(&first, |_| ()).await.is_ok());
        assert!(store.read(&second, |_| ()).await.is_err());
    }

    #[tokio::test]
    async fn test_idle_sessions_expire_on_create() {
        let store = SessionStore::new(DEFAULT_MAX_SESSIONS, Duration::ZERO);
        let stale = store.create().await;
        store.create().await;
        store.create().await;

        assert_eq!(store.len().await, 1);
        assert!(store.read(&stale, |_| ()).await.is_err());
    }
}
