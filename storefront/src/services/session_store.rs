//! Server-side session storage
//!
//! Sessions live in memory only; a restart logs everybody out and empties
//! anonymous carts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::cart::Cart;
use crate::error::StorefrontResult;
use crate::traits::{CartEdit, SessionStore};
use crate::types::Session;

const COMPONENT: &str = "sessions";

/// Real session store implementation
#[derive(Clone)]
pub struct RealSessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: chrono::Duration,
}

impl RealSessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.last_seen > self.ttl
    }

    /// Live session under `id`, replacing an expired or missing one with an
    /// empty session that keeps the token. Caller holds the write guard.
    fn live<'a>(&self, sessions: &'a mut HashMap<Uuid, Session>, id: Uuid, now: DateTime<Utc>) -> &'a mut Session {
        let session = sessions.entry(id).or_insert_with(|| Session { id, ..Session::new() });
        if self.is_expired(session, now) {
            *session = Session { id, ..Session::new() };
        }
        session.last_seen = now;
        session
    }
}

#[async_trait]
impl SessionStore for RealSessionStore {
    async fn create(&self) -> Session {
        let session = Session::new();
        self.sessions.write().await.insert(session.id, session.clone());
        shared::component_debug!(COMPONENT, "👋 New session {}", session.id);
        session
    }

    async fn get(&self, id: Uuid) -> Option<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let expired = self.is_expired(sessions.get(&id)?, now);
        if expired {
            sessions.remove(&id);
            return None;
        }
        let session = sessions.get_mut(&id)?;
        session.last_seen = now;
        Some(session.clone())
    }

    async fn save(&self, mut session: Session) {
        session.last_seen = Utc::now();
        self.sessions.write().await.insert(session.id, session);
    }

    async fn update_cart(&self, id: Uuid, edit: CartEdit) -> StorefrontResult<Cart> {
        let mut sessions = self.sessions.write().await;
        let session = self.live(&mut sessions, id, Utc::now());
        let mut cart = session.cart.clone();
        edit(&mut cart)?;
        session.cart = cart.clone();
        Ok(cart)
    }

    async fn take_cart(&self, id: Uuid) -> Cart {
        let mut sessions = self.sessions.write().await;
        let session = self.live(&mut sessions, id, Utc::now());
        std::mem::take(&mut session.cart)
    }

    async fn rotate(&self, id: Uuid) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let mut session = sessions.remove(&id)?;
        session.id = Uuid::new_v4();
        session.last_seen = Utc::now();
        sessions.insert(session.id, session.clone());
        Some(session)
    }

    async fn destroy(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        before - sessions.len()
    }

    async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
