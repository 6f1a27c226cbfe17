//! Session gate: the single source of truth for authentication state.
//!
//! All session transitions flow through [`SessionGate`], which fans them
//! out over a watch channel. UI code reads or subscribes; only the gate
//! replaces the state. A 401 from the backend API is translated into an
//! implicit sign-out here and nowhere else.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// An authenticated session issued by the identity provider.
///
/// The access token is opaque to the client; it is only ever forwarded as
/// a bearer credential. Construction goes through [`Session::new`] so a
/// present session always carries a non-empty token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("identity provider returned a session without an access token")]
    EmptyAccessToken,
}

impl Session {
    pub fn new(
        access_token: String,
        refresh_token: String,
        user: SessionUser,
    ) -> Result<Self, SessionError> {
        if access_token.is_empty() {
            return Err(SessionError::EmptyAccessToken);
        }
        Ok(Self {
            access_token,
            refresh_token,
            user,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

/// Authentication state as observed by the rest of the client.
///
/// `Loading` is only the initial state, before `initialize` has resolved
/// the stored tokens against the provider; it is never re-entered.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthState {
    #[default]
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Owner of the authentication state. Sole writer of the watch channel;
/// everything else holds receivers.
pub struct SessionGate {
    tx: watch::Sender<AuthState>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AuthState::Loading);
        Self { tx }
    }

    /// Current state, cloned out of the channel.
    pub fn state(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    /// Register for every subsequent state transition.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    /// Resolve the initial state. Called exactly once, before any
    /// protected command runs.
    pub fn initialize(&self, session: Option<Session>) {
        debug_assert!(matches!(*self.tx.borrow(), AuthState::Loading));
        match session {
            Some(session) => self.tx.send_replace(AuthState::Authenticated(session)),
            None => self.tx.send_replace(AuthState::Unauthenticated),
        };
    }

    /// Apply a provider-issued session (sign-in or token refresh).
    pub fn sign_in(&self, session: Session) {
        self.tx.send_replace(AuthState::Authenticated(session));
        tracing::debug!("session gate: authenticated");
    }

    /// Clear the session and notify subscribers.
    pub fn sign_out(&self) {
        self.tx.send_replace(AuthState::Unauthenticated);
        tracing::debug!("session gate: signed out");
    }

    /// Implicit sign-out: the backend rejected our credential (401-class).
    /// This is the only place session invalidity is inferred from anything
    /// other than the provider itself.
    pub fn handle_unauthorized(&self) {
        if self.tx.borrow().is_authenticated() {
            tracing::warn!("backend rejected credential, clearing session");
        }
        self.tx.send_replace(AuthState::Unauthenticated);
    }

    /// Current bearer credential, if any. Pure read.
    pub fn access_token(&self) -> Option<String> {
        match &*self.tx.borrow() {
            AuthState::Authenticated(session) => Some(session.access_token.clone()),
            _ => None,
        }
    }

    /// Gate for protected commands: the current session, or an error
    /// carrying the user-facing notice key.
    pub fn require_auth(&self) -> Result<Session, NotAuthenticated> {
        match &*self.tx.borrow() {
            AuthState::Authenticated(session) => Ok(session.clone()),
            _ => Err(NotAuthenticated),
        }
    }
}

/// Returned when a protected command runs without a session.
#[derive(Debug, Error, PartialEq)]
#[error("not logged in")]
pub struct NotAuthenticated;

impl NotAuthenticated {
    pub fn translation_key(&self) -> &'static str {
        "auth.please_log_in"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: &str) -> Session {
        Session::new(
            token.to_string(),
            "refresh".to_string(),
            SessionUser {
                id: "user-1".to_string(),
                email: Some("jdoe@example.com".to_string()),
                user_metadata: serde_json::Value::Null,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_session_rejects_empty_access_token() {
        let result = Session::new(String::new(), "r".to_string(), SessionUser::default());
        assert_eq!(result.unwrap_err(), SessionError::EmptyAccessToken);
    }

    #[test]
    fn test_gate_starts_loading() {
        let gate = SessionGate::new();
        assert_eq!(gate.state(), AuthState::Loading);
        assert_eq!(gate.access_token(), None);
    }

    #[test]
    fn test_initialize_with_session_authenticates() {
        let gate = SessionGate::new();
        gate.initialize(Some(session("tok")));
        assert!(gate.state().is_authenticated());
        assert_eq!(gate.access_token().as_deref(), Some("tok"));
        assert!(gate.require_auth().is_ok());
    }

    #[test]
    fn test_initialize_without_session_is_unauthenticated() {
        let gate = SessionGate::new();
        gate.initialize(None);
        assert_eq!(gate.state(), AuthState::Unauthenticated);
        assert_eq!(gate.require_auth(), Err(NotAuthenticated));
    }

    #[test]
    fn test_sign_out_notifies_subscribers() {
        let gate = SessionGate::new();
        gate.initialize(Some(session("tok")));

        let mut rx = gate.subscribe();
        rx.mark_unchanged();

        gate.sign_out();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::Unauthenticated);
        assert_eq!(gate.access_token(), None);
    }

    #[test]
    fn test_unauthorized_response_clears_session() {
        let gate = SessionGate::new();
        gate.initialize(Some(session("tok")));

        let mut rx = gate.subscribe();
        rx.mark_unchanged();

        gate.handle_unauthorized();
        assert_eq!(gate.state(), AuthState::Unauthenticated);
        assert!(rx.has_changed().unwrap());
        // The next protected render must refuse
        assert_eq!(gate.require_auth(), Err(NotAuthenticated));
    }

    #[test]
    fn test_transitions_are_observed_in_order() {
        let gate = SessionGate::new();
        let mut rx = gate.subscribe();

        gate.initialize(None);
        assert_eq!(*rx.borrow_and_update(), AuthState::Unauthenticated);

        gate.sign_in(session("a"));
        assert!(rx.borrow_and_update().is_authenticated());

        gate.sign_in(session("b"));
        assert_eq!(gate.access_token().as_deref(), Some("b"));

        gate.sign_out();
        assert_eq!(*rx.borrow_and_update(), AuthState::Unauthenticated);
    }

    #[test]
    fn test_not_authenticated_notice_resolves() {
        let key = NotAuthenticated.translation_key();
        assert_eq!(
            shared::translate(shared::Language::En, key),
            "Please log in to access this page."
        );
        assert_ne!(shared::translate(shared::Language::Fr, key), key);
    }

    #[test]
    fn test_token_read_is_fresh_not_cached() {
        let gate = SessionGate::new();
        gate.initialize(Some(session("old")));
        assert_eq!(gate.access_token().as_deref(), Some("old"));
        // Provider refresh replaces the credential; the next read sees it
        gate.sign_in(session("new"));
        assert_eq!(gate.access_token().as_deref(), Some("new"));
    }
}
