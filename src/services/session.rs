//! Session context
//!
//! Holds the signed-in user, their derived role and a loading flag for one
//! view. The context is created explicitly and handed to whoever needs it;
//! it seeds itself from a bearer token and can follow auth state changes for
//! its user through the auth event channel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::auth::{AuthEvent, AuthService};
use crate::models::{AuthUser, Role};
use crate::state::ViewScope;
use crate::utils::errors::{HostelBridgeError, Result};

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub user: Option<AuthUser>,
    pub role: Option<Role>,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn loading() -> Self {
        Self {
            user: None,
            role: None,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            role: None,
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Aborts the auth event listener when dropped
#[derive(Debug)]
pub struct ListenerGuard(JoinHandle<()>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Clone)]
pub struct SessionContext {
    auth: AuthService,
    state: Arc<watch::Sender<SessionSnapshot>>,
    token: Arc<RwLock<Option<String>>>,
    scope: ViewScope,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("snapshot", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// A context that has not resolved its session yet
    pub fn new(auth: AuthService) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::loading());
        Self {
            auth,
            state: Arc::new(state),
            token: Arc::new(RwLock::new(None)),
            scope: ViewScope::new(),
        }
    }

    /// Seed the context from a bearer token.
    ///
    /// An invalid, expired or revoked token resolves to a signed-out session.
    /// A failed role lookup resolves to a session without a role.
    pub async fn resolve(&self, token: Option<&str>) -> SessionSnapshot {
        self.state.send_modify(|s| s.loading = true);

        let user = match token {
            Some(token) => match self.auth.current_user(token).await {
                Ok(user) => Some(user),
                Err(e) => {
                    debug!(error = %e, "Session token rejected");
                    None
                }
            },
            None => None,
        };

        let role = match &user {
            Some(user) => self.auth.lookup_role_or_none(user.id).await,
            None => None,
        };

        *self.token.write().await = user.as_ref().and(token.map(str::to_string));
        let snapshot = SessionSnapshot {
            user,
            role,
            loading: false,
        };
        self.state.send_replace(snapshot.clone());
        snapshot
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Watch for snapshot changes
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Cancellation scope bound to this session
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn require_user(&self) -> Result<AuthUser> {
        self.snapshot().user.ok_or(HostelBridgeError::NotAuthenticated)
    }

    pub fn require_role(&self, role: Role) -> Result<AuthUser> {
        let snapshot = self.snapshot();
        let user = snapshot.user.ok_or(HostelBridgeError::NotAuthenticated)?;
        match snapshot.role {
            Some(current) if current == role => Ok(user),
            _ => Err(HostelBridgeError::PermissionDenied(format!(
                "{} requires role {}",
                user.email, role
            ))),
        }
    }

    /// Follow auth events for this session's user.
    ///
    /// A role change re-queries the role; sign-out or account deletion clears
    /// the session and cancels its scope. The listener stops when the guard
    /// is dropped or the scope is cancelled.
    pub fn listen(&self) -> ListenerGuard {
        let mut events = self.auth.subscribe();
        let context = self.clone();

        ListenerGuard(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = context.scope.cancelled() => break,
                    event = events.recv() => event,
                };

                match event {
                    Ok(event) => {
                        if !context.apply(event).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "Session listener lagged; re-resolving");
                        let token = context.token.read().await.clone();
                        context.resolve(token.as_deref()).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }

    /// Apply one event; returns whether the listener should keep running
    async fn apply(&self, event: AuthEvent) -> bool {
        let Some(user_id) = self.snapshot().user.map(|u| u.id) else {
            return true;
        };
        if event.user_id() != user_id {
            return true;
        }

        match event {
            AuthEvent::RoleChanged { .. } => {
                self.state.send_modify(|s| s.loading = true);
                let role = self.auth.lookup_role_or_none(user_id).await;
                self.state.send_modify(|s| {
                    s.role = role;
                    s.loading = false;
                });
                true
            }
            AuthEvent::SignedOut { .. } | AuthEvent::AccountDeleted { .. } => {
                self.clear().await;
                false
            }
            AuthEvent::SignedUp { .. } | AuthEvent::SignedIn { .. } => true,
        }
    }

    async fn clear(&self) {
        *self.token.write().await = None;
        self.state.send_replace(SessionSnapshot::signed_out());
        self.scope.cancel();
    }

    /// Revoke this session's token and clear the context
    pub async fn sign_out(&self) -> Result<()> {
        let token = self.token.read().await.clone();
        let token = token.ok_or(HostelBridgeError::NotAuthenticated)?;
        self.auth.sign_out(&token).await?;
        self.clear().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::database::{DatabaseService, MemoryBackend};
    use crate::state::StateStorage;
    use std::time::Duration;

    fn auth() -> AuthService {
        let settings = Settings::in_memory("0123456789abcdef0123456789abcdef");
        let database = DatabaseService::new(Arc::new(MemoryBackend::new()));
        AuthService::new(database, StateStorage::in_memory(settings.redis.clone()), &settings.auth)
    }

    async fn wait_until<F: Fn(&SessionSnapshot) -> bool>(context: &SessionContext, predicate: F) {
        let mut watch = context.watch();
        tokio::time::timeout(Duration::from_secs(2), watch.wait_for(|s| predicate(s)))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_resolve_without_token() {
        let context = SessionContext::new(auth());
        assert!(context.snapshot().loading);

        let snapshot = context.resolve(None).await;
        assert_eq!(snapshot, SessionSnapshot::signed_out());
        assert!(context.require_user().is_err());
    }

    #[tokio::test]
    async fn test_resolve_with_token_and_role() {
        let auth = auth();
        let user = auth.sign_up("asha@example.org", "correct-horse").await.unwrap();
        auth.assign_role(user.id, Role::Student).await.unwrap();
        let session = auth.sign_in("asha@example.org", "correct-horse").await.unwrap();

        let context = SessionContext::new(auth.clone());
        let snapshot = context.resolve(Some(&session.token)).await;
        assert_eq!(snapshot.role, Some(Role::Student));
        assert!(!snapshot.loading);
        assert!(context.require_role(Role::Student).is_ok());
        assert!(context.require_role(Role::Donor).is_err());

        let garbage = SessionContext::new(auth);
        assert!(!garbage.resolve(Some("not-a-token")).await.is_authenticated());
    }

    #[tokio::test]
    async fn test_listener_follows_role_changes_and_sign_out() {
        let auth = auth();
        let user = auth.sign_up("ravi@example.org", "correct-horse").await.unwrap();
        let session = auth.sign_in("ravi@example.org", "correct-horse").await.unwrap();

        let context = SessionContext::new(auth.clone());
        context.resolve(Some(&session.token)).await;
        assert_eq!(context.snapshot().role, None);

        let _listener = context.listen();
        auth.assign_role(user.id, Role::Donor).await.unwrap();
        wait_until(&context, |s| s.role == Some(Role::Donor) && !s.loading).await;

        auth.sign_out(&session.token).await.unwrap();
        wait_until(&context, |s| !s.is_authenticated()).await;
        assert!(context.scope().is_cancelled());
    }
}
