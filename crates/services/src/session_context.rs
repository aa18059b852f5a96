use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use training_core::model::{LearnerId, Role, UserProfile};

use crate::error::SessionContextError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: LearnerId,
    pub display_name: String,
    pub role: Role,
}

impl SessionUser {
    #[must_use]
    pub fn new(id: LearnerId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
        }
    }

    /// Session identity taken from a stored account, role included.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self::new(profile.id(), profile.display_name(), profile.role())
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// # Errors
    ///
    /// Returns `SessionContextError::NotAdmin` for any other role.
    pub fn ensure_admin(&self) -> Result<(), SessionContextError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(SessionContextError::NotAdmin)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(Option<&SessionUser>) + Send + Sync>;

#[derive(Default)]
struct Inner {
    user: Option<SessionUser>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

/// Shared handle to the signed-in user.
///
/// Cloning the handle shares state. Listeners run synchronously on the
/// thread that changed the state, after the internal lock is released, so a
/// listener may read the context again.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<Mutex<Inner>>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sign_in(&self, user: SessionUser) {
        debug!(user_id = %user.id, role = %user.role, "signed in");
        self.replace(Some(user));
    }

    pub fn sign_out(&self) {
        debug!("signed out");
        self.replace(None);
    }

    fn replace(&self, user: Option<SessionUser>) {
        let (snapshot, listeners) = {
            let mut inner = self.lock();
            inner.user = user;
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (inner.user.clone(), listeners)
        };
        for listener in listeners {
            listener(snapshot.as_ref());
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<SessionUser> {
        self.lock().user.clone()
    }

    /// The signed-in user, if they hold the admin role.
    ///
    /// # Errors
    ///
    /// Returns `SessionContextError::NotSignedIn` or
    /// `SessionContextError::NotAdmin`.
    pub fn require_admin(&self) -> Result<SessionUser, SessionContextError> {
        let user = self.current().ok_or(SessionContextError::NotSignedIn)?;
        user.ensure_admin()?;
        Ok(user)
    }

    /// Register a listener called with the new user after every sign-in or
    /// sign-out.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(Option<&SessionUser>) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(sid, _)| *sid != id);
        inner.listeners.len() != before
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionContext")
            .field("user", &inner.user)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn admin() -> SessionUser {
        SessionUser::new(LearnerId::new(1), "Ana", Role::Admin)
    }

    #[test]
    fn require_admin_checks_sign_in_and_role() {
        let ctx = SessionContext::new();
        assert_eq!(ctx.require_admin(), Err(SessionContextError::NotSignedIn));

        ctx.sign_in(SessionUser::new(LearnerId::new(2), "Bo", Role::Cleaner));
        assert_eq!(ctx.require_admin(), Err(SessionContextError::NotAdmin));

        ctx.sign_in(admin());
        assert_eq!(ctx.require_admin(), Ok(admin()));
    }

    #[test]
    fn listeners_see_every_change_until_unsubscribed() {
        let ctx = SessionContext::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = ctx.subscribe(move |user| {
            seen.fetch_add(1, Ordering::SeqCst);
            let _ = user.map(|u| u.display_name.clone());
        });

        ctx.sign_in(admin());
        ctx.sign_out();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(ctx.unsubscribe(id));
        assert!(!ctx.unsubscribe(id));
        ctx.sign_in(admin());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_may_read_context() {
        let ctx = SessionContext::new();
        let reader = ctx.clone();
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        ctx.subscribe(move |_| {
            *sink.lock().unwrap() = reader.current().map(|u| u.role);
        });

        ctx.sign_in(admin());
        assert_eq!(*observed.lock().unwrap(), Some(Role::Admin));
        assert!(ctx.current().is_some());
    }
}
