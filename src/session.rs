//! Session store - single source of truth for the visitor's session.
//!
//! Owns the one [`SessionState`] value and all network resolution against
//! the identity service. Concurrent `init` callers are coalesced onto a
//! single in-flight resolution: the first caller registers a broadcast
//! channel and performs the fetch, later callers subscribe and await the
//! completion signal. At most one primary fetch is ever in flight.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::identity::{HttpIdentityService, IdentityConfig, IdentityService, UserInfo};
use crate::routes;
use crate::types::{CoachApproval, ResolutionPhase, Role, SessionState};

enum Flight {
    /// State already resolved, nothing to do
    Done,
    /// A resolution is in flight; wait for its completion signal
    Wait(broadcast::Receiver<()>),
    /// This caller owns the resolution and must broadcast on the sender
    Run(broadcast::Sender<()>),
}

/// Process-wide, lazily-populated record of the visitor's session.
pub struct SessionStore {
    identity: Arc<dyn IdentityService>,
    state: RwLock<SessionState>,
    /// Single-flight slot: `Some` while a resolution is in flight
    in_flight: Mutex<Option<broadcast::Sender<()>>>,
}

impl SessionStore {
    /// Create a store over any identity service.
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self {
            identity,
            state: RwLock::new(SessionState::default()),
            in_flight: Mutex::new(None),
        }
    }

    /// Create a store over the platform's HTTP API.
    pub fn with_http(config: IdentityConfig) -> Self {
        Self::new(Arc::new(HttpIdentityService::new(config)))
    }

    /// A consistent copy of the current session state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn phase(&self) -> ResolutionPhase {
        self.state.read().await.phase
    }

    /// Resolve the session, once.
    ///
    /// Idempotent: with the state already resolved this returns without a
    /// network call; with a resolution in flight it awaits that one
    /// instead of issuing another fetch. Never fails - a failed primary
    /// fetch settles the state as unauthenticated.
    pub async fn init(&self) {
        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(sender) = in_flight.as_ref() {
                Flight::Wait(sender.subscribe())
            } else if self.state.read().await.phase == ResolutionPhase::Ready {
                Flight::Done
            } else {
                let (sender, _) = broadcast::channel(1);
                *in_flight = Some(sender.clone());
                self.state.write().await.phase = ResolutionPhase::Resolving;
                Flight::Run(sender)
            }
        };

        match flight {
            Flight::Done => {}
            Flight::Wait(mut receiver) => {
                // A closed channel means the resolution finished between
                // subscribing and receiving.
                let _ = receiver.recv().await;
            }
            Flight::Run(sender) => {
                debug!("starting session resolution");
                let resolved = self.resolve().await;

                // Publish the settled state before waking the waiters so
                // every one of them snapshots the same value.
                *self.state.write().await = resolved;
                *self.in_flight.lock().await = None;
                let _ = sender.send(());
            }
        }
    }

    /// Perform the resolution: primary identity fetch, role
    /// normalization, conditional coach sub-fetch. Returns the fully
    /// settled state (`phase = Ready`) for atomic publication.
    async fn resolve(&self) -> SessionState {
        let (identity, profile) = match self.identity.fetch_user_info().await {
            Ok(UserInfo {
                authenticated: true,
                identity: Some(identity),
                profile,
            }) => (identity, profile),
            Ok(_) => {
                debug!("no active session at the identity service");
                return SessionState {
                    phase: ResolutionPhase::Ready,
                    ..SessionState::default()
                };
            }
            Err(err) => {
                warn!(error = %err, "identity resolution failed, treating as unauthenticated");
                return SessionState {
                    phase: ResolutionPhase::Ready,
                    ..SessionState::default()
                };
            }
        };

        // The administrator flag wins over whatever the profile declares.
        let role = if identity.is_admin || identity.is_staff {
            Role::Admin
        } else {
            profile
                .as_ref()
                .and_then(|p| p.role)
                .unwrap_or(Role::User)
        };

        // Secondary lookup for coaches only. Its failure degrades the
        // approval flag, never the session.
        let coach_approval = if role == Role::Coach {
            match self.identity.fetch_coach_status().await {
                Ok(status) => Some(status.approval),
                Err(err) => {
                    warn!(error = %err, "coach status fetch failed, treating as not approved");
                    Some(CoachApproval::Unknown)
                }
            }
        } else {
            None
        };

        let level = profile
            .as_ref()
            .and_then(|p| p.current_level.clone())
            .unwrap_or_default();

        info!(role = %role, profile_complete = identity.profile_complete, "session resolved");

        SessionState {
            authenticated: true,
            profile_complete: identity.profile_complete,
            identity: Some(identity),
            profile,
            role,
            coach_approval,
            goal: None,
            phase: ResolutionPhase::Ready,
            level,
        }
    }

    /// Re-fetch the identity document to pick up server-side changes
    /// (onboarding that just completed, a renamed profile) without
    /// re-deriving the role or re-entering the coach sub-fetch.
    ///
    /// Meant for use after `init` has completed; the resolution phase is
    /// left untouched. A transport failure keeps the current state; a
    /// server answer that reports the session gone clears it.
    pub async fn refresh(&self) {
        match self.identity.fetch_user_info().await {
            Ok(UserInfo {
                authenticated: true,
                identity: Some(identity),
                profile,
            }) => {
                let mut state = self.state.write().await;
                state.authenticated = true;
                state.profile_complete = identity.profile_complete;
                state.level = profile
                    .as_ref()
                    .and_then(|p| p.current_level.clone())
                    .unwrap_or_default();
                state.identity = Some(identity);
                state.profile = profile;
            }
            Ok(_) => {
                debug!("session gone at the identity service, clearing");
                let mut state = self.state.write().await;
                *state = SessionState {
                    phase: state.phase,
                    ..SessionState::default()
                };
            }
            Err(err) => {
                warn!(error = %err, "session refresh failed, keeping current state");
            }
        }
    }

    /// Log out: best-effort server notification, unconditional local
    /// clear. Returns the route the application should navigate to.
    pub async fn logout(&self) -> &'static str {
        if let Err(err) = self.identity.notify_logout().await {
            warn!(error = %err, "logout notification failed, clearing local session anyway");
        }

        self.clear_auth_status().await;
        info!("session cleared");
        routes::LANDING
    }

    /// Reset every field to its unauthenticated default, including the
    /// resolution phase - the next `init` starts a fresh cycle.
    pub async fn clear_auth_status(&self) {
        *self.state.write().await = SessionState::default();
    }

    /// Optimistically set the role ahead of the server round-trip. Kept
    /// in sync with the profile's declared role when a profile exists.
    pub async fn set_role(&self, role: Role) {
        let mut state = self.state.write().await;
        state.role = role;
        if let Some(profile) = state.profile.as_mut() {
            profile.role = Some(role);
        }
    }

    /// Optimistically record the fitness goal picked during onboarding.
    pub async fn set_goal(&self, goal: impl Into<String>) {
        self.state.write().await.goal = Some(goal.into());
    }

    /// Optimistically flip onboarding completeness.
    pub async fn set_profile_complete(&self, complete: bool) {
        self.state.write().await.profile_complete = complete;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MockIdentityService;
    use crate::types::{GamificationLevel, Identity, Profile};
    use std::time::Duration;

    fn member(profile_complete: bool) -> Identity {
        Identity {
            id: 7,
            username: "jo".to_string(),
            email: "jo@example.com".to_string(),
            first_name: "Jo".to_string(),
            last_name: "Park".to_string(),
            is_admin: false,
            is_staff: false,
            profile_complete,
        }
    }

    fn admin() -> Identity {
        Identity {
            is_admin: true,
            ..member(true)
        }
    }

    fn profile_with_role(role: Role) -> Profile {
        Profile {
            role: Some(role),
            ..Profile::default()
        }
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let mock = Arc::new(MockIdentityService::new().with_user(member(true), None));
        let store = SessionStore::new(mock.clone());

        store.init().await;
        store.init().await;

        assert_eq!(mock.user_info_calls(), 1);
        let state = store.snapshot().await;
        assert!(state.authenticated);
        assert_eq!(state.phase, ResolutionPhase::Ready);
    }

    #[tokio::test]
    async fn phase_transitions_through_resolving() {
        let mock = Arc::new(
            MockIdentityService::new()
                .with_user(member(true), None)
                .with_latency(Duration::from_millis(50)),
        );
        let store = Arc::new(SessionStore::new(mock));
        assert_eq!(store.phase().await, ResolutionPhase::Idle);

        let resolving = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.init().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.phase().await, ResolutionPhase::Resolving);

        resolving.await.unwrap();
        assert_eq!(store.phase().await, ResolutionPhase::Ready);
    }

    #[tokio::test]
    async fn concurrent_inits_share_one_fetch() {
        let mock = Arc::new(
            MockIdentityService::new()
                .with_user(member(true), None)
                .with_latency(Duration::from_millis(20)),
        );
        let store = SessionStore::new(mock.clone());

        tokio::join!(store.init(), store.init(), store.init());

        assert_eq!(mock.user_info_calls(), 1);
        assert!(store.snapshot().await.authenticated);
    }

    #[tokio::test]
    async fn member_defaults_to_user_role() {
        let mock = Arc::new(MockIdentityService::new().with_user(member(true), None));
        let store = SessionStore::new(mock.clone());

        store.init().await;

        let state = store.snapshot().await;
        assert_eq!(state.role, Role::User);
        assert!(state.coach_approval.is_none());
        assert_eq!(mock.coach_status_calls(), 0);
    }

    #[tokio::test]
    async fn admin_flag_overrides_declared_role() {
        let mock = Arc::new(
            MockIdentityService::new().with_user(admin(), Some(profile_with_role(Role::Coach))),
        );
        let store = SessionStore::new(mock.clone());

        store.init().await;

        let state = store.snapshot().await;
        assert_eq!(state.role, Role::Admin);
        // no coach sub-fetch for administrators
        assert_eq!(mock.coach_status_calls(), 0);
    }

    #[tokio::test]
    async fn staff_flag_also_yields_admin() {
        let identity = Identity {
            is_staff: true,
            ..member(true)
        };
        let mock = Arc::new(MockIdentityService::new().with_user(identity, None));
        let store = SessionStore::new(mock);

        store.init().await;

        assert_eq!(store.snapshot().await.role, Role::Admin);
    }

    #[tokio::test]
    async fn coach_triggers_secondary_status_fetch() {
        let mock = Arc::new(
            MockIdentityService::new()
                .with_user(member(true), Some(profile_with_role(Role::Coach)))
                .with_coach_status(CoachApproval::Approved),
        );
        let store = SessionStore::new(mock.clone());

        store.init().await;

        let state = store.snapshot().await;
        assert_eq!(state.role, Role::Coach);
        assert_eq!(state.coach_approval, Some(CoachApproval::Approved));
        assert_eq!(mock.coach_status_calls(), 1);
    }

    #[tokio::test]
    async fn coach_status_failure_degrades_approval_only() {
        let mock = Arc::new(
            MockIdentityService::new()
                .with_user(member(true), Some(profile_with_role(Role::Coach)))
                .with_coach_status_error(),
        );
        let store = SessionStore::new(mock);

        store.init().await;

        let state = store.snapshot().await;
        assert!(state.authenticated);
        assert_eq!(state.role, Role::Coach);
        assert_eq!(state.coach_approval, Some(CoachApproval::Unknown));
    }

    #[tokio::test]
    async fn primary_failure_clears_to_unauthenticated() {
        let mock = Arc::new(MockIdentityService::new().with_user_info_error());
        let store = SessionStore::new(mock);

        store.init().await;

        let state = store.snapshot().await;
        assert!(!state.authenticated);
        assert_eq!(state.role, Role::Unknown);
        assert!(!state.profile_complete);
        assert!(state.identity.is_none());
        // settled despite the failure
        assert_eq!(state.phase, ResolutionPhase::Ready);
    }

    #[tokio::test]
    async fn recovers_after_cleared_failure() {
        let mock = Arc::new(MockIdentityService::new().with_user_info_error());
        let store = SessionStore::new(mock.clone());

        store.init().await;
        assert!(!store.snapshot().await.authenticated);

        mock.set_user_info_error(false);
        mock.set_user(member(true), None);
        store.clear_auth_status().await;

        store.init().await;
        assert!(store.snapshot().await.authenticated);
        assert_eq!(mock.user_info_calls(), 2);
    }

    #[tokio::test]
    async fn level_comes_from_profile() {
        let profile = Profile {
            current_level: Some(GamificationLevel {
                level: "Gold".to_string(),
                rank: 3,
                xp: 900,
            }),
            ..Profile::default()
        };
        let mock = Arc::new(MockIdentityService::new().with_user(member(true), Some(profile)));
        let store = SessionStore::new(mock);

        store.init().await;

        assert_eq!(store.snapshot().await.level.level, "Gold");
    }

    #[tokio::test]
    async fn logout_clears_even_when_notification_fails() {
        let mock = Arc::new(
            MockIdentityService::new()
                .with_user(member(true), None)
                .with_logout_error(),
        );
        let store = SessionStore::new(mock.clone());

        store.init().await;
        assert!(store.snapshot().await.authenticated);

        let destination = store.logout().await;

        assert_eq!(destination, routes::LANDING);
        assert_eq!(mock.logout_calls(), 1);
        let state = store.snapshot().await;
        assert!(!state.authenticated);
        assert_eq!(state.phase, ResolutionPhase::Idle);
    }

    #[tokio::test]
    async fn set_role_mirrors_onto_profile() {
        let mock = Arc::new(
            MockIdentityService::new().with_user(member(false), Some(Profile::default())),
        );
        let store = SessionStore::new(mock);

        store.init().await;
        store.set_role(Role::Coach).await;

        let state = store.snapshot().await;
        assert_eq!(state.role, Role::Coach);
        assert_eq!(state.profile.unwrap().role, Some(Role::Coach));
    }

    #[tokio::test]
    async fn set_role_without_profile() {
        let mock = Arc::new(MockIdentityService::new().with_user(member(false), None));
        let store = SessionStore::new(mock);

        store.init().await;
        store.set_role(Role::Coach).await;

        let state = store.snapshot().await;
        assert_eq!(state.role, Role::Coach);
        assert!(state.profile.is_none());
    }

    #[tokio::test]
    async fn local_mutators_do_not_touch_the_network() {
        let mock = Arc::new(MockIdentityService::new().with_user(member(false), None));
        let store = SessionStore::new(mock.clone());

        store.init().await;
        store.set_profile_complete(true).await;
        store.set_goal("build_muscle").await;

        let state = store.snapshot().await;
        assert!(state.profile_complete);
        assert_eq!(state.goal.as_deref(), Some("build_muscle"));
        assert_eq!(mock.user_info_calls(), 1);
        assert_eq!(mock.coach_status_calls(), 0);
    }

    #[tokio::test]
    async fn refresh_updates_profile_without_rederiving() {
        let mock = Arc::new(
            MockIdentityService::new()
                .with_user(member(false), Some(profile_with_role(Role::Coach)))
                .with_coach_status(CoachApproval::Pending),
        );
        let store = SessionStore::new(mock.clone());

        store.init().await;
        let state = store.snapshot().await;
        assert_eq!(state.role, Role::Coach);
        assert!(!state.profile_complete);

        // onboarding finishes server-side; approval flips too, but a
        // refresh must not pick that up
        mock.set_user(member(true), Some(profile_with_role(Role::Coach)));
        store.refresh().await;

        let state = store.snapshot().await;
        assert!(state.profile_complete);
        assert_eq!(state.role, Role::Coach);
        assert_eq!(state.coach_approval, Some(CoachApproval::Pending));
        assert_eq!(state.phase, ResolutionPhase::Ready);
        // primary re-fetched once, coach status not re-fetched
        assert_eq!(mock.user_info_calls(), 2);
        assert_eq!(mock.coach_status_calls(), 1);
    }

    #[tokio::test]
    async fn refresh_keeps_state_on_transport_failure() {
        let mock = Arc::new(MockIdentityService::new().with_user(member(true), None));
        let store = SessionStore::new(mock.clone());

        store.init().await;
        mock.set_user_info_error(true);
        store.refresh().await;

        assert!(store.snapshot().await.authenticated);
    }

    #[tokio::test]
    async fn refresh_clears_when_session_is_gone() {
        let mock = Arc::new(MockIdentityService::new().with_user(member(true), None));
        let store = SessionStore::new(mock.clone());

        store.init().await;
        mock.set_anonymous();
        store.refresh().await;

        let state = store.snapshot().await;
        assert!(!state.authenticated);
        assert_eq!(state.role, Role::Unknown);
        // the phase stays settled; refresh never reopens the cycle
        assert_eq!(state.phase, ResolutionPhase::Ready);
    }
}
