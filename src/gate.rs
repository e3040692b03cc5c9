//! Navigation interception.
//!
//! The gate sits between the router and the views: every navigation
//! attempt passes through [`AuthorizationGate::authorize`] before it
//! commits, and comes back as either "proceed" or "redirect".

use std::sync::Arc;

use tracing::debug;

use crate::policy::{self, AccessFlags, Decision};
use crate::routes::RouteTable;
use crate::session::SessionStore;

/// Decides, for every navigation attempt, whether it proceeds or is
/// redirected.
///
/// The gate holds no state of its own: it reads one [`SessionStore`]
/// snapshot per attempt and applies the precedence policy. It never fails
/// a navigation - a destination the table knows nothing about carries no
/// requirements and falls through to an allow, so an attempt the gate
/// cannot adjudicate is let through rather than frozen.
pub struct AuthorizationGate {
    store: Arc<SessionStore>,
    table: RouteTable,
}

impl AuthorizationGate {
    pub fn new(store: Arc<SessionStore>, table: RouteTable) -> Self {
        Self { store, table }
    }

    /// Authorize a navigation to `path`.
    ///
    /// Triggers or awaits the session resolution first - the sole
    /// suspension point - so every concurrent navigation decides from the
    /// same settled snapshot.
    pub async fn authorize(&self, path: &str) -> Decision {
        self.store.init().await;

        let snapshot = self.store.snapshot().await;
        let flags = AccessFlags::from_state(&snapshot);
        let requirement = self.table.lookup(path);
        let decision = policy::decide(flags, path, requirement);

        debug!(path, ?decision, role = %snapshot.role, "navigation adjudicated");
        decision
    }
}
