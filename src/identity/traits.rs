//! Service seam over the platform's credentialed identity endpoints.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CoachApproval, Identity, Profile};

/// The identity document, normalized from the wire.
#[derive(Debug, Clone, Default)]
pub struct UserInfo {
    /// Whether the ambient credentials map to a live session.
    pub authenticated: bool,
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
}

/// Coach approval status from the secondary lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoachStatus {
    pub approval: CoachApproval,
}

/// Remote identity service consumed by the session store.
///
/// Implementations carry the ambient session credentials themselves; the
/// store never sees tokens or cookies.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Fetch the primary identity + profile document.
    async fn fetch_user_info(&self) -> Result<UserInfo>;

    /// Fetch the coach approval status. Consulted only for coach
    /// sessions.
    async fn fetch_coach_status(&self) -> Result<CoachStatus>;

    /// Tell the service the visitor is logging out. Best-effort: the
    /// store clears local state whether or not this succeeds.
    async fn notify_logout(&self) -> Result<()>;
}
