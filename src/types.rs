//! Domain model for the visitor session.
//!
//! One [`SessionState`] value exists per application lifetime, owned by
//! [`SessionStore`](crate::session::SessionStore) and reset on logout.
//! Everything here is plain data; the resolution and mutation logic lives
//! in the store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized visitor role.
///
/// An administrator flag on the identity record always wins over whatever
/// the profile declares; see
/// [`SessionStore::init`](crate::session::SessionStore::init).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No resolved session
    #[default]
    Unknown,
    /// Regular member
    User,
    Coach,
    Admin,
}

impl Role {
    /// Map a profile-declared role string to a role.
    ///
    /// `"normal"` and `"member"` are historical spellings for regular
    /// users; anything unrecognized falls back to [`Role::User`] as well.
    pub fn from_declared(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            "coach" => Role::Coach,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Unknown => write!(f, "unknown"),
            Role::User => write!(f, "user"),
            Role::Coach => write!(f, "coach"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Coach approval status from the secondary lookup.
///
/// Only meaningful while the role is [`Role::Coach`]. Everything except
/// `Approved` gates like not-approved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoachApproval {
    Pending,
    Approved,
    Rejected,
    /// Status missing or the lookup failed
    #[default]
    Unknown,
}

impl CoachApproval {
    /// Map the wire `status_approval` string. `"approved"` is the only
    /// value that unlocks coach destinations.
    pub fn from_status(value: &str) -> Self {
        match value {
            "approved" => CoachApproval::Approved,
            "pending" => CoachApproval::Pending,
            "rejected" => CoachApproval::Rejected,
            _ => CoachApproval::Unknown,
        }
    }

    pub fn is_approved(self) -> bool {
        self == CoachApproval::Approved
    }
}

/// Lifecycle of the asynchronous session resolution.
///
/// `Resolving` is transient: every transition into it leaves it again, to
/// `Ready`, on success and failure alike. Logout resets the whole state
/// back to `Idle`, permitting a fresh cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionPhase {
    #[default]
    Idle,
    Resolving,
    Ready,
}

/// Display-only gamification level.
///
/// Defaults to the entry level and never participates in authorization
/// decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamificationLevel {
    pub level: String,
    pub rank: u32,
    pub xp: u32,
}

impl Default for GamificationLevel {
    fn default() -> Self {
        Self {
            level: "Bronze".to_string(),
            rank: 1,
            xp: 0,
        }
    }
}

/// Raw visitor record from the identity endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub is_staff: bool,
    pub profile_complete: bool,
}

/// Domain profile: role hint, onboarding answers, avatar, level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Role the profile declares. Overridden by the identity record's
    /// administrator flag during normalization.
    pub role: Option<Role>,
    /// Height in cm
    pub height: Option<f64>,
    /// Weight in kg
    pub weight: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub location: Option<String>,
    /// Avatar path
    pub photo: Option<String>,
    pub current_level: Option<GamificationLevel>,
}

/// The single shared session record.
///
/// Cleared atomically: the unauthenticated default is written as one
/// value, so `authenticated = false` always comes with
/// `profile_complete = false` and `role = Unknown`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub authenticated: bool,
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub profile_complete: bool,
    pub role: Role,
    /// Populated only when `role` is [`Role::Coach`].
    pub coach_approval: Option<CoachApproval>,
    /// Fitness goal picked during onboarding, mirrored locally ahead of
    /// the server round-trip
    pub goal: Option<String>,
    pub phase: ResolutionPhase,
    pub level: GamificationLevel,
}
