//! Route metadata consumed by the authorization gate.
//!
//! The route table itself belongs to the routing layer; the gate reads
//! `(path, RouteRequirement)` pairs and nothing else. The application's
//! paths are named here so the policy can spell out its redirect targets.

use serde::{Deserialize, Serialize};

/// Public entry route.
pub const LANDING: &str = "/";
pub const ABOUT: &str = "/about";
/// Onboarding: role selection
pub const SELECT_ROLE: &str = "/select-role";
/// Onboarding: profile details
pub const ABOUT_YOU: &str = "/about-you";
/// Generic profile editing. Coaches are redirected away from this page.
pub const PROFILE: &str = "/profile";
pub const DASHBOARD: &str = "/dashboard";
pub const SELECT_GOAL: &str = "/select-goal";
pub const WORKOUT: &str = "/workout";
pub const COACH_DASHBOARD: &str = "/coach-dashboard";
/// Coach landing while approval is pending; also the coach's profile
/// surface.
pub const COACH_PORTAL: &str = "/coach-portal";
/// Admin landing route and namespace root.
pub const ADMIN_HOME: &str = "/admin";

/// The pre-dashboard setup screens, in flow order.
pub const ONBOARDING_STEPS: [&str; 2] = [SELECT_ROLE, ABOUT_YOU];

pub fn is_onboarding_step(path: &str) -> bool {
    ONBOARDING_STEPS.contains(&path)
}

/// Whether a path lives under the admin section of the application.
pub fn in_admin_namespace(path: &str) -> bool {
    path == ADMIN_HOME || path.starts_with("/admin/")
}

/// Authorization metadata the routing layer attaches to a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequirement {
    #[serde(default)]
    pub requires_admin: bool,
    #[serde(default)]
    pub requires_coach: bool,
    #[serde(default)]
    pub is_onboarding_step: bool,
}

impl RouteRequirement {
    pub fn admin_only() -> Self {
        Self {
            requires_admin: true,
            ..Self::default()
        }
    }

    pub fn coach_only() -> Self {
        Self {
            requires_coach: true,
            ..Self::default()
        }
    }

    pub fn onboarding() -> Self {
        Self {
            is_onboarding_step: true,
            ..Self::default()
        }
    }
}

/// Ordered list of `(path, requirement)` pairs supplied by the routing
/// layer.
///
/// Lookup prefers an exact match, then the longest registered prefix at a
/// segment boundary (`/workout/42` inherits `/workout`, the admin pages
/// inherit `/admin`). Unknown paths carry no requirements.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<(String, RouteRequirement)>,
}

impl RouteTable {
    pub fn new(entries: Vec<(String, RouteRequirement)>) -> Self {
        Self { entries }
    }

    /// The HealthQuest route table.
    pub fn standard() -> Self {
        Self::new(vec![
            (LANDING.into(), RouteRequirement::default()),
            (ABOUT.into(), RouteRequirement::default()),
            (SELECT_ROLE.into(), RouteRequirement::onboarding()),
            (ABOUT_YOU.into(), RouteRequirement::onboarding()),
            (PROFILE.into(), RouteRequirement::default()),
            (DASHBOARD.into(), RouteRequirement::default()),
            (SELECT_GOAL.into(), RouteRequirement::default()),
            (WORKOUT.into(), RouteRequirement::default()),
            (COACH_DASHBOARD.into(), RouteRequirement::coach_only()),
            (COACH_PORTAL.into(), RouteRequirement::default()),
            (ADMIN_HOME.into(), RouteRequirement::admin_only()),
        ])
    }

    /// Requirement for a destination path.
    pub fn lookup(&self, path: &str) -> RouteRequirement {
        if let Some((_, requirement)) = self.entries.iter().find(|(p, _)| p == path) {
            return *requirement;
        }

        // Longest prefix at a '/' boundary; the root path would match
        // everything, so it only matches exactly.
        self.entries
            .iter()
            .filter(|(p, _)| {
                p != LANDING
                    && path.starts_with(p.as_str())
                    && path.as_bytes().get(p.len()) == Some(&b'/')
            })
            .max_by_key(|(p, _)| p.len())
            .map(|(_, requirement)| *requirement)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onboarding_set_is_fixed() {
        assert!(is_onboarding_step(SELECT_ROLE));
        assert!(is_onboarding_step(ABOUT_YOU));
        assert!(!is_onboarding_step(DASHBOARD));
        assert!(!is_onboarding_step(PROFILE));
    }

    #[test]
    fn admin_namespace() {
        assert!(in_admin_namespace(ADMIN_HOME));
        assert!(in_admin_namespace("/admin/users"));
        assert!(!in_admin_namespace("/administrator"));
        assert!(!in_admin_namespace(DASHBOARD));
    }

    #[test]
    fn lookup_exact() {
        let table = RouteTable::standard();
        assert!(table.lookup(COACH_DASHBOARD).requires_coach);
        assert!(table.lookup(ADMIN_HOME).requires_admin);
        assert!(table.lookup(SELECT_ROLE).is_onboarding_step);
        assert_eq!(table.lookup(DASHBOARD), RouteRequirement::default());
    }

    #[test]
    fn lookup_prefix() {
        let table = RouteTable::standard();
        assert!(table.lookup("/admin/users").requires_admin);
        assert_eq!(table.lookup("/workout/42"), RouteRequirement::default());
    }

    #[test]
    fn lookup_unknown_has_no_requirements() {
        let table = RouteTable::standard();
        assert_eq!(table.lookup("/no-such-page"), RouteRequirement::default());
        // the root entry must not act as a catch-all prefix
        assert_eq!(table.lookup("/zzz"), RouteRequirement::default());
    }

    #[test]
    fn lookup_prefix_respects_segment_boundary() {
        let table = RouteTable::new(vec![("/admin".into(), RouteRequirement::admin_only())]);
        assert!(table.lookup("/admin/roles").requires_admin);
        assert!(!table.lookup("/administrator").requires_admin);
    }
}
