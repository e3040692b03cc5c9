//! HealthQuest session synchronization and route authorization.
//!
//! Resolves "who is the current visitor and what can they do" from the
//! platform's identity endpoints, caches the answer in one shared
//! [`SessionState`], and adjudicates every navigation attempt with a
//! fixed precedence policy (onboarding completeness, role, coach
//! approval).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              AuthorizationGate              │
//! │   (navigation attempt → proceed/redirect)   │
//! └────────────────────┬────────────────────────┘
//!                      │ init + snapshot
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │                SessionStore                 │
//! │  (single-flight resolution, mutators)       │
//! └────────────────────┬────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │               IdentityService               │
//! │   (user-info / coach-status / logout)       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Concurrent navigations racing the first resolution are coalesced onto
//! a single identity fetch; every one of them decides from the same
//! settled snapshot. Network failures degrade (to unauthenticated, or to
//! not-approved for the coach sub-fetch) instead of failing the
//! navigation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use healthquest_session::{
//!     AuthorizationGate, Decision, IdentityConfig, RouteTable, SessionStore,
//! };
//!
//! # async fn example() {
//! let store = Arc::new(SessionStore::with_http(IdentityConfig::default()));
//! let gate = AuthorizationGate::new(Arc::clone(&store), RouteTable::standard());
//!
//! match gate.authorize("/dashboard").await {
//!     Decision::Proceed => { /* commit the navigation */ }
//!     Decision::Redirect(to) => { /* navigate to `to` instead */ }
//! }
//! # }
//! ```

pub mod error;
pub mod gate;
pub mod identity;
pub mod policy;
pub mod routes;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use error::{IdentityError, Result};
pub use gate::AuthorizationGate;
pub use identity::{
    CoachStatus, HttpIdentityService, IdentityConfig, IdentityService, MockIdentityService,
    UserInfo,
};
pub use policy::{AccessFlags, Decision};
pub use routes::{RouteRequirement, RouteTable};
pub use session::SessionStore;
pub use types::{
    CoachApproval, GamificationLevel, Identity, Profile, ResolutionPhase, Role, SessionState,
};
