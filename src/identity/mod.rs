//! Identity service abstraction layer.
//!
//! One trait over the platform's credentialed endpoints, an HTTP
//! implementation, and a configurable mock for tests.

pub mod http;
pub mod mock;
pub mod traits;

pub use http::{HttpIdentityService, IdentityConfig};
pub use mock::MockIdentityService;
pub use traits::{CoachStatus, IdentityService, UserInfo};
