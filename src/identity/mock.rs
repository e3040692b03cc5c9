//! Mock identity service for testing.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{CoachStatus, IdentityService, UserInfo};
use crate::error::{IdentityError, Result};
use crate::types::{CoachApproval, Identity, Profile};

/// Mock identity service.
///
/// Configurable responses, failure switches, optional latency, and call
/// counters so tests can assert the single-fetch guarantees.
pub struct MockIdentityService {
    user_info: Mutex<UserInfo>,
    coach_approval: Mutex<CoachApproval>,
    user_info_fails: AtomicBool,
    coach_status_fails: AtomicBool,
    logout_fails: AtomicBool,
    latency: Mutex<Option<Duration>>,
    user_info_calls: AtomicU32,
    coach_status_calls: AtomicU32,
    logout_calls: AtomicU32,
}

impl MockIdentityService {
    /// Create a mock that answers as an anonymous visitor.
    pub fn new() -> Self {
        Self {
            user_info: Mutex::new(UserInfo::default()),
            coach_approval: Mutex::new(CoachApproval::Unknown),
            user_info_fails: AtomicBool::new(false),
            coach_status_fails: AtomicBool::new(false),
            logout_fails: AtomicBool::new(false),
            latency: Mutex::new(None),
            user_info_calls: AtomicU32::new(0),
            coach_status_calls: AtomicU32::new(0),
            logout_calls: AtomicU32::new(0),
        }
    }

    /// Answer with an authenticated visitor.
    pub fn with_user(self, identity: Identity, profile: Option<Profile>) -> Self {
        self.set_user(identity, profile);
        self
    }

    /// Set the coach approval answer.
    pub fn with_coach_status(self, approval: CoachApproval) -> Self {
        *self.coach_approval.lock().unwrap() = approval;
        self
    }

    /// Make the primary fetch fail.
    pub fn with_user_info_error(self) -> Self {
        self.user_info_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make the coach status fetch fail.
    pub fn with_coach_status_error(self) -> Self {
        self.coach_status_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make the logout notification fail.
    pub fn with_logout_error(self) -> Self {
        self.logout_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Delay every answer, so tests can overlap concurrent callers.
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock().unwrap() = Some(latency);
        self
    }

    /// Replace the visitor after construction (server-side change).
    pub fn set_user(&self, identity: Identity, profile: Option<Profile>) {
        *self.user_info.lock().unwrap() = UserInfo {
            authenticated: true,
            identity: Some(identity),
            profile,
        };
    }

    /// Replace the answer with an anonymous visitor.
    pub fn set_anonymous(&self) {
        *self.user_info.lock().unwrap() = UserInfo::default();
    }

    pub fn set_user_info_error(&self, fails: bool) {
        self.user_info_fails.store(fails, Ordering::SeqCst);
    }

    pub fn user_info_calls(&self) -> u32 {
        self.user_info_calls.load(Ordering::SeqCst)
    }

    pub fn coach_status_calls(&self) -> u32 {
        self.coach_status_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> u32 {
        self.logout_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn failure(&self) -> IdentityError {
        IdentityError::Status {
            status: 503,
            message: "mock failure".to_string(),
        }
    }
}

impl Default for MockIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn fetch_user_info(&self) -> Result<UserInfo> {
        self.user_info_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.user_info_fails.load(Ordering::SeqCst) {
            return Err(self.failure());
        }
        Ok(self.user_info.lock().unwrap().clone())
    }

    async fn fetch_coach_status(&self) -> Result<CoachStatus> {
        self.coach_status_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.coach_status_fails.load(Ordering::SeqCst) {
            return Err(self.failure());
        }
        Ok(CoachStatus {
            approval: *self.coach_approval.lock().unwrap(),
        })
    }

    async fn notify_logout(&self) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(self.failure());
        }
        Ok(())
    }
}
