//! Waitlist sign-up as the client sees it.
//!
//! Form errors come back as errors so they can be shown inline. Storage
//! trouble never does: the sign-up is reported as accepted and logged.

use std::sync::Arc;

use callsignal_core::error::Result;
use callsignal_core::waitlist::{self, WaitlistRepository, WaitlistStatus, WaitlistSubmission};

/// Result of a sign-up attempt that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Joined,
    AlreadyJoined,
    /// The store was unreachable; the client reports success anyway.
    AcceptedOffline,
}

impl SignupOutcome {
    /// What the user is told. Every outcome reads as success.
    pub fn message(self) -> &'static str {
        match self {
            SignupOutcome::Joined | SignupOutcome::AcceptedOffline => "You're on the list.",
            SignupOutcome::AlreadyJoined => "You're already on the list.",
        }
    }
}

pub struct WaitlistService {
    repository: Arc<dyn WaitlistRepository>,
}

impl WaitlistService {
    pub fn new(repository: Arc<dyn WaitlistRepository>) -> Self {
        Self { repository }
    }

    /// # Errors
    ///
    /// Only `Validation` from the form check, carrying the message to show
    /// next to the form.
    pub async fn join(&self, submission: WaitlistSubmission) -> Result<SignupOutcome> {
        submission.validate()?;
        match waitlist::register(self.repository.as_ref(), submission).await {
            Ok(WaitlistStatus::Success) => Ok(SignupOutcome::Joined),
            Ok(WaitlistStatus::Exists) => Ok(SignupOutcome::AlreadyJoined),
            // The form already passed, so this is a store refusing a duplicate
            // that slipped past the lookup.
            Err(e) if e.is_validation() => {
                tracing::info!(target: "waitlist", error = %e, "duplicate rejected at insert");
                Ok(SignupOutcome::AlreadyJoined)
            }
            Err(e) => {
                tracing::warn!(target: "waitlist", error = %e, "waitlist store unavailable; accepting offline");
                Ok(SignupOutcome::AcceptedOffline)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use callsignal_core::error::CallSignalError;
    use callsignal_core::waitlist::WaitlistEntry;
    use callsignal_infrastructure::InMemoryWaitlistRepository;

    struct Unreachable;

    #[async_trait]
    impl WaitlistRepository for Unreachable {
        async fn contains_email(&self, _email: &str) -> Result<bool> {
            Err(CallSignalError::transport("connection refused"))
        }

        async fn insert(&self, _entry: WaitlistEntry) -> Result<()> {
            Err(CallSignalError::transport("connection refused"))
        }

        async fn list(&self) -> Result<Vec<WaitlistEntry>> {
            Err(CallSignalError::transport("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_join_then_duplicate() {
        let service = WaitlistService::new(Arc::new(InMemoryWaitlistRepository::new()));
        let submission = WaitlistSubmission::new("Grace Hopper", "grace@navy.mil", "Other");
        assert_eq!(service.join(submission.clone()).await.unwrap(), SignupOutcome::Joined);
        assert_eq!(service.join(submission).await.unwrap(), SignupOutcome::AlreadyJoined);
    }

    #[tokio::test]
    async fn test_validation_message_is_returned() {
        let service = WaitlistService::new(Arc::new(Unreachable));
        let err = service
            .join(WaitlistSubmission::new("G", "grace@navy.mil", "Other"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Name must be at least 2 characters.");
    }

    #[tokio::test]
    async fn test_unreachable_store_accepts_offline() {
        let service = WaitlistService::new(Arc::new(Unreachable));
        let outcome = service
            .join(WaitlistSubmission::new("Grace Hopper", "grace@navy.mil", "Other"))
            .await
            .unwrap();
        assert_eq!(outcome, SignupOutcome::AcceptedOffline);
        assert_eq!(outcome.message(), "You're on the list.");
    }
}
