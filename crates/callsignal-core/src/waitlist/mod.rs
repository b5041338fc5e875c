//! Waitlist sign-up boundary: form validation, dedupe on email and the
//! repository seam.

mod model;
mod repository;

use chrono::Utc;

pub use model::{
    INDUSTRIES, INDUSTRY_PLACEHOLDER, WaitlistEntry, WaitlistStatus, WaitlistSubmission,
    normalize_email,
};
pub use repository::WaitlistRepository;

use crate::error::Result;

/// Server-side handling of one submission: validate, dedupe on email,
/// then store.
///
/// # Errors
///
/// `Validation` for a malformed form; repository errors are passed through.
pub async fn register(
    repository: &dyn WaitlistRepository,
    submission: WaitlistSubmission,
) -> Result<WaitlistStatus> {
    submission.validate()?;
    if repository.contains_email(&submission.email_key()).await? {
        tracing::info!(target: "waitlist", "email already on waitlist");
        return Ok(WaitlistStatus::Exists);
    }
    repository.insert(submission.into_entry(Utc::now())).await?;
    tracing::info!(target: "waitlist", "new waitlist signup");
    Ok(WaitlistStatus::Success)
}
