//! Waitlist repository trait.

use async_trait::async_trait;

use super::model::WaitlistEntry;
use crate::error::Result;

/// Storage for waitlist sign-ups.
///
/// Email lookups are case-insensitive; implementations compare normalized
/// addresses (see [`super::normalize_email`]).
#[async_trait]
pub trait WaitlistRepository: Send + Sync {
    async fn contains_email(&self, email: &str) -> Result<bool>;

    async fn insert(&self, entry: WaitlistEntry) -> Result<()>;

    /// All entries in sign-up order.
    async fn list(&self) -> Result<Vec<WaitlistEntry>>;
}
