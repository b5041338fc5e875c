//! Credential source for the remote analysis backend.

use crate::config::SecretConfig;
use crate::error::Result;

/// Loads the Gemini credential.
///
/// Implementations keep key material out of logs and error messages, and
/// store it with owner-only permissions where the platform allows.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// A missing source is not an error; it yields an empty [`SecretConfig`],
    /// which callers read as "run on the heuristic scorer".
    async fn load_secrets(&self) -> Result<SecretConfig>;

    async fn secret_file_exists(&self) -> bool;
}
