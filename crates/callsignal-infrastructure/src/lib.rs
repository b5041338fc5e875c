pub mod config_service;
pub mod paths;
pub mod preference_store;
pub mod secret_service;
pub mod storage;
pub mod waitlist_repository;

pub use crate::config_service::ConfigService;
pub use crate::paths::CallSignalPaths;
pub use crate::preference_store::PreferenceStore;
pub use crate::secret_service::SecretServiceImpl;
pub use crate::waitlist_repository::{InMemoryWaitlistRepository, TomlWaitlistRepository};
