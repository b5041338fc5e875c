pub mod analysis;
pub mod config;
pub mod corpus;
pub mod dashboard;
pub mod error;
pub mod rng;
pub mod secret;
pub mod simulation;
pub mod tape;
pub mod transcript;
pub mod waitlist;

// Re-export common error type
pub use error::{CallSignalError, Result};
pub use rng::SimRng;
