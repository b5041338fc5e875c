//! The synthetic call generator: momentum dynamics, sentence synthesis and
//! the per-run session that ties them together.

pub mod momentum;
pub mod session;
pub mod synthesizer;

pub use momentum::{MomentumProcess, Regime, RegimeParams};
pub use session::{Session, draw_polarity, draw_role};
pub use synthesizer::{MAX_SYNTHESIS_ATTEMPTS, RecentText, fill_template, synthesize};
