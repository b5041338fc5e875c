//! Application layer for CallSignal.
//!
//! Wires the simulator, the analysis pipeline, dashboard state and the
//! waitlist boundary into runnable services.

pub mod feed_scheduler;
pub mod live_dashboard;
pub mod narrative_processor;
pub mod subscriber;
pub mod waitlist_service;

pub use feed_scheduler::FeedScheduler;
pub use live_dashboard::{DashboardUpdate, LiveDashboard};
pub use narrative_processor::NarrativeProcessor;
pub use subscriber::{ChannelSubscriber, FeedEvent, FeedSubscriber};
pub use waitlist_service::{SignupOutcome, WaitlistService};
