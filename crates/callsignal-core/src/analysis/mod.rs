//! Narrative analysis: result model, remote backend seam, keyword scorer and
//! the discrepancy rule table.

pub mod backend;
pub mod model;
pub mod rules;
pub mod scorer;

pub use backend::AnalysisBackend;
pub use model::{
    AnalysisOutcome, AnalysisRequest, AnalysisResult, Attribution, Discrepancy, DiscrepancyType,
    DriverSentiment, NarrativeDriver, Trend,
};
pub use rules::{DiscrepancyFinding, DiscrepancyRule, EventLink, RuleTable, RuleVerdict};
pub use scorer::{Assessment, HeuristicScorer};
