//! Analysis result model shared by the heuristic scorer and the remote
//! analysis boundary.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::corpus::{Level, MarketEvent};
use crate::transcript::SpeakerRole;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DriverSentiment {
    Positive,
    Negative,
    Neutral,
}

/// Direction arrow shown next to a driver.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// A short excerpt explaining why a score moved.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeDriver {
    /// Verbatim (possibly shortened) phrase from the transcript
    pub quote: String,
    /// One-line context, e.g. the topic label
    #[serde(default)]
    pub explanation: String,
    pub sentiment: DriverSentiment,
    pub trend: Trend,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DiscrepancyType {
    Reversal,
    #[serde(rename = "Walk-back")]
    #[strum(to_string = "Walk-back")]
    WalkBack,
    #[serde(rename = "Scope Shrinkage")]
    #[strum(to_string = "Scope Shrinkage")]
    ScopeShrinkage,
    #[serde(rename = "Topic Silence")]
    #[strum(to_string = "Topic Silence")]
    TopicSilence,
    #[serde(rename = "New Risk")]
    #[strum(to_string = "New Risk")]
    NewRisk,
}

/// A contradiction between the current statement and a prior-quarter one.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    #[serde(rename = "type")]
    pub discrepancy_type: DiscrepancyType,
    pub severity: Level,
    pub previous_statement: String,
    pub current_statement: String,
    pub explanation: String,
}

/// Link between a narrative shift and an external market event.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Attribution {
    pub event: MarketEvent,
    pub confidence: Level,
    pub reasoning: String,
}

/// Scores, drivers and commentary for one analysed stretch of transcript.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub confidence_score: u8,
    pub risk_score: u8,
    #[serde(default)]
    pub confidence_drivers: Vec<NarrativeDriver>,
    #[serde(default)]
    pub risk_drivers: Vec<NarrativeDriver>,
    pub tone_analysis: String,
    #[serde(default)]
    pub consistency_note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrepancy: Option<Discrepancy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
}

impl AnalysisResult {
    /// Confidence drivers followed by risk drivers.
    pub fn drivers(&self) -> impl Iterator<Item = &NarrativeDriver> {
        self.confidence_drivers.iter().chain(self.risk_drivers.iter())
    }

    /// Net sentiment in `[-1, 1]`, rounded to two decimals.
    pub fn net_sentiment(&self) -> f64 {
        let raw = (f64::from(self.confidence_score) - f64::from(self.risk_score)) / 100.0;
        (raw * 100.0).round() / 100.0
    }
}

/// Input to an analysis backend.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub text: String,
    pub speaker_role: SpeakerRole,
    pub prior_context_summary: String,
}

/// What a remote backend produced: a validated result, or a signal that the
/// caller must fall back to the heuristic scorer.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Analysis(AnalysisResult),
    FallbackRequired { reason: String },
}

impl AnalysisOutcome {
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self::FallbackRequired {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(quote: &str, trend: Trend) -> NarrativeDriver {
        NarrativeDriver {
            quote: quote.to_string(),
            explanation: String::new(),
            sentiment: DriverSentiment::Neutral,
            trend,
        }
    }

    #[test]
    fn test_net_sentiment_rounds_to_two_decimals() {
        let result = AnalysisResult {
            confidence_score: 77,
            risk_score: 24,
            confidence_drivers: vec![],
            risk_drivers: vec![],
            tone_analysis: "Optimistic".to_string(),
            consistency_note: String::new(),
            discrepancy: None,
            attribution: None,
        };
        assert_eq!(result.net_sentiment(), 0.53);
    }

    #[test]
    fn test_drivers_order() {
        let result = AnalysisResult {
            confidence_score: 50,
            risk_score: 50,
            confidence_drivers: vec![driver("up", Trend::Up)],
            risk_drivers: vec![driver("down", Trend::Down)],
            tone_analysis: String::new(),
            consistency_note: String::new(),
            discrepancy: None,
            attribution: None,
        };
        let quotes: Vec<_> = result.drivers().map(|d| d.quote.as_str()).collect();
        assert_eq!(quotes, ["up", "down"]);
    }

    #[test]
    fn test_discrepancy_type_wire_names() {
        let json = serde_json::to_string(&DiscrepancyType::WalkBack).unwrap();
        assert_eq!(json, "\"Walk-back\"");
        assert_eq!(DiscrepancyType::NewRisk.to_string(), "New Risk");
    }
}
