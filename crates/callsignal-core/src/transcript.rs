//! Transcript domain model.
//!
//! A run of the simulator produces an ordered stream of [`TranscriptSegment`]s,
//! each attributed to a speaker with a [`SpeakerRole`].

use serde::{Deserialize, Serialize};
use strum::Display;

/// Who is speaking on the call.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SpeakerRole {
    #[serde(rename = "CEO")]
    #[strum(to_string = "CEO")]
    Ceo,
    #[serde(rename = "CFO")]
    #[strum(to_string = "CFO")]
    Cfo,
    Analyst,
    Operator,
    System,
}

/// Which part of the call a segment belongs to.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CallSection {
    #[strum(to_string = "Prepared Remarks")]
    PreparedRemarks,
    #[serde(rename = "QA")]
    #[strum(to_string = "Q&A")]
    Qa,
}

impl SpeakerRole {
    /// Analyst questions belong to Q&A, everything else to prepared remarks.
    pub fn section(self) -> CallSection {
        match self {
            SpeakerRole::Analyst => CallSection::Qa,
            _ => CallSection::PreparedRemarks,
        }
    }
}

/// One attributed, timestamped utterance. Immutable once emitted.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    /// Unique identifier (UUID format)
    pub id: String,
    /// Identifier of the run that produced this segment
    pub run_id: String,
    /// 1-based, gap-free position within the run
    pub sequence_id: u64,
    pub ticker: String,
    pub company_name: String,
    /// Wall-clock display string (`HH:MM:SS`)
    pub timestamp: String,
    pub speaker: String,
    pub role: SpeakerRole,
    pub text: String,
    pub section: CallSection,
}

/// Link status reported to feed subscribers.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Snapshot of the feed connection for status displays.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    /// Synthetic round-trip latency in milliseconds
    pub latency: u32,
    pub message_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionState {
    pub fn disconnected(message_count: u64) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            latency: 0,
            message_count,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_section_mapping() {
        assert_eq!(SpeakerRole::Analyst.section(), CallSection::Qa);
        assert_eq!(SpeakerRole::Ceo.section(), CallSection::PreparedRemarks);
        assert_eq!(SpeakerRole::Cfo.section(), CallSection::PreparedRemarks);
    }

    #[test]
    fn test_segment_wire_shape() {
        let segment = TranscriptSegment {
            id: "seg-1".to_string(),
            run_id: "run-1".to_string(),
            sequence_id: 1,
            ticker: "NVDA".to_string(),
            company_name: "NVIDIA".to_string(),
            timestamp: "09:30:00".to_string(),
            speaker: "Colette Kress".to_string(),
            role: SpeakerRole::Cfo,
            text: "Gross margins held.".to_string(),
            section: CallSection::PreparedRemarks,
        };

        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["runId"], "run-1");
        assert_eq!(json["sequenceId"], 1);
        assert_eq!(json["role"], "CFO");
        assert_eq!(json["section"], "PreparedRemarks");
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(SpeakerRole::Ceo.to_string(), "CEO");
        assert_eq!(CallSection::Qa.to_string(), "Q&A");
        assert_eq!(ConnectionStatus::Connected.to_string(), "Connected");
    }
}
