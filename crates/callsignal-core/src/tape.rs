//! Rolling, deduplicated log of narrative drivers surfaced during a run.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{AnalysisResult, NarrativeDriver, Trend};

pub const DRIVER_TAPE_CAP: usize = 200;
/// How many of the most recent entries a new driver is checked against.
pub const DEDUPE_WINDOW: usize = 20;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TapeEntry {
    pub id: String,
    pub segment_id: String,
    pub quote: String,
    pub trend: Trend,
    pub timestamp: DateTime<Utc>,
}

/// Insertion-ordered driver log capped at [`DRIVER_TAPE_CAP`] entries.
///
/// Entries are never mutated once appended; overflow drops the oldest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverTape {
    entries: VecDeque<TapeEntry>,
}

impl DriverTape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted tape, keeping the newest entries if over cap.
    pub fn from_entries(entries: Vec<TapeEntry>) -> Self {
        let mut entries: VecDeque<TapeEntry> = entries.into();
        while entries.len() > DRIVER_TAPE_CAP {
            entries.pop_front();
        }
        Self { entries }
    }

    /// Appends every driver of `result`, attributed to `segment_id`.
    /// Returns how many entries were added.
    pub fn record(&mut self, segment_id: &str, result: &AnalysisResult, now: DateTime<Utc>) -> usize {
        result
            .drivers()
            .filter(|driver| self.append(segment_id, driver, now))
            .count()
    }

    /// Appends one driver unless an entry with the same segment and quote is
    /// among the last [`DEDUPE_WINDOW`] entries.
    pub fn append(&mut self, segment_id: &str, driver: &NarrativeDriver, now: DateTime<Utc>) -> bool {
        let duplicate = self
            .entries
            .iter()
            .rev()
            .take(DEDUPE_WINDOW)
            .any(|entry| entry.segment_id == segment_id && entry.quote == driver.quote);
        if duplicate {
            return false;
        }

        self.entries.push_back(TapeEntry {
            id: Uuid::new_v4().to_string(),
            segment_id: segment_id.to_string(),
            quote: driver.quote.clone(),
            trend: driver.trend,
            timestamp: now,
        });
        if self.entries.len() > DRIVER_TAPE_CAP {
            self.entries.pop_front();
        }
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &TapeEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<TapeEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DriverSentiment;

    fn driver(quote: &str) -> NarrativeDriver {
        NarrativeDriver {
            quote: quote.to_string(),
            explanation: "Demand Outlook".to_string(),
            sentiment: DriverSentiment::Positive,
            trend: Trend::Up,
        }
    }

    #[test]
    fn test_duplicate_within_window_is_skipped() {
        let mut tape = DriverTape::new();
        let now = Utc::now();
        assert!(tape.append("seg-1", &driver("record demand"), now));
        assert!(!tape.append("seg-1", &driver("record demand"), now));
        assert_eq!(tape.len(), 1);
        // Same quote, different segment is a new entry.
        assert!(tape.append("seg-2", &driver("record demand"), now));
        assert_eq!(tape.len(), 2);
    }

    #[test]
    fn test_duplicate_reappears_after_window() {
        let mut tape = DriverTape::new();
        let now = Utc::now();
        assert!(tape.append("seg-1", &driver("q"), now));
        for i in 0..DEDUPE_WINDOW {
            assert!(tape.append(&format!("filler-{i}"), &driver("other"), now));
        }
        assert!(tape.append("seg-1", &driver("q"), now));
        assert_eq!(tape.len(), DEDUPE_WINDOW + 2);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut tape = DriverTape::new();
        let now = Utc::now();
        for i in 0..(DRIVER_TAPE_CAP + 15) {
            tape.append(&format!("seg-{i}"), &driver("quote"), now);
        }
        assert_eq!(tape.len(), DRIVER_TAPE_CAP);
        assert_eq!(tape.entries().next().unwrap().segment_id, "seg-15");
        assert_eq!(
            tape.entries().last().unwrap().segment_id,
            format!("seg-{}", DRIVER_TAPE_CAP + 14)
        );
    }

    #[test]
    fn test_record_appends_every_driver_of_a_result() {
        let result = AnalysisResult {
            confidence_score: 60,
            risk_score: 40,
            confidence_drivers: vec![driver("a")],
            risk_drivers: vec![driver("b"), driver("a")],
            tone_analysis: String::new(),
            consistency_note: String::new(),
            discrepancy: None,
            attribution: None,
        };
        let mut tape = DriverTape::new();
        assert_eq!(tape.record("seg-9", &result, Utc::now()), 2);
        let quotes: Vec<_> = tape.entries().map(|e| e.quote.as_str()).collect();
        assert_eq!(quotes, ["a", "b"]);
    }

    #[test]
    fn test_from_entries_keeps_newest() {
        let mut tape = DriverTape::new();
        let now = Utc::now();
        for i in 0..DRIVER_TAPE_CAP {
            tape.append(&format!("seg-{i}"), &driver("q"), now);
        }
        let mut entries = tape.to_vec();
        entries.insert(
            0,
            TapeEntry {
                id: "old".to_string(),
                segment_id: "old".to_string(),
                quote: "old".to_string(),
                trend: Trend::Flat,
                timestamp: now,
            },
        );
        let restored = DriverTape::from_entries(entries);
        assert_eq!(restored.len(), DRIVER_TAPE_CAP);
        assert!(restored.entries().all(|e| e.id != "old"));
    }
}
