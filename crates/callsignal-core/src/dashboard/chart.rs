//! Smoothed sentiment series plotted under the live transcript.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisResult, NarrativeDriver};

/// Weight of the previous point in the exponential smoothing.
pub const SMOOTHING_CARRY: f64 = 0.7;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub time: String,
    /// Smoothed value actually drawn
    pub value: f64,
    /// Raw net sentiment of the analysis behind this point
    pub sentiment: f64,
    pub segment_id: String,
    pub speaker: String,
    pub drivers: Vec<NarrativeDriver>,
}

#[derive(Debug, Clone)]
pub struct SentimentSeries {
    points: VecDeque<ChartPoint>,
    cap: usize,
}

impl SentimentSeries {
    pub fn new(cap: usize) -> Self {
        Self {
            points: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    /// Appends the point for one analysis and returns it.
    pub fn push(
        &mut self,
        result: &AnalysisResult,
        time: &str,
        segment_id: &str,
        speaker: &str,
    ) -> &ChartPoint {
        let sentiment = result.net_sentiment();
        let previous = self.points.back().map(|p| p.value).unwrap_or(0.0);
        let value = previous * SMOOTHING_CARRY + sentiment * (1.0 - SMOOTHING_CARRY);

        self.points.push_back(ChartPoint {
            time: time.to_string(),
            value,
            sentiment,
            segment_id: segment_id.to_string(),
            speaker: speaker.to_string(),
            drivers: result.drivers().cloned().collect(),
        });
        while self.points.len() > self.cap {
            self.points.pop_front();
        }
        &self.points[self.points.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ChartPoint> {
        self.points.get(index)
    }

    pub fn latest(&self) -> Option<&ChartPoint> {
        self.points.back()
    }

    pub fn slice(&self, range: std::ops::Range<usize>) -> Vec<&ChartPoint> {
        self.points.range(range).collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
