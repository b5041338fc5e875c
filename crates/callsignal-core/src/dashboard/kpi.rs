use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::corpus::Level;

/// Headline figures shown above the chart.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub confidence: u8,
    pub risk: u8,
    /// Net sentiment of the latest analysis
    pub momentum: f64,
    pub discrepancy_level: Level,
}

impl Default for Kpis {
    fn default() -> Self {
        Self {
            confidence: 50,
            risk: 20,
            momentum: 0.0,
            discrepancy_level: Level::Low,
        }
    }
}

impl Kpis {
    /// Takes the scores of `result`. The discrepancy level only changes when
    /// the result carries a discrepancy.
    pub fn apply(&mut self, result: &AnalysisResult) {
        self.confidence = result.confidence_score;
        self.risk = result.risk_score;
        self.momentum = result.net_sentiment();
        if let Some(discrepancy) = &result.discrepancy {
            self.discrepancy_level = discrepancy.severity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Discrepancy, DiscrepancyType};

    #[test]
    fn test_discrepancy_level_is_sticky() {
        let mut kpis = Kpis::default();
        let mut result = AnalysisResult {
            confidence_score: 40,
            risk_score: 75,
            confidence_drivers: vec![],
            risk_drivers: vec![],
            tone_analysis: String::new(),
            consistency_note: String::new(),
            discrepancy: Some(Discrepancy {
                discrepancy_type: DiscrepancyType::Reversal,
                severity: Level::High,
                previous_statement: String::new(),
                current_statement: String::new(),
                explanation: String::new(),
            }),
            attribution: None,
        };
        kpis.apply(&result);
        assert_eq!(kpis.discrepancy_level, Level::High);
        assert_eq!(kpis.momentum, -0.35);

        result.discrepancy = None;
        result.confidence_score = 70;
        kpis.apply(&result);
        assert_eq!(kpis.discrepancy_level, Level::High);
        assert_eq!(kpis.confidence, 70);
    }
}
