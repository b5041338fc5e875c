//! Keyword heuristic that turns raw transcript text into an [`AnalysisResult`].
//!
//! Used when no remote backend is configured and whenever the remote backend
//! asks for a fallback, so its output has exactly the same shape.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::rng::SimRng;
use crate::transcript::SpeakerRole;

use super::model::{AnalysisResult, DriverSentiment, NarrativeDriver, Trend};
use super::rules::{RuleTable, RuleVerdict};

pub const SCORE_FLOOR: i32 = 10;
pub const SCORE_CEILING: i32 = 95;
pub const NOISE_MAGNITUDE: i32 = 5;
/// `|sentiment|` above which a driver is emitted.
pub const DRIVER_THRESHOLD: f64 = 0.3;
pub const QUOTE_MAX_CHARS: usize = 60;

const CFO_RISK_BIAS: i32 = 10;
const CFO_CONFIDENCE_BIAS: i32 = -5;

const DIVERGENT_NOTE: &str = "Significant divergence from prior quarter";
const CONSISTENT_NOTE: &str = "Consistent with prior messaging";

/// Each group contributes its weight once when any of its stems is present.
const KEYWORD_GROUPS: &[(f64, &[&str])] = &[
    (
        0.5,
        &["record", "strongest", "unprecedented", "insatiable", "never been stronger"],
    ),
    (
        0.4,
        &["accelerat", "raising", "confident", "inflect", "robust", "expanding"],
    ),
    (
        -0.5,
        &["headwind", "pressure", "decelerat", "constraint", "impacted"],
    ),
    (
        -0.4,
        &[
            "softness",
            "uncertainty",
            "volatil",
            "challeng",
            "longer than",
            "widening",
            "prudent",
        ],
    ),
];

/// Topic labels in precedence order; the first match wins.
static TOPICS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\b(?:margin|gross)", "Gross Margin Expansion"),
        (r"\b(?:revenue|sales)", "Revenue Growth"),
        (r"\b(?:demand|order)", "Demand Outlook"),
        (r"\b(?:guidance|outlook)", "FY Guidance Update"),
        (r"\b(?:cash|flow)", "Free Cash Flow Beat"),
        (r"\b(?:supply|chain)", "Supply Chain Update"),
        (r"\b(?:ai|genai)\b|\bintelligence", "AI Strategy"),
        (r"\b(?:risk|regulatory)", "Regulatory Risk Commentary"),
        (r"\binventor", "Inventory Normalization"),
        (r"\b(?:capex|capital)", "CapEx Allocation"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("valid regex"), label))
    .collect()
});

/// Deterministic part of a score: everything except the noise.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub sentiment: f64,
    /// Pre-noise confidence, already clamped to `[10, 95]`
    pub confidence: i32,
    /// Pre-noise risk, already clamped to `[10, 95]`
    pub risk: i32,
    pub verdict: RuleVerdict,
}

/// Keyword scorer. The basic variant applies the keyword formula only; the
/// richer variant also runs a discrepancy [`RuleTable`] and biases CFO
/// speech toward risk.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    rules: Option<RuleTable>,
}

impl HeuristicScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: RuleTable) -> Self {
        Self { rules: Some(rules) }
    }

    /// Richer variant with the built-in rule table.
    pub fn scripted() -> Self {
        Self::with_rules(RuleTable::builtin())
    }

    pub fn has_rules(&self) -> bool {
        self.rules.is_some()
    }

    /// Unbounded keyword sentiment of `text`.
    pub fn sentiment_of(text: &str) -> f64 {
        let lower = text.to_lowercase();
        KEYWORD_GROUPS
            .iter()
            .filter(|(_, stems)| stems.iter().any(|stem| lower.contains(stem)))
            .map(|(weight, _)| weight)
            .sum()
    }

    pub fn assess(&self, text: &str, role: SpeakerRole) -> Assessment {
        let sentiment = Self::sentiment_of(text);
        let mut confidence = (50.0 + sentiment * 40.0).round() as i32;
        let mut risk = (50.0 - sentiment * 40.0).round() as i32;

        let verdict = match &self.rules {
            Some(rules) => {
                let verdict = rules.evaluate(text);
                if let Some((rule_confidence, rule_risk)) = verdict.scores {
                    confidence = rule_confidence;
                    risk = rule_risk;
                }
                if role == SpeakerRole::Cfo {
                    confidence += CFO_CONFIDENCE_BIAS;
                    risk += CFO_RISK_BIAS;
                }
                verdict
            }
            None => RuleVerdict::default(),
        };

        Assessment {
            sentiment,
            confidence: confidence.clamp(SCORE_FLOOR, SCORE_CEILING),
            risk: risk.clamp(SCORE_FLOOR, SCORE_CEILING),
            verdict,
        }
    }

    /// Pre-noise `(confidence, risk)`.
    pub fn pre_noise_scores(&self, text: &str, role: SpeakerRole) -> (i32, i32) {
        let assessment = self.assess(text, role);
        (assessment.confidence, assessment.risk)
    }

    pub fn score(&self, text: &str, role: SpeakerRole, rng: &mut SimRng) -> AnalysisResult {
        let assessment = self.assess(text, role);
        let confidence = jitter(assessment.confidence, rng);
        let risk = jitter(assessment.risk, rng);
        let sentiment = assessment.sentiment;

        let mut confidence_drivers = Vec::new();
        let mut risk_drivers = Vec::new();
        if sentiment.abs() > DRIVER_THRESHOLD {
            let driver = NarrativeDriver {
                quote: quote_of(text),
                explanation: topic_label(text, sentiment).to_string(),
                sentiment: if sentiment > 0.0 {
                    DriverSentiment::Positive
                } else {
                    DriverSentiment::Negative
                },
                trend: if sentiment > 0.0 { Trend::Up } else { Trend::Down },
            };
            if sentiment > 0.0 {
                confidence_drivers.push(driver);
            } else {
                risk_drivers.push(driver);
            }
        }

        let verdict = assessment.verdict;
        let tone_analysis = verdict.tone.clone().unwrap_or_else(|| {
            if sentiment >= 0.0 {
                "Optimistic".to_string()
            } else {
                "Cautious".to_string()
            }
        });
        let consistency_note = if verdict.discrepancy.is_some() {
            DIVERGENT_NOTE
        } else {
            CONSISTENT_NOTE
        };

        if !verdict.fired.is_empty() {
            tracing::debug!(target: "scorer", rules = ?verdict.fired, "discrepancy rules fired");
        }

        AnalysisResult {
            confidence_score: confidence,
            risk_score: risk,
            confidence_drivers,
            risk_drivers,
            tone_analysis,
            consistency_note: consistency_note.to_string(),
            discrepancy: verdict.discrepancy,
            attribution: verdict.attribution,
        }
    }
}

fn jitter(score: i32, rng: &mut SimRng) -> u8 {
    let noisy = score + rng.range_i32(-NOISE_MAGNITUDE..=NOISE_MAGNITUDE);
    noisy.clamp(0, 100) as u8
}

/// Short quote for a driver: the whole text when short, otherwise the text
/// up to its first comma (or the first 60 characters) followed by `...`.
pub fn quote_of(text: &str) -> String {
    if text.chars().count() <= QUOTE_MAX_CHARS {
        return text.to_string();
    }
    match text.split_once(',') {
        Some((head, _)) => format!("{head}..."),
        None => {
            let head: String = text.chars().take(QUOTE_MAX_CHARS).collect();
            format!("{head}...")
        }
    }
}

/// Coarse topic label for a driver.
pub fn topic_label(text: &str, sentiment: f64) -> &'static str {
    let lower = text.to_lowercase();
    TOPICS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&lower))
        .map(|(_, label)| *label)
        .unwrap_or(if sentiment > 0.0 {
            "Operational Beat"
        } else {
            "Operational Headwind"
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::DiscrepancyType;

    #[test]
    fn test_sentiment_counts_each_group_once() {
        assert_eq!(HeuristicScorer::sentiment_of("A record quarter, record margins."), 0.5);
        let mixed = HeuristicScorer::sentiment_of("Record demand despite a pricing headwind.");
        assert!(mixed.abs() < 1e-9);
        assert!(HeuristicScorer::sentiment_of("Nothing to see here.").abs() < 1e-9);
    }

    #[test]
    fn test_pre_noise_scores_follow_formula() {
        let scorer = HeuristicScorer::new();
        // +0.5 +0.4 => 50 ± 36
        let (confidence, risk) =
            scorer.pre_noise_scores("Record results and accelerating growth.", SpeakerRole::Ceo);
        assert_eq!((confidence, risk), (86, 14));
        let (confidence, risk) = scorer.pre_noise_scores("Flat.", SpeakerRole::Cfo);
        assert_eq!((confidence, risk), (50, 50));
    }

    #[test]
    fn test_pre_noise_clamp_holds_for_arbitrary_text() {
        let scorer = HeuristicScorer::scripted();
        let mut rng = SimRng::seeded(3);
        let words = [
            "record", "headwind", "margin", "pressure", "china", "insatiable", "demand",
            "softness", "robust", "prudent", "guidance", "the", "and", "unprecedented",
        ];
        for _ in 0..500 {
            let len = rng.range_u32(0..=12) as usize;
            let text: Vec<&str> = (0..len).filter_map(|_| rng.pick(&words).copied()).collect();
            let text = text.join(" ");
            for role in [SpeakerRole::Ceo, SpeakerRole::Cfo, SpeakerRole::Analyst] {
                let (confidence, risk) = scorer.pre_noise_scores(&text, role);
                assert!((SCORE_FLOOR..=SCORE_CEILING).contains(&confidence), "{text}");
                assert!((SCORE_FLOOR..=SCORE_CEILING).contains(&risk), "{text}");

                let result = scorer.score(&text, role, &mut rng);
                assert!((5..=100).contains(&result.confidence_score));
                assert!((5..=100).contains(&result.risk_score));
                assert!((i32::from(result.confidence_score) - confidence).abs() <= NOISE_MAGNITUDE);
            }
        }
    }

    #[test]
    fn test_positive_text_yields_confidence_driver() {
        let mut rng = SimRng::seeded(1);
        let result = HeuristicScorer::new().score(
            "Demand for H100 GPUs remains robust and accelerating.",
            SpeakerRole::Ceo,
            &mut rng,
        );
        assert_eq!(result.confidence_drivers.len(), 1);
        assert!(result.risk_drivers.is_empty());
        let driver = &result.confidence_drivers[0];
        assert_eq!(driver.trend, Trend::Up);
        assert_eq!(driver.sentiment, DriverSentiment::Positive);
        assert_eq!(driver.explanation, "Demand Outlook");
        assert_eq!(result.tone_analysis, "Optimistic");
    }

    #[test]
    fn test_negative_text_yields_risk_driver() {
        let mut rng = SimRng::seeded(1);
        let result = HeuristicScorer::new().score(
            "We see some softness in enterprise spend.",
            SpeakerRole::Cfo,
            &mut rng,
        );
        assert!(result.confidence_drivers.is_empty());
        assert_eq!(result.risk_drivers.len(), 1);
        assert_eq!(result.risk_drivers[0].trend, Trend::Down);
        assert_eq!(result.risk_drivers[0].explanation, "Operational Headwind");
        assert_eq!(result.tone_analysis, "Cautious");
    }

    #[test]
    fn test_weak_sentiment_has_no_driver() {
        let mut rng = SimRng::seeded(1);
        let result =
            HeuristicScorer::new().score("Revenue was in line.", SpeakerRole::Ceo, &mut rng);
        assert_eq!(result.drivers().count(), 0);
        assert_eq!(result.consistency_note, CONSISTENT_NOTE);
    }

    #[test]
    fn test_quote_shortening() {
        assert_eq!(quote_of("Short and sweet."), "Short and sweet.");
        let with_comma =
            "Looking ahead, we expect record revenue across every segment of the business.";
        assert_eq!(quote_of(with_comma), "Looking ahead...");
        let no_comma = "x".repeat(80);
        assert_eq!(quote_of(&no_comma), format!("{}...", "x".repeat(60)));
    }

    #[test]
    fn test_topic_precedence() {
        assert_eq!(topic_label("Gross margin and revenue", 1.0), "Gross Margin Expansion");
        assert_eq!(topic_label("Revenue and demand", 1.0), "Revenue Growth");
        assert_eq!(topic_label("Our AI roadmap", 1.0), "AI Strategy");
        // "maintain" and "chain" must not read as AI
        assert_eq!(topic_label("We maintain our plan", -1.0), "Operational Headwind");
        assert_eq!(topic_label("Capital returns", 1.0), "CapEx Allocation");
        assert_eq!(topic_label("Inventory digestion", -1.0), "Inventory Normalization");
    }

    #[test]
    fn test_cfo_bias_only_with_rules() {
        let text = "Results were as expected.";
        assert_eq!(
            HeuristicScorer::new().pre_noise_scores(text, SpeakerRole::Cfo),
            (50, 50)
        );
        assert_eq!(
            HeuristicScorer::scripted().pre_noise_scores(text, SpeakerRole::Cfo),
            (45, 60)
        );
        assert_eq!(
            HeuristicScorer::scripted().pre_noise_scores(text, SpeakerRole::Ceo),
            (50, 50)
        );
    }

    #[test]
    fn test_scripted_margin_reversal() {
        let mut rng = SimRng::seeded(8);
        let result = HeuristicScorer::scripted().score(
            "We are seeing transient pressure on gross margins.",
            SpeakerRole::Ceo,
            &mut rng,
        );
        assert!((35..=45).contains(&result.confidence_score));
        assert!((70..=80).contains(&result.risk_score));
        assert_eq!(result.tone_analysis, "Preparing market for margin compression");
        assert_eq!(result.consistency_note, DIVERGENT_NOTE);
        assert_eq!(
            result.discrepancy.unwrap().discrepancy_type,
            DiscrepancyType::Reversal
        );
        assert!(result.attribution.is_some());
    }

    #[test]
    fn test_basic_variant_ignores_rules() {
        let mut rng = SimRng::seeded(8);
        let result = HeuristicScorer::new().score(
            "We are seeing transient pressure on gross margins.",
            SpeakerRole::Ceo,
            &mut rng,
        );
        assert!(result.discrepancy.is_none());
        assert_eq!(result.tone_analysis, "Cautious");
    }
}
