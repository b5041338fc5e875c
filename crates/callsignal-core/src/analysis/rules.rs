//! Scripted discrepancy detection as a pluggable rule table.
//!
//! A rule fires when every one of its trigger groups has at least one keyword
//! present in the lower-cased text. Rules are evaluated in table order and a
//! later match overrides the scores and tone of an earlier one; its finding
//! replaces the earlier finding only when it has one.

use serde::{Deserialize, Serialize};

use crate::corpus::{self, Level, MarketEvent, prior_quarter};

use super::model::{Attribution, Discrepancy, DiscrepancyType};

const CURRENT_STATEMENT_CHARS: usize = 80;

/// How to attribute a finding to a market event.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EventLink {
    /// Case-insensitive substring of the event headline
    pub headline_contains: String,
    pub confidence: Level,
    pub reasoning: String,
}

/// The discrepancy a rule reports.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DiscrepancyFinding {
    pub discrepancy_type: DiscrepancyType,
    pub severity: Level,
    pub prior_statement: String,
    pub explanation: String,
    #[serde(default)]
    pub linked_event: Option<EventLink>,
}

/// One row of the rule table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DiscrepancyRule {
    pub name: String,
    /// Conjunction of disjunctions: each inner group needs one hit.
    pub triggers: Vec<Vec<String>>,
    /// Pre-noise `(confidence, risk)` replacing the keyword scores.
    #[serde(default)]
    pub scores: Option<(i32, i32)>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub finding: Option<DiscrepancyFinding>,
}

impl DiscrepancyRule {
    /// `lower` is the lower-cased text; keywords match regardless of case.
    pub fn matches(&self, lower: &str) -> bool {
        !self.triggers.is_empty()
            && self.triggers.iter().all(|group| {
                group
                    .iter()
                    .any(|keyword| lower.contains(keyword.to_lowercase().as_str()))
            })
    }
}

/// Accumulated effect of every rule that fired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleVerdict {
    pub fired: Vec<String>,
    pub scores: Option<(i32, i32)>,
    pub tone: Option<String>,
    pub discrepancy: Option<Discrepancy>,
    pub attribution: Option<Attribution>,
}

/// Ordered rules plus the market events their links resolve against.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<DiscrepancyRule>,
    events: Vec<MarketEvent>,
}

impl RuleTable {
    pub fn new(rules: Vec<DiscrepancyRule>, events: Vec<MarketEvent>) -> Self {
        Self { rules, events }
    }

    /// Margin reversal, export-control walk-back and the bullish demand
    /// override, linked against the scripted market events.
    pub fn builtin() -> Self {
        Self::new(builtin_rules(), corpus::market_events())
    }

    pub fn push(&mut self, rule: DiscrepancyRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[DiscrepancyRule] {
        &self.rules
    }

    pub fn evaluate(&self, text: &str) -> RuleVerdict {
        let lower = text.to_lowercase();
        let mut verdict = RuleVerdict::default();

        for rule in self.rules.iter().filter(|rule| rule.matches(&lower)) {
            verdict.fired.push(rule.name.clone());
            if rule.scores.is_some() {
                verdict.scores = rule.scores;
            }
            if let Some(tone) = &rule.tone {
                verdict.tone = Some(tone.clone());
            }
            if let Some(finding) = &rule.finding {
                verdict.discrepancy = Some(Discrepancy {
                    discrepancy_type: finding.discrepancy_type,
                    severity: finding.severity,
                    previous_statement: finding.prior_statement.clone(),
                    current_statement: excerpt(text),
                    explanation: finding.explanation.clone(),
                });
                verdict.attribution = finding
                    .linked_event
                    .as_ref()
                    .and_then(|link| self.resolve(link));
            }
        }

        verdict
    }

    fn resolve(&self, link: &EventLink) -> Option<Attribution> {
        let needle = link.headline_contains.to_lowercase();
        self.events
            .iter()
            .find(|event| event.headline.to_lowercase().contains(&needle))
            .map(|event| Attribution {
                event: event.clone(),
                confidence: link.confidence,
                reasoning: link.reasoning.clone(),
            })
    }
}

fn excerpt(text: &str) -> String {
    let head: String = text.chars().take(CURRENT_STATEMENT_CHARS).collect();
    format!("{head}...")
}

fn group(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn builtin_rules() -> Vec<DiscrepancyRule> {
    vec![
        DiscrepancyRule {
            name: "margin-reversal".to_string(),
            triggers: vec![group(&["margin"]), group(&["pressure", "headwind"])],
            scores: Some((40, 75)),
            tone: Some("Preparing market for margin compression".to_string()),
            finding: Some(DiscrepancyFinding {
                discrepancy_type: DiscrepancyType::Reversal,
                severity: Level::High,
                prior_statement: prior_quarter::MARGINS.to_string(),
                explanation: "Management explicitly guided for stable margins last quarter, now citing pressure.".to_string(),
                linked_event: Some(EventLink {
                    headline_contains: "TSMC".to_string(),
                    confidence: Level::High,
                    reasoning: "Packaging delays at the foundry raise COGS for chip designers through expedited shipping and yield costs.".to_string(),
                }),
            }),
        },
        DiscrepancyRule {
            name: "export-walk-back".to_string(),
            triggers: vec![group(&["china", "export", "geopolitical"])],
            scores: Some((35, 85)),
            tone: Some("Defensive regarding regulatory exposure".to_string()),
            finding: Some(DiscrepancyFinding {
                discrepancy_type: DiscrepancyType::WalkBack,
                severity: Level::Medium,
                prior_statement: prior_quarter::CHINA.to_string(),
                explanation: "Prior-quarter tone was dismissive of risk; current tone acknowledges material uncertainty.".to_string(),
                linked_event: Some(EventLink {
                    headline_contains: "export controls".to_string(),
                    confidence: Level::High,
                    reasoning: "Direct correlation with the new Commerce Dept restrictions announced Sept 15.".to_string(),
                }),
            }),
        },
        DiscrepancyRule {
            name: "insatiable-demand".to_string(),
            triggers: vec![group(&["demand"]), group(&["insatiable"])],
            scores: Some((95, 10)),
            tone: Some("Unapologetically bullish on long-term demand".to_string()),
            finding: None,
        },
    ]
}
