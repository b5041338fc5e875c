//! Template-filling sentence synthesizer with best-effort duplicate avoidance.

use std::collections::{HashSet, VecDeque};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::corpus::{Company, Polarity, TOPICS};
use crate::rng::SimRng;

/// Attempts made to find a sentence not already in the recent-text memory.
pub const MAX_SYNTHESIS_ATTEMPTS: usize = 5;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("valid regex"));

/// Bounded memory of emitted sentences.
///
/// Insertion order is kept so that, once `capacity` is reached, the oldest
/// sentence is forgotten first.
#[derive(Debug, Clone)]
pub struct RecentText {
    seen: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl RecentText {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.seen.contains(text)
    }

    /// Records one emission. Re-recording a remembered string is a no-op.
    pub fn record(&mut self, text: &str) {
        if !self.seen.insert(text.to_string()) {
            return;
        }
        self.order.push_back(text.to_string());
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Produces a sentence of the requested polarity about `company` and records
/// it in `recent`.
///
/// Up to [`MAX_SYNTHESIS_ATTEMPTS`] candidates are generated; the first one
/// not already in `recent` wins. If every attempt collides, the last
/// candidate is accepted anyway.
pub fn synthesize(
    company: &Company,
    polarity: Polarity,
    recent: &mut RecentText,
    rng: &mut SimRng,
) -> String {
    let templates = polarity.templates();
    let mut candidate = String::new();

    for attempt in 1..=MAX_SYNTHESIS_ATTEMPTS {
        let template = rng.pick(templates).copied().unwrap_or("{product}");
        candidate = fill_template(template, company, polarity, rng);
        if !recent.contains(&candidate) {
            break;
        }
        if attempt == MAX_SYNTHESIS_ATTEMPTS {
            tracing::debug!(target: "synthesizer", %polarity, "accepting duplicate after {MAX_SYNTHESIS_ATTEMPTS} attempts");
        }
    }

    recent.record(&candidate);
    candidate
}

/// Substitutes every known placeholder in `template`.
///
/// Each placeholder occurrence draws independently. Unknown placeholders are
/// left as written.
pub fn fill_template(
    template: &str,
    company: &Company,
    polarity: Polarity,
    rng: &mut SimRng,
) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            match key {
                "product" => rng
                    .pick(&company.products)
                    .cloned()
                    .unwrap_or_else(|| company.name.clone()),
                "number" => format!("{:.1}", rng.range_f64(2.0..=17.0)),
                "adjective" => rng
                    .pick(polarity.adjectives())
                    .map(|adj| adj.to_string())
                    .unwrap_or_default(),
                "topic" => rng.pick(TOPICS).map(|t| t.to_string()).unwrap_or_default(),
                "company" => company.name.clone(),
                "ceo" => company.ceo.clone(),
                "cfo" => company.cfo.clone(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
