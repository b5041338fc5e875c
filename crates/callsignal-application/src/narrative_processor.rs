//! Narrative processor: buffers transcript text and decides when to analyse.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use callsignal_core::SimRng;
use callsignal_core::analysis::{
    AnalysisBackend, AnalysisOutcome, AnalysisRequest, AnalysisResult, HeuristicScorer,
};
use callsignal_core::config::AnalysisConfig;
use callsignal_core::transcript::{SpeakerRole, TranscriptSegment};
use callsignal_interaction::GeminiAnalysisAgent;
use tokio::time::Instant;

/// Turns buffered segment text into [`AnalysisResult`]s.
///
/// Without a remote backend every call to [`process`](Self::process) is
/// scored locally. With one, analysis is throttled by
/// `analysis_interval_ms` unless the buffer outgrows `max_buffer_chars`, and
/// any remote failure is answered by the heuristic scorer instead.
pub struct NarrativeProcessor {
    config: AnalysisConfig,
    backend: Option<Arc<dyn AnalysisBackend>>,
    scorer: HeuristicScorer,
    rng: SimRng,
    buffer: Vec<String>,
    last_analysis: Option<Instant>,
    context: VecDeque<String>,
}

impl NarrativeProcessor {
    pub fn new(
        config: AnalysisConfig,
        backend: Option<Arc<dyn AnalysisBackend>>,
        rng: SimRng,
    ) -> Self {
        Self {
            config,
            backend,
            scorer: HeuristicScorer::scripted(),
            rng,
            buffer: Vec::new(),
            last_analysis: None,
            context: VecDeque::new(),
        }
    }

    /// Uses the Gemini agent when a usable key is configured, local scoring
    /// otherwise.
    pub async fn from_default_location(config: AnalysisConfig, rng: SimRng) -> Self {
        let backend = GeminiAnalysisAgent::try_from_default_location(&config)
            .await
            .map(|agent| Arc::new(agent) as Arc<dyn AnalysisBackend>);
        Self::new(config, backend, rng)
    }

    pub fn with_scorer(mut self, scorer: HeuristicScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn push(&mut self, segment: &TranscriptSegment) {
        self.buffer.push(segment.text.clone());
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Prior tone summaries, oldest first.
    pub fn context(&self) -> impl Iterator<Item = &str> {
        self.context.iter().map(String::as_str)
    }

    /// Analyses the buffer if it is due. Returns `None` when the buffer is
    /// empty or the next remote analysis is not yet due.
    pub async fn process(&mut self, role: SpeakerRole) -> Option<AnalysisResult> {
        if self.buffer.is_empty() {
            return None;
        }

        let text = self.buffer.join(" ");
        let Some(backend) = self.backend.clone() else {
            self.buffer.clear();
            self.last_analysis = Some(Instant::now());
            return Some(self.scorer.score(&text, role, &mut self.rng));
        };

        let interval = Duration::from_millis(self.config.analysis_interval_ms);
        let due = self
            .last_analysis
            .is_none_or(|last| last.elapsed() >= interval);
        if !due && text.chars().count() <= self.config.max_buffer_chars {
            return None;
        }

        self.buffer.clear();
        self.last_analysis = Some(Instant::now());

        let request = AnalysisRequest {
            text,
            speaker_role: role,
            prior_context_summary: self.context.iter().cloned().collect::<Vec<_>>().join(" "),
        };
        match backend.analyze(&request).await {
            AnalysisOutcome::Analysis(result) => {
                self.remember(role, &result.tone_analysis);
                Some(result)
            }
            AnalysisOutcome::FallbackRequired { reason } => {
                tracing::warn!(
                    target: "narrative",
                    backend = backend.name(),
                    reason = %reason,
                    "using heuristic scorer"
                );
                Some(self.scorer.score(&request.text, role, &mut self.rng))
            }
        }
    }

    fn remember(&mut self, role: SpeakerRole, tone: &str) {
        self.context.push_back(format!("[{role}] {tone}"));
        while self.context.len() > self.config.context_window {
            self.context.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use callsignal_core::transcript::CallSection;
    use std::sync::Mutex;

    fn segment(text: &str) -> TranscriptSegment {
        TranscriptSegment {
            id: "seg".to_string(),
            run_id: "run".to_string(),
            sequence_id: 1,
            ticker: "NVDA".to_string(),
            company_name: "NVIDIA Corp".to_string(),
            timestamp: "10:00:00".to_string(),
            speaker: "Colette Kress".to_string(),
            role: SpeakerRole::Cfo,
            text: text.to_string(),
            section: CallSection::PreparedRemarks,
        }
    }

    /// Backend that replays canned outcomes and records requests.
    struct Scripted {
        outcomes: Mutex<Vec<AnalysisOutcome>>,
        requests: Mutex<Vec<AnalysisRequest>>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<AnalysisOutcome>) -> Arc<Self> {
            outcomes.reverse();
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AnalysisBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
            self.requests.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| AnalysisOutcome::fallback("exhausted"))
        }
    }

    fn remote(tone: &str) -> AnalysisOutcome {
        AnalysisOutcome::Analysis(AnalysisResult {
            confidence_score: 70,
            risk_score: 20,
            confidence_drivers: Vec::new(),
            risk_drivers: Vec::new(),
            tone_analysis: tone.to_string(),
            consistency_note: String::new(),
            discrepancy: None,
            attribution: None,
        })
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            analysis_interval_ms: 3500,
            max_buffer_chars: 400,
            context_window: 3,
            ..AnalysisConfig::default()
        }
    }

    #[tokio::test]
    async fn test_empty_buffer_yields_nothing() {
        let mut processor = NarrativeProcessor::new(config(), None, SimRng::seeded(1));
        assert!(processor.process(SpeakerRole::Ceo).await.is_none());
    }

    #[tokio::test]
    async fn test_local_mode_scores_every_call() {
        let mut processor = NarrativeProcessor::new(config(), None, SimRng::seeded(1));
        for text in ["Demand remains insatiable.", "Margins face pressure from headwinds."] {
            processor.push(&segment(text));
            let result = processor.process(SpeakerRole::Cfo).await.unwrap();
            assert!(result.confidence_score <= 100);
            assert_eq!(processor.buffered(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_analysis_is_throttled() {
        let backend = Scripted::new(vec![remote("Confident"), remote("Measured")]);
        let mut processor = NarrativeProcessor::new(
            config(),
            Some(backend.clone() as Arc<dyn AnalysisBackend>),
            SimRng::seeded(1),
        );

        processor.push(&segment("First remark."));
        assert_eq!(
            processor.process(SpeakerRole::Ceo).await.unwrap().tone_analysis,
            "Confident"
        );

        processor.push(&segment("Second remark."));
        assert!(processor.process(SpeakerRole::Ceo).await.is_none());
        assert_eq!(processor.buffered(), 1);

        tokio::time::advance(Duration::from_millis(3500)).await;
        processor.push(&segment("Third remark."));
        assert_eq!(
            processor.process(SpeakerRole::Cfo).await.unwrap().tone_analysis,
            "Measured"
        );

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].text, "Second remark. Third remark.");
        assert_eq!(requests[1].prior_context_summary, "[CEO] Confident");
        assert_eq!(requests[1].speaker_role, SpeakerRole::Cfo);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_buffer_bypasses_interval() {
        let backend = Scripted::new(vec![remote("a"), remote("b")]);
        let mut processor = NarrativeProcessor::new(
            config(),
            Some(backend.clone() as Arc<dyn AnalysisBackend>),
            SimRng::seeded(1),
        );
        processor.push(&segment("short"));
        processor.process(SpeakerRole::Ceo).await.unwrap();

        processor.push(&segment(&"x".repeat(401)));
        assert!(processor.process(SpeakerRole::Ceo).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_window_keeps_last_three() {
        let tones = ["one", "two", "three", "four"];
        let backend = Scripted::new(tones.iter().map(|t| remote(t)).collect());
        let mut processor = NarrativeProcessor::new(
            config(),
            Some(backend as Arc<dyn AnalysisBackend>),
            SimRng::seeded(1),
        );
        for _ in tones {
            processor.push(&segment("remark"));
            processor.process(SpeakerRole::Analyst).await.unwrap();
            tokio::time::advance(Duration::from_secs(4)).await;
        }
        let context: Vec<_> = processor.context().collect();
        assert_eq!(context, ["[Analyst] two", "[Analyst] three", "[Analyst] four"]);
    }

    #[tokio::test]
    async fn test_fallback_uses_heuristic_scorer() {
        let backend = Scripted::new(vec![AnalysisOutcome::fallback("HTTP 500")]);
        let mut processor = NarrativeProcessor::new(
            config(),
            Some(backend as Arc<dyn AnalysisBackend>),
            SimRng::seeded(3),
        );
        processor.push(&segment(
            "We are seeing some margin pressure from supply chain headwinds.",
        ));
        let result = processor.process(SpeakerRole::Cfo).await.unwrap();
        assert!(result.discrepancy.is_some());
        assert_eq!(
            result.consistency_note,
            "Significant divergence from prior quarter"
        );
        assert_eq!(processor.context().count(), 0);
    }
}
