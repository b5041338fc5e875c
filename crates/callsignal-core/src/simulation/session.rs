//! One simulation run: identity, cast, momentum and dedupe memory.

use chrono::{DateTime, Local};

use crate::config::SimulationConfig;
use crate::corpus::{self, ANALYST_PANEL_SIZE, ANALYSTS, Company, Polarity};
use crate::error::{CallSignalError, Result};
use crate::rng::SimRng;
use crate::simulation::momentum::{MomentumProcess, Regime};
use crate::simulation::synthesizer::{RecentText, synthesize};
use crate::transcript::{SpeakerRole, TranscriptSegment};

/// State scoped to one continuous simulation run.
///
/// The sequence counter, momentum process and recent-text memory are only
/// mutated through [`Session::next_segment`].
#[derive(Debug, Clone)]
pub struct Session {
    run_id: String,
    company: Company,
    analyst_panel: Vec<String>,
    sequence_counter: u64,
    momentum: MomentumProcess,
    recent_text: RecentText,
}

impl Session {
    /// Draws a fresh run id, company and analyst panel.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `config.ticker` names an unknown company.
    pub fn start(config: &SimulationConfig, rng: &mut SimRng) -> Result<Self> {
        let company = match config.ticker.as_deref() {
            Some(ticker) => corpus::find_company(ticker)
                .ok_or_else(|| CallSignalError::not_found("Company", ticker))?,
            None => {
                let companies = corpus::companies();
                rng.pick(&companies)
                    .cloned()
                    .ok_or_else(|| CallSignalError::internal("company catalogue is empty"))?
            }
        };
        Ok(Self::with_company(company, config.recent_text_cap, rng))
    }

    /// Starts a run for an explicit company.
    pub fn with_company(company: Company, recent_text_cap: usize, rng: &mut SimRng) -> Self {
        let analyst_panel = rng
            .pick_distinct(ANALYSTS, ANALYST_PANEL_SIZE)
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        let session = Self {
            run_id: rng.uuid().to_string(),
            company,
            analyst_panel,
            sequence_counter: 0,
            momentum: MomentumProcess::new(rng),
            recent_text: RecentText::new(recent_text_cap),
        };
        tracing::info!(
            target: "session",
            run_id = %session.run_id,
            ticker = %session.company.ticker,
            "session started"
        );
        session
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn company(&self) -> &Company {
        &self.company
    }

    pub fn analyst_panel(&self) -> &[String] {
        &self.analyst_panel
    }

    /// Number of segments emitted so far (equals the last sequence id).
    pub fn emitted(&self) -> u64 {
        self.sequence_counter
    }

    pub fn momentum(&self) -> f64 {
        self.momentum.value()
    }

    /// Pins the momentum regime; used for scripted scenarios.
    pub fn force_regime(&mut self, regime: Regime, ticks: u32) {
        self.momentum.force_regime(regime, ticks);
    }

    /// Builds the next utterance of the call.
    ///
    /// Draws a speaker role, picks a polarity (analysts always ask; executives
    /// follow the current regime), synthesizes text, advances momentum by the
    /// polarity's impulse and stamps the segment with the next sequence id.
    pub fn next_segment(&mut self, rng: &mut SimRng, now: DateTime<Local>) -> TranscriptSegment {
        let role = draw_role(rng);
        let (speaker, polarity) = match role {
            SpeakerRole::Analyst => {
                let analyst = rng
                    .pick(&self.analyst_panel)
                    .cloned()
                    .unwrap_or_else(|| "Analyst".to_string());
                (analyst, Polarity::AnalystQuestion)
            }
            SpeakerRole::Cfo => (
                self.company.cfo.clone(),
                draw_polarity(self.momentum.regime(), rng),
            ),
            _ => (
                self.company.ceo.clone(),
                draw_polarity(self.momentum.regime(), rng),
            ),
        };

        let text = synthesize(&self.company, polarity, &mut self.recent_text, rng);
        self.momentum.advance(polarity.impulse(), rng);
        self.sequence_counter += 1;

        TranscriptSegment {
            id: rng.uuid().to_string(),
            run_id: self.run_id.clone(),
            sequence_id: self.sequence_counter,
            ticker: self.company.ticker.clone(),
            company_name: self.company.name.clone(),
            timestamp: now.format("%H:%M:%S").to_string(),
            speaker,
            role,
            text,
            section: role.section(),
        }
    }
}

/// 25% Analyst, 35% CEO, 40% CFO.
pub fn draw_role(rng: &mut SimRng) -> SpeakerRole {
    let u = rng.unit();
    if u < 0.25 {
        SpeakerRole::Analyst
    } else if u < 0.60 {
        SpeakerRole::Ceo
    } else {
        SpeakerRole::Cfo
    }
}

/// Executive polarity conditioned on the current regime.
pub fn draw_polarity(regime: Regime, rng: &mut SimRng) -> Polarity {
    let (positive, negative) = match regime {
        Regime::TrendingUp => (0.70, 0.10),
        Regime::TrendingDown => (0.10, 0.70),
        Regime::HighVolatility => (0.45, 0.45),
        Regime::MeanReversion => (0.33, 0.33),
    };
    let u = rng.unit();
    if u < positive {
        Polarity::Positive
    } else if u < positive + negative {
        Polarity::Negative
    } else {
        Polarity::Neutral
    }
}
