//! Configuration model for the simulator, the analysis pipeline and the
//! dashboard buffers.
//!
//! Everything is defaulted so that an empty or missing `config.toml` yields a
//! working setup. Secrets live in a separate structure loaded from
//! `secret.json`.

use serde::{Deserialize, Serialize};

use crate::error::{CallSignalError, Result};

pub const DEFAULT_MIN_DELAY_MS: u64 = 3000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 6000;
pub const DEFAULT_RECENT_TEXT_CAP: usize = 512;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigRoot {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl ConfigRoot {
    /// Checks cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.analysis.validate()
    }
}

/// Feed scheduler and session settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Seed for the simulator's random source. `None` draws from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Pin the session to one company instead of drawing it.
    #[serde(default)]
    pub ticker: Option<String>,
    /// Upper bound on the recent-text dedupe memory.
    #[serde(default = "default_recent_text_cap")]
    pub recent_text_cap: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            ticker: None,
            recent_text_cap: DEFAULT_RECENT_TEXT_CAP,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(CallSignalError::config(format!(
                "simulation.min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            )));
        }
        if self.recent_text_cap == 0 {
            return Err(CallSignalError::config(
                "simulation.recent_text_cap must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Narrative processor and remote analysis settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Minimum spacing between remote analyses.
    #[serde(default = "default_analysis_interval_ms")]
    pub analysis_interval_ms: u64,
    /// Buffered text longer than this is analysed regardless of spacing.
    #[serde(default = "default_max_buffer_chars")]
    pub max_buffer_chars: usize,
    /// Number of prior tone summaries fed back as context.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            analysis_interval_ms: default_analysis_interval_ms(),
            max_buffer_chars: default_max_buffer_chars(),
            context_window: default_context_window(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(CallSignalError::config("analysis.model must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(CallSignalError::config(
                "analysis.timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Caps for the subscriber-owned rolling buffers.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    #[serde(default = "default_segment_history_cap")]
    pub segment_history_cap: usize,
    #[serde(default = "default_chart_cap")]
    pub chart_cap: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            segment_history_cap: default_segment_history_cap(),
            chart_cap: default_chart_cap(),
        }
    }
}

fn default_min_delay_ms() -> u64 {
    DEFAULT_MIN_DELAY_MS
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

fn default_recent_text_cap() -> usize {
    DEFAULT_RECENT_TEXT_CAP
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_analysis_interval_ms() -> u64 {
    3500
}

fn default_max_buffer_chars() -> usize {
    400
}

fn default_context_window() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_segment_history_cap() -> usize {
    200
}

fn default_chart_cap() -> usize {
    1000
}

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl GeminiConfig {
    /// A key that is blank or one of the demo placeholders counts as absent.
    pub fn has_usable_key(&self) -> bool {
        let key = self.api_key.trim();
        key.len() > 10 && !key.starts_with("demo")
    }
}
