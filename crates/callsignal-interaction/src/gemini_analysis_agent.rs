//! GeminiAnalysisAgent - narrative analysis through the Gemini REST API.
//!
//! The model is asked for JSON matching a fixed response schema. Whatever
//! comes back is validated strictly before it becomes an [`AnalysisResult`];
//! transport failures, HTTP errors, timeouts and schema mismatches all turn
//! into [`AnalysisOutcome::FallbackRequired`].

use std::time::Duration;

use async_trait::async_trait;
use callsignal_core::analysis::{
    AnalysisBackend, AnalysisOutcome, AnalysisRequest, AnalysisResult, DriverSentiment,
    NarrativeDriver, Trend,
};
use callsignal_core::config::AnalysisConfig;
use callsignal_core::error::{CallSignalError, Result};
use callsignal_core::secret::SecretService;
use callsignal_infrastructure::{CallSignalPaths, SecretServiceImpl};
use minijinja::{Environment, context};
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_INSTRUCTION: &str = "You are a financial narrative intelligence analyst. \
Answer only with JSON that matches the response schema.";

const ANALYSIS_PROMPT: &str = r#"Analyze the following earnings call transcript segment for narrative signals.

Speaker role: {{ speaker_role }}
Previous context: {% if prior_context %}{{ prior_context }}{% else %}None{% endif %}
Current segment: "{{ text }}"

Report:
1. confidenceScore (integer 0-100): how assertive and certain the speaker sounds.
2. riskScore (integer 0-100): how much defensive or hedging language is used.
3. confidenceDrivers and riskDrivers: up to 3 verbatim phrases that moved each score, each with a one-line explanation, a sentiment (Positive, Negative, Neutral) and a trend (Up, Down, Flat).
4. toneAnalysis: one short sentence on the tone, e.g. "Defensive regarding margins".
5. consistencyNote: whether this matches typical {{ speaker_role }} behavior.
"#;

/// Remote analysis backend calling `models/{model}:generateContent`.
#[derive(Clone)]
pub struct GeminiAnalysisAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiAnalysisAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAnalysisAgent")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiAnalysisAgent {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builds an agent from stored credentials.
    ///
    /// Returns `None` (and logs why) when the secrets cannot be read or hold
    /// no usable Gemini key; callers then run on the heuristic scorer alone.
    /// A `model_name` in the secrets overrides `config.model`.
    pub async fn try_from_secrets(
        service: &dyn SecretService,
        config: &AnalysisConfig,
    ) -> Option<Self> {
        let secrets = match service.load_secrets().await {
            Ok(secrets) => secrets,
            Err(e) => {
                tracing::warn!(target: "gemini", error = %e, "failed to load secrets; remote analysis disabled");
                return None;
            }
        };

        let Some(gemini) = secrets.gemini.filter(|g| g.has_usable_key()) else {
            tracing::warn!(target: "gemini", "no usable Gemini API key; remote analysis disabled");
            return None;
        };

        let model = gemini
            .model_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| config.model.clone());
        tracing::info!(target: "gemini", model = %model, "remote analysis enabled");

        Some(
            Self::new(gemini.api_key, model)
                .with_timeout(Duration::from_secs(config.timeout_secs)),
        )
    }

    /// Reads `secret.json` (and `GEMINI_API_KEY`) from the default location.
    pub async fn try_from_default_location(config: &AnalysisConfig) -> Option<Self> {
        match SecretServiceImpl::from_paths(&CallSignalPaths::default()) {
            Ok(service) => Self::try_from_secrets(&service, config).await,
            Err(e) => {
                tracing::warn!(target: "gemini", error = %e, "cannot resolve secret file");
                None
            }
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the agent at another API root (a proxy or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn try_analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: render_prompt(request)?,
                }],
            }],
            system_instruction: Some(Content {
                role: "system".to_string(),
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            }),
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        };

        let raw = tokio::time::timeout(self.timeout, self.send_request(&body))
            .await
            .map_err(|_| {
                CallSignalError::transport(format!(
                    "Gemini API timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        parse_analysis(&raw)
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                CallSignalError::transport(format!("Gemini API request failed: {}", err.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text, retry_after));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            CallSignalError::transport(format!("Failed to parse Gemini response: {}", err.without_url()))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl AnalysisBackend for GeminiAnalysisAgent {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        match self.try_analyze(request).await {
            Ok(result) => AnalysisOutcome::Analysis(result),
            Err(e) => {
                tracing::warn!(target: "gemini", error = %e, "remote analysis failed; falling back");
                AnalysisOutcome::fallback(e.to_string())
            }
        }
    }
}

/// User prompt for one request.
pub fn render_prompt(request: &AnalysisRequest) -> Result<String> {
    Environment::new()
        .render_str(
            ANALYSIS_PROMPT,
            context! {
                speaker_role => request.speaker_role.to_string(),
                prior_context => request.prior_context_summary.trim(),
                text => request.text,
            },
        )
        .map_err(|e| CallSignalError::internal(format!("failed to render analysis prompt: {e}")))
}

/// Structured-output schema sent as `generationConfig.responseSchema`.
pub fn response_schema() -> serde_json::Value {
    let driver = json!({
        "type": "OBJECT",
        "properties": {
            "quote": { "type": "STRING" },
            "explanation": { "type": "STRING" },
            "sentiment": { "type": "STRING", "enum": ["Positive", "Negative", "Neutral"] },
            "trend": { "type": "STRING", "enum": ["Up", "Down", "Flat"] }
        },
        "required": ["quote", "sentiment", "trend"]
    });
    json!({
        "type": "OBJECT",
        "properties": {
            "confidenceScore": { "type": "INTEGER" },
            "riskScore": { "type": "INTEGER" },
            "confidenceDrivers": { "type": "ARRAY", "items": driver },
            "riskDrivers": { "type": "ARRAY", "items": driver },
            "toneAnalysis": { "type": "STRING" },
            "consistencyNote": { "type": "STRING" }
        },
        "required": ["confidenceScore", "riskScore", "confidenceDrivers", "riskDrivers", "toneAnalysis"]
    })
}

/// Validates the model's JSON text into an [`AnalysisResult`].
///
/// Scores must be integers in `0..=100` and every required key must be
/// present. Drivers may be full objects or bare quote strings; a bare quote
/// takes the sentiment and trend of the list it appears in.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let wire: WireAnalysis = serde_json::from_str(strip_code_fence(raw))?;

    let confidence_score = score_in_range("confidenceScore", wire.confidence_score)?;
    let risk_score = score_in_range("riskScore", wire.risk_score)?;
    let tone_analysis = wire.tone_analysis.trim().to_string();
    if tone_analysis.is_empty() {
        return Err(CallSignalError::validation("toneAnalysis is empty"));
    }

    Ok(AnalysisResult {
        confidence_score,
        risk_score,
        confidence_drivers: drivers(wire.confidence_drivers, DriverSentiment::Positive, Trend::Up)?,
        risk_drivers: drivers(wire.risk_drivers, DriverSentiment::Negative, Trend::Down)?,
        tone_analysis,
        consistency_note: wire.consistency_note,
        discrepancy: None,
        attribution: None,
    })
}

fn score_in_range(field: &str, value: i64) -> Result<u8> {
    u8::try_from(value)
        .ok()
        .filter(|score| *score <= 100)
        .ok_or_else(|| CallSignalError::validation(format!("{field} {value} outside 0-100")))
}

fn drivers(
    wire: Vec<WireDriver>,
    sentiment: DriverSentiment,
    trend: Trend,
) -> Result<Vec<NarrativeDriver>> {
    wire.into_iter()
        .map(|driver| {
            let driver = match driver {
                WireDriver::Full(driver) => driver,
                WireDriver::Quote(quote) => NarrativeDriver {
                    quote,
                    explanation: String::new(),
                    sentiment,
                    trend,
                },
            };
            if driver.quote.trim().is_empty() {
                Err(CallSignalError::validation("driver quote is empty"))
            } else {
                Ok(driver)
            }
        })
        .collect()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnalysis {
    confidence_score: i64,
    risk_score: i64,
    confidence_drivers: Vec<WireDriver>,
    risk_drivers: Vec<WireDriver>,
    tone_analysis: String,
    #[serde(default)]
    consistency_note: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireDriver {
    Full(NarrativeDriver),
    Quote(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            CallSignalError::transport("Gemini API returned no text in the response candidates")
        })
}

fn map_http_error(status: StatusCode, body: &str, retry_after: Option<Duration>) -> CallSignalError {
    let detail = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    let mut message = format!("Gemini API returned {}: {detail}", status.as_u16());
    if let Some(delay) = retry_after {
        message.push_str(&format!(" (retry after {}s)", delay.as_secs()));
    }
    CallSignalError::transport(message)
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    // HTTP-date values are not interpreted.
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsignal_core::transcript::SpeakerRole;

    const VALID: &str = r#"{
        "confidenceScore": 72,
        "riskScore": 31,
        "confidenceDrivers": [
            {"quote": "demand remains insatiable", "explanation": "Demand Outlook", "sentiment": "Positive", "trend": "Up"}
        ],
        "riskDrivers": ["supply remains tight"],
        "toneAnalysis": "Confident with a note of caution",
        "consistencyNote": "Typical CEO framing"
    }"#;

    #[test]
    fn test_parse_valid_response() {
        let result = parse_analysis(VALID).unwrap();
        assert_eq!(result.confidence_score, 72);
        assert_eq!(result.risk_score, 31);
        assert_eq!(result.confidence_drivers[0].explanation, "Demand Outlook");
        let risk = &result.risk_drivers[0];
        assert_eq!(risk.quote, "supply remains tight");
        assert_eq!(risk.sentiment, DriverSentiment::Negative);
        assert_eq!(risk.trend, Trend::Down);
        assert!(result.discrepancy.is_none());
    }

    #[test]
    fn test_parse_accepts_fenced_json_and_missing_note() {
        let raw = "```json\n{\"confidenceScore\":50,\"riskScore\":50,\"confidenceDrivers\":[],\"riskDrivers\":[],\"toneAnalysis\":\"Neutral\"}\n```";
        let result = parse_analysis(raw).unwrap();
        assert_eq!(result.consistency_note, "");
    }

    #[test]
    fn test_parse_rejects_out_of_range_scores() {
        for (confidence, risk) in [(101, 10), (-1, 10), (50, 250)] {
            let raw = format!(
                r#"{{"confidenceScore":{confidence},"riskScore":{risk},"confidenceDrivers":[],"riskDrivers":[],"toneAnalysis":"x"}}"#
            );
            assert!(parse_analysis(&raw).unwrap_err().is_validation(), "{raw}");
        }
    }

    #[test]
    fn test_parse_rejects_schema_mismatch() {
        let cases = [
            // float score
            r#"{"confidenceScore":72.5,"riskScore":10,"confidenceDrivers":[],"riskDrivers":[],"toneAnalysis":"x"}"#,
            // missing riskDrivers
            r#"{"confidenceScore":72,"riskScore":10,"confidenceDrivers":[],"toneAnalysis":"x"}"#,
            // score as string
            r#"{"confidenceScore":"72","riskScore":10,"confidenceDrivers":[],"riskDrivers":[],"toneAnalysis":"x"}"#,
            // empty tone
            r#"{"confidenceScore":72,"riskScore":10,"confidenceDrivers":[],"riskDrivers":[],"toneAnalysis":"  "}"#,
            // empty quote
            r#"{"confidenceScore":72,"riskScore":10,"confidenceDrivers":[""],"riskDrivers":[],"toneAnalysis":"x"}"#,
            "not json at all",
        ];
        for raw in cases {
            assert!(parse_analysis(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_prompt_mentions_role_context_and_text() {
        let prompt = render_prompt(&AnalysisRequest {
            text: "Gross margins were impacted.".to_string(),
            speaker_role: SpeakerRole::Cfo,
            prior_context_summary: "[CEO] Optimistic".to_string(),
        })
        .unwrap();
        assert!(prompt.contains("Speaker role: CFO"));
        assert!(prompt.contains("Previous context: [CEO] Optimistic"));
        assert!(prompt.contains("\"Gross margins were impacted.\""));
        assert!(prompt.contains("typical CFO behavior"));

        let empty = render_prompt(&AnalysisRequest {
            text: "x".to_string(),
            speaker_role: SpeakerRole::Ceo,
            prior_context_summary: String::new(),
        })
        .unwrap();
        assert!(empty.contains("Previous context: None"));
    }

    #[test]
    fn test_http_error_message() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
            Some(Duration::from_secs(7)),
        );
        assert!(err.is_transport());
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("RESOURCE_EXHAUSTED: Quota exceeded"));
        assert!(text.contains("retry after 7s"));
    }

    #[test]
    fn test_retry_after_parsing() {
        let header = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&header)), Some(Duration::from_secs(12)));
        let date = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_schema_requires_core_fields() {
        let schema = response_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "riskScore"));
        assert_eq!(schema["properties"]["confidenceScore"]["type"], "INTEGER");
    }
}
