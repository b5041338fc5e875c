pub mod gemini_analysis_agent;

pub use gemini_analysis_agent::GeminiAnalysisAgent;
