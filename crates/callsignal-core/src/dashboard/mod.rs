//! Presentation-side state fed by the simulator and the analysis pipeline:
//! bounded segment history, smoothed chart, KPIs, driver tape and viewport.

pub mod chart;
pub mod kpi;
pub mod viewport;

use std::collections::VecDeque;

use chrono::Utc;

use crate::analysis::AnalysisResult;
use crate::config::DashboardConfig;
use crate::tape::DriverTape;
use crate::transcript::TranscriptSegment;

pub use chart::{ChartPoint, SentimentSeries};
pub use kpi::Kpis;
pub use viewport::Viewport;

pub const DEFAULT_PANEL_WIDTH: f64 = 320.0;
pub const MIN_PANEL_WIDTH: f64 = 240.0;

/// Restored drivers-panel width: the saved value, never below the minimum.
pub fn restore_panel_width(saved: Option<f64>) -> f64 {
    match saved {
        Some(width) if width.is_finite() => width.max(MIN_PANEL_WIDTH),
        _ => DEFAULT_PANEL_WIDTH,
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    segments: VecDeque<TranscriptSegment>,
    segment_cap: usize,
    series: SentimentSeries,
    kpis: Kpis,
    tape: DriverTape,
    viewport: Viewport,
    paused: bool,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self::with_tape(config, DriverTape::new())
    }

    /// Starts from a previously persisted driver tape.
    pub fn with_tape(config: &DashboardConfig, tape: DriverTape) -> Self {
        Self {
            segments: VecDeque::new(),
            segment_cap: config.segment_history_cap.max(1),
            series: SentimentSeries::new(config.chart_cap),
            kpis: Kpis::default(),
            tape,
            viewport: Viewport::default(),
            paused: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_playback(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Records an incoming segment. Returns `false` (and drops it) while
    /// playback is paused.
    pub fn push_segment(&mut self, segment: TranscriptSegment) -> bool {
        if self.paused {
            return false;
        }
        self.segments.push_back(segment);
        while self.segments.len() > self.segment_cap {
            self.segments.pop_front();
        }
        true
    }

    /// Folds one analysis into KPIs, chart and driver tape. Returns the
    /// number of new tape entries.
    pub fn apply_analysis(&mut self, result: &AnalysisResult, segment: &TranscriptSegment) -> usize {
        self.kpis.apply(result);
        self.series
            .push(result, &segment.timestamp, &segment.id, &segment.speaker);
        self.viewport.on_data_appended(1);
        self.tape.record(&segment.id, result, Utc::now())
    }

    pub fn segments(&self) -> impl Iterator<Item = &TranscriptSegment> {
        self.segments.iter()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn series(&self) -> &SentimentSeries {
        &self.series
    }

    pub fn kpis(&self) -> &Kpis {
        &self.kpis
    }

    pub fn tape(&self) -> &DriverTape {
        &self.tape
    }

    pub fn clear_tape(&mut self) {
        self.tape.clear();
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Chart points inside the current viewport.
    pub fn visible_points(&self) -> Vec<&ChartPoint> {
        self.series
            .slice(self.viewport.visible_range(self.series.len()))
    }
}
