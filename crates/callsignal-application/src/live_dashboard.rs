//! Live dashboard: folds feed events into [`DashboardState`] and keeps the
//! driver tape persisted.

use callsignal_core::analysis::AnalysisResult;
use callsignal_core::config::DashboardConfig;
use callsignal_core::dashboard::{DEFAULT_PANEL_WIDTH, DashboardState};
use callsignal_core::transcript::{ConnectionState, TranscriptSegment};
use callsignal_infrastructure::PreferenceStore;

use crate::narrative_processor::NarrativeProcessor;
use crate::subscriber::FeedEvent;

/// What one feed event changed.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardUpdate {
    Status(ConnectionState),
    Segment {
        segment: TranscriptSegment,
        analysis: Option<AnalysisResult>,
    },
    /// Segment dropped because playback is paused.
    Skipped(TranscriptSegment),
}

pub struct LiveDashboard {
    state: DashboardState,
    processor: NarrativeProcessor,
    preferences: Option<PreferenceStore>,
    connection: ConnectionState,
}

impl LiveDashboard {
    /// Restores the driver tape from `preferences` when given.
    pub fn new(
        config: &DashboardConfig,
        processor: NarrativeProcessor,
        preferences: Option<PreferenceStore>,
    ) -> Self {
        let state = match &preferences {
            Some(store) => DashboardState::with_tape(config, store.driver_tape()),
            None => DashboardState::new(config),
        };
        Self {
            state,
            processor,
            preferences,
            connection: ConnectionState::disconnected(0),
        }
    }

    pub async fn handle(&mut self, event: FeedEvent) -> DashboardUpdate {
        match event {
            FeedEvent::Status(connection) => {
                self.connection = connection.clone();
                DashboardUpdate::Status(connection)
            }
            FeedEvent::Segment(segment) => self.handle_segment(segment).await,
        }
    }

    async fn handle_segment(&mut self, segment: TranscriptSegment) -> DashboardUpdate {
        if !self.state.push_segment(segment.clone()) {
            tracing::debug!(target: "dashboard", sequence_id = segment.sequence_id, "paused; segment skipped");
            return DashboardUpdate::Skipped(segment);
        }

        self.processor.push(&segment);
        let analysis = self.processor.process(segment.role).await;
        if let Some(result) = &analysis {
            let added = self.state.apply_analysis(result, &segment);
            if added > 0 {
                self.persist_tape();
            }
        }
        DashboardUpdate::Segment { segment, analysis }
    }

    fn persist_tape(&self) {
        if let Some(store) = &self.preferences {
            if let Err(e) = store.save_driver_tape(self.state.tape()) {
                tracing::warn!(target: "dashboard", error = %e, "failed to persist driver tape");
            }
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DashboardState {
        &mut self.state
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn toggle_playback(&mut self) -> bool {
        self.state.toggle_playback()
    }

    /// Stored drivers panel width (minimum 240 px, default 320 px).
    pub fn panel_width(&self) -> f64 {
        self.preferences
            .as_ref()
            .map_or(DEFAULT_PANEL_WIDTH, PreferenceStore::panel_width)
    }

    pub fn set_panel_width(&self, width: f64) {
        if let Some(store) = &self.preferences {
            if let Err(e) = store.save_panel_width(width) {
                tracing::warn!(target: "dashboard", error = %e, "failed to persist panel width");
            }
        }
    }

    /// Empties the driver tape and its persisted copy.
    pub fn clear_tape(&mut self) {
        self.state.clear_tape();
        self.persist_tape();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsignal_core::SimRng;
    use callsignal_core::config::AnalysisConfig;
    use callsignal_core::dashboard::MIN_PANEL_WIDTH;
    use callsignal_core::transcript::{CallSection, ConnectionStatus, SpeakerRole};
    use tempfile::TempDir;

    fn segment(sequence_id: u64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            id: format!("seg-{sequence_id}"),
            run_id: "run".to_string(),
            sequence_id,
            ticker: "NVDA".to_string(),
            company_name: "NVIDIA Corp".to_string(),
            timestamp: "10:00:00".to_string(),
            speaker: "Jensen Huang".to_string(),
            role: SpeakerRole::Ceo,
            text: text.to_string(),
            section: CallSection::PreparedRemarks,
        }
    }

    fn dashboard(preferences: Option<PreferenceStore>) -> LiveDashboard {
        let processor = NarrativeProcessor::new(AnalysisConfig::default(), None, SimRng::seeded(5));
        LiveDashboard::new(&DashboardConfig::default(), processor, preferences)
    }

    #[tokio::test]
    async fn test_segments_feed_chart_and_kpis() {
        let mut dashboard = dashboard(None);
        let update = dashboard
            .handle(FeedEvent::Segment(segment(1, "Demand remains insatiable for our platform.")))
            .await;

        let DashboardUpdate::Segment { analysis, .. } = update else {
            panic!("expected segment update");
        };
        let analysis = analysis.unwrap();
        let state = dashboard.state();
        assert_eq!(state.segment_count(), 1);
        assert_eq!(state.series().len(), 1);
        assert_eq!(state.kpis().confidence, analysis.confidence_score);
    }

    #[tokio::test]
    async fn test_paused_dashboard_skips_segments() {
        let mut dashboard = dashboard(None);
        assert!(dashboard.toggle_playback());
        let update = dashboard.handle(FeedEvent::Segment(segment(1, "Anything."))).await;
        assert!(matches!(update, DashboardUpdate::Skipped(_)));
        assert_eq!(dashboard.state().segment_count(), 0);
        assert!(dashboard.state().series().is_empty());
    }

    #[tokio::test]
    async fn test_status_events_update_connection() {
        let mut dashboard = dashboard(None);
        let connected = ConnectionState {
            status: ConnectionStatus::Connected,
            latency: 12,
            message_count: 0,
            error: None,
        };
        dashboard.handle(FeedEvent::Status(connected.clone())).await;
        assert_eq!(dashboard.connection(), &connected);
    }

    #[tokio::test]
    async fn test_driver_tape_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("preferences.toml");

        let mut first = dashboard(Some(PreferenceStore::new(path.clone())));
        first
            .handle(FeedEvent::Segment(segment(
                1,
                "We delivered record revenue with robust data center demand.",
            )))
            .await;
        let recorded = first.state().tape().len();
        assert!(recorded > 0);

        let second = dashboard(Some(PreferenceStore::new(path)));
        assert_eq!(second.state().tape().len(), recorded);
    }

    #[test]
    fn test_panel_width_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let with_store = dashboard(Some(PreferenceStore::new(
            temp_dir.path().join("preferences.toml"),
        )));
        assert_eq!(with_store.panel_width(), DEFAULT_PANEL_WIDTH);
        with_store.set_panel_width(100.0);
        assert_eq!(with_store.panel_width(), MIN_PANEL_WIDTH);

        let without_store = dashboard(None);
        without_store.set_panel_width(500.0);
        assert_eq!(without_store.panel_width(), DEFAULT_PANEL_WIDTH);
    }
}
