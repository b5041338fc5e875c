//! Feed scheduler: drives one [`Session`] at a randomized cadence.
//!
//! A run lives in a single tokio task that sleeps between ticks. Every tick
//! re-checks the run's cancellation token and the session under the state
//! lock before emitting, so once [`FeedScheduler::disconnect`] returns no
//! further segment reaches the subscriber. `connect` and `disconnect` are
//! serialized, and a tick only emits for the run that spawned it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Result, anyhow};
use callsignal_core::SimRng;
use callsignal_core::config::SimulationConfig;
use callsignal_core::simulation::Session;
use callsignal_core::transcript::{ConnectionState, ConnectionStatus, TranscriptSegment};
use chrono::Local;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::subscriber::FeedSubscriber;

/// Synthetic round-trip latency reported while connected.
const LATENCY_MS: std::ops::RangeInclusive<u32> = 10..=29;

/// Lower bound on the sleep between ticks, even for a zero-delay config.
const MIN_TICK_DELAY_MS: u64 = 1;

struct SchedulerState {
    status: ConnectionStatus,
    session: Option<Session>,
    token: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    rng: SimRng,
    latency_rng: SimRng,
    last_error: Option<String>,
}

/// Owns the simulation run and pushes its segments to one subscriber.
pub struct FeedScheduler {
    config: SimulationConfig,
    subscriber: Arc<dyn FeedSubscriber>,
    state: Arc<Mutex<SchedulerState>>,
    lifecycle: tokio::sync::Mutex<()>,
    segment_limit: Option<u64>,
}

impl FeedScheduler {
    /// Seeds the random source from `config.seed` (entropy when unset).
    pub fn new(config: SimulationConfig, subscriber: Arc<dyn FeedSubscriber>) -> Result<Self> {
        let rng = SimRng::new(config.seed);
        Self::with_rng(config, subscriber, rng)
    }

    pub fn with_rng(
        config: SimulationConfig,
        subscriber: Arc<dyn FeedSubscriber>,
        mut rng: SimRng,
    ) -> Result<Self> {
        config.validate()?;
        let latency_rng = rng.fork();
        Ok(Self {
            config,
            subscriber,
            state: Arc::new(Mutex::new(SchedulerState {
                status: ConnectionStatus::Disconnected,
                session: None,
                token: None,
                task: None,
                rng,
                latency_rng,
                last_error: None,
            })),
            lifecycle: tokio::sync::Mutex::new(()),
            segment_limit: None,
        })
    }

    /// Ends each run on its own after `limit` segments.
    pub fn with_segment_limit(mut self, limit: u64) -> Self {
        self.segment_limit = Some(limit);
        self
    }

    /// Starts a fresh run and returns its run id.
    ///
    /// An active run is fully stopped first. Subscribers see `Connecting`,
    /// `Connected` and the run's first segment before this returns.
    pub async fn connect(&self) -> Result<String> {
        let _lifecycle = self.lifecycle.lock().await;
        self.stop_run().await;

        {
            let mut state = lock(&self.state)?;
            state.status = ConnectionStatus::Connecting;
            state.last_error = None;
            notify_status(self.subscriber.as_ref(), &snapshot(&mut state));
        }

        let token = CancellationToken::new();
        let run_id = {
            let mut state = lock(&self.state)?;
            let session = match Session::start(&self.config, &mut state.rng) {
                Ok(session) => session,
                Err(e) => {
                    state.status = ConnectionStatus::Error;
                    state.last_error = Some(e.to_string());
                    notify_status(self.subscriber.as_ref(), &snapshot(&mut state));
                    return Err(anyhow!("Failed to start simulation session: {}", e));
                }
            };
            let run_id = session.run_id().to_string();
            state.session = Some(session);
            state.token = Some(token.clone());
            state.status = ConnectionStatus::Connected;
            notify_status(self.subscriber.as_ref(), &snapshot(&mut state));
            emit_tick(&mut state, self.subscriber.as_ref(), &run_id, &token, self.segment_limit);
            run_id
        };

        let task = tokio::spawn(run_loop(
            Arc::clone(&self.state),
            Arc::clone(&self.subscriber),
            RunHandle {
                run_id: run_id.clone(),
                token,
                min_delay_ms: self.config.min_delay_ms,
                max_delay_ms: self.config.max_delay_ms,
                segment_limit: self.segment_limit,
            },
        ));
        if let Some(stale) = lock(&self.state)?.task.replace(task) {
            stale.abort();
        }

        tracing::info!(target: "feed", run_id = %run_id, "feed connected");
        Ok(run_id)
    }

    /// Stops the active run. Calling it again is a no-op.
    pub async fn disconnect(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let was_active = self.stop_run().await;
        let Ok(mut state) = lock(&self.state) else {
            return;
        };
        if was_active || state.status != ConnectionStatus::Disconnected {
            state.status = ConnectionStatus::Disconnected;
            notify_status(self.subscriber.as_ref(), &snapshot(&mut state));
            tracing::info!(target: "feed", "feed disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.state)
            .map(|state| state.status == ConnectionStatus::Connected && state.session.is_some())
            .unwrap_or(false)
    }

    /// Id of the active run, if any.
    pub fn run_id(&self) -> Option<String> {
        lock(&self.state)
            .ok()?
            .session
            .as_ref()
            .map(|session| session.run_id().to_string())
    }

    /// Samples the connection state, drawing a fresh synthetic latency.
    pub fn connection_state(&self) -> ConnectionState {
        match lock(&self.state) {
            Ok(mut state) => snapshot(&mut state),
            Err(e) => ConnectionState {
                status: ConnectionStatus::Error,
                latency: 0,
                message_count: 0,
                error: Some(e.to_string()),
            },
        }
    }

    /// Cancels the token, drops the session and waits for the task to end.
    /// Returns whether a run was active.
    async fn stop_run(&self) -> bool {
        let (token, task, had_session) = match lock(&self.state) {
            Ok(mut state) => {
                let had_session = state.session.take().is_some();
                (state.token.take(), state.task.take(), had_session)
            }
            Err(_) => return false,
        };
        if let Some(token) = &token {
            token.cancel();
        }
        if let Some(task) = task {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::error!(target: "feed", error = %e, "feed task ended abnormally");
                }
            }
        }
        had_session || token.is_some()
    }
}

impl Drop for FeedScheduler {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(token) = state.token.take() {
                token.cancel();
            }
            if let Some(task) = state.task.take() {
                task.abort();
            }
            state.session = None;
        }
    }
}

/// What a spawned run needs to know about itself.
struct RunHandle {
    run_id: String,
    token: CancellationToken,
    min_delay_ms: u64,
    max_delay_ms: u64,
    segment_limit: Option<u64>,
}

async fn run_loop(
    state: Arc<Mutex<SchedulerState>>,
    subscriber: Arc<dyn FeedSubscriber>,
    run: RunHandle,
) {
    loop {
        let delay = match lock(&state) {
            Ok(mut state) => state
                .rng
                .range_u64(run.min_delay_ms..=run.max_delay_ms)
                .max(MIN_TICK_DELAY_MS),
            Err(_) => break,
        };

        tokio::select! {
            _ = run.token.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
        }

        let Ok(mut guard) = lock(&state) else {
            break;
        };
        if !emit_tick(
            &mut guard,
            subscriber.as_ref(),
            &run.run_id,
            &run.token,
            run.segment_limit,
        ) {
            break;
        }
    }
    tracing::debug!(target: "feed", run_id = %run.run_id, "feed task finished");
}

/// Builds and delivers one segment. Returns `false` when the run is over,
/// was replaced by another run, or has reached `segment_limit`.
fn emit_tick(
    state: &mut SchedulerState,
    subscriber: &dyn FeedSubscriber,
    run_id: &str,
    token: &CancellationToken,
    segment_limit: Option<u64>,
) -> bool {
    if token.is_cancelled() {
        return false;
    }
    let SchedulerState { session, rng, .. } = state;
    let Some(session) = session.as_mut().filter(|session| session.run_id() == run_id) else {
        return false;
    };
    if segment_limit.is_some_and(|limit| session.emitted() >= limit) {
        tracing::debug!(target: "feed", run_id, "segment limit reached");
        return false;
    }
    let segment = session.next_segment(rng, Local::now());
    deliver_segment(subscriber, &segment);
    true
}

fn deliver_segment(subscriber: &dyn FeedSubscriber, segment: &TranscriptSegment) {
    if catch_unwind(AssertUnwindSafe(|| subscriber.on_segment(segment))).is_err() {
        tracing::error!(
            target: "feed",
            sequence_id = segment.sequence_id,
            "subscriber panicked handling segment; continuing"
        );
    }
}

fn notify_status(subscriber: &dyn FeedSubscriber, connection: &ConnectionState) {
    if catch_unwind(AssertUnwindSafe(|| subscriber.on_status(connection))).is_err() {
        tracing::error!(target: "feed", status = %connection.status, "subscriber panicked handling status");
    }
}

fn snapshot(state: &mut SchedulerState) -> ConnectionState {
    let message_count = state.session.as_ref().map_or(0, Session::emitted);
    match state.status {
        ConnectionStatus::Connected => ConnectionState {
            status: ConnectionStatus::Connected,
            latency: state.latency_rng.range_u32(LATENCY_MS),
            message_count,
            error: None,
        },
        ConnectionStatus::Disconnected => ConnectionState::disconnected(message_count),
        status => ConnectionState {
            status,
            latency: 0,
            message_count,
            error: state.last_error.clone(),
        },
    }
}

fn lock(state: &Mutex<SchedulerState>) -> Result<MutexGuard<'_, SchedulerState>> {
    state
        .lock()
        .map_err(|_| anyhow!("feed scheduler state poisoned"))
}
