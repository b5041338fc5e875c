use std::sync::Arc;

use anyhow::Result;
use callsignal_application::{ChannelSubscriber, DashboardUpdate, FeedScheduler, LiveDashboard, NarrativeProcessor};
use callsignal_core::SimRng;
use callsignal_core::analysis::AnalysisResult;
use callsignal_core::transcript::{ConnectionStatus, SpeakerRole, TranscriptSegment};
use callsignal_infrastructure::{CallSignalPaths, ConfigService, PreferenceStore};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of segments to stream before stopping
    #[arg(long, default_value_t = 20)]
    pub ticks: u64,
    /// Seed for a reproducible run (overrides config.toml)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Company ticker to simulate (overrides config.toml)
    #[arg(long)]
    pub ticker: Option<String>,
    /// Shrink the inter-arrival delays to a millisecond
    #[arg(long)]
    pub fast: bool,
    /// Score locally even when a Gemini key is configured
    #[arg(long)]
    pub offline: bool,
}

pub async fn run(paths: &CallSignalPaths, args: SimulateArgs) -> Result<()> {
    let mut config = ConfigService::from_paths(paths)?.get_config()?;
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }
    if args.ticker.is_some() {
        config.simulation.ticker = args.ticker.map(|t| t.to_uppercase());
    }
    if args.fast {
        config.simulation.min_delay_ms = 1;
        config.simulation.max_delay_ms = 1;
    }

    // The feed and the scorer draw from separate streams of one seed.
    let mut rng = SimRng::new(config.simulation.seed);
    let scorer_rng = rng.fork();

    let processor = if args.offline {
        NarrativeProcessor::new(config.analysis.clone(), None, scorer_rng)
    } else {
        NarrativeProcessor::from_default_location(config.analysis.clone(), scorer_rng).await
    };
    let mode = if processor.has_backend() { "gemini" } else { "heuristic" };

    let preferences = match PreferenceStore::from_paths(paths) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(target: "cli", error = %e, "preferences unavailable; driver tape not persisted");
            None
        }
    };
    let mut dashboard = LiveDashboard::new(&config.dashboard, processor, preferences);

    let (subscriber, mut rx) = ChannelSubscriber::new();
    // The feed stops producing after --ticks segments.
    let scheduler = FeedScheduler::with_rng(config.simulation.clone(), Arc::new(subscriber), rng)?
        .with_segment_limit(args.ticks);

    println!("{}", "=== CallSignal live feed ===".bright_magenta().bold());
    println!("{}", format!("analysis: {mode}").dimmed());
    scheduler.connect().await?;

    let mut received = 0;
    while received < args.ticks {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Interrupted.".yellow());
                break;
            }
        };
        let Some(event) = event else {
            break;
        };

        match dashboard.handle(event).await {
            DashboardUpdate::Status(state) => match state.status {
                ConnectionStatus::Error => eprintln!(
                    "{}",
                    format!("Feed error: {}", state.error.unwrap_or_default()).red()
                ),
                status => println!("{}", format!("-- {status} --").dimmed()),
            },
            DashboardUpdate::Segment { segment, analysis } => {
                received += 1;
                print_segment(&segment);
                if let Some(result) = analysis {
                    print_analysis(&result);
                }
            }
            DashboardUpdate::Skipped(_) => {}
        }
    }

    scheduler.disconnect().await;

    let state = dashboard.state();
    let kpis = state.kpis();
    println!();
    println!("{}", "=== Summary ===".bright_magenta().bold());
    println!(
        "confidence {}  risk {}  momentum {:+.2}  discrepancy {}",
        kpis.confidence, kpis.risk, kpis.momentum, kpis.discrepancy_level
    );
    if let Some(point) = state.series().latest() {
        println!("smoothed sentiment {:+.3}", point.value);
    }
    println!("driver tape: {} entries", state.tape().len());
    Ok(())
}

fn print_segment(segment: &TranscriptSegment) {
    let speaker = format!("{} ({})", segment.speaker, segment.role);
    let speaker = match segment.role {
        SpeakerRole::Ceo => speaker.bright_cyan(),
        SpeakerRole::Cfo => speaker.bright_blue(),
        SpeakerRole::Analyst => speaker.yellow(),
        SpeakerRole::Operator | SpeakerRole::System => speaker.dimmed(),
    };
    println!(
        "{} {} {} {}",
        format!("[{}]", segment.timestamp).dimmed(),
        format!("#{:<3}", segment.sequence_id).dimmed(),
        speaker.bold(),
        segment.text
    );
}

fn print_analysis(result: &AnalysisResult) {
    let sentiment = result.net_sentiment();
    let sentiment = if sentiment >= 0.0 {
        format!("{sentiment:+.2}").green()
    } else {
        format!("{sentiment:+.2}").red()
    };
    println!(
        "      conf {:>3}  risk {:>3}  {}  {}",
        result.confidence_score,
        result.risk_score,
        sentiment,
        result.tone_analysis.italic()
    );
    for driver in result.drivers() {
        println!("      {} \"{}\" {}", "•".dimmed(), driver.quote, driver.explanation.dimmed());
    }
    if let Some(discrepancy) = &result.discrepancy {
        println!(
            "      {}",
            format!(
                "{} ({}): {}",
                discrepancy.discrepancy_type, discrepancy.severity, discrepancy.explanation
            )
            .red()
        );
    }
    if let Some(attribution) = &result.attribution {
        println!(
            "      {}",
            format!("linked to: {}", attribution.event.headline).yellow()
        );
    }
}
