// Offline replay of recorded sessions
// Drives an engine on a manual clock from a JSON-lines capture, injecting
// periodic ticks the way the live session timer would.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::models::{Decision, Timestamp, TransactionContext};
use crate::security::analysis::fallback_decision;
use crate::security::behavioral_biometrics::{BiometricEngine, BiometricEvent, BiometricSnapshot};
use crate::security::factors::{evaluate_factors, summarize, BiometricFactor, FactorSummary};
use crate::utils::clock::ManualClock;
use crate::utils::sanitize_for_log;

/// One recorded event, `at` milliseconds after the session started
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at: Timestamp,
    #[serde(flatten)]
    pub event: BiometricEvent,
}

#[derive(Clone, Debug)]
pub struct ReplayOptions {
    /// Simulated tick period; zero disables injected ticks
    pub tick_ms: Timestamp,
    pub context: TransactionContext,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    pub events_applied: usize,
    pub ticks_injected: u64,
    pub lines_skipped: usize,
    pub duration_ms: Timestamp,
    pub snapshot: BiometricSnapshot,
    pub factors: Vec<BiometricFactor>,
    pub summary: FactorSummary,
    pub decision: Decision,
}

/// Parse a JSON-lines capture. Blank lines are ignored; malformed lines are
/// logged and counted.
pub fn parse_events<R: BufRead>(reader: R) -> Result<(Vec<TimedEvent>, usize)> {
    let mut events = Vec::new();
    let mut skipped = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read capture")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<TimedEvent>(trimmed) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(
                    "Skipping line {}: {} ({})",
                    index + 1,
                    e,
                    sanitize_for_log(trimmed)
                );
                skipped += 1;
            }
        }
    }

    Ok((events, skipped))
}

/// Run a capture through a fresh engine
pub fn replay(events: &[TimedEvent], options: &ReplayOptions) -> ReplayReport {
    let mut ordered = events.to_vec();
    ordered.sort_by_key(|e| e.at);

    let clock = Arc::new(ManualClock::new(0));
    let mut engine = BiometricEngine::new(clock.clone());
    engine.set_transaction_context(&options.context);

    // None once the tick schedule runs past the end of the timeline
    let mut next_tick = Some(options.tick_ms).filter(|tick| *tick > 0);
    let mut ticks_injected: u64 = 0;

    for timed in &ordered {
        if let Some(due) = next_tick.filter(|due| *due <= timed.at) {
            // A tick only reads the clock, so the last one before the event
            // stands in for the whole run of them
            let pending = (timed.at - due) / options.tick_ms;
            let last = due + pending * options.tick_ms;
            clock.set(last);
            engine.tick();
            ticks_injected = ticks_injected.saturating_add(pending + 1);
            next_tick = last.checked_add(options.tick_ms);
        }

        clock.set(timed.at);
        engine.ingest(&timed.event);

        if timed.event == BiometricEvent::Reset {
            engine.set_transaction_context(&options.context);
        }
    }

    // Settle the time-driven metrics at the end of the capture
    engine.tick();

    let snapshot = engine.snapshot().clone();
    let factors = evaluate_factors(&snapshot, &options.context);

    ReplayReport {
        events_applied: ordered.len(),
        ticks_injected,
        lines_skipped: 0,
        duration_ms: ordered.last().map(|e| e.at).unwrap_or(0),
        summary: summarize(&factors),
        decision: fallback_decision(snapshot.transaction_context_risk),
        snapshot,
        factors,
    }
}

pub fn replay_file(path: &Path, options: &ReplayOptions) -> Result<ReplayReport> {
    let file = File::open(path).with_context(|| format!("Failed to open capture {}", path.display()))?;
    let (events, skipped) = parse_events(BufReader::new(file))?;

    info!(
        "Replaying {} events from {} ({} skipped)",
        events.len(),
        path.display(),
        skipped
    );

    let mut report = replay(&events, options);
    report.lines_skipped = skipped;
    Ok(report)
}

/// Plain-text factor table for terminal output
pub fn render_report(report: &ReplayReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{:<22} {:>24}  {}", "FACTOR", "VALUE", "STATUS");
    for factor in &report.factors {
        let _ = writeln!(
            out,
            "{:<22} {:>24}  {}",
            factor.name,
            factor.formatted_value(),
            factor.status
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} normal, {} warning, {} critical",
        report.summary.normal, report.summary.warning, report.summary.critical
    );
    let _ = writeln!(
        out,
        "Events: {} applied, {} skipped, {} ticks over {} ms",
        report.events_applied, report.lines_skipped, report.ticks_injected, report.duration_ms
    );
    let _ = writeln!(
        out,
        "Decision: {} (transaction risk {})",
        report.decision, report.snapshot.transaction_context_risk
    );

    out
}
