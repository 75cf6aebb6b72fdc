// Behavioral biometrics engine
// Folds raw interaction events from a payment form into a live snapshot of
// behavioral metrics.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::{Point, Timestamp, TransactionContext};
use crate::security::statistics::{coefficient_of_variation, intervals, mean, rate, windowed_count};
use crate::security::transaction_risk::context_risk;
use crate::utils::clock::Clock;
use crate::utils::round_to;

// Typing metrics need more than this many keystrokes
const MIN_KEYSTROKES_FOR_TYPING: usize = 3;
// Curvature stays neutral until the pointer is this far from its origin
const MIN_CURVATURE_DISPLACEMENT: f64 = 10.0;
const SCROLL_RATE_WINDOW_MS: Timestamp = 1_000;
const CHARS_PER_WORD: f64 = 5.0;

///////////////////////////////////////////////////////////////////////////////
// Events
///////////////////////////////////////////////////////////////////////////////

/// Raw interaction event delivered by the form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BiometricEvent {
    Keystroke,
    FieldFocus,
    FieldBlur,
    PointerMove { x: f64, y: f64 },
    Scroll { delta: f64 },
    Click,
    VisibilityChange { hidden: bool },
    OrientationChange { gamma: Option<f64> },
    Tick,
    Reset,
}

///////////////////////////////////////////////////////////////////////////////
// Snapshot
///////////////////////////////////////////////////////////////////////////////

/// Published view of the session's behavioral metrics.
///
/// Field names on the wire follow the submission payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricSnapshot {
    #[serde(rename = "typingWPM")]
    pub typing_wpm: f64,
    #[serde(rename = "typingWPS")]
    pub typing_wps: f64,
    #[serde(rename = "typingCPS")]
    pub typing_cps: f64,
    pub keystroke_interval: f64,  // ms
    pub keystroke_variance: f64,  // coefficient of variation
    pub field_focus_time_amount: f64, // seconds
    pub total_dwell_time: f64,    // seconds
    pub mouse_speed: f64,         // px/sec
    pub mouse_path_curvature: f64,
    pub scroll_speed: f64,        // events in the trailing second
    pub scroll_distance: f64,     // px
    pub click_delay: f64,         // ms
    pub click_interval: f64,      // ms
    pub tab_switch_count: u32,
    pub time_away_from_tab: f64,  // seconds
    pub device_orientation_events: u32,
    pub device_orientation_speed: f64, // deg/sec
    pub interaction_density: f64, // interactions/sec
    pub transaction_context_risk: u32, // 0-100
}

impl Default for BiometricSnapshot {
    fn default() -> Self {
        BiometricSnapshot {
            typing_wpm: 0.0,
            typing_wps: 0.0,
            typing_cps: 0.0,
            keystroke_interval: 0.0,
            keystroke_variance: 0.0,
            field_focus_time_amount: 0.0,
            total_dwell_time: 0.0,
            mouse_speed: 0.0,
            mouse_path_curvature: 1.0,
            scroll_speed: 0.0,
            scroll_distance: 0.0,
            click_delay: 0.0,
            click_interval: 0.0,
            tab_switch_count: 0,
            time_away_from_tab: 0.0,
            device_orientation_events: 0,
            device_orientation_speed: 0.0,
            interaction_density: 0.0,
            transaction_context_risk: 0,
        }
    }
}

impl BiometricSnapshot {
    /// Every numeric field as `f64`, in declaration order
    pub fn values(&self) -> [f64; 19] {
        [
            self.typing_wpm,
            self.typing_wps,
            self.typing_cps,
            self.keystroke_interval,
            self.keystroke_variance,
            self.field_focus_time_amount,
            self.total_dwell_time,
            self.mouse_speed,
            self.mouse_path_curvature,
            self.scroll_speed,
            self.scroll_distance,
            self.click_delay,
            self.click_interval,
            self.tab_switch_count as f64,
            self.time_away_from_tab,
            self.device_orientation_events as f64,
            self.device_orientation_speed,
            self.interaction_density,
            self.transaction_context_risk as f64,
        ]
    }
}

///////////////////////////////////////////////////////////////////////////////
// Accumulators
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Default)]
struct PointerTrack {
    last_position: Option<Point>,
    start_position: Option<Point>,
    cumulative_path_length: f64,
    straight_line_displacement: f64,
}

#[derive(Debug, Default)]
struct ScrollLog {
    timestamps: Vec<Timestamp>,
    cumulative_distance: f64,
}

#[derive(Debug, Default)]
struct VisibilityState {
    switch_count: u32,
    away_start: Option<Timestamp>,
    cumulative_away_seconds: f64,
}

#[derive(Debug, Default)]
struct OrientationLog {
    event_count: u32,
    last_event_time: Option<Timestamp>,
    angular_speeds: Vec<f64>,
}

///////////////////////////////////////////////////////////////////////////////
// Engine
///////////////////////////////////////////////////////////////////////////////

/// Session-scoped accumulator for one user filling out one form.
///
/// All mutation goes through `&mut self`, so a session is owned by exactly
/// one writer; independent sessions use independent engines.
pub struct BiometricEngine {
    clock: Arc<dyn Clock>,
    session_start: Timestamp,
    focus_start: Option<Timestamp>,
    keystrokes: Vec<Timestamp>,
    pointer: PointerTrack,
    scrolls: ScrollLog,
    clicks: Vec<Timestamp>,
    visibility: VisibilityState,
    orientation: OrientationLog,
    interaction_count: u64,
    snapshot: BiometricSnapshot,
}

impl BiometricEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let session_start = clock.now_millis();

        BiometricEngine {
            clock,
            session_start,
            focus_start: None,
            keystrokes: Vec::new(),
            pointer: PointerTrack::default(),
            scrolls: ScrollLog::default(),
            clicks: Vec::new(),
            visibility: VisibilityState::default(),
            orientation: OrientationLog::default(),
            interaction_count: 0,
            snapshot: BiometricSnapshot::default(),
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> &BiometricSnapshot {
        &self.snapshot
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now_millis()
    }

    pub fn cumulative_path_length(&self) -> f64 {
        self.pointer.cumulative_path_length
    }

    pub fn straight_line_displacement(&self) -> f64 {
        self.pointer.straight_line_displacement
    }

    pub fn cumulative_scroll_distance(&self) -> f64 {
        self.scrolls.cumulative_distance
    }

    pub fn interaction_count(&self) -> u64 {
        self.interaction_count
    }

    /// Dispatch a raw event to its ingestion operation
    pub fn ingest(&mut self, event: &BiometricEvent) {
        match *event {
            BiometricEvent::Keystroke => self.keystroke(),
            BiometricEvent::FieldFocus => self.field_focus(),
            BiometricEvent::FieldBlur => self.field_blur(),
            BiometricEvent::PointerMove { x, y } => self.pointer_move(x, y),
            BiometricEvent::Scroll { delta } => self.scroll(delta),
            BiometricEvent::Click => self.click(),
            BiometricEvent::VisibilityChange { hidden } => self.visibility_change(hidden),
            BiometricEvent::OrientationChange { gamma } => self.orientation_change(gamma),
            BiometricEvent::Tick => self.tick(),
            BiometricEvent::Reset => self.reset(),
        }
    }

    fn elapsed_seconds(&self, now: Timestamp) -> f64 {
        now.saturating_sub(self.session_start) as f64 / 1000.0
    }

    pub fn keystroke(&mut self) {
        let now = self.now();
        self.keystrokes.push(now);
        self.interaction_count += 1;

        if self.keystrokes.len() <= MIN_KEYSTROKES_FOR_TYPING {
            return;
        }

        // Recomputed over the full history, not a window
        let first = self.keystrokes[0];
        let last = self.keystrokes[self.keystrokes.len() - 1];
        let time_span_ms = last.saturating_sub(first) as f64;
        let chars = self.keystrokes.len() as f64;
        let minutes = time_span_ms / 60_000.0;

        let wpm = if minutes > 0.0 {
            (chars / CHARS_PER_WORD) / minutes
        } else {
            0.0
        };
        let wps = wpm / 60.0;
        let cps = rate(chars, time_span_ms / 1000.0);

        let gaps = intervals(&self.keystrokes);

        self.snapshot.typing_wpm = round_to(wpm, 0);
        self.snapshot.typing_wps = round_to(wps, 2);
        self.snapshot.typing_cps = round_to(cps, 2);
        self.snapshot.keystroke_interval = round_to(mean(&gaps), 0);
        self.snapshot.keystroke_variance = round_to(coefficient_of_variation(&gaps), 2);
    }

    pub fn field_focus(&mut self) {
        self.focus_start = Some(self.now());
    }

    /// Publishes focus time since the last focus. The focus start is kept, so
    /// a second blur measures from the same start.
    pub fn field_blur(&mut self) {
        if let Some(start) = self.focus_start {
            let seconds = self.now().saturating_sub(start) as f64 / 1000.0;
            self.snapshot.field_focus_time_amount = round_to(seconds, 1);
        }
    }

    /// Moves with non-finite coordinates are dropped
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let now = self.now();
        let position = Point::new(x, y);
        let pointer = &mut self.pointer;

        let start = *pointer.start_position.get_or_insert(position);

        if let Some(last) = pointer.last_position {
            pointer.cumulative_path_length += last.distance_to(&position);
        }
        pointer.last_position = Some(position);
        pointer.straight_line_displacement = start.distance_to(&position);

        let path = pointer.cumulative_path_length;
        let displacement = pointer.straight_line_displacement;
        let speed = rate(path, self.elapsed_seconds(now));
        let curvature = if displacement > MIN_CURVATURE_DISPLACEMENT {
            path / displacement
        } else {
            1.0
        };

        self.snapshot.mouse_speed = round_to(speed, 0);
        self.snapshot.mouse_path_curvature = round_to(curvature, 2);
    }

    pub fn scroll(&mut self, delta: f64) {
        let now = self.now();
        self.scrolls.timestamps.push(now);
        self.interaction_count += 1;
        if delta.is_finite() {
            self.scrolls.cumulative_distance += delta.abs();
        }

        let recent = windowed_count(&self.scrolls.timestamps, now, SCROLL_RATE_WINDOW_MS);

        self.snapshot.scroll_speed = recent as f64;
        self.snapshot.scroll_distance = round_to(self.scrolls.cumulative_distance, 0);
    }

    pub fn click(&mut self) {
        let now = self.now();
        self.clicks.push(now);
        self.interaction_count += 1;

        if self.clicks.len() == 1 {
            self.snapshot.click_delay = now.saturating_sub(self.session_start) as f64;
        } else {
            self.snapshot.click_interval = round_to(mean(&intervals(&self.clicks)), 0);
        }
    }

    pub fn visibility_change(&mut self, hidden: bool) {
        let now = self.now();
        let visibility = &mut self.visibility;

        if hidden {
            visibility.switch_count += 1;
            visibility.away_start = Some(now);
        } else if let Some(away_start) = visibility.away_start.take() {
            visibility.cumulative_away_seconds += now.saturating_sub(away_start) as f64 / 1000.0;
        }

        self.snapshot.tab_switch_count = visibility.switch_count;
        self.snapshot.time_away_from_tab = round_to(visibility.cumulative_away_seconds, 1);
    }

    /// `gamma` is the left/right tilt in degrees; `None` when the sensor
    /// reports no angle. The event still counts.
    pub fn orientation_change(&mut self, gamma: Option<f64>) {
        let now = self.now();
        let orientation = &mut self.orientation;
        orientation.event_count += 1;

        if let (Some(last), Some(angle)) = (orientation.last_event_time, gamma) {
            let elapsed = now.saturating_sub(last) as f64 / 1000.0;
            if elapsed > 0.0 && angle.is_finite() {
                orientation.angular_speeds.push(angle.abs() / elapsed);
            }
        }
        orientation.last_event_time = Some(now);

        self.snapshot.device_orientation_events = orientation.event_count;
        self.snapshot.device_orientation_speed = round_to(mean(&orientation.angular_speeds), 1);
    }

    /// Periodic update of the time-driven metrics
    pub fn tick(&mut self) {
        let elapsed = self.elapsed_seconds(self.now());

        self.snapshot.total_dwell_time = round_to(elapsed, 1);
        self.snapshot.interaction_density = round_to(rate(self.interaction_count as f64, elapsed), 2);
    }

    /// Fold the transaction context risk into the snapshot
    pub fn set_transaction_context(&mut self, context: &TransactionContext) -> u32 {
        let risk = context_risk(context);
        self.snapshot.transaction_context_risk = risk;
        risk
    }

    /// Start a fresh session: every accumulator is cleared and the session
    /// clock restarts now.
    pub fn reset(&mut self) {
        self.session_start = self.now();
        self.focus_start = None;
        self.keystrokes.clear();
        self.pointer = PointerTrack::default();
        self.scrolls = ScrollLog::default();
        self.clicks.clear();
        self.visibility = VisibilityState::default();
        self.orientation = OrientationLog::default();
        self.interaction_count = 0;
        self.snapshot = BiometricSnapshot::default();

        debug!("Biometric session reset at {}", self.session_start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MerchantCategory;
    use crate::utils::clock::ManualClock;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal_macros::dec;

    const START: Timestamp = 1_700_000_000_000;

    fn engine_at_start() -> (Arc<ManualClock>, BiometricEngine) {
        let clock = Arc::new(ManualClock::new(START));
        let engine = BiometricEngine::new(clock.clone());
        (clock, engine)
    }

    #[test]
    fn test_initial_snapshot() {
        let (_, engine) = engine_at_start();
        let snapshot = engine.snapshot();
        assert_eq!(*snapshot, BiometricSnapshot::default());
        assert_eq!(snapshot.mouse_path_curvature, 1.0);
        assert_eq!(snapshot.mouse_speed, 0.0);
    }

    #[test]
    fn test_regular_keystrokes() {
        let (clock, mut engine) = engine_at_start();
        for at in [0, 200, 400, 600, 800] {
            clock.set(START + at);
            engine.keystroke();
        }

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.keystroke_interval, 200.0);
        assert_eq!(snapshot.keystroke_variance, 0.0);
        // (5 / 5) / (800 / 60000) = 75
        assert_eq!(snapshot.typing_wpm, 75.0);
        assert_eq!(snapshot.typing_wps, 1.25);
        assert_eq!(snapshot.typing_cps, 6.25);
        assert_eq!(engine.interaction_count(), 5);
    }

    #[test]
    fn test_typing_rates_round_exact_value() {
        let (clock, mut engine) = engine_at_start();
        for at in [0, 3_200, 6_400, 9_600, 12_800, 16_000] {
            clock.set(START + at);
            engine.keystroke();
        }

        // 4.5 WPM / 60 is stored just below 0.075
        assert_eq!(engine.snapshot().typing_wps, 0.07);
        // 6 / 16 s is exactly 0.375
        assert_eq!(engine.snapshot().typing_cps, 0.38);
        assert_eq!(engine.snapshot().keystroke_interval, 3_200.0);
    }

    #[test]
    fn test_typing_metrics_wait_for_four_keystrokes() {
        let (clock, mut engine) = engine_at_start();
        for at in [0, 150, 300] {
            clock.set(START + at);
            engine.keystroke();
        }
        assert_eq!(engine.snapshot().typing_wpm, 0.0);
        assert_eq!(engine.snapshot().keystroke_interval, 0.0);

        clock.set(START + 450);
        engine.keystroke();
        assert_eq!(engine.snapshot().keystroke_interval, 150.0);
    }

    #[test]
    fn test_irregular_keystrokes_variance() {
        let (clock, mut engine) = engine_at_start();
        // Intervals 100, 300, 100, 300: mean 200, population sd 100
        for at in [0, 100, 400, 500, 800] {
            clock.set(START + at);
            engine.keystroke();
        }
        assert_eq!(engine.snapshot().keystroke_interval, 200.0);
        assert_eq!(engine.snapshot().keystroke_variance, 0.5);
    }

    #[test]
    fn test_simultaneous_keystrokes_do_not_divide_by_zero() {
        let (_, mut engine) = engine_at_start();
        for _ in 0..6 {
            engine.keystroke();
        }
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.typing_wpm, 0.0);
        assert_eq!(snapshot.typing_cps, 0.0);
        assert_eq!(snapshot.keystroke_variance, 0.0);
    }

    #[test]
    fn test_pointer_path_and_curvature() {
        let (clock, mut engine) = engine_at_start();
        engine.pointer_move(0.0, 0.0);
        engine.pointer_move(100.0, 0.0);
        clock.set(START + 2_000);
        engine.pointer_move(100.0, 100.0);

        assert_eq!(engine.cumulative_path_length(), 200.0);
        assert!((engine.straight_line_displacement() - 141.421356).abs() < 1e-6);
        assert_eq!(engine.snapshot().mouse_path_curvature, 1.41);
        assert_eq!(engine.snapshot().mouse_speed, 100.0);
    }

    #[test]
    fn test_non_finite_pointer_moves_are_dropped() {
        let (clock, mut engine) = engine_at_start();
        engine.pointer_move(0.0, 0.0);
        engine.pointer_move(f64::NAN, 10.0);
        engine.pointer_move(10.0, f64::INFINITY);
        clock.set(START + 1_000);
        engine.pointer_move(30.0, 40.0);

        assert_eq!(engine.cumulative_path_length(), 50.0);
        assert_eq!(engine.straight_line_displacement(), 50.0);
        assert_eq!(engine.snapshot().mouse_speed, 50.0);

        engine.pointer_move(f64::NEG_INFINITY, f64::NAN);
        assert_eq!(engine.cumulative_path_length(), 50.0);
    }

    #[test]
    fn test_curvature_neutral_near_origin() {
        let (clock, mut engine) = engine_at_start();
        clock.set(START + 1_000);
        engine.pointer_move(50.0, 50.0);
        engine.pointer_move(55.0, 50.0);
        engine.pointer_move(50.0, 50.0);

        assert_eq!(engine.cumulative_path_length(), 10.0);
        assert_eq!(engine.snapshot().mouse_path_curvature, 1.0);
        assert_eq!(engine.snapshot().mouse_speed, 10.0);
    }

    #[test]
    fn test_first_move_at_session_start() {
        let (_, mut engine) = engine_at_start();
        engine.pointer_move(10.0, 10.0);
        assert_eq!(engine.cumulative_path_length(), 0.0);
        assert_eq!(engine.snapshot().mouse_speed, 0.0);
    }

    #[test]
    fn test_scroll_rate_window() {
        let (clock, mut engine) = engine_at_start();
        clock.set(START + 1_000);
        engine.scroll(100.0);
        clock.set(START + 1_500);
        engine.scroll(-50.0);

        for at in [3_100, 3_300, 3_500, 3_700, 3_850, 4_000] {
            clock.set(START + at);
            engine.scroll(10.0);
        }

        assert_eq!(engine.snapshot().scroll_speed, 6.0);
        // Absolute deltas accumulate even when scrolling back
        assert_eq!(engine.snapshot().scroll_distance, 210.0);
        assert_eq!(engine.interaction_count(), 8);
    }

    #[test]
    fn test_click_delay_and_interval() {
        let (clock, mut engine) = engine_at_start();
        clock.set(START + 1_234);
        engine.click();
        assert_eq!(engine.snapshot().click_delay, 1_234.0);
        assert_eq!(engine.snapshot().click_interval, 0.0);

        clock.set(START + 2_234);
        engine.click();
        clock.set(START + 4_235);
        engine.click();

        // First click delay is not republished
        assert_eq!(engine.snapshot().click_delay, 1_234.0);
        // Mean of 1000 and 2001
        assert_eq!(engine.snapshot().click_interval, 1_501.0);
    }

    #[test]
    fn test_field_focus_and_stale_blur() {
        let (clock, mut engine) = engine_at_start();
        // Blur without focus is a no-op
        engine.field_blur();
        assert_eq!(engine.snapshot().field_focus_time_amount, 0.0);

        clock.set(START + 1_000);
        engine.field_focus();
        clock.set(START + 5_260);
        engine.field_blur();
        assert_eq!(engine.snapshot().field_focus_time_amount, 4.3);

        // Focus start is kept, so a second blur measures from the same start
        clock.set(START + 8_000);
        engine.field_blur();
        assert_eq!(engine.snapshot().field_focus_time_amount, 7.0);
    }

    #[test]
    fn test_visibility_changes() {
        let (clock, mut engine) = engine_at_start();
        clock.set(START + 1_000);
        engine.visibility_change(true);
        assert_eq!(engine.snapshot().tab_switch_count, 1);

        clock.set(START + 3_500);
        engine.visibility_change(false);
        assert_eq!(engine.snapshot().time_away_from_tab, 2.5);

        // Becoming visible again without being hidden adds nothing
        clock.set(START + 4_000);
        engine.visibility_change(false);
        assert_eq!(engine.snapshot().time_away_from_tab, 2.5);

        engine.visibility_change(true);
        clock.set(START + 4_120);
        engine.visibility_change(false);
        assert_eq!(engine.snapshot().tab_switch_count, 2);
        assert_eq!(engine.snapshot().time_away_from_tab, 2.6);
    }

    #[test]
    fn test_orientation_speed() {
        let (clock, mut engine) = engine_at_start();
        engine.orientation_change(Some(30.0));
        assert_eq!(engine.snapshot().device_orientation_events, 1);
        assert_eq!(engine.snapshot().device_orientation_speed, 0.0);

        clock.set(START + 500);
        engine.orientation_change(Some(-20.0)); // 40 deg/sec
        clock.set(START + 1_000);
        engine.orientation_change(None); // counted, no speed sample
        clock.set(START + 2_000);
        engine.orientation_change(Some(25.0)); // 25 deg/sec

        assert_eq!(engine.snapshot().device_orientation_events, 4);
        assert_eq!(engine.snapshot().device_orientation_speed, 32.5);
    }

    #[test]
    fn test_orientation_same_instant_skips_speed() {
        let (_, mut engine) = engine_at_start();
        engine.orientation_change(Some(10.0));
        engine.orientation_change(Some(10.0));
        assert_eq!(engine.snapshot().device_orientation_events, 2);
        assert_eq!(engine.snapshot().device_orientation_speed, 0.0);
    }

    #[test]
    fn test_tick_dwell_and_density() {
        let (clock, mut engine) = engine_at_start();
        engine.tick();
        assert_eq!(engine.snapshot().total_dwell_time, 0.0);
        assert_eq!(engine.snapshot().interaction_density, 0.0);

        for at in [500, 1_000, 1_500] {
            clock.set(START + at);
            engine.click();
        }
        clock.set(START + 4_000);
        engine.tick();

        assert_eq!(engine.snapshot().total_dwell_time, 4.0);
        assert_eq!(engine.snapshot().interaction_density, 0.75);
    }

    #[test]
    fn test_pointer_moves_are_not_interactions() {
        let (clock, mut engine) = engine_at_start();
        engine.pointer_move(0.0, 0.0);
        engine.pointer_move(10.0, 0.0);
        clock.set(START + 1_000);
        engine.tick();
        assert_eq!(engine.interaction_count(), 0);
        assert_eq!(engine.snapshot().interaction_density, 0.0);
    }

    #[test]
    fn test_transaction_context_risk() {
        let (_, mut engine) = engine_at_start();
        let context = TransactionContext::new(Some(dec!(60000)), MerchantCategory::Cryptocurrency);
        assert_eq!(engine.set_transaction_context(&context), 90);
        assert_eq!(engine.snapshot().transaction_context_risk, 90);
    }

    #[test]
    fn test_reset_restores_initial_snapshot() {
        let (clock, mut engine) = engine_at_start();
        for at in [0, 120, 260, 390, 540] {
            clock.set(START + at);
            engine.keystroke();
        }
        engine.pointer_move(0.0, 0.0);
        engine.pointer_move(300.0, 40.0);
        engine.scroll(120.0);
        engine.click();
        engine.visibility_change(true);
        engine.orientation_change(Some(12.0));
        engine.field_focus();
        clock.set(START + 3_000);
        engine.tick();
        engine.set_transaction_context(&TransactionContext::new(
            Some(dec!(200000)),
            MerchantCategory::Gambling,
        ));

        clock.set(START + 10_000);
        engine.reset();

        assert_eq!(*engine.snapshot(), BiometricSnapshot::default());
        assert_eq!(engine.session_start, START + 10_000);
        assert_eq!(engine.cumulative_path_length(), 0.0);
        assert_eq!(engine.interaction_count(), 0);

        // Focus start was cleared as well
        engine.field_blur();
        assert_eq!(engine.snapshot().field_focus_time_amount, 0.0);

        // Session time restarts from the reset
        clock.set(START + 10_500);
        engine.click();
        assert_eq!(engine.snapshot().click_delay, 500.0);

        engine.reset();
        engine.reset();
        assert_eq!(*engine.snapshot(), BiometricSnapshot::default());
    }

    #[test]
    fn test_ingest_dispatch() {
        let (clock, mut engine) = engine_at_start();
        let events: Vec<BiometricEvent> = serde_json::from_str(
            r#"[
                {"type": "pointer_move", "x": 0, "y": 0},
                {"type": "pointer_move", "x": 30, "y": 40},
                {"type": "scroll", "delta": -75.5},
                {"type": "visibility_change", "hidden": true},
                {"type": "orientation_change", "gamma": null},
                {"type": "click"}
            ]"#,
        )
        .unwrap();

        clock.set(START + 1_000);
        for event in &events {
            engine.ingest(event);
        }

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.mouse_speed, 50.0);
        assert_eq!(snapshot.scroll_distance, 76.0);
        assert_eq!(snapshot.tab_switch_count, 1);
        assert_eq!(snapshot.device_orientation_events, 1);
        assert_eq!(snapshot.click_delay, 1_000.0);

        engine.ingest(&BiometricEvent::Reset);
        assert_eq!(*engine.snapshot(), BiometricSnapshot::default());
    }

    #[test]
    fn test_snapshot_wire_names() {
        let json = serde_json::to_value(BiometricSnapshot::default()).unwrap();
        assert_eq!(json["typingWPM"], 0.0);
        assert_eq!(json["mousePathCurvature"], 1.0);
        assert_eq!(json["fieldFocusTimeAmount"], 0.0);
        assert_eq!(json["transactionContextRisk"], 0);
        assert_eq!(json.as_object().unwrap().len(), 19);
    }

    #[test]
    fn test_random_sessions_stay_finite_and_monotonic() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let (clock, mut engine) = engine_at_start();
            let mut last_path = 0.0;
            let mut last_scroll = 0.0;
            let mut last_interactions = 0;
            let mut last_switches = 0;
            let mut last_orientation = 0;

            for _ in 0..300 {
                clock.advance(rng.gen_range(0..250));
                let event = match rng.gen_range(0..9) {
                    0 => BiometricEvent::Keystroke,
                    1 => BiometricEvent::FieldFocus,
                    2 => BiometricEvent::FieldBlur,
                    3 => BiometricEvent::PointerMove {
                        x: rng.gen_range(-50.0..1900.0),
                        y: rng.gen_range(-50.0..1100.0),
                    },
                    4 => BiometricEvent::Scroll {
                        delta: rng.gen_range(-400.0..400.0),
                    },
                    5 => BiometricEvent::Click,
                    6 => BiometricEvent::VisibilityChange {
                        hidden: rng.gen_bool(0.5),
                    },
                    7 => BiometricEvent::OrientationChange {
                        gamma: if rng.gen_bool(0.8) {
                            Some(rng.gen_range(-90.0..90.0))
                        } else {
                            None
                        },
                    },
                    _ => BiometricEvent::Tick,
                };
                engine.ingest(&event);

                let snapshot = engine.snapshot();
                for value in snapshot.values() {
                    assert!(value.is_finite());
                    assert!(value >= 0.0);
                }
                assert!(snapshot.mouse_path_curvature >= 1.0);

                assert!(engine.cumulative_path_length() >= last_path);
                assert!(engine.cumulative_scroll_distance() >= last_scroll);
                assert!(engine.interaction_count() >= last_interactions);
                assert!(snapshot.tab_switch_count >= last_switches);
                assert!(snapshot.device_orientation_events >= last_orientation);

                last_path = engine.cumulative_path_length();
                last_scroll = engine.cumulative_scroll_distance();
                last_interactions = engine.interaction_count();
                last_switches = snapshot.tab_switch_count;
                last_orientation = snapshot.device_orientation_events;
            }
        }
    }
}
