// Factor evaluation
// Maps a biometric snapshot to the ordered list of named, thresholded
// factors shown to the user and attached to analysis results.

use serde::{Deserialize, Serialize};

use crate::models::{FactorStatus, TransactionContext};
use crate::security::behavioral_biometrics::BiometricSnapshot;
use crate::security::transaction_risk::context_risk;
use crate::utils::format_metric;

/// Grouping used by the factor grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Typing,
    FocusDwell,
    Mouse,
    Scroll,
    Click,
    SessionDevice,
    Interaction,
}

/// Normal band of a factor, for display
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Normal interval plus an optional outer tolerance interval
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
    pub warning: Option<(f64, f64)>,
}

impl Band {
    pub const fn new(min: f64, max: f64, warning_min: f64, warning_max: f64) -> Self {
        Band {
            min,
            max,
            warning: Some((warning_min, warning_max)),
        }
    }

    /// Normal inside `[min, max]`, warning inside `[warning_min, min)` or
    /// `(max, warning_max]`, critical otherwise.
    pub fn status(&self, value: f64) -> FactorStatus {
        if value >= self.min && value <= self.max {
            return FactorStatus::Normal;
        }
        if let Some((warning_min, warning_max)) = self.warning {
            if (value >= warning_min && value < self.min) || (value > self.max && value <= warning_max) {
                return FactorStatus::Warning;
            }
        }
        FactorStatus::Critical
    }
}

/// Status policy of a single factor
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FactorRule {
    Band(Band),
    /// Exactly zero is critical (no pointer device), otherwise the band applies
    ZeroIsCritical(Band),
    /// Below the floor is critical regardless of the band
    CriticalBelow { floor: f64, band: Band },
    /// Above the ceiling is critical regardless of the band
    CriticalAbove { ceiling: f64, band: Band },
    /// Higher is worse: normal below `warning_from`, warning below `critical_from`
    Ascending { warning_from: f64, critical_from: f64 },
    /// Lower is worse: critical below `critical_below`, warning below `warning_below`
    Descending { warning_below: f64, critical_below: f64 },
    /// Counters: zero is normal, up to `max_warning` is a warning
    Count { max_warning: f64 },
    /// Only a warning tier above the limit
    WarnAbove { limit: f64 },
}

impl FactorRule {
    pub fn status(&self, value: f64) -> FactorStatus {
        match *self {
            FactorRule::Band(band) => band.status(value),
            FactorRule::ZeroIsCritical(band) => {
                if value == 0.0 {
                    FactorStatus::Critical
                } else {
                    band.status(value)
                }
            }
            FactorRule::CriticalBelow { floor, band } => {
                if value < floor {
                    FactorStatus::Critical
                } else {
                    band.status(value)
                }
            }
            FactorRule::CriticalAbove { ceiling, band } => {
                if value > ceiling {
                    FactorStatus::Critical
                } else {
                    band.status(value)
                }
            }
            FactorRule::Ascending { warning_from, critical_from } => {
                if value < warning_from {
                    FactorStatus::Normal
                } else if value < critical_from {
                    FactorStatus::Warning
                } else {
                    FactorStatus::Critical
                }
            }
            FactorRule::Descending { warning_below, critical_below } => {
                if value < critical_below {
                    FactorStatus::Critical
                } else if value < warning_below {
                    FactorStatus::Warning
                } else {
                    FactorStatus::Normal
                }
            }
            FactorRule::Count { max_warning } => {
                if value == 0.0 {
                    FactorStatus::Normal
                } else if value <= max_warning {
                    FactorStatus::Warning
                } else {
                    FactorStatus::Critical
                }
            }
            FactorRule::WarnAbove { limit } => {
                if value > limit {
                    FactorStatus::Warning
                } else {
                    FactorStatus::Normal
                }
            }
        }
    }

    pub fn threshold(&self) -> Threshold {
        match *self {
            FactorRule::Band(band)
            | FactorRule::ZeroIsCritical(band)
            | FactorRule::CriticalBelow { band, .. }
            | FactorRule::CriticalAbove { band, .. } => Threshold {
                min: Some(band.min),
                max: Some(band.max),
            },
            FactorRule::Ascending { warning_from, .. } => Threshold {
                min: None,
                max: Some(warning_from),
            },
            FactorRule::Descending { warning_below, .. } => Threshold {
                min: Some(warning_below),
                max: None,
            },
            FactorRule::Count { .. } => Threshold {
                min: None,
                max: Some(0.0),
            },
            FactorRule::WarnAbove { limit } => Threshold {
                min: None,
                max: Some(limit),
            },
        }
    }
}

/// The evaluated factors, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorId {
    TypingWpm,
    TypingWps,
    TypingCps,
    KeystrokeInterval,
    FieldFocus,
    DwellTime,
    MouseSpeed,
    MouseCurvature,
    ScrollSpeed,
    ScrollDistance,
    ClickDelay,
    ClickInterval,
    TabSwitches,
    TimeAway,
    OrientationEvents,
    OrientationSpeed,
    InteractionDensity,
    TransactionRisk,
}

impl FactorId {
    pub const ALL: [FactorId; 18] = [
        FactorId::TypingWpm,
        FactorId::TypingWps,
        FactorId::TypingCps,
        FactorId::KeystrokeInterval,
        FactorId::FieldFocus,
        FactorId::DwellTime,
        FactorId::MouseSpeed,
        FactorId::MouseCurvature,
        FactorId::ScrollSpeed,
        FactorId::ScrollDistance,
        FactorId::ClickDelay,
        FactorId::ClickInterval,
        FactorId::TabSwitches,
        FactorId::TimeAway,
        FactorId::OrientationEvents,
        FactorId::OrientationSpeed,
        FactorId::InteractionDensity,
        FactorId::TransactionRisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactorId::TypingWpm => "typing_wpm",
            FactorId::TypingWps => "typing_wps",
            FactorId::TypingCps => "typing_cps",
            FactorId::KeystrokeInterval => "keystroke_interval",
            FactorId::FieldFocus => "field_focus",
            FactorId::DwellTime => "dwell_time",
            FactorId::MouseSpeed => "mouse_speed",
            FactorId::MouseCurvature => "mouse_curvature",
            FactorId::ScrollSpeed => "scroll_speed",
            FactorId::ScrollDistance => "scroll_distance",
            FactorId::ClickDelay => "click_delay",
            FactorId::ClickInterval => "click_interval",
            FactorId::TabSwitches => "tab_switches",
            FactorId::TimeAway => "time_away",
            FactorId::OrientationEvents => "orientation_events",
            FactorId::OrientationSpeed => "orientation_speed",
            FactorId::InteractionDensity => "interaction_density",
            FactorId::TransactionRisk => "transaction_risk",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FactorId::TypingWpm => "Typing Speed (WPM)",
            FactorId::TypingWps => "Typing Speed (WPS)",
            FactorId::TypingCps => "Typing Speed (CPS)",
            FactorId::KeystrokeInterval => "Keystroke Interval",
            FactorId::FieldFocus => "Field Focus Time",
            FactorId::DwellTime => "Total Dwell Time",
            FactorId::MouseSpeed => "Mouse Speed",
            FactorId::MouseCurvature => "Mouse Curvature",
            FactorId::ScrollSpeed => "Scroll Speed",
            FactorId::ScrollDistance => "Scroll Distance",
            FactorId::ClickDelay => "Click Delay",
            FactorId::ClickInterval => "Click Interval",
            FactorId::TabSwitches => "Tab Switches",
            FactorId::TimeAway => "Time Away",
            FactorId::OrientationEvents => "Orientation Events",
            FactorId::OrientationSpeed => "Orientation Speed",
            FactorId::InteractionDensity => "Interaction Density",
            FactorId::TransactionRisk => "Transaction Risk",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            FactorId::TypingWpm => "WPM",
            FactorId::TypingWps => "WPS",
            FactorId::TypingCps => "CPS",
            FactorId::KeystrokeInterval | FactorId::ClickDelay | FactorId::ClickInterval => "ms",
            FactorId::FieldFocus | FactorId::DwellTime | FactorId::TimeAway => "sec",
            FactorId::MouseSpeed => "px/sec",
            FactorId::ScrollSpeed => "evt/sec",
            FactorId::ScrollDistance => "px",
            FactorId::OrientationSpeed => "°/sec",
            FactorId::InteractionDensity => "int/sec",
            FactorId::TransactionRisk => "/100",
            FactorId::MouseCurvature | FactorId::TabSwitches | FactorId::OrientationEvents => "",
        }
    }

    pub fn category(&self) -> FactorCategory {
        match self {
            FactorId::TypingWpm
            | FactorId::TypingWps
            | FactorId::TypingCps
            | FactorId::KeystrokeInterval => FactorCategory::Typing,
            FactorId::FieldFocus | FactorId::DwellTime => FactorCategory::FocusDwell,
            FactorId::MouseSpeed | FactorId::MouseCurvature => FactorCategory::Mouse,
            FactorId::ScrollSpeed | FactorId::ScrollDistance => FactorCategory::Scroll,
            FactorId::ClickDelay | FactorId::ClickInterval => FactorCategory::Click,
            FactorId::TabSwitches
            | FactorId::TimeAway
            | FactorId::OrientationEvents
            | FactorId::OrientationSpeed => FactorCategory::SessionDevice,
            FactorId::InteractionDensity | FactorId::TransactionRisk => FactorCategory::Interaction,
        }
    }

    pub fn rule(&self) -> FactorRule {
        match self {
            FactorId::TypingWpm => FactorRule::Band(Band::new(40.0, 80.0, 20.0, 100.0)),
            FactorId::TypingWps => FactorRule::Band(Band::new(0.67, 1.33, 0.33, 1.67)),
            FactorId::TypingCps => FactorRule::Band(Band::new(3.3, 6.6, 1.5, 10.0)),
            FactorId::KeystrokeInterval => FactorRule::Band(Band::new(75.0, 150.0, 50.0, 300.0)),
            FactorId::FieldFocus => FactorRule::Band(Band::new(3.0, 15.0, 1.0, 30.0)),
            FactorId::DwellTime => FactorRule::Band(Band::new(5.0, 30.0, 2.0, 60.0)),
            FactorId::MouseSpeed => FactorRule::ZeroIsCritical(Band::new(100.0, 500.0, 50.0, 800.0)),
            FactorId::MouseCurvature => FactorRule::Descending {
                warning_below: 1.2,
                critical_below: 1.1,
            },
            FactorId::ScrollSpeed => FactorRule::CriticalAbove {
                ceiling: 5.0,
                band: Band::new(0.0, 2.0, 0.0, 4.0),
            },
            FactorId::ScrollDistance => FactorRule::WarnAbove { limit: 2000.0 },
            FactorId::ClickDelay => FactorRule::CriticalBelow {
                floor: 200.0,
                band: Band::new(500.0, 5000.0, 200.0, 8000.0),
            },
            FactorId::ClickInterval => FactorRule::CriticalBelow {
                floor: 500.0,
                band: Band::new(1000.0, 5000.0, 500.0, 8000.0),
            },
            FactorId::TabSwitches | FactorId::OrientationEvents => FactorRule::Count { max_warning: 2.0 },
            FactorId::TimeAway => FactorRule::Ascending {
                warning_from: 2.0,
                critical_from: 10.0,
            },
            FactorId::OrientationSpeed => FactorRule::Ascending {
                warning_from: 45.0,
                critical_from: 90.0,
            },
            FactorId::InteractionDensity => FactorRule::CriticalAbove {
                ceiling: 5.0,
                band: Band::new(0.1, 1.0, 0.0, 2.0),
            },
            FactorId::TransactionRisk => FactorRule::Ascending {
                warning_from: 30.0,
                critical_from: 60.0,
            },
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FactorId::TypingWpm => "Words per minute. Normal human typing ranges from 40-80 WPM. Extremely fast or slow typing may indicate automation or struggle.",
            FactorId::TypingWps => "Words per second. Derived from WPM. Consistent rate indicates natural typing behavior.",
            FactorId::TypingCps => "Characters per second. Measures raw input speed. Bot-like input often shows unnaturally consistent CPS.",
            FactorId::KeystrokeInterval => "Average time between keystrokes. Humans show natural variance; bots tend to be perfectly regular.",
            FactorId::FieldFocus => "Time spent focused on the amount field. Too quick suggests copy-paste or automation.",
            FactorId::DwellTime => "Total time on page before submission. Rushed or excessively long sessions are suspicious.",
            FactorId::MouseSpeed => "Average cursor velocity. Zero movement suggests touch device or script automation.",
            FactorId::MouseCurvature => "Ratio of actual path to straight line. Humans move in curves (>1.2); bots move in straight lines (≈1.0).",
            FactorId::ScrollSpeed => "Scroll events per second. Rapid scrolling (>5/sec) indicates automated behavior.",
            FactorId::ScrollDistance => "Total pixels scrolled. Excessive scrolling may indicate confusion or automation.",
            FactorId::ClickDelay => "Time from page load to first click. Instant clicks (<200ms) indicate bots.",
            FactorId::ClickInterval => "Average time between clicks. Rapid clicking (<500ms) suggests automation.",
            FactorId::TabSwitches => "Number of times user left this tab. Frequent switching may indicate multi-tasking or fraud scripts.",
            FactorId::TimeAway => "Total time spent away from tab. Extended absence during transaction is suspicious.",
            FactorId::OrientationEvents => "Device rotation count. Frequent rotations during transaction entry is unusual.",
            FactorId::OrientationSpeed => "Rate of device rotation. Rapid rotation suggests device is being manipulated.",
            FactorId::InteractionDensity => "Combined rate of all interactions. Bot-like behavior shows >5 interactions/second.",
            FactorId::TransactionRisk => "Risk score based on amount and merchant type combination. High-value crypto/gambling is riskier.",
        }
    }

    /// Short reason for the report view
    pub fn reason(&self, status: FactorStatus) -> &'static str {
        let normal = status == FactorStatus::Normal;
        match self {
            FactorId::TypingWpm if normal => "Natural typing speed within human range",
            FactorId::TypingWpm => "Typing speed outside the human range",
            FactorId::TypingWps if normal => "Consistent word-per-second rate",
            FactorId::TypingWps => "Unusual word-per-second rate",
            FactorId::TypingCps if normal => "Character input rate consistent with human typing",
            FactorId::TypingCps => "Character input rate inconsistent with human typing",
            FactorId::KeystrokeInterval if normal => "Regular keystroke timing with natural variance",
            FactorId::KeystrokeInterval => "Keystroke timing outside the natural range",
            FactorId::FieldFocus if normal => "Reasonable time spent on amount field",
            FactorId::FieldFocus => "Unusual time spent on amount field",
            FactorId::DwellTime if normal => "Natural form completion time",
            FactorId::DwellTime => "Rushed or prolonged session",
            FactorId::MouseSpeed if normal => "Natural mouse movement speed",
            FactorId::MouseSpeed => "No mouse movement detected or unnatural cursor speed",
            FactorId::MouseCurvature if normal => "Curved, natural mouse movement",
            FactorId::MouseCurvature => "Straight-line cursor paths",
            FactorId::ScrollSpeed if normal => "Normal scrolling pattern",
            FactorId::ScrollSpeed => "Rapid scrolling",
            FactorId::ScrollDistance if normal => "Typical page scrolling behavior",
            FactorId::ScrollDistance => "Excessive scrolling",
            FactorId::ClickDelay if normal => "Normal delay before first interaction",
            FactorId::ClickDelay => "Unusual delay before first click",
            FactorId::ClickInterval if normal => "Natural pacing between clicks",
            FactorId::ClickInterval => "Unnatural pacing between clicks",
            FactorId::TabSwitches if normal => "User stayed focused",
            FactorId::TabSwitches => "Some tab switching detected",
            FactorId::TimeAway if normal => "Minimal time away from tab",
            FactorId::TimeAway => "Extended absence from tab",
            FactorId::OrientationEvents if normal => "Device held steady",
            FactorId::OrientationEvents => "Device rotated during entry",
            FactorId::OrientationSpeed if normal => "No rapid device rotation",
            FactorId::OrientationSpeed => "Rapid device rotation",
            FactorId::InteractionDensity if normal => "Natural interaction rate",
            FactorId::InteractionDensity => "Interaction rate outside the human range",
            FactorId::TransactionRisk if normal => "Risk assessed based on amount and merchant",
            FactorId::TransactionRisk => "Elevated risk for this amount and merchant",
        }
    }

    fn value(&self, snapshot: &BiometricSnapshot, context: &TransactionContext) -> f64 {
        match self {
            FactorId::TypingWpm => snapshot.typing_wpm,
            FactorId::TypingWps => snapshot.typing_wps,
            FactorId::TypingCps => snapshot.typing_cps,
            FactorId::KeystrokeInterval => snapshot.keystroke_interval,
            FactorId::FieldFocus => snapshot.field_focus_time_amount,
            FactorId::DwellTime => snapshot.total_dwell_time,
            FactorId::MouseSpeed => snapshot.mouse_speed,
            FactorId::MouseCurvature => snapshot.mouse_path_curvature,
            FactorId::ScrollSpeed => snapshot.scroll_speed,
            FactorId::ScrollDistance => snapshot.scroll_distance,
            FactorId::ClickDelay => snapshot.click_delay,
            FactorId::ClickInterval => snapshot.click_interval,
            FactorId::TabSwitches => snapshot.tab_switch_count as f64,
            FactorId::TimeAway => snapshot.time_away_from_tab,
            FactorId::OrientationEvents => snapshot.device_orientation_events as f64,
            FactorId::OrientationSpeed => snapshot.device_orientation_speed,
            FactorId::InteractionDensity => snapshot.interaction_density,
            FactorId::TransactionRisk => context_risk(context) as f64,
        }
    }
}

/// Grid view of one factor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiometricFactor {
    pub id: FactorId,
    pub name: String,
    pub category: FactorCategory,
    pub value: f64,
    pub unit: String,
    pub status: FactorStatus,
    pub description: String,
    pub threshold: Threshold,
}

impl BiometricFactor {
    /// Value with its unit, as printed in reports
    pub fn formatted_value(&self) -> String {
        let value = format_metric(self.value);
        if self.unit.is_empty() {
            value
        } else if self.unit.starts_with('°') {
            format!("{}{}", value, self.unit)
        } else {
            format!("{} {}", value, self.unit)
        }
    }
}

/// Report view of one factor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorReport {
    pub id: String,
    pub name: String,
    pub value: String,
    pub status: FactorStatus,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,
}

/// Status counts across a factor list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorSummary {
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
}

/// Evaluate all factors for a snapshot.
///
/// The transaction risk factor is recomputed from `context`, so the result
/// does not depend on whether the snapshot has folded the context in yet.
pub fn evaluate_factors(snapshot: &BiometricSnapshot, context: &TransactionContext) -> Vec<BiometricFactor> {
    FactorId::ALL
        .iter()
        .map(|id| {
            let rule = id.rule();
            let value = id.value(snapshot, context);

            BiometricFactor {
                id: *id,
                name: id.name().to_string(),
                category: id.category(),
                value,
                unit: id.unit().to_string(),
                status: rule.status(value),
                description: id.description().to_string(),
                threshold: rule.threshold(),
            }
        })
        .collect()
}

/// Report view of evaluated factors
pub fn build_report(factors: &[BiometricFactor], context: &TransactionContext) -> Vec<FactorReport> {
    factors
        .iter()
        .map(|factor| {
            let value = if factor.id == FactorId::TransactionRisk {
                format!(
                    "₹{} ({})",
                    context.amount_or_zero().normalize(),
                    context.merchant_category.label()
                )
            } else {
                factor.formatted_value()
            };

            FactorReport {
                id: factor.id.as_str().to_string(),
                name: factor.name.clone(),
                value,
                status: factor.status,
                reason: factor.id.reason(factor.status).to_string(),
                threshold: Some(factor.threshold),
            }
        })
        .collect()
}

pub fn summarize(factors: &[BiometricFactor]) -> FactorSummary {
    factors.iter().fold(FactorSummary::default(), |mut summary, factor| {
        match factor.status {
            FactorStatus::Normal => summary.normal += 1,
            FactorStatus::Warning => summary.warning += 1,
            FactorStatus::Critical => summary.critical += 1,
        }
        summary
    })
}
