use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MetricsError;
use crate::metrics;

/// A wall-clock time of day with no date attached. Two clock times cannot
/// tell you which calendar day they fall on; overnight spans are resolved
/// by `metrics::minutes_in_bed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, MetricsError> {
        if hour > 23 || minute > 59 {
            return Err(MetricsError::InvalidTimeFormat(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn minutes_from_midnight(self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MetricsError::InvalidTimeFormat(s.to_string());
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        ClockTime::new(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = MetricsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> String {
        t.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MorningMood {
    Terrible,
    Bad,
    Neutral,
    Good,
    Great,
}

impl MorningMood {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Terrible => "terrible",
            Self::Bad => "bad",
            Self::Neutral => "neutral",
            Self::Good => "good",
            Self::Great => "great",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "terrible" => Some(Self::Terrible),
            "bad" => Some(Self::Bad),
            "neutral" => Some(Self::Neutral),
            "good" => Some(Self::Good),
            "great" => Some(Self::Great),
            _ => None,
        }
    }
}

/// One diary entry per calendar date. Morning and evening halves are saved
/// separately, so every field is optional; the derived metrics are filled in
/// once all four morning sleep inputs are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryRecord {
    pub date: NaiveDate,

    // morning fields
    pub bedtime: Option<ClockTime>,
    pub wake_time: Option<ClockTime>,
    pub sleep_onset_latency: Option<u32>,
    pub awakenings: Option<u32>,
    pub waso: Option<u32>,
    pub sleep_quality: Option<u8>,
    pub morning_mood: Option<MorningMood>,

    // derived, never set directly
    pub total_sleep_time: Option<u32>,
    pub sleep_efficiency: Option<u8>,

    // evening fields
    pub stress_level: Option<u8>,
    pub caffeine: Option<bool>,
    pub caffeine_last_time: Option<ClockTime>,
    pub exercise: Option<bool>,
    pub exercise_type: Option<String>,
    pub nap: Option<bool>,
    pub nap_duration: Option<u32>,
    pub worry_note: Option<String>,
}

impl DiaryRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            bedtime: None,
            wake_time: None,
            sleep_onset_latency: None,
            awakenings: None,
            waso: None,
            sleep_quality: None,
            morning_mood: None,
            total_sleep_time: None,
            sleep_efficiency: None,
            stress_level: None,
            caffeine: None,
            caffeine_last_time: None,
            exercise: None,
            exercise_type: None,
            nap: None,
            nap_duration: None,
            worry_note: None,
        }
    }

    /// Merge a save payload into this record: only the fields present in the
    /// update overwrite, everything else keeps its stored value. Recomputes
    /// the derived metrics afterwards.
    pub fn apply(&mut self, update: DiaryUpdate) -> Result<(), MetricsError> {
        if let Some(quality) = update.sleep_quality {
            if !(1..=5).contains(&quality) {
                return Err(MetricsError::OutOfRangeScore {
                    field: "sleep quality",
                    value: i64::from(quality),
                    min: 1,
                    max: 5,
                });
            }
        }
        if let Some(stress) = update.stress_level {
            if !(1..=10).contains(&stress) {
                return Err(MetricsError::OutOfRangeScore {
                    field: "stress level",
                    value: i64::from(stress),
                    min: 1,
                    max: 10,
                });
            }
        }

        merge(&mut self.bedtime, update.bedtime);
        merge(&mut self.wake_time, update.wake_time);
        merge(&mut self.sleep_onset_latency, update.sleep_onset_latency);
        merge(&mut self.awakenings, update.awakenings);
        merge(&mut self.waso, update.waso);
        merge(&mut self.sleep_quality, update.sleep_quality);
        merge(&mut self.morning_mood, update.morning_mood);
        merge(&mut self.stress_level, update.stress_level);
        merge(&mut self.caffeine, update.caffeine);
        merge(&mut self.caffeine_last_time, update.caffeine_last_time);
        merge(&mut self.exercise, update.exercise);
        merge(&mut self.exercise_type, update.exercise_type);
        merge(&mut self.nap, update.nap);
        merge(&mut self.nap_duration, update.nap_duration);
        merge(&mut self.worry_note, update.worry_note);

        self.recompute_metrics();
        Ok(())
    }

    fn recompute_metrics(&mut self) {
        if let (Some(bed), Some(wake), Some(latency), Some(waso)) = (
            self.bedtime,
            self.wake_time,
            self.sleep_onset_latency,
            self.waso,
        ) {
            let tst = metrics::total_sleep_time(bed, wake, latency, waso);
            self.total_sleep_time = Some(tst);
            self.sleep_efficiency = Some(metrics::sleep_efficiency(tst, bed, wake));
        }
    }
}

fn merge<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

/// Incremental save payload for one date. Fields left as `None` are not
/// touched in the stored record.
#[derive(Debug, Default, Clone)]
pub struct DiaryUpdate {
    pub bedtime: Option<ClockTime>,
    pub wake_time: Option<ClockTime>,
    pub sleep_onset_latency: Option<u32>,
    pub awakenings: Option<u32>,
    pub waso: Option<u32>,
    pub sleep_quality: Option<u8>,
    pub morning_mood: Option<MorningMood>,
    pub stress_level: Option<u8>,
    pub caffeine: Option<bool>,
    pub caffeine_last_time: Option<ClockTime>,
    pub exercise: Option<bool>,
    pub exercise_type: Option<String>,
    pub nap: Option<bool>,
    pub nap_duration: Option<u32>,
    pub worry_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "no clinically significant insomnia",
            Self::Mild => "subthreshold insomnia",
            Self::Moderate => "clinical insomnia, moderate severity",
            Self::Severe => "clinical insomnia, severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed ISI questionnaire. History is append-only; the severity
/// band is always recomputed from the scores, never trusted from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub id: Uuid,
    pub taken_on: NaiveDate,
    pub scores: [u8; 7],
    pub total_score: u8,
    pub severity: Severity,
}

/// Rolling-window averages with deltas against the preceding window.
#[derive(Debug, Clone)]
pub struct WeeklyAggregate {
    pub days: usize,
    pub avg_sleep_time: f64,
    pub avg_sleep_efficiency: f64,
    pub avg_sleep_quality: f64,
    pub avg_awakenings: f64,
    pub avg_stress_level: Option<f64>,
    pub sleep_time_change: Option<f64>,
    pub efficiency_change: Option<f64>,
}

/// Per-weekday average of one metric. `average` is `None` when no record
/// falls on that weekday, which renderers must distinguish from a real zero.
#[derive(Debug, Clone, Copy)]
pub struct WeekdayStat {
    pub weekday: usize,
    pub label: &'static str,
    pub average: Option<f64>,
}

/// One paired sample for scatter-style analysis, tagged with its date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPoint {
    pub date: NaiveDate,
    pub a: f64,
    pub b: f64,
}
