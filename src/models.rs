use crate::assessment::AssessmentCategory;
use crate::duration::parse_time_of_day;
use crate::errors::SleepError;
use crate::repository::SleepLog;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SleepStages {
    pub deep_sleep: f64,
    pub light_sleep: f64,
    pub rem_sleep: f64,
}

impl SleepStages {
    pub fn total(&self) -> f64 {
        self.deep_sleep + self.light_sleep + self.rem_sleep
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepFactors {
    pub sleep_quality: u8,
    pub interruptions: u32,
    pub fell_asleep_quickly: bool,
    pub woke_up_refreshed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SleepEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub bedtime: String,
    pub waketime: String,
    pub sleep_quality: u8,
    pub interruptions: u32,
    pub fell_asleep_quickly: bool,
    pub woke_up_refreshed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Display cache only; aggregation always recomputes from the raw fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_stages: Option<SleepStages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_at: Option<DateTime<Utc>>,
}

impl SleepEntry {
    pub fn factors(&self) -> SleepFactors {
        SleepFactors {
            sleep_quality: self.sleep_quality,
            interruptions: self.interruptions,
            fell_asleep_quickly: self.fell_asleep_quickly,
            woke_up_refreshed: self.woke_up_refreshed,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewSleepEntry {
    pub date: NaiveDate,
    pub bedtime: String,
    pub waketime: String,
    pub sleep_quality: u8,
    #[serde(default)]
    pub interruptions: u32,
    #[serde(default)]
    pub fell_asleep_quickly: bool,
    #[serde(default)]
    pub woke_up_refreshed: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sleep_stages: Option<SleepStages>,
}

impl NewSleepEntry {
    pub fn factors(&self) -> SleepFactors {
        SleepFactors {
            sleep_quality: self.sleep_quality,
            interruptions: self.interruptions,
            fell_asleep_quickly: self.fell_asleep_quickly,
            woke_up_refreshed: self.woke_up_refreshed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    pub name: String,
    pub daily_sleep_goal: f64,
    pub preferred_bedtime: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            name: String::new(),
            daily_sleep_goal: 8.0,
            preferred_bedtime: "22:30".to_string(),
        }
    }
}

impl UserPreferences {
    pub fn validate(&self) -> Result<(), SleepError> {
        if !(self.daily_sleep_goal > 0.0 && self.daily_sleep_goal <= 24.0) {
            return Err(SleepError::validation(
                "daily_sleep_goal",
                format!("{} hours is outside (0, 24]", self.daily_sleep_goal),
            ));
        }
        parse_time_of_day("preferred_bedtime", &self.preferred_bedtime)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssessmentRecord {
    pub date: NaiveDate,
    pub score: u8,
    pub category: AssessmentCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub entries: SleepLog,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub assessments: Vec<AssessmentRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    #[default]
    Week,
    Month,
}

impl ReportPeriod {
    pub fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub day: String,
    pub entries: usize,
    pub hours: f64,
    pub quality: u8,
    pub deep_sleep: f64,
    pub light_sleep: f64,
    pub rem_sleep: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct WindowAverages {
    pub average_hours: f64,
    pub average_quality: u8,
    pub average_deep: f64,
    pub average_light: f64,
    pub average_rem: f64,
    pub deep_percent: u32,
    pub rem_percent: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateWindow {
    pub period: ReportPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DayPoint>,
    pub averages: WindowAverages,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LastNight {
    pub id: Uuid,
    pub date: NaiveDate,
    pub bedtime: String,
    pub waketime: String,
    pub hours: f64,
    pub quality: u8,
    pub interruptions: u32,
    pub stages: SleepStages,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LastNightResponse {
    pub date: NaiveDate,
    pub last_night: Option<LastNight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Steady,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub today: NaiveDate,
    pub last_night: Option<LastNight>,
    pub weekly_average: WindowAverages,
    pub trend: Trend,
    pub streak: u32,
    pub sleep_goal: f64,
    pub goal_met: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecomputeResponse {
    pub updated: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct StatsQuery {
    #[serde(default)]
    pub period: ReportPeriod,
}

#[derive(Debug, Deserialize, Default)]
pub struct EntryRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}
