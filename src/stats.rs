use crate::duration::{round1, round2, sleep_duration};
use crate::errors::SleepError;
use crate::estimator::{EffectiveSleepPolicy, estimate, split_stages};
use crate::models::{
    AggregateWindow, DashboardResponse, DayPoint, LastNight, ReportPeriod, SleepEntry, Trend,
    WindowAverages,
};
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

const TREND_THRESHOLD_HOURS: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameDayPolicy {
    #[default]
    Sum,
    Latest,
}

impl SameDayPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "latest" => Some(Self::Latest),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct DayGroup {
    total_hours: f64,
    total_quality: u32,
    count: usize,
    fell_asleep_quickly: bool,
    woke_up_refreshed: bool,
}

impl DayGroup {
    fn absorb(&mut self, policy: SameDayPolicy, hours: f64, entry: &SleepEntry) {
        if policy == SameDayPolicy::Latest {
            *self = DayGroup::default();
        }
        self.total_hours += hours;
        self.total_quality += u32::from(entry.sleep_quality);
        self.count += 1;
        self.fell_asleep_quickly = entry.fell_asleep_quickly;
        self.woke_up_refreshed = entry.woke_up_refreshed;
    }
}

pub fn build_window(
    entries: &[SleepEntry],
    period: ReportPeriod,
    policy: SameDayPolicy,
) -> Result<AggregateWindow, SleepError> {
    build_window_at(Local::now().date_naive(), entries, period, policy)
}

pub fn build_window_at(
    today: NaiveDate,
    entries: &[SleepEntry],
    period: ReportPeriod,
    policy: SameDayPolicy,
) -> Result<AggregateWindow, SleepError> {
    let start = today - Duration::days(period.days() - 1);
    let days = aggregate_range(entries, start, today, period, policy)?;
    let averages = window_averages(&days);

    Ok(AggregateWindow {
        period,
        start_date: start,
        end_date: today,
        days,
        averages,
    })
}

pub fn aggregate_range(
    entries: &[SleepEntry],
    start: NaiveDate,
    end: NaiveDate,
    period: ReportPeriod,
    policy: SameDayPolicy,
) -> Result<Vec<DayPoint>, SleepError> {
    let mut groups: BTreeMap<NaiveDate, DayGroup> = BTreeMap::new();
    for entry in entries.iter().filter(|entry| entry.date >= start && entry.date <= end) {
        let hours = sleep_duration(&entry.bedtime, &entry.waketime)?;
        groups.entry(entry.date).or_default().absorb(policy, hours, entry);
    }

    let points = groups
        .into_iter()
        .map(|(date, group)| {
            let hours = round2(group.total_hours);
            let quality = (f64::from(group.total_quality) / group.count as f64).round() as u8;
            let stages = split_stages(hours, group.fell_asleep_quickly, group.woke_up_refreshed);
            DayPoint {
                date,
                day: day_label(date, period),
                entries: group.count,
                hours,
                quality,
                deep_sleep: stages.deep_sleep,
                light_sleep: stages.light_sleep,
                rem_sleep: stages.rem_sleep,
            }
        })
        .collect();

    Ok(points)
}

pub fn window_averages(days: &[DayPoint]) -> WindowAverages {
    if days.is_empty() {
        return WindowAverages::default();
    }

    let count = days.len() as f64;
    let mean = |field: fn(&DayPoint) -> f64| days.iter().map(field).sum::<f64>() / count;

    let average_hours = round1(mean(|day| day.hours));
    let average_quality = mean(|day| f64::from(day.quality)).round() as u8;
    let average_deep = round1(mean(|day| day.deep_sleep));
    let average_light = round1(mean(|day| day.light_sleep));
    let average_rem = round1(mean(|day| day.rem_sleep));

    WindowAverages {
        average_hours,
        average_quality,
        average_deep,
        average_light,
        average_rem,
        deep_percent: percent_of(average_deep, average_hours),
        rem_percent: percent_of(average_rem, average_hours),
    }
}

fn percent_of(part: f64, whole: f64) -> u32 {
    if whole <= 0.0 {
        return 0;
    }
    (part / whole * 100.0).round() as u32
}

fn day_label(date: NaiveDate, period: ReportPeriod) -> String {
    match period {
        ReportPeriod::Week => date.format("%a").to_string(),
        ReportPeriod::Month => date.day().to_string(),
    }
}

/// Picks the entry dated yesterday. Among several, the most recently
/// logged wins; entries without a stamp lose to stamped ones and fall
/// back to the later position in `entries`.
pub fn select_last_night_at(today: NaiveDate, entries: &[SleepEntry]) -> Option<&SleepEntry> {
    let yesterday = today - Duration::days(1);
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.date == yesterday)
        .max_by_key(|(index, entry)| (entry.logged_at, *index))
        .map(|(_, entry)| entry)
}

pub fn last_night(
    entries: &[SleepEntry],
    policy: EffectiveSleepPolicy,
) -> Result<Option<LastNight>, SleepError> {
    last_night_at(Local::now().date_naive(), entries, policy)
}

pub fn last_night_at(
    today: NaiveDate,
    entries: &[SleepEntry],
    policy: EffectiveSleepPolicy,
) -> Result<Option<LastNight>, SleepError> {
    let Some(entry) = select_last_night_at(today, entries) else {
        return Ok(None);
    };

    let estimate = estimate(&entry.bedtime, &entry.waketime, &entry.factors(), policy)?;
    Ok(Some(LastNight {
        id: entry.id,
        date: entry.date,
        bedtime: entry.bedtime.clone(),
        waketime: entry.waketime.clone(),
        hours: round1(estimate.duration_hours),
        quality: entry.sleep_quality,
        interruptions: entry.interruptions,
        stages: estimate.stages,
        notes: entry.notes.clone(),
    }))
}

pub fn logging_streak_at(today: NaiveDate, entries: &[SleepEntry]) -> u32 {
    let logged: HashSet<NaiveDate> = entries.iter().map(|entry| entry.date).collect();

    let mut cursor = if logged.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while logged.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

pub fn weekly_trend_at(
    today: NaiveDate,
    entries: &[SleepEntry],
    policy: SameDayPolicy,
) -> Result<Trend, SleepError> {
    let current_start = today - Duration::days(6);
    let previous_end = current_start - Duration::days(1);
    let previous_start = previous_end - Duration::days(6);

    let current = aggregate_range(entries, current_start, today, ReportPeriod::Week, policy)?;
    let previous =
        aggregate_range(entries, previous_start, previous_end, ReportPeriod::Week, policy)?;

    if current.is_empty() || previous.is_empty() {
        return Ok(Trend::Steady);
    }

    let delta = window_averages(&current).average_hours - window_averages(&previous).average_hours;
    Ok(if delta >= TREND_THRESHOLD_HOURS {
        Trend::Up
    } else if delta <= -TREND_THRESHOLD_HOURS {
        Trend::Down
    } else {
        Trend::Steady
    })
}

pub fn build_dashboard(
    entries: &[SleepEntry],
    sleep_goal: f64,
    stage_policy: EffectiveSleepPolicy,
    same_day_policy: SameDayPolicy,
) -> Result<DashboardResponse, SleepError> {
    build_dashboard_at(
        Local::now().date_naive(),
        entries,
        sleep_goal,
        stage_policy,
        same_day_policy,
    )
}

pub fn build_dashboard_at(
    today: NaiveDate,
    entries: &[SleepEntry],
    sleep_goal: f64,
    stage_policy: EffectiveSleepPolicy,
    same_day_policy: SameDayPolicy,
) -> Result<DashboardResponse, SleepError> {
    let week = build_window_at(today, entries, ReportPeriod::Week, same_day_policy)?;
    let goal_met = !week.days.is_empty() && week.averages.average_hours >= sleep_goal;

    Ok(DashboardResponse {
        today,
        last_night: last_night_at(today, entries, stage_policy)?,
        trend: weekly_trend_at(today, entries, same_day_policy)?,
        streak: logging_streak_at(today, entries),
        weekly_average: week.averages,
        sleep_goal,
        goal_met,
    })
}
