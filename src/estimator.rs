use crate::duration::{round2, sleep_duration};
use crate::errors::SleepError;
use crate::models::{SleepFactors, SleepStages};
use serde::{Deserialize, Serialize};

const MINUTES_PER_INTERRUPTION: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveSleepPolicy {
    None,
    #[default]
    QualityAndInterruptionDiscounted,
}

impl EffectiveSleepPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "raw" | "none" => Some(Self::None),
            "discounted" | "quality_and_interruption_discounted" => {
                Some(Self::QualityAndInterruptionDiscounted)
            }
            _ => None,
        }
    }

    pub fn effective_hours(self, duration_hours: f64, factors: &SleepFactors) -> f64 {
        match self {
            Self::None => duration_hours,
            Self::QualityAndInterruptionDiscounted => {
                let lost = f64::from(factors.interruptions) * MINUTES_PER_INTERRUPTION / 60.0;
                let scaled = (duration_hours - lost) * (f64::from(factors.sleep_quality) / 100.0);
                scaled.max(0.0)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSplit {
    pub deep: f64,
    pub rem: f64,
}

impl StageSplit {
    pub fn for_flags(fell_asleep_quickly: bool, woke_up_refreshed: bool) -> Self {
        Self {
            deep: if fell_asleep_quickly { 0.20 } else { 0.15 },
            rem: if woke_up_refreshed { 0.25 } else { 0.20 },
        }
    }

    pub fn light(&self) -> f64 {
        1.0 - self.deep - self.rem
    }
}

pub fn split_stages(hours: f64, fell_asleep_quickly: bool, woke_up_refreshed: bool) -> SleepStages {
    let split = StageSplit::for_flags(fell_asleep_quickly, woke_up_refreshed);
    let deep_sleep = round2((hours * split.deep).max(0.0));
    let rem_sleep = round2((hours * split.rem).max(0.0));
    let light_sleep = round2((round2(hours) - deep_sleep - rem_sleep).max(0.0));

    SleepStages {
        deep_sleep,
        light_sleep,
        rem_sleep,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepEstimate {
    pub duration_hours: f64,
    pub effective_hours: f64,
    pub stages: SleepStages,
}

pub fn estimate(
    bedtime: &str,
    waketime: &str,
    factors: &SleepFactors,
    policy: EffectiveSleepPolicy,
) -> Result<SleepEstimate, SleepError> {
    let duration_hours = sleep_duration(bedtime, waketime)?;
    let effective_hours = policy.effective_hours(duration_hours, factors);
    let stages = split_stages(
        effective_hours,
        factors.fell_asleep_quickly,
        factors.woke_up_refreshed,
    );

    Ok(SleepEstimate {
        duration_hours,
        effective_hours,
        stages,
    })
}
