use crate::estimator::EffectiveSleepPolicy;
use crate::stats::SameDayPolicy;
use crate::storage::resolve_data_path;
use std::{env, path::PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub stage_policy: EffectiveSleepPolicy,
    pub same_day_policy: SameDayPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, std::io::Error> {
        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            data_path: resolve_data_path()?,
            stage_policy: policy_from(
                "SLEEP_STAGE_POLICY",
                env::var("SLEEP_STAGE_POLICY").ok(),
                EffectiveSleepPolicy::parse,
            ),
            same_day_policy: policy_from(
                "SLEEP_SAME_DAY_POLICY",
                env::var("SLEEP_SAME_DAY_POLICY").ok(),
                SameDayPolicy::parse,
            ),
        })
    }
}

fn policy_from<T: Default + std::fmt::Debug>(
    name: &str,
    value: Option<String>,
    parse: fn(&str) -> Option<T>,
) -> T {
    let Some(value) = value else {
        return T::default();
    };
    parse(&value).unwrap_or_else(|| {
        let fallback = T::default();
        warn!("ignoring {name}={value:?}, using {fallback:?}");
        fallback
    })
}
