use std::path::PathBuf;

use chrono::NaiveTime;
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::engine::{BusinessHours, ConflictScope, ScheduleError, parse_zone};
use crate::limits::*;

/// Business rules that differ between deployments. Each flag turns one
/// check on or off; none of them is hard-wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulesConfig {
    pub conflict_scope: ConflictScope,
    pub enforce_business_hours: bool,
    pub require_end_after_start: bool,
    pub reject_past_start: bool,
    /// Form-level date rules: start date not before today, end date not before start date.
    pub date_ordering: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            conflict_scope: ConflictScope::Customer,
            enforce_business_hours: true,
            require_end_after_start: true,
            reject_past_start: false,
            date_ordering: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub rules: RulesConfig,
    pub business_hours: BusinessHours,
    /// Zone the user's wall-clock input is interpreted in.
    pub local_zone: Tz,
    pub upcoming_horizon_minutes: i64,
    /// JSON seed for the in-memory store.
    pub data_path: Option<PathBuf>,
}

impl SchedulerConfig {
    /// Defaults everywhere, with an explicit local zone.
    pub fn with_local_zone(local_zone: Tz) -> Self {
        Self {
            rules: RulesConfig::default(),
            business_hours: BusinessHours::default(),
            local_zone,
            upcoming_horizon_minutes: UPCOMING_HORIZON_MINUTES,
            data_path: None,
        }
    }

    pub fn from_env() -> Result<Self, ScheduleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source. Unset keys take their default; set
    /// keys that fail to parse are configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScheduleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RulesConfig::default();
        let rules = RulesConfig {
            conflict_scope: typed(&lookup, "SCHEDULE_CONFLICT_SCOPE", defaults.conflict_scope)?,
            enforce_business_hours: flag(&lookup, "SCHEDULE_BUSINESS_HOURS", defaults.enforce_business_hours)?,
            require_end_after_start: flag(&lookup, "SCHEDULE_END_AFTER_START", defaults.require_end_after_start)?,
            reject_past_start: flag(&lookup, "SCHEDULE_REJECT_PAST", defaults.reject_past_start)?,
            date_ordering: flag(&lookup, "SCHEDULE_DATE_ORDERING", defaults.date_ordering)?,
        };

        let business_zone = lookup("SCHEDULE_BUSINESS_TZ").unwrap_or_else(|| REFERENCE_ZONE.into());
        let defaults_hours = BusinessHours::default();
        let open = time_of_day(&lookup, "SCHEDULE_OPEN", defaults_hours.open())?;
        let close = time_of_day(&lookup, "SCHEDULE_CLOSE", defaults_hours.close())?;
        let business_hours = BusinessHours::new(&business_zone, open, close)?;

        let local_zone = match lookup("SCHEDULE_LOCAL_TZ") {
            Some(name) => parse_zone(&name)?,
            None => system_zone()?,
        };

        let upcoming_horizon_minutes = typed(&lookup, "SCHEDULE_UPCOMING_MINUTES", UPCOMING_HORIZON_MINUTES)?;
        if !(1..=MAX_UPCOMING_HORIZON_MINUTES).contains(&upcoming_horizon_minutes) {
            return Err(ScheduleError::Configuration(format!(
                "SCHEDULE_UPCOMING_MINUTES must be between 1 and {MAX_UPCOMING_HORIZON_MINUTES}"
            )));
        }

        let data_path = lookup("SCHEDULE_DATA").map(PathBuf::from);

        info!(
            "rules: scope={:?} business_hours={} end_after_start={} reject_past={} date_ordering={}",
            rules.conflict_scope,
            rules.enforce_business_hours,
            rules.require_end_after_start,
            rules.reject_past_start,
            rules.date_ordering
        );
        info!(
            "business hours {}-{} {}, local zone {local_zone}",
            business_hours.open().format("%H:%M"),
            business_hours.close().format("%H:%M"),
            business_hours.zone()
        );

        Ok(Self {
            rules,
            business_hours,
            local_zone,
            upcoming_horizon_minutes,
            data_path,
        })
    }
}

fn system_zone() -> Result<Tz, ScheduleError> {
    let name = iana_time_zone::get_timezone()
        .map_err(|e| ScheduleError::Configuration(format!("cannot determine system timezone: {e}")))?;
    debug!("system timezone: {name}");
    parse_zone(&name)
}

fn typed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ScheduleError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ScheduleError::Configuration(format!("{key}={raw:?}: {e}"))),
    }
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ScheduleError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ScheduleError::Configuration(format!("{key}={v:?}: expected a boolean"))),
        },
    }
}

fn time_of_day<F>(lookup: &F, key: &str, default: NaiveTime) -> Result<NaiveTime, ScheduleError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map_err(|e| ScheduleError::Configuration(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = SchedulerConfig::from_lookup(lookup(&[("SCHEDULE_LOCAL_TZ", "UTC")])).unwrap();
        assert_eq!(config.rules, RulesConfig::default());
        assert_eq!(config.business_hours, BusinessHours::default());
        assert_eq!(config.local_zone, chrono_tz::UTC);
        assert_eq!(config.upcoming_horizon_minutes, 15);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = SchedulerConfig::from_lookup(lookup(&[
            ("SCHEDULE_LOCAL_TZ", "America/Phoenix"),
            ("SCHEDULE_BUSINESS_TZ", "Europe/London"),
            ("SCHEDULE_OPEN", "09:30"),
            ("SCHEDULE_CLOSE", "17:00"),
            ("SCHEDULE_CONFLICT_SCOPE", "contact"),
            ("SCHEDULE_BUSINESS_HOURS", "off"),
            ("SCHEDULE_REJECT_PAST", "true"),
            ("SCHEDULE_DATE_ORDERING", "1"),
            ("SCHEDULE_UPCOMING_MINUTES", "30"),
            ("SCHEDULE_DATA", "/tmp/seed.json"),
        ]))
        .unwrap();
        assert_eq!(config.rules.conflict_scope, ConflictScope::Contact);
        assert!(!config.rules.enforce_business_hours);
        assert!(config.rules.reject_past_start);
        assert!(config.rules.date_ordering);
        assert!(config.rules.require_end_after_start);
        assert_eq!(config.business_hours.zone(), chrono_tz::Europe::London);
        assert_eq!(config.business_hours.open(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(config.local_zone, chrono_tz::America::Phoenix);
        assert_eq!(config.upcoming_horizon_minutes, 30);
        assert_eq!(config.data_path, Some(PathBuf::from("/tmp/seed.json")));
    }

    #[test]
    fn one_year_horizon_is_accepted() {
        let config = SchedulerConfig::from_lookup(lookup(&[
            ("SCHEDULE_LOCAL_TZ", "UTC"),
            ("SCHEDULE_UPCOMING_MINUTES", "525600"),
        ]))
        .unwrap();
        assert_eq!(config.upcoming_horizon_minutes, MAX_UPCOMING_HORIZON_MINUTES);
    }

    #[test]
    fn bad_values_are_configuration_errors() {
        let cases: &[(&str, &str)] = &[
            ("SCHEDULE_BUSINESS_TZ", "Atlantis/Capital"),
            ("SCHEDULE_LOCAL_TZ", "Nope"),
            ("SCHEDULE_OPEN", "8am"),
            ("SCHEDULE_CONFLICT_SCOPE", "room"),
            ("SCHEDULE_BUSINESS_HOURS", "maybe"),
            ("SCHEDULE_UPCOMING_MINUTES", "soon"),
            ("SCHEDULE_UPCOMING_MINUTES", "0"),
            ("SCHEDULE_UPCOMING_MINUTES", "525601"),
            ("SCHEDULE_UPCOMING_MINUTES", "9223372036854775807"),
        ];
        for &(key, value) in cases {
            let mut pairs = vec![(key, value)];
            if key != "SCHEDULE_LOCAL_TZ" {
                pairs.push(("SCHEDULE_LOCAL_TZ", "UTC"));
            }
            let result = SchedulerConfig::from_lookup(lookup(&pairs));
            assert!(
                matches!(result, Err(ScheduleError::Configuration(_))),
                "{key}={value} should be rejected"
            );
        }
    }
}
