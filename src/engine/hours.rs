use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::limits::{BUSINESS_CLOSE_MINUTE, BUSINESS_OPEN_MINUTE};

use super::ScheduleError;

/// Opening hours defined in a fixed reference zone, independent of where the
/// client runs. Both bounds are inclusive at minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    zone: Tz,
    open_minute: u32,
    close_minute: u32,
}

impl Default for BusinessHours {
    /// 08:00–22:00 America/New_York.
    fn default() -> Self {
        Self {
            zone: chrono_tz::America::New_York,
            open_minute: BUSINESS_OPEN_MINUTE,
            close_minute: BUSINESS_CLOSE_MINUTE,
        }
    }
}

impl BusinessHours {
    pub fn new(zone_name: &str, open: NaiveTime, close: NaiveTime) -> Result<Self, ScheduleError> {
        let zone = parse_zone(zone_name)?;
        Self::from_zone(zone, open, close)
    }

    pub fn from_zone(zone: Tz, open: NaiveTime, close: NaiveTime) -> Result<Self, ScheduleError> {
        let open_minute = minute_of_day(open);
        let close_minute = minute_of_day(close);
        if open_minute >= close_minute {
            return Err(ScheduleError::Configuration(format!(
                "business hours open {} is not before close {}",
                open.format("%H:%M"),
                close.format("%H:%M")
            )));
        }
        Ok(Self {
            zone,
            open_minute,
            close_minute,
        })
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn open(&self) -> NaiveTime {
        NaiveTime::MIN + Duration::minutes(i64::from(self.open_minute))
    }

    pub fn close(&self) -> NaiveTime {
        NaiveTime::MIN + Duration::minutes(i64::from(self.close_minute))
    }

    /// Interpret `at` on `local_zone`'s wall clock and express it on the
    /// reference zone's wall clock.
    ///
    /// Ambiguous local times take the earlier instant. Local times inside a
    /// DST gap are pushed forward by an hour.
    pub fn to_reference(&self, local_zone: Tz, at: NaiveDateTime) -> Result<NaiveDateTime, ScheduleError> {
        let instant = local_zone
            .from_local_datetime(&at)
            .earliest()
            .or_else(|| local_zone.from_local_datetime(&(at + Duration::hours(1))).earliest())
            .ok_or_else(|| {
                ScheduleError::Configuration(format!("local time {at} does not exist in {local_zone}"))
            })?;
        Ok(instant.with_timezone(&self.zone).naive_local())
    }

    pub fn is_open_at(&self, local_zone: Tz, at: NaiveDateTime) -> Result<bool, ScheduleError> {
        let minute = minute_of_day(self.to_reference(local_zone, at)?.time());
        Ok(self.open_minute <= minute && minute <= self.close_minute)
    }

    /// True only if both endpoints fall inside business hours.
    ///
    /// An interval whose endpoints both pass but which runs through a closed
    /// period in between (e.g. across midnight) is not detected.
    pub fn is_within_business_hours(
        &self,
        local_zone: Tz,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<bool, ScheduleError> {
        Ok(self.is_open_at(local_zone, start)? && self.is_open_at(local_zone, end)?)
    }

    /// Local hours of `on` whose `HH:00` is open. Feeds the hour selectors.
    pub fn bookable_hours(&self, local_zone: Tz, on: NaiveDate) -> Result<Vec<u32>, ScheduleError> {
        let mut hours = Vec::new();
        for hour in 0..24u32 {
            let at = on.and_time(NaiveTime::MIN + Duration::hours(i64::from(hour)));
            if self.is_open_at(local_zone, at)? {
                hours.push(hour);
            }
        }
        Ok(hours)
    }

    pub(crate) fn rejection(&self) -> ScheduleError {
        ScheduleError::OutOfBusinessHours {
            open: self.open(),
            close: self.close(),
            zone: self.zone.name().to_string(),
        }
    }
}

/// Resolve an IANA zone name. Missing zone data is a configuration error,
/// never a silent fallback.
pub fn parse_zone(name: &str) -> Result<Tz, ScheduleError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| ScheduleError::Configuration(format!("unknown timezone {name:?}: {e}")))
}

fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}
