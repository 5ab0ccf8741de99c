/// Market session: weekly open window and countdown
use std::sync::Arc;

use chrono::offset::LocalResult;
use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc,
    Weekday,
};
use chrono_tz::Tz;

use super::clock::Clock;
use crate::error::{FeiraError, Result};
use crate::types::{Countdown, MarketConfig, MarketStatus};

/// Weekly recurrence rule: one weekday, `[open_hour, close_hour)` local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSchedule {
    open_weekday: Weekday,
    open_hour: u32,
    close_hour: u32,
    timezone: Tz,
}

impl Default for MarketSchedule {
    /// Sunday 06:00 to 12:00, Brasília time
    fn default() -> Self {
        MarketSchedule {
            open_weekday: Weekday::Sun,
            open_hour: 6,
            close_hour: 12,
            timezone: chrono_tz::America::Sao_Paulo,
        }
    }
}

impl MarketSchedule {
    pub fn new(open_weekday: Weekday, open_hour: u32, close_hour: u32, timezone: Tz) -> Result<Self> {
        if open_hour >= close_hour {
            return Err(FeiraError::InvalidParameter(format!(
                "open_hour {} must be before close_hour {}",
                open_hour, close_hour
            )));
        }

        if close_hour > 24 {
            return Err(FeiraError::InvalidParameter(format!(
                "close_hour {} exceeds 24",
                close_hour
            )));
        }

        Ok(MarketSchedule {
            open_weekday,
            open_hour,
            close_hour,
            timezone,
        })
    }

    pub fn from_config(config: &MarketConfig) -> Result<Self> {
        let weekday = parse_weekday(&config.weekday)?;
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|e| FeiraError::InvalidTimezone(format!("{}: {}", config.timezone, e)))?;

        MarketSchedule::new(weekday, config.open_hour, config.close_hour, timezone)
    }

    pub fn open_weekday(&self) -> Weekday {
        self.open_weekday
    }

    pub fn open_hour(&self) -> u32 {
        self.open_hour
    }

    pub fn close_hour(&self) -> u32 {
        self.close_hour
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Open iff on the market weekday and `open_hour <= hour < close_hour`
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.timezone);

        local.weekday() == self.open_weekday
            && local.hour() >= self.open_hour
            && local.hour() < self.close_hour
    }

    /// Next opening strictly after `now`
    pub fn next_open(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&self.timezone);

        let current = local.weekday().num_days_from_sunday() as i64;
        let target = self.open_weekday.num_days_from_sunday() as i64;

        let mut offset = (7 - current + target) % 7;

        // Market day at or after the opening hour: today's session has
        // started (or ended), so the next one is a week away
        if offset == 0 && local.hour() >= self.open_hour {
            offset = 7;
        }

        self.local_instant(local.date_naive() + TimeDelta::days(offset), self.open_hour)
    }

    /// Closing instant of the session running on `date`
    fn close_on(&self, date: NaiveDate) -> DateTime<Utc> {
        self.local_instant(date, self.close_hour)
    }

    /// `date` at `hour`:00:00 market time. `hour` may be 24 (next midnight).
    fn local_instant(&self, date: NaiveDate, hour: u32) -> DateTime<Utc> {
        let naive = date.and_time(NaiveTime::MIN) + TimeDelta::hours(hour as i64);
        resolve_local(&self.timezone, naive)
    }

    pub fn compute_status(&self, now: DateTime<Utc>) -> MarketStatus {
        if self.is_open(now) {
            let today = now.with_timezone(&self.timezone).date_naive();
            let close_at = self.close_on(today);

            return MarketStatus {
                is_open: true,
                remaining: Countdown::from_delta_without_days(close_at - now),
                next_transition: close_at,
            };
        }

        let open_at = self.next_open(now);

        MarketStatus {
            is_open: false,
            remaining: Countdown::from_delta(open_at - now),
            next_transition: open_at,
        }
    }
}

/// Map a local wall-clock time to UTC. Ambiguous times take the earliest
/// mapping; times inside a DST gap move to the first valid minute after it.
fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let mut probe = naive;
            for _ in 0..(24 * 60) {
                probe += TimeDelta::minutes(1);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    return dt.with_timezone(&Utc);
                }
            }
            naive.and_utc()
        }
    }
}

/// Accepts English names/abbreviations and Portuguese names
pub fn parse_weekday(name: &str) -> Result<Weekday> {
    let normalized = name.trim().to_lowercase();

    let weekday = match normalized.trim_end_matches("-feira") {
        "domingo" => Some(Weekday::Sun),
        "segunda" => Some(Weekday::Mon),
        "terça" | "terca" => Some(Weekday::Tue),
        "quarta" => Some(Weekday::Wed),
        "quinta" => Some(Weekday::Thu),
        "sexta" => Some(Weekday::Fri),
        "sábado" | "sabado" => Some(Weekday::Sat),
        _ => normalized.parse::<Weekday>().ok(),
    };

    weekday.ok_or_else(|| FeiraError::InvalidParameter(format!("Unknown weekday: {}", name)))
}

/// Schedule bound to a clock
pub struct MarketScheduleCalculator {
    schedule: MarketSchedule,
    clock: Arc<dyn Clock>,
}

impl MarketScheduleCalculator {
    pub fn new(schedule: MarketSchedule, clock: Arc<dyn Clock>) -> Self {
        MarketScheduleCalculator { schedule, clock }
    }

    pub fn schedule(&self) -> &MarketSchedule {
        &self.schedule
    }

    pub fn compute_status(&self, now: DateTime<Utc>) -> MarketStatus {
        self.schedule.compute_status(now)
    }

    /// Status at the injected clock's current instant
    pub fn current_status(&self) -> MarketStatus {
        self.schedule.compute_status(self.clock.now())
    }
}
