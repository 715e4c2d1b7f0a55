use crate::date::{add_days, add_months, localize, to_local};
use crate::holiday::HolidayCalendar;
use chrono::{prelude::*, Duration};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Display, str::FromStr};
use thiserror::Error;

/// Upper bound on the number of candidates tried after the initial estimate
/// when catching up an anchor that lies in the past.
const MAX_CATCH_UP_ITERATIONS: i64 = 10_000;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RecurrenceKind {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    NextWorkingDay,
    NextHoliday,
}

impl RecurrenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::NextWorkingDay => "nextWorkingDay",
            Self::NextHoliday => "nextHoliday",
        }
    }
}

impl Display for RecurrenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecurrenceKind {
    type Err = InvalidRecurrenceRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "nextWorkingDay" => Ok(Self::NextWorkingDay),
            "nextHoliday" => Ok(Self::NextHoliday),
            _ => Err(InvalidRecurrenceRuleError::UnknownKind(s.to_string())),
        }
    }
}

fn default_interval() -> i64 {
    1
}

/// Policy for deriving the next due time of a `Reminder` from the previous one
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub kind: RecurrenceKind,
    /// Number of days, weeks, months or years between firings.
    /// Ignored for `None`, `NextWorkingDay` and `NextHoliday`
    #[serde(default = "default_interval")]
    pub interval: i64,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self {
            kind: RecurrenceKind::None,
            interval: 1,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidRecurrenceRuleError {
    #[error("Unknown recurrence kind: {0}")]
    UnknownKind(String),
    #[error("Recurrence interval must be a positive number, got: {0}")]
    InvalidInterval(i64),
}

/// The recurrence rule could not produce a due time, usually because
/// the holiday calendar does not reach far enough into the future.
#[derive(Error, Debug, PartialEq)]
#[error("No next date could be found for the recurrence rule")]
pub struct NoNextDate;

impl RecurrenceRule {
    pub fn new(kind: RecurrenceKind, interval: i64) -> Self {
        Self { kind, interval }
    }

    pub fn validate(&self) -> Result<(), InvalidRecurrenceRuleError> {
        if self.uses_interval() && self.interval <= 0 {
            return Err(InvalidRecurrenceRuleError::InvalidInterval(self.interval));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Whether another occurrence should follow a delivered or completed one
    pub fn is_repeatable(&self) -> bool {
        self.kind != RecurrenceKind::None
    }

    pub fn is_calendar_aware(&self) -> bool {
        matches!(
            self.kind,
            RecurrenceKind::NextWorkingDay | RecurrenceKind::NextHoliday
        )
    }

    fn uses_interval(&self) -> bool {
        matches!(
            self.kind,
            RecurrenceKind::Daily
                | RecurrenceKind::Weekly
                | RecurrenceKind::Monthly
                | RecurrenceKind::Yearly
        )
    }

    /// Computes the next due timestamp (millis) for a reminder anchored at `anchor_ts`.
    ///
    /// When `last_fired_ts` is set the result is one step past it. Otherwise the anchor
    /// is the first candidate and, if it already lies before `now`, interval rules take
    /// the smallest `anchor + n * interval` that is not before `now` while calendar aware
    /// rules start looking from the day after the anchor.
    ///
    /// All calendar arithmetic is done in `tz` and the local time of day is preserved.
    pub fn compute_next(
        &self,
        anchor_ts: i64,
        last_fired_ts: Option<i64>,
        now: i64,
        tz: &Tz,
        calendar: &dyn HolidayCalendar,
    ) -> Result<i64, NoNextDate> {
        if self.kind == RecurrenceKind::None {
            return Ok(anchor_ts);
        }
        if !self.is_valid() {
            return Err(NoNextDate);
        }

        if self.is_calendar_aware() {
            return self.next_calendar_date(anchor_ts, last_fired_ts, now, tz, calendar);
        }

        match last_fired_ts {
            Some(last_fired) => {
                let local = to_local(last_fired, tz).ok_or(NoNextDate)?;
                self.step_from(local.naive_local(), 1, tz)
            }
            None if anchor_ts >= now => Ok(anchor_ts),
            None => self.catch_up(anchor_ts, now, tz),
        }
    }

    fn next_calendar_date(
        &self,
        anchor_ts: i64,
        last_fired_ts: Option<i64>,
        now: i64,
        tz: &Tz,
        calendar: &dyn HolidayCalendar,
    ) -> Result<i64, NoNextDate> {
        let baseline = match last_fired_ts {
            Some(last_fired) => to_local(last_fired, tz)
                .ok_or(NoNextDate)?
                .naive_local()
                .checked_add_signed(Duration::days(1))
                .ok_or(NoNextDate)?,
            None => {
                let anchor = to_local(anchor_ts, tz).ok_or(NoNextDate)?.naive_local();
                if now > anchor_ts {
                    anchor
                        .checked_add_signed(Duration::days(1))
                        .ok_or(NoNextDate)?
                } else {
                    anchor
                }
            }
        };

        let date = match self.kind {
            RecurrenceKind::NextWorkingDay => {
                calendar.next_working_day_on_or_after(baseline.date())
            }
            _ => calendar.next_holiday_on_or_after(baseline.date()),
        }
        .ok_or(NoNextDate)?;

        localize(date.and_time(baseline.time()), tz)
            .map(|due| due.timestamp_millis())
            .ok_or(NoNextDate)
    }

    /// Smallest `anchor + n * interval` (n >= 1) that is not before `now`
    fn catch_up(&self, anchor_ts: i64, now: i64, tz: &Tz) -> Result<i64, NoNextDate> {
        let anchor = to_local(anchor_ts, tz).ok_or(NoNextDate)?.naive_local();

        // Conservative estimate so that the loop below only takes a few steps
        let max_step_days = match self.kind {
            RecurrenceKind::Daily => 1_i64,
            RecurrenceKind::Weekly => 7,
            RecurrenceKind::Monthly => 31,
            _ => 366,
        }
        .checked_mul(self.interval)
        .ok_or(NoNextDate)?;
        let elapsed_days =
            now.checked_sub(anchor_ts).ok_or(NoNextDate)? / Duration::days(1).num_milliseconds();
        let first_step = std::cmp::max(elapsed_days / max_step_days - 1, 1);

        for steps in first_step..first_step.saturating_add(MAX_CATCH_UP_ITERATIONS) {
            let due = self.step_from(anchor, steps, tz)?;
            if due >= now {
                return Ok(due);
            }
        }
        Err(NoNextDate)
    }

    fn step_from(&self, from: NaiveDateTime, steps: i64, tz: &Tz) -> Result<i64, NoNextDate> {
        let units = steps
            .checked_mul(self.interval)
            .and_then(|units| u64::try_from(units).ok())
            .ok_or(NoNextDate)?;
        let date = from.date();
        let next = match self.kind {
            RecurrenceKind::Daily => add_days(date, units),
            RecurrenceKind::Weekly => units.checked_mul(7).and_then(|days| add_days(date, days)),
            RecurrenceKind::Monthly => u32::try_from(units).ok().and_then(|m| add_months(date, m)),
            RecurrenceKind::Yearly => units
                .checked_mul(12)
                .and_then(|months| u32::try_from(months).ok())
                .and_then(|m| add_months(date, m)),
            _ => None,
        }
        .ok_or(NoNextDate)?;

        localize(next.and_time(from.time()), tz)
            .map(|due| due.timestamp_millis())
            .ok_or(NoNextDate)
    }
}
