use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeMap;

/// A single day of the holiday calendar
#[derive(Debug, Clone, PartialEq)]
pub struct HolidayDay {
    pub date: NaiveDate,
    /// `false` for public holidays and weekends, `true` for working days
    /// including make-up working days that fall on a weekend.
    pub is_working_day: bool,
}

impl HolidayDay {
    /// The default classification of a date without any holiday information
    pub fn regular(date: NaiveDate) -> Self {
        Self {
            date,
            is_working_day: !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        }
    }
}

/// Query contract the recurrence calculation uses to resolve
/// `NextWorkingDay` and `NextHoliday` rules.
pub trait HolidayCalendar {
    fn is_working_day(&self, date: NaiveDate) -> bool;
    /// `None` if the calendar does not know about any working day on or after `date`
    fn next_working_day_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate>;
    /// `None` if the calendar does not know about any holiday on or after `date`
    fn next_holiday_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate>;
}

/// In memory `HolidayCalendar` built from a window of stored `HolidayDay`s.
/// Only dates present in the window are considered by the next-date queries,
/// so a window that ends too early yields `None`.
#[derive(Debug, Clone, Default)]
pub struct HolidaySchedule {
    days: BTreeMap<NaiveDate, bool>,
}

impl HolidaySchedule {
    pub fn new(days: Vec<HolidayDay>) -> Self {
        Self {
            days: days
                .into_iter()
                .map(|day| (day.date, day.is_working_day))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    fn next_matching(&self, date: NaiveDate, working_day: bool) -> Option<NaiveDate> {
        self.days
            .range(date..)
            .find(|(_, is_working_day)| **is_working_day == working_day)
            .map(|(date, _)| *date)
    }
}

impl HolidayCalendar for HolidaySchedule {
    fn is_working_day(&self, date: NaiveDate) -> bool {
        match self.days.get(&date) {
            Some(is_working_day) => *is_working_day,
            None => HolidayDay::regular(date).is_working_day,
        }
    }

    fn next_working_day_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.next_matching(date, true)
    }

    fn next_holiday_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.next_matching(date, false)
    }
}

/// Every day of `year` classified as a regular day, with the given overrides
/// (public holidays and make-up working days) applied on top.
pub fn build_year(year: i32, overrides: &[HolidayDay]) -> Vec<HolidayDay> {
    let mut days: BTreeMap<NaiveDate, bool> = BTreeMap::new();
    let mut date = NaiveDate::from_ymd_opt(year, 1, 1);
    while let Some(d) = date {
        if d.year() != year {
            break;
        }
        days.insert(d, HolidayDay::regular(d).is_working_day);
        date = d.succ_opt();
    }
    for day in overrides.iter().filter(|day| day.date.year() == year) {
        days.insert(day.date, day.is_working_day);
    }

    days.into_iter()
        .map(|(date, is_working_day)| HolidayDay {
            date,
            is_working_day,
        })
        .collect()
}
