pub mod recalculate_reminders;
pub mod refresh_holidays;
mod subscribers;
