pub mod date;
mod holiday;
mod occurrence;
mod reminder;
mod shared;

pub use holiday::{build_year, HolidayCalendar, HolidayDay, HolidaySchedule};
pub use occurrence::{InvalidOccurrenceOriginError, Occurrence, OccurrenceOrigin};
pub use reminder::Reminder;
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use shared::recurrence::{
    InvalidRecurrenceRuleError, NoNextDate, RecurrenceKind, RecurrenceRule,
};
