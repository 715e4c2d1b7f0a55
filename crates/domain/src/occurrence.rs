use crate::{
    shared::{
        entity::{Entity, ID},
        recurrence::RecurrenceRule,
    },
    Reminder,
};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Why an `Occurrence` was generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceOrigin {
    Created,
    Edited,
    Delivered,
    Completed,
    Skipped,
    Recalculated,
}

impl OccurrenceOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Edited => "edited",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Recalculated => "recalculated",
        }
    }
}

impl Display for OccurrenceOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Invalid occurrence origin: {0}")]
pub struct InvalidOccurrenceOriginError(String);

impl FromStr for OccurrenceOrigin {
    type Err = InvalidOccurrenceOriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "edited" => Ok(Self::Edited),
            "delivered" => Ok(Self::Delivered),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            "recalculated" => Ok(Self::Recalculated),
            _ => Err(InvalidOccurrenceOriginError(s.to_string())),
        }
    }
}

/// One scheduled or fired instance of a `Reminder`.
///
/// The content, attachments and recurrence of the `Reminder` are copied in
/// at generation time so that later edits of the `Reminder` do not change
/// occurrences that are already scheduled or delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub id: ID,
    pub reminder_id: ID,
    pub user_id: String,
    /// `None` for todo items that are not reminded
    pub due_ts: Option<i64>,
    pub delivered: bool,
    pub delivered_ts: Option<i64>,
    pub completed: bool,
    pub completed_ts: Option<i64>,
    pub deleted: bool,
    pub content: String,
    pub attachments: Vec<String>,
    pub needs_reminder: bool,
    pub recurrence: RecurrenceRule,
    /// The `Occurrence` whose delivery, completion or skip produced this one
    pub predecessor_id: Option<ID>,
    pub origin: OccurrenceOrigin,
    pub created: i64,
    pub updated: i64,
}

impl Entity for Occurrence {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl Occurrence {
    pub fn generate(
        reminder: &Reminder,
        due_ts: Option<i64>,
        predecessor_id: Option<ID>,
        origin: OccurrenceOrigin,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            reminder_id: reminder.id,
            user_id: reminder.user_id.clone(),
            due_ts,
            delivered: false,
            delivered_ts: None,
            completed: false,
            completed_ts: None,
            deleted: false,
            content: reminder.content.clone(),
            attachments: reminder.attachments.clone(),
            needs_reminder: reminder.needs_reminder,
            recurrence: reminder.recurrence.clone(),
            predecessor_id,
            origin,
            created: now,
            updated: now,
        }
    }

    /// Not deleted, not completed and not delivered. At most one pending
    /// `Occurrence` exists per `Reminder`.
    pub fn is_pending(&self) -> bool {
        !self.deleted && !self.completed && !self.delivered
    }

    pub fn is_due(&self, now: i64) -> bool {
        self.is_pending()
            && self.needs_reminder
            && matches!(self.due_ts, Some(due_ts) if due_ts <= now)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::recurrence::RecurrenceKind;

    #[test]
    fn copies_reminder_content_at_generation() {
        let mut reminder = Reminder::new(
            "1234".into(),
            "Water the plants".into(),
            RecurrenceRule::new(RecurrenceKind::Daily, 1),
            100,
            0,
        );
        reminder.attachments = vec!["plants.png".into()];
        let occurrence =
            Occurrence::generate(&reminder, Some(100), None, OccurrenceOrigin::Created, 10);
        reminder.content = "Changed".into();

        assert_eq!(occurrence.content, "Water the plants");
        assert_eq!(occurrence.attachments, vec!["plants.png".to_string()]);
        assert_eq!(occurrence.reminder_id, reminder.id);
        assert!(occurrence.is_pending());
        assert!(!occurrence.is_due(99));
        assert!(occurrence.is_due(100));
    }

    #[test]
    fn delivered_occurrence_is_not_pending() {
        let reminder = Reminder::new("1".into(), "a".into(), Default::default(), 0, 0);
        let mut occurrence =
            Occurrence::generate(&reminder, Some(0), None, OccurrenceOrigin::Created, 0);
        occurrence.delivered = true;
        assert!(!occurrence.is_pending());
        assert!(!occurrence.is_due(10));
    }

    #[test]
    fn parses_origins() {
        for origin in vec![
            OccurrenceOrigin::Created,
            OccurrenceOrigin::Edited,
            OccurrenceOrigin::Delivered,
            OccurrenceOrigin::Completed,
            OccurrenceOrigin::Skipped,
            OccurrenceOrigin::Recalculated,
        ] {
            assert_eq!(origin.as_str().parse::<OccurrenceOrigin>().unwrap(), origin);
        }
        assert!("unknown".parse::<OccurrenceOrigin>().is_err());
    }
}
