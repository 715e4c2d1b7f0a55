mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderRepo;
pub use postgres::PostgresReminderRepo;
use todo_reminder_domain::{Reminder, ID};

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()>;
    /// Also returns soft deleted `Reminder`s
    async fn find(&self, reminder_id: &ID) -> Option<Reminder>;
    async fn find_many(&self, reminder_ids: &[ID]) -> anyhow::Result<Vec<Reminder>>;
    /// Moves `last_fired_ts` forward to `ts`. A `ts` before the current value is ignored.
    async fn advance_last_fired(&self, reminder_id: &ID, ts: i64) -> anyhow::Result<()>;
    /// Overwrites `last_fired_ts`, only used when editing a `Reminder` or rolling back a completion
    async fn reset_last_fired(&self, reminder_id: &ID, ts: Option<i64>) -> anyhow::Result<()>;
    /// Soft deletes the `Reminder`. Returns `None` if it did not exist or was already deleted
    async fn delete(&self, reminder_id: &ID, ts: i64) -> Option<Reminder>;
    /// Non deleted, reminding `Reminder`s with a recurrence depending on the holiday calendar
    async fn find_calendar_aware(&self) -> anyhow::Result<Vec<Reminder>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_reminder_domain::{RecurrenceKind, RecurrenceRule};

    fn reminder(kind: RecurrenceKind) -> Reminder {
        Reminder::new(
            "1".into(),
            "Pay rent".into(),
            RecurrenceRule::new(kind, 1),
            1000,
            0,
        )
    }

    #[tokio::test]
    async fn create_update_and_delete() {
        let repo = InMemoryReminderRepo::new();
        let mut reminder = reminder(RecurrenceKind::Monthly);
        assert!(repo.insert(&reminder).await.is_ok());
        assert_eq!(repo.find(&reminder.id).await.unwrap(), reminder);

        reminder.content = "Pay the rent".into();
        assert!(repo.save(&reminder).await.is_ok());
        assert_eq!(repo.find(&reminder.id).await.unwrap().content, "Pay the rent");

        let deleted = repo.delete(&reminder.id, 10).await.unwrap();
        assert!(deleted.deleted);
        assert_eq!(deleted.updated, 10);
        assert!(repo.delete(&reminder.id, 20).await.is_none());
        assert!(repo.find(&reminder.id).await.unwrap().deleted);
    }

    #[tokio::test]
    async fn last_fired_is_non_decreasing() {
        let repo = InMemoryReminderRepo::new();
        let reminder = reminder(RecurrenceKind::Daily);
        repo.insert(&reminder).await.unwrap();

        repo.advance_last_fired(&reminder.id, 500).await.unwrap();
        repo.advance_last_fired(&reminder.id, 200).await.unwrap();
        assert_eq!(repo.find(&reminder.id).await.unwrap().last_fired_ts, Some(500));

        repo.reset_last_fired(&reminder.id, Some(100)).await.unwrap();
        assert_eq!(repo.find(&reminder.id).await.unwrap().last_fired_ts, Some(100));
        repo.reset_last_fired(&reminder.id, None).await.unwrap();
        assert_eq!(repo.find(&reminder.id).await.unwrap().last_fired_ts, None);
    }

    #[tokio::test]
    async fn finds_calendar_aware_reminders() {
        let repo = InMemoryReminderRepo::new();
        let working_day = reminder(RecurrenceKind::NextWorkingDay);
        let mut not_reminding = reminder(RecurrenceKind::NextHoliday);
        not_reminding.needs_reminder = false;
        let deleted = reminder(RecurrenceKind::NextHoliday);
        for r in &[
            working_day.clone(),
            not_reminding,
            deleted.clone(),
            reminder(RecurrenceKind::Daily),
        ] {
            repo.insert(r).await.unwrap();
        }
        repo.delete(&deleted.id, 0).await.unwrap();

        let found = repo.find_calendar_aware().await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, working_day.id);
    }
}
