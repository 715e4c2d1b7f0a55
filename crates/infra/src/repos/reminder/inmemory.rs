use super::IReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use todo_reminder_domain::{Reminder, ID};

pub struct InMemoryReminderRepo {
    reminders: std::sync::Mutex<Vec<Reminder>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        insert(reminder, &self.reminders);
        Ok(())
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()> {
        save(reminder, &self.reminders);
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        find(reminder_id, &self.reminders)
    }

    async fn find_many(&self, reminder_ids: &[ID]) -> anyhow::Result<Vec<Reminder>> {
        let res = find_by(&self.reminders, |r| reminder_ids.contains(&r.id));
        Ok(res)
    }

    async fn advance_last_fired(&self, reminder_id: &ID, ts: i64) -> anyhow::Result<()> {
        update_if(
            reminder_id,
            &self.reminders,
            |r| r.last_fired_ts.map(|last_fired| last_fired <= ts).unwrap_or(true),
            |r| r.last_fired_ts = Some(ts),
        );
        Ok(())
    }

    async fn reset_last_fired(&self, reminder_id: &ID, ts: Option<i64>) -> anyhow::Result<()> {
        update_if(reminder_id, &self.reminders, |_| true, |r| r.last_fired_ts = ts);
        Ok(())
    }

    async fn delete(&self, reminder_id: &ID, ts: i64) -> Option<Reminder> {
        update_if(
            reminder_id,
            &self.reminders,
            |r| !r.deleted,
            |r| {
                r.deleted = true;
                r.updated = ts;
            },
        )
    }

    async fn find_calendar_aware(&self) -> anyhow::Result<Vec<Reminder>> {
        let res = find_by(&self.reminders, |r| {
            !r.deleted && r.needs_reminder && r.recurrence.is_calendar_aware()
        });
        Ok(res)
    }
}
