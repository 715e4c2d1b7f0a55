use serde::{Deserialize, Serialize};
use todo_reminder_domain::{RecurrenceRule, Reminder, ID};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDTO {
    pub id: ID,
    pub user_id: String,
    pub content: String,
    pub attachments: Vec<String>,
    pub needs_reminder: bool,
    pub recurrence: RecurrenceRule,
    pub anchor_ts: i64,
    pub last_fired_ts: Option<i64>,
    pub created: i64,
    pub updated: i64,
}

impl ReminderDTO {
    pub fn new(reminder: Reminder) -> Self {
        Self {
            id: reminder.id,
            user_id: reminder.user_id,
            content: reminder.content,
            attachments: reminder.attachments,
            needs_reminder: reminder.needs_reminder,
            recurrence: reminder.recurrence,
            anchor_ts: reminder.anchor_ts,
            last_fired_ts: reminder.last_fired_ts,
            created: reminder.created,
            updated: reminder.updated,
        }
    }
}
