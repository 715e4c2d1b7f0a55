use crate::{APIResponse, BaseClient, RecurrenceRule, ID};
use reqwest::StatusCode;
use std::sync::Arc;
use todo_reminder_api_structs::*;

#[derive(Clone)]
pub struct ReminderClient {
    base: Arc<BaseClient>,
}

pub struct CreateReminderInput {
    pub content: String,
    pub attachments: Vec<String>,
    pub needs_reminder: bool,
    pub recurrence: RecurrenceRule,
    pub anchor_ts: i64,
}

impl CreateReminderInput {
    /// Reminding, non repeating reminder without attachments
    pub fn new<T: Into<String>>(content: T, anchor_ts: i64) -> Self {
        Self {
            content: content.into(),
            attachments: Vec::new(),
            needs_reminder: true,
            recurrence: Default::default(),
            anchor_ts,
        }
    }
}

pub struct UpdateReminderInput {
    pub reminder_id: ID,
    pub reminder: CreateReminderInput,
}

#[derive(Default)]
pub struct SearchRemindersInput {
    pub completed: bool,
    pub due_start: Option<i64>,
    pub due_end: Option<i64>,
}

impl From<CreateReminderInput> for ReminderBody {
    fn from(input: CreateReminderInput) -> Self {
        Self {
            content: input.content,
            attachments: input.attachments,
            needs_reminder: input.needs_reminder,
            recurrence: input.recurrence,
            anchor_ts: input.anchor_ts,
        }
    }
}

impl ReminderClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn create(
        &self,
        input: CreateReminderInput,
    ) -> APIResponse<create_reminder::APIResponse> {
        let body: create_reminder::RequestBody = input.into();
        self.base
            .post(body, "reminders".into(), StatusCode::CREATED)
            .await
    }

    pub async fn get(&self, reminder_id: ID) -> APIResponse<get_reminder::APIResponse> {
        self.base
            .get(format!("reminders/{}", reminder_id), StatusCode::OK)
            .await
    }

    pub async fn update(
        &self,
        input: UpdateReminderInput,
    ) -> APIResponse<update_reminder::APIResponse> {
        let body: update_reminder::RequestBody = input.reminder.into();
        self.base
            .put(
                body,
                format!("reminders/{}", input.reminder_id),
                StatusCode::OK,
            )
            .await
    }

    pub async fn delete(&self, reminder_id: ID) -> APIResponse<delete_reminder::APIResponse> {
        self.base
            .delete(format!("reminders/{}", reminder_id), StatusCode::OK)
            .await
    }

    pub async fn search(
        &self,
        input: SearchRemindersInput,
    ) -> APIResponse<search_reminders::APIResponse> {
        let due = match (input.due_start, input.due_end) {
            (None, None) => None,
            (start, end) => Some(search_reminders::TimeRange { start, end }),
        };
        let body = search_reminders::RequestBody {
            completed: input.completed,
            due,
        };
        self.base
            .post(body, "reminders/search".into(), StatusCode::OK)
            .await
    }
}
