use super::{regenerate_occurrence::RegenerateOccurrenceUseCase, ReminderWithOccurrence};
use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::create_reminder::*;
use todo_reminder_domain::{OccurrenceOrigin, RecurrenceRule, Reminder};
use todo_reminder_infra::TodoReminderContext;

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::InvalidRecurrenceRule(msg) => TodoReminderError::BadClientData(format!(
            "Invalid recurrence rule specified for the reminder: {}",
            msg
        )),
        UseCaseError::EmptyContent => {
            TodoReminderError::BadClientData("The reminder content can not be empty".into())
        }
        UseCaseError::StorageError => TodoReminderError::InternalError,
    }
}

pub async fn create_reminder_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let body = body.0;
    let usecase = CreateReminderUseCase {
        user_id,
        content: body.content,
        attachments: body.attachments,
        needs_reminder: body.needs_reminder,
        recurrence: body.recurrence,
        anchor_ts: body.anchor_ts,
    };

    execute(usecase, &ctx)
        .await
        .map(|res| HttpResponse::Created().json(res.into_response(&ctx)))
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct CreateReminderUseCase {
    pub user_id: String,
    pub content: String,
    pub attachments: Vec<String>,
    pub needs_reminder: bool,
    pub recurrence: RecurrenceRule,
    pub anchor_ts: i64,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidRecurrenceRule(String),
    EmptyContent,
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateReminderUseCase {
    type Response = ReminderWithOccurrence;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateReminder";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        if self.content.trim().is_empty() {
            return Err(UseCaseError::EmptyContent);
        }
        self.recurrence
            .validate()
            .map_err(|e| UseCaseError::InvalidRecurrenceRule(e.to_string()))?;

        let now = ctx.sys.get_timestamp_millis();
        let mut reminder = Reminder::new(
            self.user_id.clone(),
            self.content.clone(),
            self.recurrence.clone(),
            self.anchor_ts,
            now,
        );
        reminder.attachments = self.attachments.clone();
        reminder.needs_reminder = self.needs_reminder;

        ctx.repos
            .reminders
            .insert(&reminder)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        // A reminder without a next date is still created, the holiday sweep retries it
        let regenerate = RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created);
        let pending_occurrence = execute(regenerate, ctx).await.ok().flatten();

        let reminder = ctx
            .repos
            .reminders
            .find(&reminder.id)
            .await
            .unwrap_or(reminder);

        Ok(ReminderWithOccurrence {
            reminder,
            pending_occurrence,
        })
    }
}
