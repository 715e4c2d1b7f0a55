use super::{regenerate_occurrence::RegenerateOccurrenceUseCase, ReminderWithOccurrence};
use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::update_reminder::*;
use todo_reminder_domain::{OccurrenceOrigin, RecurrenceRule, ID};
use todo_reminder_infra::TodoReminderContext;
use tracing::info;

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::NotFound(reminder_id) => TodoReminderError::NotFound(format!(
            "The reminder with id: {}, was not found.",
            reminder_id
        )),
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

pub async fn update_reminder_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let body = body.0;
    let usecase = UpdateReminderUseCase {
        user_id,
        reminder_id: path_params.reminder_id,
        content: body.content,
        attachments: body.attachments,
        needs_reminder: body.needs_reminder,
        recurrence: body.recurrence,
        anchor_ts: body.anchor_ts,
    };

    execute(usecase, &ctx)
        .await
        .map(|res| HttpResponse::Ok().json(res.into_response(&ctx)))
        .map_err(handle_error)
}

/// Replaces the user editable fields of a `Reminder` and schedules it from scratch
#[derive(Debug)]
pub struct UpdateReminderUseCase {
    pub user_id: String,
    pub reminder_id: ID,
    pub content: String,
    pub attachments: Vec<String>,
    pub needs_reminder: bool,
    pub recurrence: RecurrenceRule,
    pub anchor_ts: i64,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    InvalidRecurrenceRule(String),
    EmptyContent,
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpdateReminderUseCase {
    type Response = ReminderWithOccurrence;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateReminder";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        if self.content.trim().is_empty() {
            return Err(UseCaseError::EmptyContent);
        }
        self.recurrence
            .validate()
            .map_err(|e| UseCaseError::InvalidRecurrenceRule(e.to_string()))?;

        let mut reminder = match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) if !reminder.deleted && reminder.user_id == self.user_id => reminder,
            _ => return Err(UseCaseError::NotFound(self.reminder_id)),
        };

        let fired_and_undone = ctx
            .repos
            .occurrences
            .find_by_reminder(&reminder.id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .iter()
            .any(|o| o.delivered && !o.completed);

        let now = ctx.sys.get_timestamp_millis();
        reminder.content = self.content.clone();
        reminder.attachments = self.attachments.clone();
        reminder.needs_reminder = self.needs_reminder;
        reminder.recurrence = self.recurrence.clone();
        reminder.anchor_ts = self.anchor_ts;
        reminder.last_fired_ts = None;
        reminder.updated = now;

        ctx.repos
            .reminders
            .save(&reminder)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        ctx.repos
            .occurrences
            .cancel_pending_for_reminder(&reminder.id, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let pending_occurrence = if !reminder.recurrence.is_repeatable() && fired_and_undone {
            info!(
                "Reminder: {} already fired and is not done yet, no new occurrence is generated",
                reminder.id
            );
            None
        } else {
            let regenerate =
                RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Edited);
            execute(regenerate, ctx).await.ok().flatten()
        };

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
