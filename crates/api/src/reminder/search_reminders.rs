use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::{dtos::ReminderDTO, search_reminders::*};
use todo_reminder_domain::{Reminder, ID};
use todo_reminder_infra::{OccurrenceSearchQuery, TodoReminderContext};

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::InvalidTimeRange => TodoReminderError::BadClientData(
            "The start of the due range can not be after its end".into(),
        ),
        UseCaseError::StorageError => TodoReminderError::InternalError,
    }
}

pub async fn search_reminders_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let body = body.0;
    let due = body.due.unwrap_or_default();
    let usecase = SearchRemindersUseCase {
        user_id,
        completed: body.completed,
        due_start: due.start,
        due_end: due.end,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminders| {
            HttpResponse::Ok().json(APIResponse {
                total: reminders.len(),
                reminders: reminders.into_iter().map(ReminderDTO::new).collect(),
            })
        })
        .map_err(handle_error)
}

/// Finds the `Reminder`s that have an occurrence in the given done state and due range.
/// Reminders are ordered by the due time of their earliest matching occurrence.
#[derive(Debug)]
pub struct SearchRemindersUseCase {
    pub user_id: String,
    pub completed: bool,
    pub due_start: Option<i64>,
    pub due_end: Option<i64>,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidTimeRange,
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for SearchRemindersUseCase {
    type Response = Vec<Reminder>;

    type Error = UseCaseError;

    const NAME: &'static str = "SearchReminders";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        if let (Some(start), Some(end)) = (self.due_start, self.due_end) {
            if start > end {
                return Err(UseCaseError::InvalidTimeRange);
            }
        }

        let occurrences = ctx
            .repos
            .occurrences
            .search(OccurrenceSearchQuery {
                user_id: self.user_id.clone(),
                completed: self.completed,
                due_start: self.due_start,
                due_end: self.due_end,
            })
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let mut reminder_ids: Vec<ID> = Vec::new();
        for occurrence in &occurrences {
            if !reminder_ids.contains(&occurrence.reminder_id) {
                reminder_ids.push(occurrence.reminder_id);
            }
        }

        let mut reminders = ctx
            .repos
            .reminders
            .find_many(&reminder_ids)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .into_iter()
            .filter(|r| !r.deleted && r.user_id == self.user_id)
            .collect::<Vec<_>>();
        reminders.sort_by_key(|r| {
            reminder_ids
                .iter()
                .position(|id| *id == r.id)
                .unwrap_or(reminder_ids.len())
        });

        Ok(reminders)
    }
}
