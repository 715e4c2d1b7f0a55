use super::ReminderWithOccurrence;
use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::get_reminder::*;
use todo_reminder_domain::ID;
use todo_reminder_infra::TodoReminderContext;

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::NotFound(reminder_id) => TodoReminderError::NotFound(format!(
            "The reminder with id: {}, was not found.",
            reminder_id
        )),
    }
}

pub async fn get_reminder_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let usecase = GetReminderUseCase {
        user_id,
        reminder_id: path_params.reminder_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|res| HttpResponse::Ok().json(res.into_response(&ctx)))
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct GetReminderUseCase {
    pub user_id: String,
    pub reminder_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetReminderUseCase {
    type Response = ReminderWithOccurrence;

    type Error = UseCaseError;

    const NAME: &'static str = "GetReminder";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) if !reminder.deleted && reminder.user_id == self.user_id => {
                let pending_occurrence = ctx
                    .repos
                    .occurrences
                    .find_pending_by_reminder(&reminder.id)
                    .await;
                Ok(ReminderWithOccurrence {
                    reminder,
                    pending_occurrence,
                })
            }
            _ => Err(UseCaseError::NotFound(self.reminder_id)),
        }
    }
}
