use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::{delete_reminder::*, dtos::ReminderDTO};
use todo_reminder_domain::{Reminder, ID};
use todo_reminder_infra::TodoReminderContext;
use tracing::info;

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::NotFound(reminder_id) => TodoReminderError::NotFound(format!(
            "The reminder with id: {}, was not found.",
            reminder_id
        )),
        UseCaseError::StorageError => TodoReminderError::InternalError,
    }
}

pub async fn delete_reminder_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let usecase = DeleteReminderUseCase {
        user_id,
        reminder_id: path_params.reminder_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| {
            HttpResponse::Ok().json(APIResponse {
                reminder: ReminderDTO::new(reminder),
            })
        })
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct DeleteReminderUseCase {
    pub user_id: String,
    pub reminder_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteReminder";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) if !reminder.deleted && reminder.user_id == self.user_id => {}
            _ => return Err(UseCaseError::NotFound(self.reminder_id)),
        };

        let now = ctx.sys.get_timestamp_millis();
        let reminder = ctx
            .repos
            .reminders
            .delete(&self.reminder_id, now)
            .await
            .ok_or(UseCaseError::NotFound(self.reminder_id))?;

        let res = ctx
            .repos
            .occurrences
            .delete_by_reminder(&reminder.id, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        info!(
            "Deleted reminder: {} and {} of its occurrences",
            reminder.id, res.deleted_count
        );

        Ok(reminder)
    }
}
