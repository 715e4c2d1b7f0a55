use super::{find_user_occurrence, subscribers::RegenerateOnOccurrenceCompleted};
use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    occurrence_dto,
    usecase::{execute, Subscriber, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::complete_occurrence::*;
use todo_reminder_domain::{Occurrence, ID};
use todo_reminder_infra::{OccurrenceRepoError, TodoReminderContext};

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::NotFound(occurrence_id) => TodoReminderError::NotFound(format!(
            "The occurrence with id: {}, was not found.",
            occurrence_id
        )),
        UseCaseError::AlreadyCompleted(occurrence_id) => TodoReminderError::Conflict(format!(
            "The occurrence with id: {}, is already completed.",
            occurrence_id
        )),
        UseCaseError::StorageError => TodoReminderError::InternalError,
    }
}

pub async fn complete_occurrence_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let usecase = CompleteOccurrenceUseCase {
        user_id,
        occurrence_id: path_params.occurrence_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|occurrence| {
            HttpResponse::Ok().json(APIResponse {
                occurrence: occurrence_dto(occurrence, &ctx),
            })
        })
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct CompleteOccurrenceUseCase {
    pub user_id: String,
    pub occurrence_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    AlreadyCompleted(ID),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for CompleteOccurrenceUseCase {
    type Response = Occurrence;

    type Error = UseCaseError;

    const NAME: &'static str = "CompleteOccurrence";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        if find_user_occurrence(&self.occurrence_id, &self.user_id, ctx)
            .await
            .is_none()
        {
            return Err(UseCaseError::NotFound(self.occurrence_id));
        }

        let now = ctx.sys.get_timestamp_millis();
        ctx.repos
            .occurrences
            .mark_completed(&self.occurrence_id, now)
            .await
            .map_err(|e| match e {
                OccurrenceRepoError::NotFound => UseCaseError::NotFound(self.occurrence_id),
                OccurrenceRepoError::AlreadyCompleted => {
                    UseCaseError::AlreadyCompleted(self.occurrence_id)
                }
                _ => UseCaseError::StorageError,
            })
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(RegenerateOnOccurrenceCompleted)]
    }
}
