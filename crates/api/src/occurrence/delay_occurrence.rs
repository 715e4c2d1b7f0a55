use super::find_user_occurrence;
use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    occurrence_dto,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::delay_occurrence::*;
use todo_reminder_domain::{Occurrence, ID};
use todo_reminder_infra::{OccurrenceRepoError, TodoReminderContext};

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::NotFound(occurrence_id) => TodoReminderError::NotFound(format!(
            "The occurrence with id: {}, was not found.",
            occurrence_id
        )),
        UseCaseError::InvalidDelay(seconds) => TodoReminderError::BadClientData(format!(
            "The delay must be a positive number of seconds that keeps the due time in range, got: {}",
            seconds
        )),
        UseCaseError::AlreadyDelivered(occurrence_id) => TodoReminderError::Conflict(format!(
            "The occurrence with id: {}, has already been delivered and can not be delayed.",
            occurrence_id
        )),
        UseCaseError::NotScheduled(occurrence_id) => TodoReminderError::BadClientData(format!(
            "The occurrence with id: {}, has no due time to delay.",
            occurrence_id
        )),
        UseCaseError::StorageError => TodoReminderError::InternalError,
    }
}

pub async fn delay_occurrence_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let usecase = DelayOccurrenceUseCase {
        user_id,
        occurrence_id: path_params.occurrence_id,
        seconds: body.seconds,
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

/// Pushes the due time of an undelivered `Occurrence` back by `seconds`
#[derive(Debug)]
pub struct DelayOccurrenceUseCase {
    pub user_id: String,
    pub occurrence_id: ID,
    pub seconds: i64,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    InvalidDelay(i64),
    AlreadyDelivered(ID),
    NotScheduled(ID),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for DelayOccurrenceUseCase {
    type Response = Occurrence;

    type Error = UseCaseError;

    const NAME: &'static str = "DelayOccurrence";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        let millis = match self.seconds.checked_mul(1000) {
            Some(millis) if millis > 0 => millis,
            _ => return Err(UseCaseError::InvalidDelay(self.seconds)),
        };

        if find_user_occurrence(&self.occurrence_id, &self.user_id, ctx)
            .await
            .is_none()
        {
            return Err(UseCaseError::NotFound(self.occurrence_id));
        }

        let now = ctx.sys.get_timestamp_millis();
        ctx.repos
            .occurrences
            .delay(&self.occurrence_id, millis, now)
            .await
            .map_err(|e| match e {
                OccurrenceRepoError::NotFound => UseCaseError::NotFound(self.occurrence_id),
                OccurrenceRepoError::AlreadyDelivered => {
                    UseCaseError::AlreadyDelivered(self.occurrence_id)
                }
                OccurrenceRepoError::NotScheduled => UseCaseError::NotScheduled(self.occurrence_id),
                OccurrenceRepoError::DelayOutOfRange => UseCaseError::InvalidDelay(self.seconds),
                _ => UseCaseError::StorageError,
            })
    }
}
