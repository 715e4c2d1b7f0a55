use super::find_user_occurrence;
use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    occurrence_dto,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::rollback_occurrence::*;
use todo_reminder_domain::{Occurrence, ID};
use todo_reminder_infra::{OccurrenceRepoError, TodoReminderContext};
use tracing::info;

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::NotFound(occurrence_id) => TodoReminderError::NotFound(format!(
            "The occurrence with id: {}, was not found.",
            occurrence_id
        )),
        UseCaseError::NotCompleted(occurrence_id) => TodoReminderError::BadClientData(format!(
            "The occurrence with id: {}, is not completed.",
            occurrence_id
        )),
        UseCaseError::Conflict(occurrence_id) => TodoReminderError::Conflict(format!(
            "The occurrence with id: {}, can not be reopened while its reminder has another pending occurrence.",
            occurrence_id
        )),
        UseCaseError::StorageError => TodoReminderError::InternalError,
    }
}

pub async fn rollback_occurrence_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let usecase = RollbackOccurrenceUseCase {
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

/// Reopens a completed `Occurrence`.
///
/// The undelivered successor its completion generated is cancelled and the `Reminder`
/// goes back to having fired at the due time of the reopened `Occurrence`, which
/// then becomes pending again. When the `Reminder` has another pending `Occurrence`,
/// for example the one generated by its delivery, the reopened one keeps its
/// delivery state instead.
#[derive(Debug)]
pub struct RollbackOccurrenceUseCase {
    pub user_id: String,
    pub occurrence_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    NotCompleted(ID),
    Conflict(ID),
    StorageError,
}

impl RollbackOccurrenceUseCase {
    fn map_repo_error(&self, e: OccurrenceRepoError) -> UseCaseError {
        match e {
            OccurrenceRepoError::NotFound => UseCaseError::NotFound(self.occurrence_id),
            OccurrenceRepoError::Conflict => UseCaseError::Conflict(self.occurrence_id),
            _ => UseCaseError::StorageError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for RollbackOccurrenceUseCase {
    type Response = Occurrence;

    type Error = UseCaseError;

    const NAME: &'static str = "RollbackOccurrence";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        let occurrence = find_user_occurrence(&self.occurrence_id, &self.user_id, ctx)
            .await
            .ok_or(UseCaseError::NotFound(self.occurrence_id))?;
        if !occurrence.completed {
            return Err(UseCaseError::NotCompleted(occurrence.id));
        }

        let now = ctx.sys.get_timestamp_millis();
        let successor = ctx
            .repos
            .occurrences
            .cancel_completion_successor(&occurrence.id, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if let Some(successor) = successor {
            info!(
                "Cancelled successor: {} of rolled back occurrence: {}",
                successor.id, occurrence.id
            );
            ctx.repos
                .reminders
                .reset_last_fired(&occurrence.reminder_id, occurrence.due_ts)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
        }

        match ctx
            .repos
            .occurrences
            .mark_uncompleted(&occurrence.id, true, now)
            .await
        {
            Ok(occurrence) => Ok(occurrence),
            Err(OccurrenceRepoError::Conflict) => ctx
                .repos
                .occurrences
                .mark_uncompleted(&occurrence.id, false, now)
                .await
                .map_err(|e| self.map_repo_error(e)),
            Err(e) => Err(self.map_repo_error(e)),
        }
    }
}
