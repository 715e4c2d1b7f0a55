use super::find_user_occurrence;
use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    occurrence_dto,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::get_occurrence::*;
use todo_reminder_domain::{Occurrence, ID};
use todo_reminder_infra::TodoReminderContext;

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::NotFound(occurrence_id) => TodoReminderError::NotFound(format!(
            "The occurrence with id: {}, was not found.",
            occurrence_id
        )),
    }
}

pub async fn get_occurrence_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let usecase = GetOccurrenceUseCase {
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
pub struct GetOccurrenceUseCase {
    pub user_id: String,
    pub occurrence_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetOccurrenceUseCase {
    type Response = Occurrence;

    type Error = UseCaseError;

    const NAME: &'static str = "GetOccurrence";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        find_user_occurrence(&self.occurrence_id, &self.user_id, ctx)
            .await
            .ok_or(UseCaseError::NotFound(self.occurrence_id))
    }
}
