use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    occurrence_dto,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::get_occurrences::*;
use todo_reminder_infra::{OccurrenceListQuery, OccurrencePage, OccurrenceSort, TodoReminderContext};

const DEFAULT_PAGE: usize = 1;
const DEFAULT_PER_PAGE: usize = 100;
const MAX_PER_PAGE: usize = 1000;

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::InvalidSort(sort) => TodoReminderError::BadClientData(format!(
            "Invalid sort specified for the occurrences: {}",
            sort
        )),
        UseCaseError::InvalidPagination => TodoReminderError::BadClientData(format!(
            "The page must be at least 1 and the page size between 1 and {}",
            MAX_PER_PAGE
        )),
        UseCaseError::StorageError => TodoReminderError::InternalError,
    }
}

pub async fn get_occurrences_controller(
    http_req: HttpRequest,
    query_params: web::Query<QueryParams>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let query = query_params.0;
    let usecase = GetOccurrencesUseCase {
        user_id,
        completed: query.completed.unwrap_or(false),
        page: query.page.unwrap_or(DEFAULT_PAGE),
        per_page: query.per_page.unwrap_or(DEFAULT_PER_PAGE),
        sort: query.sort,
    };

    execute(usecase, &ctx)
        .await
        .map(|page| {
            HttpResponse::Ok().json(APIResponse {
                total: page.total,
                occurrences: page
                    .items
                    .into_iter()
                    .map(|occurrence| occurrence_dto(occurrence, &ctx))
                    .collect(),
            })
        })
        .map_err(handle_error)
}

/// Lists the occurrences of a user page by page. Undone occurrences are ordered by
/// due time and done occurrences by completion time unless another sort is given.
#[derive(Debug)]
pub struct GetOccurrencesUseCase {
    pub user_id: String,
    pub completed: bool,
    pub page: usize,
    pub per_page: usize,
    pub sort: Option<String>,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidSort(String),
    InvalidPagination,
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetOccurrencesUseCase {
    type Response = OccurrencePage;

    type Error = UseCaseError;

    const NAME: &'static str = "GetOccurrences";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        if self.page < 1 || self.per_page < 1 || self.per_page > MAX_PER_PAGE {
            return Err(UseCaseError::InvalidPagination);
        }

        let sort = match &self.sort {
            Some(sort) => sort
                .parse::<OccurrenceSort>()
                .map_err(|_| UseCaseError::InvalidSort(sort.clone()))?,
            None if self.completed => OccurrenceSort::completed_desc(),
            None => OccurrenceSort::due_asc(),
        };

        ctx.repos
            .occurrences
            .find_by_user(OccurrenceListQuery {
                user_id: self.user_id.clone(),
                completed: self.completed,
                skip: (self.page - 1) * self.per_page,
                limit: self.per_page,
                sort,
            })
            .await
            .map_err(|_| UseCaseError::StorageError)
    }
}
