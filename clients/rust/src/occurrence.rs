use crate::{APIResponse, BaseClient, ID};
use reqwest::StatusCode;
use std::sync::Arc;
use todo_reminder_api_structs::*;

#[derive(Clone)]
pub struct OccurrenceClient {
    base: Arc<BaseClient>,
}

#[derive(Default)]
pub struct GetOccurrencesInput {
    pub completed: Option<bool>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    /// `dueTs`, `completedTs` or `created`, prefixed with `-` for descending order
    pub sort: Option<String>,
}

impl GetOccurrencesInput {
    pub(crate) fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(completed) = self.completed {
            params.push(format!("completed={}", completed));
        }
        if let Some(page) = self.page {
            params.push(format!("page={}", page));
        }
        if let Some(per_page) = self.per_page {
            params.push(format!("perPage={}", per_page));
        }
        if let Some(sort) = &self.sort {
            params.push(format!("sort={}", sort));
        }
        params.join("&")
    }
}

pub struct DelayOccurrenceInput {
    pub occurrence_id: ID,
    pub seconds: i64,
}

impl OccurrenceClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn list(
        &self,
        input: GetOccurrencesInput,
    ) -> APIResponse<get_occurrences::APIResponse> {
        self.base
            .get(
                format!("occurrences?{}", input.to_query_string()),
                StatusCode::OK,
            )
            .await
    }

    pub async fn get(&self, occurrence_id: ID) -> APIResponse<get_occurrence::APIResponse> {
        self.base
            .get(format!("occurrences/{}", occurrence_id), StatusCode::OK)
            .await
    }

    /// Skips the occurrence
    pub async fn delete(&self, occurrence_id: ID) -> APIResponse<delete_occurrence::APIResponse> {
        self.base
            .delete(format!("occurrences/{}", occurrence_id), StatusCode::OK)
            .await
    }

    pub async fn complete(
        &self,
        occurrence_id: ID,
    ) -> APIResponse<complete_occurrence::APIResponse> {
        self.base
            .post(
                (),
                format!("occurrences/{}/complete", occurrence_id),
                StatusCode::OK,
            )
            .await
    }

    pub async fn rollback(
        &self,
        occurrence_id: ID,
    ) -> APIResponse<rollback_occurrence::APIResponse> {
        self.base
            .post(
                (),
                format!("occurrences/{}/rollback", occurrence_id),
                StatusCode::OK,
            )
            .await
    }

    pub async fn delay(
        &self,
        input: DelayOccurrenceInput,
    ) -> APIResponse<delay_occurrence::APIResponse> {
        let body = delay_occurrence::RequestBody {
            seconds: input.seconds,
        };
        self.base
            .post(
                body,
                format!("occurrences/{}/delay", input.occurrence_id),
                StatusCode::OK,
            )
            .await
    }
}
