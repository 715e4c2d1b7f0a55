use crate::dtos::OccurrenceDTO;
use serde::{Deserialize, Serialize};
use todo_reminder_domain::ID;

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceResponse {
    pub occurrence: OccurrenceDTO,
}

#[derive(Deserialize)]
pub struct OccurrencePathParams {
    pub occurrence_id: ID,
}

pub mod get_occurrences {
    use super::*;

    #[derive(Deserialize, Serialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        pub completed: Option<bool>,
        pub page: Option<usize>,
        pub per_page: Option<usize>,
        /// Field to sort by, prefixed with `-` for descending order
        pub sort: Option<String>,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub total: i64,
        pub occurrences: Vec<OccurrenceDTO>,
    }
}

pub mod get_occurrence {
    use super::*;

    pub type PathParams = OccurrencePathParams;

    pub type APIResponse = OccurrenceResponse;
}

pub mod delete_occurrence {
    use super::*;

    pub type PathParams = OccurrencePathParams;

    pub type APIResponse = OccurrenceResponse;
}

pub mod complete_occurrence {
    use super::*;

    pub type PathParams = OccurrencePathParams;

    pub type APIResponse = OccurrenceResponse;
}

pub mod rollback_occurrence {
    use super::*;

    pub type PathParams = OccurrencePathParams;

    pub type APIResponse = OccurrenceResponse;
}

pub mod delay_occurrence {
    use super::*;

    pub type PathParams = OccurrencePathParams;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub seconds: i64,
    }

    pub type APIResponse = OccurrenceResponse;
}
