use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceSortField {
    DueTs,
    CompletedTs,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceSort {
    pub field: OccurrenceSortField,
    pub descending: bool,
}

impl OccurrenceSort {
    pub fn due_asc() -> Self {
        Self {
            field: OccurrenceSortField::DueTs,
            descending: false,
        }
    }

    pub fn completed_desc() -> Self {
        Self {
            field: OccurrenceSortField::CompletedTs,
            descending: true,
        }
    }
}

#[derive(Error, Debug)]
#[error("Invalid sort: {0}, expected one of dueTs, completedTs or created optionally prefixed with -")]
pub struct InvalidSortError(String);

/// `dueTs` sorts ascending and `-dueTs` descending
impl FromStr for OccurrenceSort {
    type Err = InvalidSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, field) = match s.strip_prefix('-') {
            Some(field) => (true, field),
            None => (false, s),
        };
        let field = match field {
            "dueTs" => OccurrenceSortField::DueTs,
            "completedTs" => OccurrenceSortField::CompletedTs,
            "created" => OccurrenceSortField::Created,
            _ => return Err(InvalidSortError(s.to_string())),
        };
        Ok(Self { field, descending })
    }
}

/// Paginated listing of the non deleted occurrences of a user
#[derive(Debug, Clone)]
pub struct OccurrenceListQuery {
    pub user_id: String,
    pub completed: bool,
    pub skip: usize,
    pub limit: usize,
    pub sort: OccurrenceSort,
}

#[derive(Debug, Clone)]
pub struct OccurrenceSearchQuery {
    pub user_id: String,
    pub completed: bool,
    /// Inclusive lower bound on the due time
    pub due_start: Option<i64>,
    /// Inclusive upper bound on the due time
    pub due_end: Option<i64>,
}
