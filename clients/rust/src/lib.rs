mod base;
mod occurrence;
mod reminder;
mod status;

pub(crate) use base::BaseClient;
pub use base::{APIError, APIResponse};
use occurrence::OccurrenceClient;
pub use occurrence::{DelayOccurrenceInput, GetOccurrencesInput};
use reminder::ReminderClient;
pub use reminder::{CreateReminderInput, SearchRemindersInput, UpdateReminderInput};
use status::StatusClient;
use std::sync::Arc;
pub use todo_reminder_api_structs::dtos::*;
pub use todo_reminder_domain::{RecurrenceKind, RecurrenceRule, ID};

// Domain
pub use todo_reminder_api_structs::dtos::OccurrenceDTO as Occurrence;
pub use todo_reminder_api_structs::dtos::ReminderDTO as Reminder;

/// Todo Reminder Server SDK
///
/// The SDK contains methods for interacting with the Todo Reminder server
/// API on behalf of a single user.
#[derive(Clone)]
pub struct TodoReminderSDK {
    pub occurrence: OccurrenceClient,
    pub reminder: ReminderClient,
    pub status: StatusClient,
}

impl TodoReminderSDK {
    pub fn new<T: Into<String>>(address: String, user_id: T) -> Self {
        let mut base = BaseClient::new(address);
        base.set_user_id(user_id.into());
        Self::from_base(base)
    }

    /// Client that does not identify any user, only public routes can be used
    pub fn anonymous(address: String) -> Self {
        Self::from_base(BaseClient::new(address))
    }

    fn from_base(base: BaseClient) -> Self {
        let base = Arc::new(base);
        let occurrence = OccurrenceClient::new(base.clone());
        let reminder = ReminderClient::new(base.clone());
        let status = StatusClient::new(base);

        Self {
            occurrence,
            reminder,
            status,
        }
    }
}
