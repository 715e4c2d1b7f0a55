use crate::dtos::{OccurrenceDTO, ReminderDTO};
use serde::{Deserialize, Serialize};
use todo_reminder_domain::{RecurrenceRule, ID};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub reminder: ReminderDTO,
    /// The currently pending occurrence of the reminder, if any
    pub pending_occurrence: Option<OccurrenceDTO>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReminderBody {
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default = "default_needs_reminder")]
    pub needs_reminder: bool,
    #[serde(default)]
    pub recurrence: RecurrenceRule,
    pub anchor_ts: i64,
}

fn default_needs_reminder() -> bool {
    true
}

pub mod create_reminder {
    use super::*;

    pub type RequestBody = ReminderBody;

    pub type APIResponse = ReminderResponse;
}

pub mod update_reminder {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reminder_id: ID,
    }

    pub type RequestBody = ReminderBody;

    pub type APIResponse = ReminderResponse;
}

pub mod get_reminder {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reminder_id: ID,
    }

    pub type APIResponse = ReminderResponse;
}

pub mod delete_reminder {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reminder_id: ID,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub reminder: ReminderDTO,
    }
}

pub mod search_reminders {
    use super::*;

    #[derive(Deserialize, Serialize, Debug, Clone, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct TimeRange {
        pub start: Option<i64>,
        pub end: Option<i64>,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub completed: bool,
        #[serde(default)]
        pub due: Option<TimeRange>,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub total: usize,
        pub reminders: Vec<ReminderDTO>,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use todo_reminder_domain::RecurrenceKind;

    #[test]
    fn reminder_body_defaults() {
        let body: ReminderBody =
            serde_json::from_str(r#"{"content": "Buy milk", "anchorTs": 1000}"#).unwrap();
        assert!(body.needs_reminder);
        assert!(body.attachments.is_empty());
        assert_eq!(body.recurrence.kind, RecurrenceKind::None);

        let body: ReminderBody = serde_json::from_str(
            r#"{"content": "Gym", "anchorTs": 1, "needsReminder": false, "recurrence": {"kind": "weekly", "interval": 2}}"#,
        )
        .unwrap();
        assert!(!body.needs_reminder);
        assert_eq!(body.recurrence, RecurrenceRule::new(RecurrenceKind::Weekly, 2));
    }
}
