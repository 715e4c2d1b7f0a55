use serde::{Deserialize, Serialize};
use todo_reminder_domain::{Occurrence, RecurrenceRule, ID};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDTO {
    /// The blob reference of the attachment
    pub name: String,
    /// Signed url of the attachment, `None` if it could not be signed
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceDTO {
    pub id: ID,
    pub reminder_id: ID,
    pub user_id: String,
    pub due_ts: Option<i64>,
    pub delivered: bool,
    pub delivered_ts: Option<i64>,
    pub completed: bool,
    pub completed_ts: Option<i64>,
    pub content: String,
    pub attachments: Vec<AttachmentDTO>,
    pub needs_reminder: bool,
    pub recurrence: RecurrenceRule,
    pub predecessor_id: Option<ID>,
    pub origin: String,
    pub created: i64,
    pub updated: i64,
}

impl OccurrenceDTO {
    /// `sign` resolves a blob reference to a url
    pub fn new<F: Fn(&str) -> Option<String>>(occurrence: Occurrence, sign: F) -> Self {
        let attachments = occurrence
            .attachments
            .into_iter()
            .map(|name| {
                let url = sign(&name);
                AttachmentDTO { name, url }
            })
            .collect();
        Self {
            id: occurrence.id,
            reminder_id: occurrence.reminder_id,
            user_id: occurrence.user_id,
            due_ts: occurrence.due_ts,
            delivered: occurrence.delivered,
            delivered_ts: occurrence.delivered_ts,
            completed: occurrence.completed,
            completed_ts: occurrence.completed_ts,
            content: occurrence.content,
            attachments,
            needs_reminder: occurrence.needs_reminder,
            recurrence: occurrence.recurrence,
            predecessor_id: occurrence.predecessor_id,
            origin: occurrence.origin.to_string(),
            created: occurrence.created,
            updated: occurrence.updated,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use todo_reminder_domain::{OccurrenceOrigin, Reminder};

    #[test]
    fn serializes_occurrence_in_camel_case() {
        let mut reminder = Reminder::new("9".into(), "Call mom".into(), Default::default(), 10, 0);
        reminder.attachments = vec!["a.png".into(), "b.png".into()];
        let occurrence =
            Occurrence::generate(&reminder, Some(10), None, OccurrenceOrigin::Created, 0);
        let dto = OccurrenceDTO::new(occurrence, |name| {
            if name == "a.png" {
                Some(format!("http://blobs/{}", name))
            } else {
                None
            }
        });

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["dueTs"], 10);
        assert_eq!(json["origin"], "created");
        assert_eq!(json["recurrence"]["kind"], "none");
        assert_eq!(json["attachments"][0]["url"], "http://blobs/a.png");
        assert!(json["attachments"][1]["url"].is_null());
        assert!(json["predecessorId"].is_null());
    }
}
