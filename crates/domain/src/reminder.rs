use crate::shared::{
    entity::{Entity, ID},
    recurrence::RecurrenceRule,
};

/// A `Reminder` is the user authored todo item together with the policy
/// describing when, and how often, its owner should be notified about it.
///
/// The `Reminder` itself is never delivered. Every notification is represented
/// by an `Occurrence` which is generated from the `Reminder`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    /// Opaque identifier of the owner, also used as the address of the notifier
    pub user_id: String,
    pub content: String,
    /// Ordered blob references of the attachments
    pub attachments: Vec<String>,
    /// Whether occurrences of this `Reminder` should be delivered at all.
    /// A `Reminder` without this flag is a plain todo item.
    pub needs_reminder: bool,
    pub recurrence: RecurrenceRule,
    /// The first time the `Reminder` is due, in millis
    pub anchor_ts: i64,
    /// Due time of the latest generated `Occurrence`
    pub last_fired_ts: Option<i64>,
    pub deleted: bool,
    pub created: i64,
    pub updated: i64,
}

impl Entity for Reminder {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl Reminder {
    pub fn new(
        user_id: String,
        content: String,
        recurrence: RecurrenceRule,
        anchor_ts: i64,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            user_id,
            content,
            attachments: Vec::new(),
            needs_reminder: true,
            recurrence,
            anchor_ts,
            last_fired_ts: None,
            deleted: false,
            created: now,
            updated: now,
        }
    }

    /// Whether a new `Occurrence` should be generated after one was delivered,
    /// completed or skipped.
    pub fn repeats(&self) -> bool {
        !self.deleted && self.needs_reminder && self.recurrence.is_repeatable()
    }
}
