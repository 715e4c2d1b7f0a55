mod inmemory;
mod postgres;

use crate::repos::shared::{
    query_structs::{OccurrenceListQuery, OccurrenceSearchQuery},
    repo::DeleteResult,
};
pub use inmemory::InMemoryOccurrenceRepo;
pub use postgres::PostgresOccurrenceRepo;
use thiserror::Error;
use todo_reminder_domain::{Occurrence, ID};

#[derive(Error, Debug)]
pub enum OccurrenceRepoError {
    #[error("Occurrence was not found")]
    NotFound,
    #[error("Another pending occurrence already exists for the reminder")]
    Conflict,
    #[error("Occurrence has already been delivered")]
    AlreadyDelivered,
    #[error("Occurrence has already been completed")]
    AlreadyCompleted,
    #[error("Occurrence does not have a due time")]
    NotScheduled,
    #[error("Delaying the occurrence would move its due time out of range")]
    DelayOutOfRange,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct OccurrencePage {
    pub total: i64,
    pub items: Vec<Occurrence>,
}

/// Storage of `Occurrence`s. Every state transition is a single conditional
/// update so that concurrent callers can not break the invariant of at most
/// one pending `Occurrence` per `Reminder`.
#[async_trait::async_trait]
pub trait IOccurrenceRepo: Send + Sync {
    /// Inserts the `Occurrence`. Fails with `Conflict` if it is pending and
    /// its `Reminder` already has a pending `Occurrence`.
    async fn create_pending(&self, occurrence: &Occurrence) -> Result<(), OccurrenceRepoError>;
    async fn find(&self, occurrence_id: &ID) -> Option<Occurrence>;
    async fn find_pending_by_reminder(&self, reminder_id: &ID) -> Option<Occurrence>;
    /// All non deleted `Occurrence`s of the `Reminder`
    async fn find_by_reminder(&self, reminder_id: &ID) -> anyhow::Result<Vec<Occurrence>>;
    async fn mark_delivered(
        &self,
        occurrence_id: &ID,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError>;
    /// Marks every undelivered `Occurrence` in `occurrence_ids` as delivered and
    /// returns the ids of those that were actually transitioned
    async fn mark_many_delivered(&self, occurrence_ids: &[ID], ts: i64)
        -> anyhow::Result<Vec<ID>>;
    async fn mark_completed(
        &self,
        occurrence_id: &ID,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError>;
    /// Reopens a completed `Occurrence`, optionally clearing its delivery state as well.
    /// Fails with `Conflict` if the reopened `Occurrence` would be a second pending one.
    /// Reopening an `Occurrence` that is not completed is a no-op.
    async fn mark_uncompleted(
        &self,
        occurrence_id: &ID,
        clear_delivery: bool,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError>;
    /// Shifts the due time of an undelivered `Occurrence` by `millis`.
    /// Fails with `DelayOutOfRange` when the shifted due time does not fit.
    async fn delay(
        &self,
        occurrence_id: &ID,
        millis: i64,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError>;
    /// Pending, reminding `Occurrence`s with a due time at or before `now`
    async fn list_due_undelivered(&self, now: i64) -> anyhow::Result<Vec<Occurrence>>;
    /// Soft deletes the pending `Occurrence` of the `Reminder`
    async fn cancel_pending_for_reminder(
        &self,
        reminder_id: &ID,
        ts: i64,
    ) -> anyhow::Result<Option<Occurrence>>;
    /// Soft deletes the pending `Occurrence` that completing `predecessor_id` generated.
    /// Successors generated by its delivery are kept.
    async fn cancel_completion_successor(
        &self,
        predecessor_id: &ID,
        ts: i64,
    ) -> anyhow::Result<Option<Occurrence>>;
    /// Soft deletes the `Occurrence`
    async fn delete(&self, occurrence_id: &ID, ts: i64) -> Result<Occurrence, OccurrenceRepoError>;
    /// Soft deletes every `Occurrence` of the `Reminder`
    async fn delete_by_reminder(&self, reminder_id: &ID, ts: i64) -> anyhow::Result<DeleteResult>;
    async fn find_by_user(&self, query: OccurrenceListQuery) -> anyhow::Result<OccurrencePage>;
    async fn search(&self, query: OccurrenceSearchQuery) -> anyhow::Result<Vec<Occurrence>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::shared::query_structs::OccurrenceSort;
    use std::sync::Arc;
    use todo_reminder_domain::{
        OccurrenceOrigin, RecurrenceKind, RecurrenceRule, Reminder,
    };

    fn new_reminder() -> Reminder {
        Reminder::new(
            "42".into(),
            "Stretch".into(),
            RecurrenceRule::new(RecurrenceKind::Daily, 1),
            1000,
            0,
        )
    }

    fn occurrence(reminder: &Reminder, due_ts: i64) -> Occurrence {
        Occurrence::generate(reminder, Some(due_ts), None, OccurrenceOrigin::Created, 0)
    }

    #[tokio::test]
    async fn allows_single_pending_occurrence_per_reminder() {
        let repo = InMemoryOccurrenceRepo::new();
        let reminder = new_reminder();
        let first = occurrence(&reminder, 1000);
        assert!(repo.create_pending(&first).await.is_ok());
        assert!(matches!(
            repo.create_pending(&occurrence(&reminder, 2000)).await,
            Err(OccurrenceRepoError::Conflict)
        ));
        // Other reminders are unaffected
        assert!(repo
            .create_pending(&occurrence(&new_reminder(), 1000))
            .await
            .is_ok());

        // Once delivered it is no longer pending
        repo.mark_delivered(&first.id, 1000).await.unwrap();
        assert!(repo.create_pending(&occurrence(&reminder, 2000)).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_creates_leave_one_pending() {
        let repo = Arc::new(InMemoryOccurrenceRepo::new());
        let reminder = new_reminder();
        let creates = (0..20).map(|i| {
            let repo = repo.clone();
            let occurrence = occurrence(&reminder, 1000 + i);
            async move { repo.create_pending(&occurrence).await.is_ok() }
        });
        let created = futures::future::join_all(creates)
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count();
        assert_eq!(created, 1);
        assert_eq!(repo.find_by_reminder(&reminder.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delivery_is_idempotent() {
        let repo = InMemoryOccurrenceRepo::new();
        let occurrence = occurrence(&new_reminder(), 1000);
        repo.create_pending(&occurrence).await.unwrap();

        let delivered = repo.mark_delivered(&occurrence.id, 1500).await.unwrap();
        assert!(delivered.delivered);
        assert_eq!(delivered.delivered_ts, Some(1500));

        assert!(matches!(
            repo.mark_delivered(&occurrence.id, 2000).await,
            Err(OccurrenceRepoError::AlreadyDelivered)
        ));
        let stored = repo.find(&occurrence.id).await.unwrap();
        assert_eq!(stored, delivered);

        assert!(matches!(
            repo.mark_delivered(&ID::new(), 2000).await,
            Err(OccurrenceRepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn marks_many_delivered_once() {
        let repo = InMemoryOccurrenceRepo::new();
        let a = occurrence(&new_reminder(), 1000);
        let b = occurrence(&new_reminder(), 1000);
        repo.create_pending(&a).await.unwrap();
        repo.create_pending(&b).await.unwrap();
        repo.mark_delivered(&b.id, 1000).await.unwrap();

        let delivered = repo
            .mark_many_delivered(&[a.id, b.id, ID::new()], 1200)
            .await
            .unwrap();
        assert_eq!(delivered, vec![a.id]);
        assert_eq!(repo.find(&b.id).await.unwrap().delivered_ts, Some(1000));
    }

    #[tokio::test]
    async fn delay_only_applies_to_undelivered() {
        let repo = InMemoryOccurrenceRepo::new();
        let reminder = new_reminder();
        let pending = occurrence(&reminder, 1000);
        repo.create_pending(&pending).await.unwrap();

        let delayed = repo.delay(&pending.id, 60_000, 10).await.unwrap();
        assert_eq!(delayed.due_ts, Some(61_000));

        repo.mark_delivered(&pending.id, 61_000).await.unwrap();
        assert!(matches!(
            repo.delay(&pending.id, 60_000, 20).await,
            Err(OccurrenceRepoError::AlreadyDelivered)
        ));
        assert_eq!(repo.find(&pending.id).await.unwrap().due_ts, Some(61_000));

        let unscheduled = Occurrence::generate(&reminder, None, None, OccurrenceOrigin::Created, 0);
        repo.create_pending(&unscheduled).await.unwrap();
        assert!(matches!(
            repo.delay(&unscheduled.id, 60_000, 20).await,
            Err(OccurrenceRepoError::NotScheduled)
        ));
    }

    #[tokio::test]
    async fn rejects_delay_past_max_due_time() {
        let repo = InMemoryOccurrenceRepo::new();
        let pending = occurrence(&new_reminder(), 1_700_000_000_000);
        repo.create_pending(&pending).await.unwrap();

        assert!(matches!(
            repo.delay(&pending.id, (i64::MAX / 1000) * 1000, 10).await,
            Err(OccurrenceRepoError::DelayOutOfRange)
        ));
        assert_eq!(
            repo.find(&pending.id).await.unwrap().due_ts,
            Some(1_700_000_000_000)
        );
        // The repo is still usable afterwards
        let delayed = repo.delay(&pending.id, 1000, 20).await.unwrap();
        assert_eq!(delayed.due_ts, Some(1_700_000_001_000));
    }

    #[tokio::test]
    async fn lists_due_occurrences() {
        let repo = InMemoryOccurrenceRepo::new();
        let due = occurrence(&new_reminder(), 1000);
        let later = occurrence(&new_reminder(), 5000);
        let mut not_reminding_reminder = new_reminder();
        not_reminding_reminder.needs_reminder = false;
        let not_reminding = occurrence(&not_reminding_reminder, 1000);
        let completed = occurrence(&new_reminder(), 1000);
        for o in &[&due, &later, &not_reminding, &completed] {
            repo.create_pending(o).await.unwrap();
        }
        repo.mark_completed(&completed.id, 900).await.unwrap();

        let listed = repo.list_due_undelivered(1000).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, due.id);
    }

    #[tokio::test]
    async fn completes_and_reopens() {
        let repo = InMemoryOccurrenceRepo::new();
        let reminder = new_reminder();
        let first = occurrence(&reminder, 1000);
        repo.create_pending(&first).await.unwrap();
        repo.mark_delivered(&first.id, 1000).await.unwrap();

        let completed = repo.mark_completed(&first.id, 1100).await.unwrap();
        assert_eq!(completed.completed_ts, Some(1100));
        assert!(matches!(
            repo.mark_completed(&first.id, 1200).await,
            Err(OccurrenceRepoError::AlreadyCompleted)
        ));

        // A successor is pending so the first one can not become pending again
        let second = occurrence(&reminder, 2000);
        repo.create_pending(&second).await.unwrap();
        assert!(matches!(
            repo.mark_uncompleted(&first.id, true, 1300).await,
            Err(OccurrenceRepoError::Conflict)
        ));
        let reopened = repo.mark_uncompleted(&first.id, false, 1300).await.unwrap();
        assert!(!reopened.completed);
        assert!(reopened.delivered);
        assert_eq!(reopened.completed_ts, None);

        repo.delete(&second.id, 1400).await.unwrap();
        repo.mark_completed(&first.id, 1500).await.unwrap();
        let reopened = repo.mark_uncompleted(&first.id, true, 1600).await.unwrap();
        assert!(reopened.is_pending());
        assert_eq!(reopened.due_ts, Some(1000));
    }

    #[tokio::test]
    async fn cancels_pending_and_successors() {
        let repo = InMemoryOccurrenceRepo::new();
        let reminder = new_reminder();
        let first = occurrence(&reminder, 1000);
        repo.create_pending(&first).await.unwrap();
        repo.mark_delivered(&first.id, 1000).await.unwrap();
        let delivery_successor = Occurrence::generate(
            &reminder,
            Some(2000),
            Some(first.id),
            OccurrenceOrigin::Delivered,
            1000,
        );
        repo.create_pending(&delivery_successor).await.unwrap();
        assert!(repo
            .cancel_completion_successor(&first.id, 1500)
            .await
            .unwrap()
            .is_none());
        assert!(repo.find_pending_by_reminder(&reminder.id).await.is_some());
        repo.delete(&delivery_successor.id, 1500).await.unwrap();

        let successor = Occurrence::generate(
            &reminder,
            Some(2000),
            Some(first.id),
            OccurrenceOrigin::Completed,
            1000,
        );
        repo.create_pending(&successor).await.unwrap();

        let cancelled = repo
            .cancel_completion_successor(&first.id, 1500)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.id, successor.id);
        assert!(repo.find_pending_by_reminder(&reminder.id).await.is_none());
        assert!(repo.cancel_completion_successor(&first.id, 1500).await.unwrap().is_none());

        let third = occurrence(&reminder, 3000);
        repo.create_pending(&third).await.unwrap();
        let cancelled = repo
            .cancel_pending_for_reminder(&reminder.id, 1600)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.id, third.id);
        assert!(cancelled.deleted);

        let res = repo.delete_by_reminder(&reminder.id, 1700).await.unwrap();
        assert_eq!(res.deleted_count, 1);
        assert!(repo.find_by_reminder(&reminder.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(&first.id, 1800).await,
            Err(OccurrenceRepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn lists_and_searches_by_user() {
        let repo = InMemoryOccurrenceRepo::new();
        for due_ts in &[3000, 1000, 2000] {
            repo.create_pending(&occurrence(&new_reminder(), *due_ts))
                .await
                .unwrap();
        }
        let mut other_user = new_reminder();
        other_user.user_id = "7".into();
        repo.create_pending(&occurrence(&other_user, 500))
            .await
            .unwrap();

        let page = repo
            .find_by_user(OccurrenceListQuery {
                user_id: "42".into(),
                completed: false,
                skip: 1,
                limit: 1,
                sort: OccurrenceSort::due_asc(),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].due_ts, Some(2000));

        let found = repo
            .search(OccurrenceSearchQuery {
                user_id: "42".into(),
                completed: false,
                due_start: Some(1500),
                due_end: Some(3000),
            })
            .await
            .unwrap();
        assert_eq!(
            found.iter().map(|o| o.due_ts).collect::<Vec<_>>(),
            vec![Some(2000), Some(3000)]
        );
    }
}
