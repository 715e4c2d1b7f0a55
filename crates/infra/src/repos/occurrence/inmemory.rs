use super::{IOccurrenceRepo, OccurrencePage, OccurrenceRepoError};
use crate::repos::shared::{
    inmemory_repo::*,
    query_structs::{OccurrenceListQuery, OccurrenceSearchQuery, OccurrenceSort, OccurrenceSortField},
    repo::DeleteResult,
};
use std::{cmp::Ordering, sync::Mutex};
use todo_reminder_domain::{Occurrence, OccurrenceOrigin, ID};

pub struct InMemoryOccurrenceRepo {
    occurrences: Mutex<Vec<Occurrence>>,
}

impl InMemoryOccurrenceRepo {
    pub fn new() -> Self {
        Self {
            occurrences: Mutex::new(Vec::new()),
        }
    }

    /// Runs `transition` on the non deleted occurrence while holding the lock
    fn transition<F>(&self, occurrence_id: &ID, transition: F) -> Result<Occurrence, OccurrenceRepoError>
    where
        F: FnOnce(&mut Occurrence) -> Result<(), OccurrenceRepoError>,
    {
        let mut occurrences = self.occurrences.lock().unwrap();
        let occurrence = occurrences
            .iter_mut()
            .find(|o| o.id == *occurrence_id && !o.deleted)
            .ok_or(OccurrenceRepoError::NotFound)?;
        transition(occurrence)?;
        Ok(occurrence.clone())
    }
}

fn compare_optional(a: Option<i64>, b: Option<i64>) -> Ordering {
    // Missing values are sorted last
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_occurrences(occurrences: &mut Vec<Occurrence>, sort: OccurrenceSort) {
    occurrences.sort_by(|a, b| {
        let (a, b) = if sort.descending { (b, a) } else { (a, b) };
        match sort.field {
            OccurrenceSortField::DueTs => compare_optional(a.due_ts, b.due_ts),
            OccurrenceSortField::CompletedTs => compare_optional(a.completed_ts, b.completed_ts),
            OccurrenceSortField::Created => a.created.cmp(&b.created),
        }
    });
}

#[async_trait::async_trait]
impl IOccurrenceRepo for InMemoryOccurrenceRepo {
    async fn create_pending(&self, occurrence: &Occurrence) -> Result<(), OccurrenceRepoError> {
        let mut occurrences = self.occurrences.lock().unwrap();
        if occurrence.is_pending()
            && occurrences
                .iter()
                .any(|o| o.reminder_id == occurrence.reminder_id && o.is_pending())
        {
            return Err(OccurrenceRepoError::Conflict);
        }
        occurrences.push(occurrence.clone());
        Ok(())
    }

    async fn find(&self, occurrence_id: &ID) -> Option<Occurrence> {
        find(occurrence_id, &self.occurrences)
    }

    async fn find_pending_by_reminder(&self, reminder_id: &ID) -> Option<Occurrence> {
        find_by(&self.occurrences, |o| o.reminder_id == *reminder_id && o.is_pending())
            .into_iter()
            .next()
    }

    async fn find_by_reminder(&self, reminder_id: &ID) -> anyhow::Result<Vec<Occurrence>> {
        Ok(find_by(&self.occurrences, |o| {
            o.reminder_id == *reminder_id && !o.deleted
        }))
    }

    async fn mark_delivered(
        &self,
        occurrence_id: &ID,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError> {
        self.transition(occurrence_id, |o| {
            if o.delivered {
                return Err(OccurrenceRepoError::AlreadyDelivered);
            }
            o.delivered = true;
            o.delivered_ts = Some(ts);
            o.updated = ts;
            Ok(())
        })
    }

    async fn mark_many_delivered(
        &self,
        occurrence_ids: &[ID],
        ts: i64,
    ) -> anyhow::Result<Vec<ID>> {
        let delivered = update_many(
            &self.occurrences,
            |o| occurrence_ids.contains(&o.id) && !o.deleted && !o.delivered,
            |o| {
                o.delivered = true;
                o.delivered_ts = Some(ts);
                o.updated = ts;
            },
        );
        Ok(delivered.into_iter().map(|o| o.id).collect())
    }

    async fn mark_completed(
        &self,
        occurrence_id: &ID,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError> {
        self.transition(occurrence_id, |o| {
            if o.completed {
                return Err(OccurrenceRepoError::AlreadyCompleted);
            }
            o.completed = true;
            o.completed_ts = Some(ts);
            o.updated = ts;
            Ok(())
        })
    }

    async fn mark_uncompleted(
        &self,
        occurrence_id: &ID,
        clear_delivery: bool,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError> {
        let mut occurrences = self.occurrences.lock().unwrap();
        let index = occurrences
            .iter()
            .position(|o| o.id == *occurrence_id && !o.deleted)
            .ok_or(OccurrenceRepoError::NotFound)?;
        if !occurrences[index].completed {
            return Ok(occurrences[index].clone());
        }

        let becomes_pending = clear_delivery || !occurrences[index].delivered;
        let reminder_id = occurrences[index].reminder_id;
        if becomes_pending
            && occurrences
                .iter()
                .any(|o| o.reminder_id == reminder_id && o.is_pending())
        {
            return Err(OccurrenceRepoError::Conflict);
        }

        let occurrence = &mut occurrences[index];
        occurrence.completed = false;
        occurrence.completed_ts = None;
        if clear_delivery {
            occurrence.delivered = false;
            occurrence.delivered_ts = None;
        }
        occurrence.updated = ts;
        Ok(occurrence.clone())
    }

    async fn delay(
        &self,
        occurrence_id: &ID,
        millis: i64,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError> {
        self.transition(occurrence_id, |o| {
            if o.delivered {
                return Err(OccurrenceRepoError::AlreadyDelivered);
            }
            let due_ts = o.due_ts.ok_or(OccurrenceRepoError::NotScheduled)?;
            o.due_ts = Some(
                due_ts
                    .checked_add(millis)
                    .ok_or(OccurrenceRepoError::DelayOutOfRange)?,
            );
            o.updated = ts;
            Ok(())
        })
    }

    async fn list_due_undelivered(&self, now: i64) -> anyhow::Result<Vec<Occurrence>> {
        let mut due = find_by(&self.occurrences, |o| o.is_due(now));
        sort_occurrences(&mut due, OccurrenceSort::due_asc());
        Ok(due)
    }

    async fn cancel_pending_for_reminder(
        &self,
        reminder_id: &ID,
        ts: i64,
    ) -> anyhow::Result<Option<Occurrence>> {
        let cancelled = update_many(
            &self.occurrences,
            |o| o.reminder_id == *reminder_id && o.is_pending(),
            |o| {
                o.deleted = true;
                o.updated = ts;
            },
        );
        Ok(cancelled.into_iter().next())
    }

    async fn cancel_completion_successor(
        &self,
        predecessor_id: &ID,
        ts: i64,
    ) -> anyhow::Result<Option<Occurrence>> {
        let cancelled = update_many(
            &self.occurrences,
            |o| {
                o.predecessor_id == Some(*predecessor_id)
                    && o.origin == OccurrenceOrigin::Completed
                    && o.is_pending()
            },
            |o| {
                o.deleted = true;
                o.updated = ts;
            },
        );
        Ok(cancelled.into_iter().next())
    }

    async fn delete(&self, occurrence_id: &ID, ts: i64) -> Result<Occurrence, OccurrenceRepoError> {
        self.transition(occurrence_id, |o| {
            o.deleted = true;
            o.updated = ts;
            Ok(())
        })
    }

    async fn delete_by_reminder(&self, reminder_id: &ID, ts: i64) -> anyhow::Result<DeleteResult> {
        let deleted = update_many(
            &self.occurrences,
            |o| o.reminder_id == *reminder_id && !o.deleted,
            |o| {
                o.deleted = true;
                o.updated = ts;
            },
        );
        Ok(DeleteResult {
            deleted_count: deleted.len() as i64,
        })
    }

    /// Skip and limit are applied after sorting
    async fn find_by_user(&self, query: OccurrenceListQuery) -> anyhow::Result<OccurrencePage> {
        let mut occurrences = find_by(&self.occurrences, |o| {
            o.user_id == query.user_id && !o.deleted && o.completed == query.completed
        });
        sort_occurrences(&mut occurrences, query.sort);
        Ok(OccurrencePage {
            total: occurrences.len() as i64,
            items: occurrences
                .into_iter()
                .skip(query.skip)
                .take(query.limit)
                .collect(),
        })
    }

    async fn search(&self, query: OccurrenceSearchQuery) -> anyhow::Result<Vec<Occurrence>> {
        let mut occurrences = find_by(&self.occurrences, |o| {
            let in_range = match o.due_ts {
                Some(due_ts) => {
                    query.due_start.map(|start| due_ts >= start).unwrap_or(true)
                        && query.due_end.map(|end| due_ts <= end).unwrap_or(true)
                }
                None => query.due_start.is_none() && query.due_end.is_none(),
            };
            o.user_id == query.user_id && !o.deleted && o.completed == query.completed && in_range
        });
        sort_occurrences(&mut occurrences, OccurrenceSort::due_asc());
        Ok(occurrences)
    }
}
