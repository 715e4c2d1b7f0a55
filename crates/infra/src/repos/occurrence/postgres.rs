use super::{IOccurrenceRepo, OccurrencePage, OccurrenceRepoError};
use crate::repos::shared::{
    query_structs::{OccurrenceListQuery, OccurrenceSearchQuery, OccurrenceSort, OccurrenceSortField},
    repo::DeleteResult,
};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use todo_reminder_domain::{Occurrence, OccurrenceOrigin, RecurrenceKind, RecurrenceRule, ID};
use tracing::error;

pub struct PostgresOccurrenceRepo {
    pool: PgPool,
}

impl PostgresOccurrenceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OccurrenceRaw {
    occurrence_uid: Uuid,
    reminder_uid: Uuid,
    user_id: String,
    due_ts: Option<i64>,
    delivered: bool,
    delivered_ts: Option<i64>,
    completed: bool,
    completed_ts: Option<i64>,
    deleted: bool,
    content: String,
    attachments: Vec<String>,
    needs_reminder: bool,
    recurrence_kind: String,
    recurrence_interval: i64,
    predecessor_uid: Option<Uuid>,
    origin: String,
    created: i64,
    updated: i64,
}

#[derive(Debug, FromRow)]
struct CountRaw {
    count: i64,
}

#[derive(Debug, FromRow)]
struct IdRaw {
    occurrence_uid: Uuid,
}

impl TryFrom<OccurrenceRaw> for Occurrence {
    type Error = anyhow::Error;

    fn try_from(raw: OccurrenceRaw) -> anyhow::Result<Self> {
        let kind = raw.recurrence_kind.parse::<RecurrenceKind>()?;
        let origin = raw.origin.parse::<OccurrenceOrigin>()?;
        Ok(Occurrence {
            id: raw.occurrence_uid.into(),
            reminder_id: raw.reminder_uid.into(),
            user_id: raw.user_id,
            due_ts: raw.due_ts,
            delivered: raw.delivered,
            delivered_ts: raw.delivered_ts,
            completed: raw.completed,
            completed_ts: raw.completed_ts,
            deleted: raw.deleted,
            content: raw.content,
            attachments: raw.attachments,
            needs_reminder: raw.needs_reminder,
            recurrence: RecurrenceRule::new(kind, raw.recurrence_interval),
            predecessor_id: raw.predecessor_uid.map(ID::from),
            origin,
            created: raw.created,
            updated: raw.updated,
        })
    }
}

fn into_occurrences(raws: Vec<OccurrenceRaw>) -> anyhow::Result<Vec<Occurrence>> {
    raws.into_iter().map(Occurrence::try_from).collect()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(e) => e.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn order_by(sort: OccurrenceSort) -> &'static str {
    match (sort.field, sort.descending) {
        (OccurrenceSortField::DueTs, false) => "o.due_ts ASC NULLS LAST",
        (OccurrenceSortField::DueTs, true) => "o.due_ts DESC NULLS LAST",
        (OccurrenceSortField::CompletedTs, false) => "o.completed_ts ASC NULLS LAST",
        (OccurrenceSortField::CompletedTs, true) => "o.completed_ts DESC NULLS LAST",
        (OccurrenceSortField::Created, false) => "o.created ASC",
        (OccurrenceSortField::Created, true) => "o.created DESC",
    }
}

impl PostgresOccurrenceRepo {
    /// Result of a conditional update. When no row was updated the current
    /// state of the occurrence is classified with `classify`.
    async fn conditional_update<F>(
        &self,
        occurrence_id: &ID,
        updated: Result<Option<OccurrenceRaw>, sqlx::Error>,
        classify: F,
    ) -> Result<Occurrence, OccurrenceRepoError>
    where
        F: FnOnce(&Occurrence) -> OccurrenceRepoError,
    {
        match updated {
            Ok(Some(raw)) => Ok(Occurrence::try_from(raw)?),
            Ok(None) => match self.find(occurrence_id).await {
                Some(occurrence) if !occurrence.deleted => Err(classify(&occurrence)),
                _ => Err(OccurrenceRepoError::NotFound),
            },
            Err(e) if is_unique_violation(&e) => Err(OccurrenceRepoError::Conflict),
            Err(e) => {
                error!("Unable to update occurrence: {}. Error: {:?}", occurrence_id, e);
                Err(OccurrenceRepoError::Storage(anyhow::Error::new(e)))
            }
        }
    }
}

#[async_trait::async_trait]
impl IOccurrenceRepo for PostgresOccurrenceRepo {
    async fn create_pending(&self, o: &Occurrence) -> Result<(), OccurrenceRepoError> {
        let res = sqlx::query(
            r#"
            INSERT INTO occurrences(
                occurrence_uid,
                reminder_uid,
                user_id,
                due_ts,
                delivered,
                delivered_ts,
                completed,
                completed_ts,
                deleted,
                content,
                attachments,
                needs_reminder,
                recurrence_kind,
                recurrence_interval,
                predecessor_uid,
                origin,
                created,
                updated
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(o.id.inner_ref())
        .bind(o.reminder_id.inner_ref())
        .bind(&o.user_id)
        .bind(o.due_ts)
        .bind(o.delivered)
        .bind(o.delivered_ts)
        .bind(o.completed)
        .bind(o.completed_ts)
        .bind(o.deleted)
        .bind(&o.content)
        .bind(&o.attachments)
        .bind(o.needs_reminder)
        .bind(o.recurrence.kind.as_str())
        .bind(o.recurrence.interval)
        .bind(o.predecessor_id.map(|id| id.inner()))
        .bind(o.origin.as_str())
        .bind(o.created)
        .bind(o.updated)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(OccurrenceRepoError::Conflict),
            Err(e) => Err(OccurrenceRepoError::Storage(anyhow::Error::new(e))),
        }
    }

    async fn find(&self, occurrence_id: &ID) -> Option<Occurrence> {
        let occurrence: OccurrenceRaw = sqlx::query_as(
            r#"
            SELECT * FROM occurrences AS o
            WHERE o.occurrence_uid = $1
            "#,
        )
        .bind(occurrence_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        .ok()?;
        match Occurrence::try_from(occurrence) {
            Ok(occurrence) => Some(occurrence),
            Err(e) => {
                error!("Unable to read occurrence: {}. Error: {:?}", occurrence_id, e);
                None
            }
        }
    }

    async fn find_pending_by_reminder(&self, reminder_id: &ID) -> Option<Occurrence> {
        let occurrence: OccurrenceRaw = sqlx::query_as(
            r#"
            SELECT * FROM occurrences AS o
            WHERE o.reminder_uid = $1
            AND NOT o.deleted AND NOT o.completed AND NOT o.delivered
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()??;
        Occurrence::try_from(occurrence).ok()
    }

    async fn find_by_reminder(&self, reminder_id: &ID) -> anyhow::Result<Vec<Occurrence>> {
        let occurrences: Vec<OccurrenceRaw> = sqlx::query_as(
            r#"
            SELECT * FROM occurrences AS o
            WHERE o.reminder_uid = $1 AND NOT o.deleted
            ORDER BY o.created ASC
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;
        into_occurrences(occurrences)
    }

    async fn mark_delivered(
        &self,
        occurrence_id: &ID,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError> {
        let updated = sqlx::query_as::<_, OccurrenceRaw>(
            r#"
            UPDATE occurrences SET delivered = true, delivered_ts = $2, updated = $2
            WHERE occurrence_uid = $1 AND NOT deleted AND NOT delivered
            RETURNING *
            "#,
        )
        .bind(occurrence_id.inner_ref())
        .bind(ts)
        .fetch_optional(&self.pool)
        .await;
        self.conditional_update(occurrence_id, updated, |_| {
            OccurrenceRepoError::AlreadyDelivered
        })
        .await
    }

    async fn mark_many_delivered(
        &self,
        occurrence_ids: &[ID],
        ts: i64,
    ) -> anyhow::Result<Vec<ID>> {
        let ids = occurrence_ids
            .iter()
            .map(|id| *id.inner_ref())
            .collect::<Vec<_>>();
        let delivered: Vec<IdRaw> = sqlx::query_as(
            r#"
            UPDATE occurrences SET delivered = true, delivered_ts = $2, updated = $2
            WHERE occurrence_uid = ANY($1) AND NOT deleted AND NOT delivered
            RETURNING occurrence_uid
            "#,
        )
        .bind(&ids)
        .bind(ts)
        .fetch_all(&self.pool)
        .await?;
        Ok(delivered
            .into_iter()
            .map(|raw| raw.occurrence_uid.into())
            .collect())
    }

    async fn mark_completed(
        &self,
        occurrence_id: &ID,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError> {
        let updated = sqlx::query_as::<_, OccurrenceRaw>(
            r#"
            UPDATE occurrences SET completed = true, completed_ts = $2, updated = $2
            WHERE occurrence_uid = $1 AND NOT deleted AND NOT completed
            RETURNING *
            "#,
        )
        .bind(occurrence_id.inner_ref())
        .bind(ts)
        .fetch_optional(&self.pool)
        .await;
        self.conditional_update(occurrence_id, updated, |_| {
            OccurrenceRepoError::AlreadyCompleted
        })
        .await
    }

    async fn mark_uncompleted(
        &self,
        occurrence_id: &ID,
        clear_delivery: bool,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError> {
        // The unique pending index rejects the update if it would create a second pending occurrence
        let updated = sqlx::query_as::<_, OccurrenceRaw>(
            r#"
            UPDATE occurrences SET
                completed = false,
                completed_ts = NULL,
                delivered = CASE WHEN $2 THEN false ELSE delivered END,
                delivered_ts = CASE WHEN $2 THEN NULL ELSE delivered_ts END,
                updated = $3
            WHERE occurrence_uid = $1 AND NOT deleted AND completed
            RETURNING *
            "#,
        )
        .bind(occurrence_id.inner_ref())
        .bind(clear_delivery)
        .bind(ts)
        .fetch_optional(&self.pool)
        .await;

        match updated {
            Ok(None) => match self.find(occurrence_id).await {
                // Not completed, nothing to reopen
                Some(occurrence) if !occurrence.deleted => Ok(occurrence),
                _ => Err(OccurrenceRepoError::NotFound),
            },
            updated => {
                self.conditional_update(occurrence_id, updated, |_| {
                    OccurrenceRepoError::NotFound
                })
                .await
            }
        }
    }

    async fn delay(
        &self,
        occurrence_id: &ID,
        millis: i64,
        ts: i64,
    ) -> Result<Occurrence, OccurrenceRepoError> {
        // Due times the shift can be applied to without leaving the bigint range
        let (min_due, max_due) = if millis >= 0 {
            (i64::MIN, i64::MAX - millis)
        } else {
            (i64::MIN - millis, i64::MAX)
        };
        let updated = sqlx::query_as::<_, OccurrenceRaw>(
            r#"
            UPDATE occurrences SET due_ts = due_ts + $2, updated = $3
            WHERE occurrence_uid = $1 AND NOT deleted AND NOT delivered
            AND due_ts IS NOT NULL AND due_ts BETWEEN $4 AND $5
            RETURNING *
            "#,
        )
        .bind(occurrence_id.inner_ref())
        .bind(millis)
        .bind(ts)
        .bind(min_due)
        .bind(max_due)
        .fetch_optional(&self.pool)
        .await;
        self.conditional_update(occurrence_id, updated, |occurrence| {
            if occurrence.delivered {
                OccurrenceRepoError::AlreadyDelivered
            } else if occurrence.due_ts.is_none() {
                OccurrenceRepoError::NotScheduled
            } else {
                OccurrenceRepoError::DelayOutOfRange
            }
        })
        .await
    }

    async fn list_due_undelivered(&self, now: i64) -> anyhow::Result<Vec<Occurrence>> {
        let occurrences: Vec<OccurrenceRaw> = sqlx::query_as(
            r#"
            SELECT * FROM occurrences AS o
            WHERE NOT o.deleted AND o.due_ts <= $1 AND NOT o.delivered
            AND o.needs_reminder AND NOT o.completed
            ORDER BY o.due_ts ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        into_occurrences(occurrences)
    }

    async fn cancel_pending_for_reminder(
        &self,
        reminder_id: &ID,
        ts: i64,
    ) -> anyhow::Result<Option<Occurrence>> {
        let cancelled: Option<OccurrenceRaw> = sqlx::query_as(
            r#"
            UPDATE occurrences SET deleted = true, updated = $2
            WHERE reminder_uid = $1
            AND NOT deleted AND NOT completed AND NOT delivered
            RETURNING *
            "#,
        )
        .bind(reminder_id.inner_ref())
        .bind(ts)
        .fetch_optional(&self.pool)
        .await?;
        cancelled.map(Occurrence::try_from).transpose()
    }

    async fn cancel_completion_successor(
        &self,
        predecessor_id: &ID,
        ts: i64,
    ) -> anyhow::Result<Option<Occurrence>> {
        let cancelled: Option<OccurrenceRaw> = sqlx::query_as(
            r#"
            UPDATE occurrences SET deleted = true, updated = $2
            WHERE predecessor_uid = $1 AND origin = $3
            AND NOT deleted AND NOT completed AND NOT delivered
            RETURNING *
            "#,
        )
        .bind(predecessor_id.inner_ref())
        .bind(ts)
        .bind(OccurrenceOrigin::Completed.as_str())
        .fetch_optional(&self.pool)
        .await?;
        cancelled.map(Occurrence::try_from).transpose()
    }

    async fn delete(&self, occurrence_id: &ID, ts: i64) -> Result<Occurrence, OccurrenceRepoError> {
        let updated = sqlx::query_as::<_, OccurrenceRaw>(
            r#"
            UPDATE occurrences SET deleted = true, updated = $2
            WHERE occurrence_uid = $1 AND NOT deleted
            RETURNING *
            "#,
        )
        .bind(occurrence_id.inner_ref())
        .bind(ts)
        .fetch_optional(&self.pool)
        .await;
        self.conditional_update(occurrence_id, updated, |_| OccurrenceRepoError::NotFound)
            .await
    }

    async fn delete_by_reminder(&self, reminder_id: &ID, ts: i64) -> anyhow::Result<DeleteResult> {
        let res = sqlx::query(
            r#"
            UPDATE occurrences SET deleted = true, updated = $2
            WHERE reminder_uid = $1 AND NOT deleted
            "#,
        )
        .bind(reminder_id.inner_ref())
        .bind(ts)
        .execute(&self.pool)
        .await?;
        Ok(DeleteResult {
            deleted_count: res.rows_affected() as i64,
        })
    }

    async fn find_by_user(&self, query: OccurrenceListQuery) -> anyhow::Result<OccurrencePage> {
        let total: CountRaw = sqlx::query_as(
            r#"
            SELECT COUNT(*) AS count FROM occurrences AS o
            WHERE o.user_id = $1 AND NOT o.deleted AND o.completed = $2
            "#,
        )
        .bind(&query.user_id)
        .bind(query.completed)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT * FROM occurrences AS o
            WHERE o.user_id = $1 AND NOT o.deleted AND o.completed = $2
            ORDER BY {}
            OFFSET $3
            LIMIT $4
            "#,
            order_by(query.sort)
        );
        let occurrences: Vec<OccurrenceRaw> = sqlx::query_as(&sql)
            .bind(&query.user_id)
            .bind(query.completed)
            .bind(query.skip as i64)
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(OccurrencePage {
            total: total.count,
            items: into_occurrences(occurrences)?,
        })
    }

    async fn search(&self, query: OccurrenceSearchQuery) -> anyhow::Result<Vec<Occurrence>> {
        let occurrences: Vec<OccurrenceRaw> = sqlx::query_as(
            r#"
            SELECT * FROM occurrences AS o
            WHERE o.user_id = $1 AND NOT o.deleted AND o.completed = $2
            AND (($3::BIGINT IS NULL AND $4::BIGINT IS NULL) OR o.due_ts IS NOT NULL)
            AND ($3::BIGINT IS NULL OR o.due_ts >= $3)
            AND ($4::BIGINT IS NULL OR o.due_ts <= $4)
            ORDER BY o.due_ts ASC NULLS LAST
            "#,
        )
        .bind(&query.user_id)
        .bind(query.completed)
        .bind(query.due_start)
        .bind(query.due_end)
        .fetch_all(&self.pool)
        .await?;
        into_occurrences(occurrences)
    }
}
