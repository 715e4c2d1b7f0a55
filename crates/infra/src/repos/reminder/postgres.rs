use super::IReminderRepo;
use std::convert::TryFrom;
use todo_reminder_domain::{RecurrenceKind, RecurrenceRule, Reminder, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    user_id: String,
    content: String,
    attachments: Vec<String>,
    needs_reminder: bool,
    recurrence_kind: String,
    recurrence_interval: i64,
    anchor_ts: i64,
    last_fired_ts: Option<i64>,
    deleted: bool,
    created: i64,
    updated: i64,
}

impl TryFrom<ReminderRaw> for Reminder {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderRaw) -> anyhow::Result<Self> {
        let kind = raw.recurrence_kind.parse::<RecurrenceKind>()?;
        Ok(Reminder {
            id: raw.reminder_uid.into(),
            user_id: raw.user_id,
            content: raw.content,
            attachments: raw.attachments,
            needs_reminder: raw.needs_reminder,
            recurrence: RecurrenceRule::new(kind, raw.recurrence_interval),
            anchor_ts: raw.anchor_ts,
            last_fired_ts: raw.last_fired_ts,
            deleted: raw.deleted,
            created: raw.created,
            updated: raw.updated,
        })
    }
}

fn into_reminders(raws: Vec<ReminderRaw>) -> anyhow::Result<Vec<Reminder>> {
    raws.into_iter().map(Reminder::try_from).collect()
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, r: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminders(
                reminder_uid,
                user_id,
                content,
                attachments,
                needs_reminder,
                recurrence_kind,
                recurrence_interval,
                anchor_ts,
                last_fired_ts,
                deleted,
                created,
                updated
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(r.id.inner_ref())
        .bind(&r.user_id)
        .bind(&r.content)
        .bind(&r.attachments)
        .bind(r.needs_reminder)
        .bind(r.recurrence.kind.as_str())
        .bind(r.recurrence.interval)
        .bind(r.anchor_ts)
        .bind(r.last_fired_ts)
        .bind(r.deleted)
        .bind(r.created)
        .bind(r.updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, r: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminders SET
                user_id = $2,
                content = $3,
                attachments = $4,
                needs_reminder = $5,
                recurrence_kind = $6,
                recurrence_interval = $7,
                anchor_ts = $8,
                last_fired_ts = $9,
                deleted = $10,
                updated = $11
            WHERE reminder_uid = $1
            "#,
        )
        .bind(r.id.inner_ref())
        .bind(&r.user_id)
        .bind(&r.content)
        .bind(&r.attachments)
        .bind(r.needs_reminder)
        .bind(r.recurrence.kind.as_str())
        .bind(r.recurrence.interval)
        .bind(r.anchor_ts)
        .bind(r.last_fired_ts)
        .bind(r.deleted)
        .bind(r.updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        let reminder: ReminderRaw = match sqlx::query_as(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(reminder) => reminder,
            Err(_) => return None,
        };
        match Reminder::try_from(reminder) {
            Ok(reminder) => Some(reminder),
            Err(e) => {
                error!("Unable to read reminder: {}. Error: {:?}", reminder_id, e);
                None
            }
        }
    }

    async fn find_many(&self, reminder_ids: &[ID]) -> anyhow::Result<Vec<Reminder>> {
        let ids = reminder_ids
            .iter()
            .map(|id| *id.inner_ref())
            .collect::<Vec<_>>();
        let reminders: Vec<ReminderRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.reminder_uid = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        into_reminders(reminders)
    }

    async fn advance_last_fired(&self, reminder_id: &ID, ts: i64) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminders SET last_fired_ts = $2
            WHERE reminder_uid = $1 AND (last_fired_ts IS NULL OR last_fired_ts <= $2)
            "#,
        )
        .bind(reminder_id.inner_ref())
        .bind(ts)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset_last_fired(&self, reminder_id: &ID, ts: Option<i64>) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminders SET last_fired_ts = $2
            WHERE reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .bind(ts)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, reminder_id: &ID, ts: i64) -> Option<Reminder> {
        let reminder: ReminderRaw = sqlx::query_as(
            r#"
            UPDATE reminders SET deleted = true, updated = $2
            WHERE reminder_uid = $1 AND NOT deleted
            RETURNING *
            "#,
        )
        .bind(reminder_id.inner_ref())
        .bind(ts)
        .fetch_one(&self.pool)
        .await
        .ok()?;
        Reminder::try_from(reminder).ok()
    }

    async fn find_calendar_aware(&self) -> anyhow::Result<Vec<Reminder>> {
        let reminders: Vec<ReminderRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminders AS r
            WHERE NOT r.deleted AND r.needs_reminder
            AND r.recurrence_kind IN ('nextWorkingDay', 'nextHoliday')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        into_reminders(reminders)
    }
}
