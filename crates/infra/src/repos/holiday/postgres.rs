use super::IHolidayRepo;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use todo_reminder_domain::HolidayDay;

pub struct PostgresHolidayRepo {
    pool: PgPool,
}

impl PostgresHolidayRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct HolidayRaw {
    date: NaiveDate,
    is_working_day: bool,
}

impl From<HolidayRaw> for HolidayDay {
    fn from(raw: HolidayRaw) -> Self {
        HolidayDay {
            date: raw.date,
            is_working_day: raw.is_working_day,
        }
    }
}

#[async_trait::async_trait]
impl IHolidayRepo for PostgresHolidayRepo {
    async fn upsert_many(&self, days: &[HolidayDay]) -> anyhow::Result<()> {
        let dates = days.iter().map(|day| day.date).collect::<Vec<_>>();
        let working_days = days.iter().map(|day| day.is_working_day).collect::<Vec<_>>();
        sqlx::query(
            r#"
            INSERT INTO holidays(date, is_working_day)
            SELECT * FROM UNNEST($1::DATE[], $2::BOOLEAN[])
            ON CONFLICT (date) DO UPDATE SET is_working_day = EXCLUDED.is_working_day
            "#,
        )
        .bind(&dates)
        .bind(&working_days)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_from(&self, date: NaiveDate, limit: usize) -> anyhow::Result<Vec<HolidayDay>> {
        let days: Vec<HolidayRaw> = sqlx::query_as(
            r#"
            SELECT * FROM holidays AS h
            WHERE h.date >= $1
            ORDER BY h.date ASC
            LIMIT $2
            "#,
        )
        .bind(date)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(days.into_iter().map(|day| day.into()).collect())
    }
}
