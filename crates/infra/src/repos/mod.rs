mod holiday;
mod occurrence;
mod reminder;
mod shared;

use holiday::{InMemoryHolidayRepo, PostgresHolidayRepo};
use occurrence::{InMemoryOccurrenceRepo, PostgresOccurrenceRepo};
use reminder::{InMemoryReminderRepo, PostgresReminderRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

pub use holiday::IHolidayRepo;
pub use occurrence::{IOccurrenceRepo, OccurrencePage, OccurrenceRepoError};
pub use reminder::IReminderRepo;
pub use shared::query_structs::*;
pub use shared::repo::DeleteResult;

#[derive(Clone)]
pub struct Repos {
    pub reminders: Arc<dyn IReminderRepo>,
    pub occurrences: Arc<dyn IOccurrenceRepo>,
    pub holidays: Arc<dyn IHolidayRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");

        info!("DB EXECUTING MIGRATION ...");
        sqlx::migrate!().run(&pool).await?;
        info!("DB EXECUTING MIGRATION ... [done]");

        Ok(Self {
            reminders: Arc::new(PostgresReminderRepo::new(pool.clone())),
            occurrences: Arc::new(PostgresOccurrenceRepo::new(pool.clone())),
            holidays: Arc::new(PostgresHolidayRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            reminders: Arc::new(InMemoryReminderRepo::new()),
            occurrences: Arc::new(InMemoryOccurrenceRepo::new()),
            holidays: Arc::new(InMemoryHolidayRepo::new()),
        }
    }
}
