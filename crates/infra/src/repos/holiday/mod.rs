mod inmemory;
mod postgres;

use chrono::NaiveDate;
pub use inmemory::InMemoryHolidayRepo;
pub use postgres::PostgresHolidayRepo;
use todo_reminder_domain::HolidayDay;

#[async_trait::async_trait]
pub trait IHolidayRepo: Send + Sync {
    /// Inserts the days, overwriting already stored days with the same date
    async fn upsert_many(&self, days: &[HolidayDay]) -> anyhow::Result<()>;
    /// At most `limit` stored days on or after `date`, ordered by date
    async fn find_from(&self, date: NaiveDate, limit: usize) -> anyhow::Result<Vec<HolidayDay>>;
}
