use super::IHolidayRepo;
use chrono::NaiveDate;
use std::{collections::BTreeMap, sync::Mutex};
use todo_reminder_domain::HolidayDay;

pub struct InMemoryHolidayRepo {
    days: Mutex<BTreeMap<NaiveDate, bool>>,
}

impl InMemoryHolidayRepo {
    pub fn new() -> Self {
        Self {
            days: Mutex::new(BTreeMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl IHolidayRepo for InMemoryHolidayRepo {
    async fn upsert_many(&self, days: &[HolidayDay]) -> anyhow::Result<()> {
        let mut stored = self.days.lock().unwrap();
        for day in days {
            stored.insert(day.date, day.is_working_day);
        }
        Ok(())
    }

    async fn find_from(&self, date: NaiveDate, limit: usize) -> anyhow::Result<Vec<HolidayDay>> {
        let stored = self.days.lock().unwrap();
        Ok(stored
            .range(date..)
            .take(limit)
            .map(|(date, is_working_day)| HolidayDay {
                date: *date,
                is_working_day: *is_working_day,
            })
            .collect())
    }
}
