use super::subscribers::RecalculateRemindersOnHolidaysRefreshed;
use crate::shared::usecase::{Subscriber, UseCase};
use chrono::Datelike;
use todo_reminder_domain::{build_year, date::to_local};
use todo_reminder_infra::TodoReminderContext;
use tracing::{error, info};

/// Stores the holiday calendar of the current and the next year
#[derive(Debug)]
pub struct RefreshHolidaysUseCase {}

#[derive(Debug, PartialEq)]
pub struct HolidayRefreshReport {
    pub refreshed_years: Vec<i32>,
    pub failed_years: Vec<i32>,
    pub stored_days: usize,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidClock(i64),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for RefreshHolidaysUseCase {
    type Response = HolidayRefreshReport;

    type Error = UseCaseError;

    const NAME: &'static str = "RefreshHolidays";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let current_year = to_local(now, &ctx.config.timezone)
            .ok_or(UseCaseError::InvalidClock(now))?
            .year();

        let mut report = HolidayRefreshReport {
            refreshed_years: Vec::new(),
            failed_years: Vec::new(),
            stored_days: 0,
        };
        for year in current_year..=current_year + 1 {
            // Keep the previously stored calendar when the provider is unavailable
            let overrides = match ctx.services.holiday_provider.fetch_year(year).await {
                Ok(overrides) => overrides,
                Err(e) => {
                    error!("Unable to fetch holidays of year: {}. Error: {:?}", year, e);
                    report.failed_years.push(year);
                    continue;
                }
            };

            let days = build_year(year, &overrides);
            ctx.repos.holidays.upsert_many(&days).await.map_err(|e| {
                error!("Unable to store holidays of year: {}. Error: {:?}", year, e);
                UseCaseError::StorageError
            })?;
            info!(
                "Stored {} days of year: {} with {} overrides",
                days.len(),
                year,
                overrides.len()
            );
            report.refreshed_years.push(year);
            report.stored_days += days.len();
        }

        Ok(report)
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(RecalculateRemindersOnHolidaysRefreshed)]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_utils::setup_with_holidays;
    use chrono::prelude::*;
    use std::sync::Arc;
    use todo_reminder_domain::{HolidayCalendar, HolidayDay, HolidaySchedule};
    use todo_reminder_infra::IHolidayProvider;

    struct UnavailableProvider {}

    #[async_trait::async_trait]
    impl IHolidayProvider for UnavailableProvider {
        async fn fetch_year(&self, _year: i32) -> anyhow::Result<Vec<HolidayDay>> {
            Err(anyhow::Error::msg("Holiday api is down"))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[actix_web::main]
    #[test]
    async fn stores_current_and_next_year() {
        let now = Utc
            .with_ymd_and_hms(2023, 6, 1, 12, 0, 0)
            .unwrap()
            .timestamp_millis();
        let test = setup_with_holidays(
            now,
            vec![
                HolidayDay {
                    date: date(2023, 10, 2),
                    is_working_day: false,
                },
                HolidayDay {
                    date: date(2023, 10, 7),
                    is_working_day: true,
                },
            ],
        );

        let mut usecase = RefreshHolidaysUseCase {};
        let report = usecase.execute(&test.ctx).await.unwrap();
        assert_eq!(report.refreshed_years, vec![2023, 2024]);
        assert!(report.failed_years.is_empty());
        assert_eq!(report.stored_days, 365 + 366);

        let schedule = HolidaySchedule::new(
            test.ctx
                .repos
                .holidays
                .find_from(date(2023, 10, 1), 10)
                .await
                .unwrap(),
        );
        assert!(!schedule.is_working_day(date(2023, 10, 2)));
        assert!(schedule.is_working_day(date(2023, 10, 7)));
        assert_eq!(
            schedule.next_working_day_on_or_after(date(2023, 10, 1)),
            Some(date(2023, 10, 3))
        );
    }

    #[actix_web::main]
    #[test]
    async fn reports_unavailable_provider() {
        let mut test = setup_with_holidays(0, Vec::new());
        test.ctx.services.holiday_provider = Arc::new(UnavailableProvider {});

        let mut usecase = RefreshHolidaysUseCase {};
        let report = usecase.execute(&test.ctx).await.unwrap();
        assert!(report.refreshed_years.is_empty());
        assert_eq!(report.failed_years, vec![1970, 1971]);
        assert!(test
            .ctx
            .repos
            .holidays
            .find_from(date(1970, 1, 1), 10)
            .await
            .unwrap()
            .is_empty());
    }
}
