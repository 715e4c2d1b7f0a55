use crate::reminder::regenerate_occurrence::RegenerateOccurrenceUseCase;
use crate::shared::usecase::{execute, UseCase};
use todo_reminder_domain::OccurrenceOrigin;
use todo_reminder_infra::TodoReminderContext;
use tracing::{error, info};

/// Regenerates the missing pending occurrences of holiday calendar aware reminders.
/// Those reminders have no pending occurrence when the stored calendar did not reach
/// far enough when they were last scheduled.
#[derive(Debug)]
pub struct RecalculateRemindersUseCase {}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for RecalculateRemindersUseCase {
    /// Number of reminders that got a new pending occurrence
    type Response = usize;

    type Error = UseCaseError;

    const NAME: &'static str = "RecalculateReminders";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        let reminders = ctx
            .repos
            .reminders
            .find_calendar_aware()
            .await
            .map_err(|e| {
                error!("Unable to find calendar aware reminders. Error: {:?}", e);
                UseCaseError::StorageError
            })?;

        let mut regenerated = 0;
        for reminder in reminders {
            if ctx
                .repos
                .occurrences
                .find_pending_by_reminder(&reminder.id)
                .await
                .is_some()
            {
                continue;
            }

            let regenerate = RegenerateOccurrenceUseCase::successor(
                reminder.id,
                None,
                OccurrenceOrigin::Recalculated,
            );
            if let Ok(Some(_)) = execute(regenerate, ctx).await {
                regenerated += 1;
            }
        }
        info!("Recalculated {} calendar aware reminders", regenerated);

        Ok(regenerated)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::holiday::refresh_holidays::RefreshHolidaysUseCase;
    use crate::shared::test_utils::setup_with_holidays;
    use chrono::prelude::*;
    use todo_reminder_domain::{RecurrenceKind, RecurrenceRule, Reminder};

    #[actix_web::main]
    #[test]
    async fn refresh_schedules_reminders_that_had_no_next_date() {
        // Friday
        let now = Utc
            .with_ymd_and_hms(2023, 6, 2, 9, 0, 0)
            .unwrap()
            .timestamp_millis();
        let test = setup_with_holidays(now, Vec::new());
        let reminder = Reminder::new(
            "8".into(),
            "Submit timesheet".into(),
            RecurrenceRule::new(RecurrenceKind::NextWorkingDay, 1),
            now,
            now,
        );
        test.ctx.repos.reminders.insert(&reminder).await.unwrap();

        // No calendar stored yet
        assert_eq!(
            execute(RecalculateRemindersUseCase {}, &test.ctx)
                .await
                .unwrap(),
            0
        );

        // The refresh triggers the recalculation
        execute(RefreshHolidaysUseCase {}, &test.ctx).await.unwrap();
        let pending = test
            .ctx
            .repos
            .occurrences
            .find_pending_by_reminder(&reminder.id)
            .await
            .unwrap();
        assert_eq!(pending.due_ts, Some(now));
        assert_eq!(pending.origin, OccurrenceOrigin::Recalculated);

        // Reminders with a pending occurrence are left alone
        assert_eq!(
            execute(RecalculateRemindersUseCase {}, &test.ctx)
                .await
                .unwrap(),
            0
        );
    }
}
