use crate::shared::usecase::UseCase;
use todo_reminder_domain::{
    date::to_local, HolidaySchedule, Occurrence, OccurrenceOrigin, Reminder, ID,
};
use todo_reminder_infra::{OccurrenceRepoError, TodoReminderContext};
use tracing::{info, warn};

/// Number of stored calendar days loaded for resolving calendar aware recurrences
const HOLIDAY_WINDOW_DAYS: usize = 400;

/// Makes sure the `Reminder` has a pending `Occurrence` if it should have one.
///
/// The `Occurrence` is inserted before `last_fired_ts` is moved forward, so a
/// failure in between leaves an `Occurrence` that the next regeneration finds
/// and returns instead of a `Reminder` that skipped a due time.
#[derive(Debug)]
pub struct RegenerateOccurrenceUseCase {
    pub reminder_id: ID,
    /// First generation after the `Reminder` was created or edited
    pub is_first: bool,
    pub predecessor_id: Option<ID>,
    pub origin: OccurrenceOrigin,
}

impl RegenerateOccurrenceUseCase {
    pub fn first(reminder_id: ID, origin: OccurrenceOrigin) -> Self {
        Self {
            reminder_id,
            is_first: true,
            predecessor_id: None,
            origin,
        }
    }

    pub fn successor(reminder_id: ID, predecessor_id: Option<ID>, origin: OccurrenceOrigin) -> Self {
        Self {
            reminder_id,
            is_first: false,
            predecessor_id,
            origin,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    NoNextDate(ID),
    StorageError,
}

async fn load_holiday_schedule(
    reminder: &Reminder,
    ctx: &TodoReminderContext,
) -> Result<HolidaySchedule, UseCaseError> {
    if !reminder.recurrence.is_calendar_aware() {
        return Ok(HolidaySchedule::default());
    }
    let baseline_ts = reminder.last_fired_ts.unwrap_or(reminder.anchor_ts);
    let baseline = match to_local(baseline_ts, &ctx.config.timezone) {
        Some(local) => local.naive_local().date(),
        None => return Err(UseCaseError::NoNextDate(reminder.id)),
    };

    ctx.repos
        .holidays
        .find_from(baseline, HOLIDAY_WINDOW_DAYS)
        .await
        .map(HolidaySchedule::new)
        .map_err(|_| UseCaseError::StorageError)
}

#[async_trait::async_trait(?Send)]
impl UseCase for RegenerateOccurrenceUseCase {
    /// The pending `Occurrence` of the `Reminder` after regeneration
    type Response = Option<Occurrence>;

    type Error = UseCaseError;

    const NAME: &'static str = "RegenerateOccurrence";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        let reminder = match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) if !reminder.deleted => reminder,
            _ => return Err(UseCaseError::NotFound(self.reminder_id)),
        };

        if !self.is_first && !reminder.repeats() {
            return Ok(None);
        }

        if let Some(pending) = ctx
            .repos
            .occurrences
            .find_pending_by_reminder(&reminder.id)
            .await
        {
            return Ok(Some(pending));
        }

        let now = ctx.sys.get_timestamp_millis();
        let due_ts = if reminder.needs_reminder {
            let calendar = load_holiday_schedule(&reminder, ctx).await?;
            match reminder.recurrence.compute_next(
                reminder.anchor_ts,
                reminder.last_fired_ts,
                now,
                &ctx.config.timezone,
                &calendar,
            ) {
                Ok(due_ts) => Some(due_ts),
                Err(e) => {
                    warn!(
                        "Unable to schedule the next occurrence of reminder: {}. Error: {}",
                        reminder.id, e
                    );
                    return Err(UseCaseError::NoNextDate(reminder.id));
                }
            }
        } else {
            None
        };

        let occurrence =
            Occurrence::generate(&reminder, due_ts, self.predecessor_id, self.origin, now);
        match ctx.repos.occurrences.create_pending(&occurrence).await {
            Ok(()) => {}
            Err(OccurrenceRepoError::Conflict) => {
                info!(
                    "Reminder: {} already got a pending occurrence from a concurrent regeneration",
                    reminder.id
                );
                return Ok(ctx
                    .repos
                    .occurrences
                    .find_pending_by_reminder(&reminder.id)
                    .await);
            }
            Err(_) => return Err(UseCaseError::StorageError),
        }

        if let Some(due_ts) = due_ts {
            ctx.repos
                .reminders
                .advance_last_fired(&reminder.id, due_ts)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
        }

        Ok(Some(occurrence))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_utils::{setup, setup_with_holidays};
    use chrono::prelude::*;
    use futures::future::join_all;
    use todo_reminder_domain::{build_year, HolidayDay, RecurrenceKind, RecurrenceRule};

    const HOUR: i64 = 1000 * 60 * 60;
    const DAY: i64 = HOUR * 24;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    async fn insert_reminder(
        ctx: &TodoReminderContext,
        kind: RecurrenceKind,
        anchor_ts: i64,
    ) -> Reminder {
        let reminder = Reminder::new(
            "42".into(),
            "Water the plants".into(),
            RecurrenceRule::new(kind, 1),
            anchor_ts,
            0,
        );
        ctx.repos.reminders.insert(&reminder).await.unwrap();
        reminder
    }

    #[actix_web::main]
    #[test]
    async fn generates_first_occurrence_and_records_last_fired() {
        let now = ts(2023, 5, 1, 8);
        let test = setup(now);
        let reminder = insert_reminder(&test.ctx, RecurrenceKind::Daily, now + HOUR).await;

        let mut usecase = RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created);
        let occurrence = usecase.execute(&test.ctx).await.unwrap().unwrap();
        assert_eq!(occurrence.due_ts, Some(now + HOUR));
        assert_eq!(occurrence.origin, OccurrenceOrigin::Created);

        let reminder = test.ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert_eq!(reminder.last_fired_ts, Some(now + HOUR));

        // Running it again returns the existing pending occurrence
        let mut usecase = RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created);
        let again = usecase.execute(&test.ctx).await.unwrap().unwrap();
        assert_eq!(again.id, occurrence.id);
    }

    #[actix_web::main]
    #[test]
    async fn concurrent_regenerations_leave_a_single_pending_occurrence() {
        let now = ts(2023, 5, 1, 8);
        let test = setup(now);
        let reminder = insert_reminder(&test.ctx, RecurrenceKind::Weekly, now).await;

        let regenerations = (0..10).map(|_| {
            let ctx = test.ctx.clone();
            let reminder_id = reminder.id;
            async move {
                let mut usecase = RegenerateOccurrenceUseCase::successor(
                    reminder_id,
                    None,
                    OccurrenceOrigin::Recalculated,
                );
                usecase.execute(&ctx).await
            }
        });
        let results = join_all(regenerations).await;
        assert!(results.iter().all(|res| matches!(res, Ok(Some(_)))));

        let occurrences = test
            .ctx
            .repos
            .occurrences
            .find_by_reminder(&reminder.id)
            .await
            .unwrap();
        assert_eq!(occurrences.iter().filter(|o| o.is_pending()).count(), 1);
    }

    #[actix_web::main]
    #[test]
    async fn non_reminding_todo_gets_occurrence_without_due_time() {
        let test = setup(1000);
        let mut reminder = Reminder::new(
            "42".into(),
            "Read a book".into(),
            RecurrenceRule::new(RecurrenceKind::Daily, 1),
            0,
            0,
        );
        reminder.needs_reminder = false;
        test.ctx.repos.reminders.insert(&reminder).await.unwrap();

        let mut usecase = RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created);
        let occurrence = usecase.execute(&test.ctx).await.unwrap().unwrap();
        assert_eq!(occurrence.due_ts, None);
        assert!(!occurrence.needs_reminder);

        // Not repeating, so no successor is generated
        test.ctx
            .repos
            .occurrences
            .mark_completed(&occurrence.id, 2000)
            .await
            .unwrap();
        let mut usecase = RegenerateOccurrenceUseCase::successor(
            reminder.id,
            Some(occurrence.id),
            OccurrenceOrigin::Completed,
        );
        assert_eq!(usecase.execute(&test.ctx).await, Ok(None));
    }

    #[actix_web::main]
    #[test]
    async fn missing_calendar_data_gives_no_next_date() {
        let now = ts(2023, 1, 2, 8);
        let test = setup(now);
        let reminder = insert_reminder(&test.ctx, RecurrenceKind::NextWorkingDay, now).await;

        let mut usecase = RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created);
        assert_eq!(
            usecase.execute(&test.ctx).await,
            Err(UseCaseError::NoNextDate(reminder.id))
        );
        assert!(test
            .ctx
            .repos
            .occurrences
            .find_pending_by_reminder(&reminder.id)
            .await
            .is_none());
        let reminder = test.ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert_eq!(reminder.last_fired_ts, None);
    }

    #[actix_web::main]
    #[test]
    async fn resolves_next_working_day_from_stored_calendar() {
        // Friday 2023-01-20 09:00, the following Monday is a holiday
        let now = ts(2023, 1, 20, 9);
        let test = setup_with_holidays(now, Vec::new());
        let days = build_year(
            2023,
            &[HolidayDay {
                date: NaiveDate::from_ymd_opt(2023, 1, 23).unwrap(),
                is_working_day: false,
            }],
        );
        test.ctx.repos.holidays.upsert_many(&days).await.unwrap();
        let reminder = insert_reminder(&test.ctx, RecurrenceKind::NextWorkingDay, now).await;

        let mut usecase = RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created);
        let first = usecase.execute(&test.ctx).await.unwrap().unwrap();
        assert_eq!(first.due_ts, Some(now));

        test.ctx
            .repos
            .occurrences
            .mark_delivered(&first.id, now)
            .await
            .unwrap();
        let mut usecase = RegenerateOccurrenceUseCase::successor(
            reminder.id,
            Some(first.id),
            OccurrenceOrigin::Delivered,
        );
        let next = usecase.execute(&test.ctx).await.unwrap().unwrap();
        assert_eq!(next.due_ts, Some(ts(2023, 1, 24, 9)));
        assert_eq!(next.due_ts, Some(now + 4 * DAY));
        assert_eq!(next.predecessor_id, Some(first.id));
    }

    #[actix_web::main]
    #[test]
    async fn rejects_deleted_reminders() {
        let test = setup(0);
        let reminder = insert_reminder(&test.ctx, RecurrenceKind::Daily, 0).await;
        test.ctx.repos.reminders.delete(&reminder.id, 1).await.unwrap();

        let mut usecase = RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Edited);
        assert_eq!(
            usecase.execute(&test.ctx).await,
            Err(UseCaseError::NotFound(reminder.id))
        );
    }
}
