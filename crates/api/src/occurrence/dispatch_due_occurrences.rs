use crate::reminder::regenerate_occurrence::RegenerateOccurrenceUseCase;
use crate::shared::usecase::{execute, UseCase};
use actix_web::rt::time::timeout;
use futures::{future::join_all, stream, StreamExt};
use std::time::Duration;
use todo_reminder_domain::{Occurrence, OccurrenceOrigin, ID};
use todo_reminder_infra::TodoReminderContext;
use tracing::{error, info, warn};

/// Delivers every due `Occurrence` and regenerates the reminders that repeat.
///
/// Deliveries that fail stay undelivered and are retried on the next run.
#[derive(Debug)]
pub struct DispatchDueOccurrencesUseCase {}

#[derive(Debug, Default, PartialEq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    pub regenerated: usize,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

/// Sends the text of the `Occurrence` followed by its attachments. Only a failed
/// text message counts as a failed delivery.
async fn deliver(occurrence: &Occurrence, ctx: &TodoReminderContext, now: i64) -> bool {
    let notifier = &ctx.services.notifier;
    let limit = Duration::from_millis(ctx.config.notifier_timeout_millis);

    match timeout(limit, notifier.send_text(&occurrence.user_id, &occurrence.content)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(
                "Failed to deliver occurrence: {} to user: {}. Error: {:?}",
                occurrence.id, occurrence.user_id, e
            );
            return false;
        }
        Err(_) => {
            warn!(
                "Timed out delivering occurrence: {} to user: {}",
                occurrence.id, occurrence.user_id
            );
            return false;
        }
    }

    for blob_ref in &occurrence.attachments {
        let url = match ctx.services.blob_store.signed_url(blob_ref, now) {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    "Unable to sign attachment: {} of occurrence: {}. Error: {:?}",
                    blob_ref, occurrence.id, e
                );
                continue;
            }
        };
        match timeout(limit, notifier.send_image(&occurrence.user_id, blob_ref, &url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                "Failed to send attachment: {} of occurrence: {}. Error: {:?}",
                blob_ref, occurrence.id, e
            ),
            Err(_) => warn!(
                "Timed out sending attachment: {} of occurrence: {}",
                blob_ref, occurrence.id
            ),
        }
    }

    true
}

#[async_trait::async_trait(?Send)]
impl UseCase for DispatchDueOccurrencesUseCase {
    type Response = DispatchReport;

    type Error = UseCaseError;

    const NAME: &'static str = "DispatchDueOccurrences";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let due = ctx
            .repos
            .occurrences
            .list_due_undelivered(now)
            .await
            .map_err(|e| {
                error!("Unable to list due occurrences. Error: {:?}", e);
                UseCaseError::StorageError
            })?;
        if due.is_empty() {
            return Ok(DispatchReport::default());
        }
        info!("Dispatching {} due occurrences", due.len());

        let concurrency = std::cmp::max(ctx.config.dispatch_concurrency, 1);
        let results = stream::iter(due.into_iter().map(|occurrence| async move {
            let delivered = deliver(&occurrence, ctx, now).await;
            (occurrence, delivered)
        }))
        .buffer_unordered(concurrency)
        .collect::<Vec<_>>()
        .await;

        let delivered_ids = results
            .iter()
            .filter(|(_, delivered)| *delivered)
            .map(|(occurrence, _)| occurrence.id)
            .collect::<Vec<ID>>();
        let failed = results.len() - delivered_ids.len();

        let marked = ctx
            .repos
            .occurrences
            .mark_many_delivered(&delivered_ids, now)
            .await
            .map_err(|e| {
                error!("Unable to mark occurrences as delivered. Error: {:?}", e);
                UseCaseError::StorageError
            })?;

        let regenerations = results
            .iter()
            .filter(|(occurrence, _)| {
                marked.contains(&occurrence.id) && occurrence.recurrence.is_repeatable()
            })
            .map(|(occurrence, _)| {
                let regenerate = RegenerateOccurrenceUseCase::successor(
                    occurrence.reminder_id,
                    Some(occurrence.id),
                    OccurrenceOrigin::Delivered,
                );
                execute(regenerate, ctx)
            });
        let regenerated = join_all(regenerations)
            .await
            .into_iter()
            .filter(|res| matches!(res, Ok(Some(_))))
            .count();

        let report = DispatchReport {
            delivered: marked.len(),
            failed,
            regenerated,
        };
        info!("Dispatch finished: {:?}", report);
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reminder::regenerate_occurrence::RegenerateOccurrenceUseCase;
    use crate::shared::test_utils::{setup, SentMessage, TestContext};
    use todo_reminder_domain::{RecurrenceKind, RecurrenceRule, Reminder};

    const HOUR: i64 = 1000 * 60 * 60;
    const DAY: i64 = HOUR * 24;
    const NOW: i64 = 1_700_000_000_000;

    async fn create_reminder(
        test: &TestContext,
        user_id: &str,
        kind: RecurrenceKind,
        anchor_ts: i64,
    ) -> Reminder {
        let reminder = Reminder::new(
            user_id.into(),
            "Drink water".into(),
            RecurrenceRule::new(kind, 1),
            anchor_ts,
            NOW,
        );
        test.ctx.repos.reminders.insert(&reminder).await.unwrap();
        execute(
            RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created),
            &test.ctx,
        )
        .await
        .unwrap();
        reminder
    }

    async fn occurrences_of(test: &TestContext, reminder: &Reminder) -> Vec<Occurrence> {
        let mut occurrences = test
            .ctx
            .repos
            .occurrences
            .find_by_reminder(&reminder.id)
            .await
            .unwrap();
        occurrences.sort_by_key(|o| o.due_ts);
        occurrences
    }

    async fn dispatch(test: &TestContext) -> DispatchReport {
        execute(DispatchDueOccurrencesUseCase {}, &test.ctx)
            .await
            .unwrap()
    }

    #[actix_web::main]
    #[test]
    async fn daily_reminder_is_delivered_and_regenerated_a_day_later() {
        let test = setup(NOW);
        let reminder = create_reminder(&test, "1", RecurrenceKind::Daily, NOW + HOUR).await;

        let occurrences = occurrences_of(&test, &reminder).await;
        assert_eq!(occurrences.len(), 1);
        assert!(occurrences[0].is_pending());
        assert_eq!(occurrences[0].due_ts, Some(NOW + HOUR));

        // Nothing is due yet
        assert_eq!(dispatch(&test).await, DispatchReport::default());

        test.sys.set_timestamp_millis(NOW + HOUR);
        let report = dispatch(&test).await;
        assert_eq!(
            report,
            DispatchReport {
                delivered: 1,
                failed: 0,
                regenerated: 1
            }
        );
        assert_eq!(test.notifier.texts(), vec!["Drink water".to_string()]);

        let occurrences = occurrences_of(&test, &reminder).await;
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences[0].delivered);
        assert_eq!(occurrences[0].delivered_ts, Some(NOW + HOUR));
        assert!(occurrences[1].is_pending());
        assert_eq!(occurrences[1].due_ts, Some(NOW + HOUR + DAY));
        assert_eq!(occurrences[1].predecessor_id, Some(occurrences[0].id));
        assert_eq!(occurrences[1].origin, OccurrenceOrigin::Delivered);

        // Delivering again is a no-op
        assert_eq!(dispatch(&test).await, DispatchReport::default());
        assert_eq!(test.notifier.texts().len(), 1);
    }

    #[actix_web::main]
    #[test]
    async fn single_reminder_generates_no_successor() {
        let test = setup(NOW);
        let reminder = create_reminder(&test, "1", RecurrenceKind::None, NOW).await;

        let report = dispatch(&test).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.regenerated, 0);

        let occurrences = occurrences_of(&test, &reminder).await;
        assert_eq!(occurrences.len(), 1);
        assert!(occurrences[0].delivered);
        assert!(!occurrences[0].completed);
    }

    #[actix_web::main]
    #[test]
    async fn failed_deliveries_are_retried_on_the_next_run() {
        let test = setup(NOW);
        let failing = create_reminder(&test, "1", RecurrenceKind::Daily, NOW).await;
        let working = create_reminder(&test, "2", RecurrenceKind::Daily, NOW).await;
        test.notifier.fail_for("1");

        let report = dispatch(&test).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);

        let occurrences = occurrences_of(&test, &failing).await;
        assert_eq!(occurrences.len(), 1);
        assert!(occurrences[0].is_pending());
        assert_eq!(occurrences_of(&test, &working).await.len(), 2);

        test.notifier.failing_users.lock().unwrap().clear();
        let report = dispatch(&test).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(occurrences_of(&test, &failing).await.len(), 2);
    }

    #[actix_web::main]
    #[test]
    async fn stuck_notifier_call_does_not_block_other_deliveries() {
        let mut test = setup(NOW);
        test.ctx.config.notifier_timeout_millis = 50;
        let stuck = create_reminder(&test, "1", RecurrenceKind::Daily, NOW).await;
        let working = create_reminder(&test, "2", RecurrenceKind::Daily, NOW).await;
        test.notifier.stall_for("1");

        let report = dispatch(&test).await;
        assert_eq!(
            report,
            DispatchReport {
                delivered: 1,
                failed: 1,
                regenerated: 1
            }
        );
        assert_eq!(test.notifier.texts(), vec!["Drink water".to_string()]);

        let occurrences = occurrences_of(&test, &stuck).await;
        assert_eq!(occurrences.len(), 1);
        assert!(!occurrences[0].delivered);
        assert!(occurrences[0].is_pending());
        let occurrences = occurrences_of(&test, &working).await;
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences[0].delivered);
    }

    #[actix_web::main]
    #[test]
    async fn sends_attachments_after_the_text() {
        let test = setup(NOW);
        let mut reminder = Reminder::new(
            "1".into(),
            "Pay the bill".into(),
            Default::default(),
            NOW,
            NOW,
        );
        reminder.attachments = vec!["bill.png".into(), "".into()];
        test.ctx.repos.reminders.insert(&reminder).await.unwrap();
        execute(
            RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created),
            &test.ctx,
        )
        .await
        .unwrap();

        // The empty blob reference can not be signed and is skipped
        let report = dispatch(&test).await;
        assert_eq!(report.delivered, 1);
        let sent = test.notifier.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![
                SentMessage::Text {
                    user_id: "1".into(),
                    text: "Pay the bill".into()
                },
                SentMessage::Image {
                    user_id: "1".into(),
                    blob_ref: "bill.png".into()
                }
            ]
        );
    }

    #[actix_web::main]
    #[test]
    async fn skips_todos_that_do_not_need_a_reminder() {
        let test = setup(NOW);
        let mut reminder = Reminder::new(
            "1".into(),
            "Someday".into(),
            Default::default(),
            NOW - DAY,
            NOW,
        );
        reminder.needs_reminder = false;
        test.ctx.repos.reminders.insert(&reminder).await.unwrap();
        execute(
            RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created),
            &test.ctx,
        )
        .await
        .unwrap();

        assert_eq!(dispatch(&test).await, DispatchReport::default());
        assert!(test.notifier.texts().is_empty());
    }
}
