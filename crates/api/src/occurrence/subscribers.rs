use super::{
    complete_occurrence::CompleteOccurrenceUseCase, delete_occurrence::DeleteOccurrenceUseCase,
};
use crate::reminder::regenerate_occurrence::RegenerateOccurrenceUseCase;
use crate::shared::usecase::{execute, Subscriber};
use todo_reminder_domain::{Occurrence, OccurrenceOrigin};
use todo_reminder_infra::TodoReminderContext;

pub struct RegenerateOnOccurrenceCompleted;

#[async_trait::async_trait(?Send)]
impl Subscriber<CompleteOccurrenceUseCase> for RegenerateOnOccurrenceCompleted {
    async fn notify(&self, e: &Occurrence, ctx: &TodoReminderContext) {
        let regenerate = RegenerateOccurrenceUseCase::successor(
            e.reminder_id,
            Some(e.id),
            OccurrenceOrigin::Completed,
        );

        // Sideeffect, ignore result
        let _ = execute(regenerate, ctx).await;
    }
}

pub struct RegenerateOnOccurrenceSkipped;

#[async_trait::async_trait(?Send)]
impl Subscriber<DeleteOccurrenceUseCase> for RegenerateOnOccurrenceSkipped {
    async fn notify(&self, e: &Occurrence, ctx: &TodoReminderContext) {
        let regenerate = RegenerateOccurrenceUseCase::successor(
            e.reminder_id,
            Some(e.id),
            OccurrenceOrigin::Skipped,
        );

        // Sideeffect, ignore result
        let _ = execute(regenerate, ctx).await;
    }
}
