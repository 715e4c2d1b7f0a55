use super::{find_user_occurrence, subscribers::RegenerateOnOccurrenceSkipped};
use crate::error::TodoReminderError;
use crate::shared::{
    auth::protect_route,
    occurrence_dto,
    usecase::{execute, Subscriber, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use todo_reminder_api_structs::delete_occurrence::*;
use todo_reminder_domain::{Occurrence, ID};
use todo_reminder_infra::{OccurrenceRepoError, TodoReminderContext};

fn handle_error(e: UseCaseError) -> TodoReminderError {
    match e {
        UseCaseError::NotFound(occurrence_id) => TodoReminderError::NotFound(format!(
            "The occurrence with id: {}, was not found.",
            occurrence_id
        )),
        UseCaseError::StorageError => TodoReminderError::InternalError,
    }
}

pub async fn delete_occurrence_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<TodoReminderContext>,
) -> Result<HttpResponse, TodoReminderError> {
    let user_id = protect_route(&http_req)?;

    let usecase = DeleteOccurrenceUseCase {
        user_id,
        occurrence_id: path_params.occurrence_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|occurrence| {
            HttpResponse::Ok().json(APIResponse {
                occurrence: occurrence_dto(occurrence, &ctx),
            })
        })
        .map_err(handle_error)
}

/// Skips a single `Occurrence`. Repeating reminders get their next one generated.
#[derive(Debug)]
pub struct DeleteOccurrenceUseCase {
    pub user_id: String,
    pub occurrence_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteOccurrenceUseCase {
    type Response = Occurrence;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteOccurrence";

    async fn execute(&mut self, ctx: &TodoReminderContext) -> Result<Self::Response, Self::Error> {
        if find_user_occurrence(&self.occurrence_id, &self.user_id, ctx)
            .await
            .is_none()
        {
            return Err(UseCaseError::NotFound(self.occurrence_id));
        }

        let now = ctx.sys.get_timestamp_millis();
        ctx.repos
            .occurrences
            .delete(&self.occurrence_id, now)
            .await
            .map_err(|e| match e {
                OccurrenceRepoError::NotFound => UseCaseError::NotFound(self.occurrence_id),
                _ => UseCaseError::StorageError,
            })
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(RegenerateOnOccurrenceSkipped)]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reminder::regenerate_occurrence::RegenerateOccurrenceUseCase;
    use crate::shared::test_utils::setup;
    use todo_reminder_domain::{OccurrenceOrigin, RecurrenceKind, RecurrenceRule, Reminder};

    const WEEK: i64 = 1000 * 60 * 60 * 24 * 7;

    async fn first_occurrence(ctx: &TodoReminderContext, kind: RecurrenceKind) -> Occurrence {
        let reminder = Reminder::new(
            "6".into(),
            "Clean the kitchen".into(),
            RecurrenceRule::new(kind, 1),
            WEEK,
            0,
        );
        ctx.repos.reminders.insert(&reminder).await.unwrap();
        execute(
            RegenerateOccurrenceUseCase::first(reminder.id, OccurrenceOrigin::Created),
            ctx,
        )
        .await
        .unwrap()
        .unwrap()
    }

    #[actix_web::main]
    #[test]
    async fn skipping_repeating_occurrence_schedules_the_next_one() {
        let test = setup(0);
        let first = first_occurrence(&test.ctx, RecurrenceKind::Weekly).await;

        let usecase = DeleteOccurrenceUseCase {
            user_id: "6".into(),
            occurrence_id: first.id,
        };
        let skipped = execute(usecase, &test.ctx).await.unwrap();
        assert!(skipped.deleted);

        let next = test
            .ctx
            .repos
            .occurrences
            .find_pending_by_reminder(&first.reminder_id)
            .await
            .unwrap();
        assert_eq!(next.due_ts, Some(2 * WEEK));
        assert_eq!(next.origin, OccurrenceOrigin::Skipped);
        assert_eq!(next.predecessor_id, Some(first.id));
    }

    #[actix_web::main]
    #[test]
    async fn skipping_single_occurrence_leaves_nothing_pending() {
        let test = setup(0);
        let first = first_occurrence(&test.ctx, RecurrenceKind::None).await;

        let usecase = DeleteOccurrenceUseCase {
            user_id: "6".into(),
            occurrence_id: first.id,
        };
        execute(usecase, &test.ctx).await.unwrap();
        assert!(test
            .ctx
            .repos
            .occurrences
            .find_pending_by_reminder(&first.reminder_id)
            .await
            .is_none());

        let usecase = DeleteOccurrenceUseCase {
            user_id: "6".into(),
            occurrence_id: first.id,
        };
        assert!(matches!(
            execute(usecase, &test.ctx).await,
            Err(UseCaseError::NotFound(_))
        ));
    }
}
