use super::{
    recalculate_reminders::RecalculateRemindersUseCase,
    refresh_holidays::{HolidayRefreshReport, RefreshHolidaysUseCase},
};
use crate::shared::usecase::{execute, Subscriber};
use todo_reminder_infra::TodoReminderContext;

pub struct RecalculateRemindersOnHolidaysRefreshed;

#[async_trait::async_trait(?Send)]
impl Subscriber<RefreshHolidaysUseCase> for RecalculateRemindersOnHolidaysRefreshed {
    async fn notify(&self, _e: &HolidayRefreshReport, ctx: &TodoReminderContext) {
        // Sideeffect, ignore result
        let _ = execute(RecalculateRemindersUseCase {}, ctx).await;
    }
}
