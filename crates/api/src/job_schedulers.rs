use crate::{
    holiday::refresh_holidays::RefreshHolidaysUseCase,
    occurrence::dispatch_due_occurrences::DispatchDueOccurrencesUseCase,
    shared::usecase::execute,
};
use actix_web::rt::time::{interval, sleep_until, Instant};
use std::time::Duration;
use todo_reminder_infra::TodoReminderContext;
use tracing::{error, info};

pub fn get_start_delay(now_ts: usize, secs_before_min: usize) -> usize {
    let secs_to_next_minute = 60 - (now_ts / 1000) % 60;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

/// Refreshes the holiday calendar at startup and then periodically
pub fn start_holiday_refresh_job(ctx: TodoReminderContext) {
    actix_web::rt::spawn(async move {
        let period = Duration::from_secs(std::cmp::max(ctx.config.holiday_refresh_interval_secs, 1));
        let mut refresh_interval = interval(period);
        loop {
            refresh_interval.tick().await;
            let context = ctx.clone();
            if let Err(e) = actix_web::rt::spawn(refresh_holidays(context)).await {
                error!("Holiday refresh job panicked: {:?}", e);
            }
        }
    });
}

/// Dispatches due occurrences at a fixed interval, starting at the next whole minute.
/// A run is awaited before the next one starts and a panicking run does not stop the job.
pub fn start_dispatch_job(ctx: TodoReminderContext) {
    actix_web::rt::spawn(async move {
        let now = ctx.sys.get_timestamp_millis();
        let secs_to_next_run = get_start_delay(now as usize, 0);
        let start = Instant::now() + Duration::from_secs(secs_to_next_run as u64);
        info!(
            "Dispatching due occurrences every {} seconds, starting in {} seconds",
            ctx.config.dispatch_interval_secs, secs_to_next_run
        );

        sleep_until(start).await;
        let period = Duration::from_secs(std::cmp::max(ctx.config.dispatch_interval_secs, 1));
        let mut dispatch_interval = interval(period);
        loop {
            dispatch_interval.tick().await;
            let context = ctx.clone();
            if let Err(e) = actix_web::rt::spawn(dispatch_due_occurrences(context)).await {
                error!("Dispatch job panicked: {:?}", e);
            }
        }
    });
}

async fn dispatch_due_occurrences(context: TodoReminderContext) {
    let usecase = DispatchDueOccurrencesUseCase {};
    // Errors are logged by the usecase executor
    let _ = execute(usecase, &context).await;
}

async fn refresh_holidays(context: TodoReminderContext) {
    let usecase = RefreshHolidaysUseCase {};
    let _ = execute(usecase, &context).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_delay_works() {
        assert_eq!(get_start_delay(50 * 1000, 5), 5);
        assert_eq!(get_start_delay(50 * 1000, 10), 60);
        assert_eq!(get_start_delay(50 * 1000, 15), 55);
        assert_eq!(get_start_delay(60 * 1000, 60), 60);
        assert_eq!(get_start_delay(60 * 1000, 10), 50);
        assert_eq!(get_start_delay(59 * 1000, 0), 1);
        assert_eq!(get_start_delay(59 * 1000, 1), 60);
    }
}
