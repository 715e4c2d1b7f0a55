mod create_reminder;
mod delete_reminder;
mod get_reminder;
pub mod regenerate_occurrence;
mod search_reminders;
mod update_reminder;

use crate::shared::occurrence_dto;
use actix_web::web;
use create_reminder::create_reminder_controller;
use delete_reminder::delete_reminder_controller;
use get_reminder::get_reminder_controller;
use search_reminders::search_reminders_controller;
use todo_reminder_api_structs::{dtos::ReminderDTO, ReminderResponse};
use todo_reminder_domain::{Occurrence, Reminder};
use todo_reminder_infra::TodoReminderContext;
use update_reminder::update_reminder_controller;

/// A `Reminder` together with its pending `Occurrence`
#[derive(Debug)]
pub struct ReminderWithOccurrence {
    pub reminder: Reminder,
    pub pending_occurrence: Option<Occurrence>,
}

impl ReminderWithOccurrence {
    fn into_response(self, ctx: &TodoReminderContext) -> ReminderResponse {
        ReminderResponse {
            reminder: ReminderDTO::new(self.reminder),
            pending_occurrence: self
                .pending_occurrence
                .map(|occurrence| occurrence_dto(occurrence, ctx)),
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/reminders", web::post().to(create_reminder_controller));
    cfg.route(
        "/reminders/search",
        web::post().to(search_reminders_controller),
    );
    cfg.route(
        "/reminders/{reminder_id}",
        web::get().to(get_reminder_controller),
    );
    cfg.route(
        "/reminders/{reminder_id}",
        web::put().to(update_reminder_controller),
    );
    cfg.route(
        "/reminders/{reminder_id}",
        web::delete().to(delete_reminder_controller),
    );
}
