mod complete_occurrence;
mod delay_occurrence;
mod delete_occurrence;
pub mod dispatch_due_occurrences;
mod get_occurrence;
mod get_occurrences;
mod rollback_occurrence;
mod subscribers;

use actix_web::web;
use complete_occurrence::complete_occurrence_controller;
use delay_occurrence::delay_occurrence_controller;
use delete_occurrence::delete_occurrence_controller;
use get_occurrence::get_occurrence_controller;
use get_occurrences::get_occurrences_controller;
use rollback_occurrence::rollback_occurrence_controller;
use todo_reminder_domain::{Occurrence, ID};
use todo_reminder_infra::TodoReminderContext;

/// The non deleted `Occurrence` if it belongs to the user
async fn find_user_occurrence(
    occurrence_id: &ID,
    user_id: &str,
    ctx: &TodoReminderContext,
) -> Option<Occurrence> {
    match ctx.repos.occurrences.find(occurrence_id).await {
        Some(occurrence) if !occurrence.deleted && occurrence.user_id == user_id => {
            Some(occurrence)
        }
        _ => None,
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/occurrences", web::get().to(get_occurrences_controller));
    cfg.route(
        "/occurrences/{occurrence_id}",
        web::get().to(get_occurrence_controller),
    );
    cfg.route(
        "/occurrences/{occurrence_id}",
        web::delete().to(delete_occurrence_controller),
    );
    cfg.route(
        "/occurrences/{occurrence_id}/complete",
        web::post().to(complete_occurrence_controller),
    );
    cfg.route(
        "/occurrences/{occurrence_id}/rollback",
        web::post().to(rollback_occurrence_controller),
    );
    cfg.route(
        "/occurrences/{occurrence_id}/delay",
        web::post().to(delay_occurrence_controller),
    );
}
