pub mod auth;
#[cfg(test)]
pub mod test_utils;
pub mod usecase;

use todo_reminder_api_structs::dtos::OccurrenceDTO;
use todo_reminder_domain::Occurrence;
use todo_reminder_infra::TodoReminderContext;
use tracing::warn;

/// Converts the `Occurrence` to its api representation with signed attachment urls.
/// Attachments that can not be signed are returned without an url.
pub fn occurrence_dto(occurrence: Occurrence, ctx: &TodoReminderContext) -> OccurrenceDTO {
    let now = ctx.sys.get_timestamp_millis();
    OccurrenceDTO::new(occurrence, |blob_ref| {
        match ctx.services.blob_store.signed_url(blob_ref, now) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(
                    "Unable to sign the url of attachment: {}. Error: {:?}",
                    blob_ref, e
                );
                None
            }
        }
    })
}
