//! Delete Event Use Case

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{PlatformError, Result};
use crate::operations::ExecutionContext;
use crate::repository::EventRepository;
use crate::storage::{poster_key_from_url, PosterStorage};

/// Deletes an owned event, its venues (by cascade) and its poster object.
pub struct DeleteEventUseCase {
    events: Arc<dyn EventRepository>,
    storage: Arc<dyn PosterStorage>,
}

impl DeleteEventUseCase {
    pub fn new(events: Arc<dyn EventRepository>, storage: Arc<dyn PosterStorage>) -> Self {
        Self { events, storage }
    }

    pub async fn execute(&self, event_id: Uuid, ctx: &ExecutionContext) -> Result<()> {
        let user = ctx.require_user("You must be logged in to delete events")?;

        // Foreign and missing events look the same to the caller
        let event = self
            .events
            .find_owned(event_id, user.id)
            .await?
            .ok_or_else(|| PlatformError::delete_failed("Event not found"))?;

        if !self.events.delete_event(event_id, user.id).await? {
            return Err(PlatformError::delete_failed("Event not found"));
        }
        info!(execution_id = %ctx.execution_id, event_id = %event_id, "Event deleted");

        if let Some(url) = event.poster_url.as_deref() {
            match poster_key_from_url(url) {
                Some(key) => {
                    if let Err(e) = self.storage.delete(&key).await {
                        warn!(
                            execution_id = %ctx.execution_id,
                            event_id = %event_id,
                            key = %key,
                            error = %e,
                            "Event deleted but poster object remains"
                        );
                    }
                }
                None => warn!(
                    execution_id = %ctx.execution_id,
                    event_id = %event_id,
                    poster_url = %url,
                    "Poster URL has no recognizable object key"
                ),
            }
        }

        Ok(())
    }
}
