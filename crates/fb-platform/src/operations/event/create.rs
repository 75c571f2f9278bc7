//! Create Event Use Case

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::domain::{
    normalize_content_type, poster_extension, poster_key, Event, NewVenue, PosterInput,
    PosterPolicy, PosterUploadMode, SportType, StoredPosterRef, Venue, EVENT_DESCRIPTION_MAX_CHARS,
    EVENT_NAME_MAX_CHARS,
};
use crate::error::{PlatformError, Result};
use crate::operations::ExecutionContext;
use crate::repository::EventRepository;
use crate::storage::PosterStorage;

/// Command for creating an event with its venues and optional poster
#[derive(Debug, Clone)]
pub struct CreateEventCommand {
    pub name: String,
    pub sport_type: SportType,
    pub date_time: DateTime<Utc>,
    pub description: Option<String>,
    pub poster: Option<PosterInput>,
    pub venues: Vec<NewVenue>,
}

impl CreateEventCommand {
    pub fn new(name: impl Into<String>, sport_type: SportType, date_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            sport_type,
            date_time,
            description: None,
            poster: None,
            venues: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_poster(mut self, poster: PosterInput) -> Self {
        self.poster = Some(poster);
        self
    }

    pub fn with_venue(mut self, venue: NewVenue) -> Self {
        self.venues.push(venue);
        self
    }

    /// Field rules checked before anything is written.
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PlatformError::validation("Event name is required"));
        }
        if name.chars().count() > EVENT_NAME_MAX_CHARS {
            return Err(PlatformError::validation("Event name is too long"));
        }
        if self
            .description
            .as_ref()
            .is_some_and(|d| d.chars().count() > EVENT_DESCRIPTION_MAX_CHARS)
        {
            return Err(PlatformError::validation("Description is too long"));
        }
        if self.venues.is_empty() {
            return Err(PlatformError::validation("At least one venue is required"));
        }
        for venue in &self.venues {
            if venue.name.trim().is_empty() {
                return Err(PlatformError::validation("Venue name is required"));
            }
            if venue.capacity.is_some_and(|c| c < 0) {
                return Err(PlatformError::validation("Venue capacity cannot be negative"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateEventConfig {
    pub upload_mode: PosterUploadMode,
    pub poster_policy: PosterPolicy,
}

/// Result of a successful creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub id: Uuid,

    /// Public URL of the attached poster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,

    /// Set when the poster could not be stored or attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Poster object that made it into storage
struct StoredPoster {
    key: String,
    url: String,
}

/// Creates an event, stores and attaches its poster, then inserts venues.
///
/// Steps run strictly in sequence. A failed venue insert rolls back the
/// event row and the stored poster. A poster that cannot be uploaded or
/// attached downgrades to a warning; the event is kept without a poster.
/// A poster rejected by the policy fails the call but leaves the event row
/// in place, since the row is written before the poster is inspected.
pub struct CreateEventUseCase {
    events: Arc<dyn EventRepository>,
    storage: Arc<dyn PosterStorage>,
    config: CreateEventConfig,
}

impl CreateEventUseCase {
    pub fn new(
        events: Arc<dyn EventRepository>,
        storage: Arc<dyn PosterStorage>,
        config: CreateEventConfig,
    ) -> Self {
        Self { events, storage, config }
    }

    pub fn config(&self) -> &CreateEventConfig {
        &self.config
    }

    pub async fn execute(&self, command: CreateEventCommand, ctx: &ExecutionContext) -> Result<CreatedEvent> {
        let user = ctx.require_user("You must be logged in to create events")?;
        command.validate()?;

        let CreateEventCommand {
            name,
            sport_type,
            date_time,
            description,
            poster,
            venues,
        } = command;

        let event = Event::new(user.id, name.trim(), sport_type, date_time).with_description(description);

        if let Err(e) = self.events.insert_event(&event).await {
            error!(execution_id = %ctx.execution_id, error = %e, "Failed to insert event");
            return Err(PlatformError::create_failed(e.to_string()));
        }
        info!(
            execution_id = %ctx.execution_id,
            event_id = %event.id,
            user_id = %user.id,
            "Event created"
        );

        let mut stored: Option<StoredPoster> = None;
        let mut warning: Option<String> = None;

        if let Some(poster) = poster {
            let checked = match self.check_poster(poster, user.id).await {
                Ok(poster) => Some(poster),
                Err(e @ PlatformError::InvalidPoster { .. }) => {
                    warn!(
                        execution_id = %ctx.execution_id,
                        event_id = %event.id,
                        error = %e,
                        "Poster rejected; event kept without poster"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        execution_id = %ctx.execution_id,
                        event_id = %event.id,
                        error = %e,
                        "Poster could not be inspected; continuing without poster"
                    );
                    warning = Some(e.to_string());
                    None
                }
            };

            if let Some(poster) = checked {
                match self.store_poster(poster, user.id, event.id).await {
                    Ok(poster) => match self.attach_poster(&event, &poster, ctx).await {
                        Ok(()) => stored = Some(poster),
                        Err(e) => warning = Some(e.to_string()),
                    },
                    Err(e) => {
                        warn!(
                            execution_id = %ctx.execution_id,
                            event_id = %event.id,
                            error = %e,
                            "Poster upload failed; continuing without poster"
                        );
                        warning = Some(e.to_string());
                    }
                }
            }
        }

        let venues: Vec<Venue> = venues.into_iter().map(|v| Venue::new(event.id, v)).collect();
        if let Err(e) = self.events.insert_venues(&venues).await {
            error!(
                execution_id = %ctx.execution_id,
                event_id = %event.id,
                error = %e,
                "Failed to insert venues; rolling back event"
            );
            self.roll_back(&event, stored.as_ref(), ctx).await;
            return Err(PlatformError::venues_failed(e.to_string()));
        }

        info!(
            execution_id = %ctx.execution_id,
            event_id = %event.id,
            venues = venues.len(),
            has_poster = stored.is_some(),
            "Event creation completed"
        );

        Ok(CreatedEvent {
            id: event.id,
            poster_url: stored.map(|p| p.url),
            warning,
        })
    }

    /// Apply the poster policy. Client-uploaded objects are checked against
    /// what storage reports, not what the request claims, and may back only
    /// one event.
    async fn check_poster(&self, poster: PosterInput, owner: Uuid) -> Result<PosterInput> {
        let policy = &self.config.poster_policy;
        let mode = self.config.upload_mode;
        policy.validate(&poster, mode, owner)?;

        let PosterInput::Stored(reference) = poster else {
            return Ok(poster);
        };

        let info = self
            .storage
            .object_info(&reference.key)
            .await
            .map_err(|e| PlatformError::upload_failed(format!("could not inspect poster: {}", e)))?
            .ok_or_else(|| PlatformError::invalid_poster("Poster image was not found in storage"))?;

        let in_use = self
            .events
            .poster_url_in_use(&self.storage.public_url(&reference.key))
            .await
            .map_err(|e| PlatformError::upload_failed(format!("could not inspect poster: {}", e)))?;
        if in_use {
            return Err(PlatformError::invalid_poster("Poster image is already used by another event"));
        }

        let actual = PosterInput::Stored(StoredPosterRef {
            key: reference.key,
            content_type: info.content_type,
            size: info.size,
        });
        policy.validate(&actual, mode, owner)?;
        Ok(actual)
    }

    /// Put the poster into storage, or resolve the client-uploaded object.
    async fn store_poster(&self, poster: PosterInput, owner: Uuid, event_id: Uuid) -> Result<StoredPoster> {
        match poster {
            PosterInput::Upload(upload) => {
                let extension = poster_extension(&upload.file_name, &upload.content_type);
                let key = poster_key(owner, event_id, &extension, Utc::now().timestamp_millis());
                let content_type = normalize_content_type(&upload.content_type);
                let url = self
                    .storage
                    .upload(&key, upload.bytes, &content_type)
                    .await
                    .map_err(|e| PlatformError::upload_failed(e.to_string()))?;
                Ok(StoredPoster { key, url })
            }
            PosterInput::Stored(reference) => {
                let url = self.storage.public_url(&reference.key);
                Ok(StoredPoster { key: reference.key, url })
            }
        }
    }

    async fn attach_poster(&self, event: &Event, poster: &StoredPoster, ctx: &ExecutionContext) -> Result<()> {
        let outcome = self
            .events
            .update_poster_url(event.id, event.user_id, Some(&poster.url))
            .await;

        let failure = match outcome {
            Ok(true) => return Ok(()),
            Ok(false) => PlatformError::not_found("Event", event.id.to_string()),
            Err(e) => e,
        };

        warn!(
            execution_id = %ctx.execution_id,
            event_id = %event.id,
            error = %failure,
            "Could not attach poster; removing stored object"
        );
        self.remove_poster(&poster.key, ctx).await;
        Err(PlatformError::upload_failed(format!("could not attach poster: {}", failure)))
    }

    async fn roll_back(&self, event: &Event, poster: Option<&StoredPoster>, ctx: &ExecutionContext) {
        match self.events.delete_event(event.id, event.user_id).await {
            Ok(true) => info!(execution_id = %ctx.execution_id, event_id = %event.id, "Rolled back event"),
            Ok(false) => warn!(
                execution_id = %ctx.execution_id,
                event_id = %event.id,
                "Rollback found no event row to delete"
            ),
            Err(e) => error!(
                execution_id = %ctx.execution_id,
                event_id = %event.id,
                error = %e,
                "Rollback of event failed; row left orphaned"
            ),
        }

        if let Some(poster) = poster {
            self.remove_poster(&poster.key, ctx).await;
        }
    }

    async fn remove_poster(&self, key: &str, ctx: &ExecutionContext) {
        if let Err(e) = self.storage.delete(key).await {
            error!(
                execution_id = %ctx.execution_id,
                key = %key,
                error = %e,
                "Failed to delete poster object"
            );
        }
    }
}
