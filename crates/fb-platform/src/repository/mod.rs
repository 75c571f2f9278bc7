//! Repository Layer
//!
//! Persistence for events and their venues. Every mutation of an existing
//! event is scoped by both event id and owning user.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Event, EventFilter, EventWithVenues, Venue};
use crate::error::Result;

pub use memory::InMemoryEventRepository;
pub use postgres::PostgresEventRepository;

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new event row.
    async fn insert_event(&self, event: &Event) -> Result<()>;

    /// Set or clear the poster URL. Returns false when no owned row matched.
    async fn update_poster_url(&self, id: Uuid, user_id: Uuid, poster_url: Option<&str>) -> Result<bool>;

    /// Insert a batch of venues atomically: either all rows land or none do.
    async fn insert_venues(&self, venues: &[Venue]) -> Result<()>;

    /// Delete an owned event and, by cascade, its venues. Returns false when
    /// no owned row matched.
    async fn delete_event(&self, id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EventWithVenues>>;

    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Event>>;

    /// Whether any event already shows this poster URL.
    async fn poster_url_in_use(&self, poster_url: &str) -> Result<bool>;

    /// Events matching the filter, ordered by date-time ascending.
    async fn list(&self, filter: &EventFilter) -> Result<Vec<EventWithVenues>>;
}
