//! In-memory Event Repository
//!
//! Backs development mode and tests. Enforces the same constraints as the
//! PostgreSQL schema (foreign key, cascade, non-empty venue names) and can be
//! told to fail individual operations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::domain::{Event, EventFilter, EventWithVenues, Venue};
use crate::error::{PlatformError, Result};
use crate::repository::EventRepository;

/// Operation that can be forced to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    InsertEvent,
    UpdatePosterUrl,
    InsertVenues,
    DeleteEvent,
}

#[derive(Default)]
struct Tables {
    events: HashMap<Uuid, Event>,
    venues: Vec<Venue>,
}

impl Tables {
    fn with_venues(&self, event: &Event) -> EventWithVenues {
        EventWithVenues {
            event: event.clone(),
            venues: self
                .venues
                .iter()
                .filter(|v| v.event_id == event.id)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Default)]
pub struct InMemoryEventRepository {
    tables: RwLock<Tables>,
    failing: Mutex<HashSet<RepositoryOperation>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `operation` fail until cleared.
    pub fn fail_on(&self, operation: RepositoryOperation) {
        self.failing.lock().insert(operation);
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    pub fn event_count(&self) -> usize {
        self.tables.read().events.len()
    }

    pub fn venue_count(&self) -> usize {
        self.tables.read().venues.len()
    }

    fn check(&self, operation: RepositoryOperation) -> Result<()> {
        if self.failing.lock().contains(&operation) {
            return Err(PlatformError::internal(format!("injected {:?} failure", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        self.check(RepositoryOperation::InsertEvent)?;
        let mut tables = self.tables.write();
        if tables.events.contains_key(&event.id) {
            return Err(PlatformError::duplicate("Event", "id", event.id.to_string()));
        }
        tables.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn update_poster_url(&self, id: Uuid, user_id: Uuid, poster_url: Option<&str>) -> Result<bool> {
        self.check(RepositoryOperation::UpdatePosterUrl)?;
        let mut tables = self.tables.write();
        match tables.events.get_mut(&id) {
            Some(event) if event.is_owned_by(user_id) => {
                event.poster_url = poster_url.map(str::to_string);
                event.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_venues(&self, venues: &[Venue]) -> Result<()> {
        self.check(RepositoryOperation::InsertVenues)?;
        let mut tables = self.tables.write();

        // Validate the whole batch before touching the table
        for venue in venues {
            if !tables.events.contains_key(&venue.event_id) {
                return Err(PlatformError::validation(format!(
                    "venue references unknown event {}",
                    venue.event_id
                )));
            }
            if venue.name.trim().is_empty() {
                return Err(PlatformError::validation("venue name must not be empty"));
            }
            if venue.capacity.is_some_and(|c| c < 0) {
                return Err(PlatformError::validation("venue capacity must not be negative"));
            }
        }

        tables.venues.extend(venues.iter().cloned());
        Ok(())
    }

    async fn delete_event(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        self.check(RepositoryOperation::DeleteEvent)?;
        let mut tables = self.tables.write();
        let owned = tables.events.get(&id).is_some_and(|e| e.is_owned_by(user_id));
        if !owned {
            return Ok(false);
        }
        tables.events.remove(&id);
        tables.venues.retain(|v| v.event_id != id);
        Ok(true)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EventWithVenues>> {
        let tables = self.tables.read();
        Ok(tables.events.get(&id).map(|e| tables.with_venues(e)))
    }

    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Event>> {
        let tables = self.tables.read();
        Ok(tables.events.get(&id).filter(|e| e.is_owned_by(user_id)).cloned())
    }

    async fn poster_url_in_use(&self, poster_url: &str) -> Result<bool> {
        let tables = self.tables.read();
        Ok(tables
            .events
            .values()
            .any(|e| e.poster_url.as_deref() == Some(poster_url)))
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<EventWithVenues>> {
        let tables = self.tables.read();
        let mut events: Vec<&Event> = tables.events.values().filter(|e| filter.matches(e)).collect();
        events.sort_by(|a, b| a.date_time.cmp(&b.date_time).then(a.created_at.cmp(&b.created_at)));
        Ok(events.into_iter().map(|e| tables.with_venues(e)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewVenue, SportType};
    use chrono::{Duration, TimeZone};

    fn event_for(user: Uuid, name: &str, sport: SportType, day: u32) -> Event {
        let at = Utc.with_ymd_and_hms(2026, 5, day, 18, 0, 0).unwrap();
        Event::new(user, name, sport, at)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryEventRepository::new();
        let user = Uuid::new_v4();
        let event = event_for(user, "5v5 Run", SportType::Basketball, 1);
        repo.insert_event(&event).await.unwrap();
        repo.insert_venues(&[Venue::new(event.id, NewVenue::new("Court A"))]).await.unwrap();

        let found = repo.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(found.event, event);
        assert_eq!(found.venues.len(), 1);
    }

    #[tokio::test]
    async fn test_venue_batch_is_atomic() {
        let repo = InMemoryEventRepository::new();
        let event = event_for(Uuid::new_v4(), "Match", SportType::Soccer, 2);
        repo.insert_event(&event).await.unwrap();

        let batch = vec![
            Venue::new(event.id, NewVenue::new("Field 1")),
            Venue::new(event.id, NewVenue::new("  ")),
        ];
        assert!(repo.insert_venues(&batch).await.is_err());
        assert_eq!(repo.venue_count(), 0);
    }

    #[tokio::test]
    async fn test_venue_requires_parent_event() {
        let repo = InMemoryEventRepository::new();
        let orphan = Venue::new(Uuid::new_v4(), NewVenue::new("Court A"));
        assert!(repo.insert_venues(&[orphan]).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped_and_cascades() {
        let repo = InMemoryEventRepository::new();
        let owner = Uuid::new_v4();
        let event = event_for(owner, "Match", SportType::Soccer, 3);
        repo.insert_event(&event).await.unwrap();
        repo.insert_venues(&[Venue::new(event.id, NewVenue::new("Field 1"))]).await.unwrap();

        assert!(!repo.delete_event(event.id, Uuid::new_v4()).await.unwrap());
        assert_eq!(repo.event_count(), 1);

        assert!(repo.delete_event(event.id, owner).await.unwrap());
        assert_eq!(repo.event_count(), 0);
        assert_eq!(repo.venue_count(), 0);
    }

    #[tokio::test]
    async fn test_update_poster_is_owner_scoped() {
        let repo = InMemoryEventRepository::new();
        let owner = Uuid::new_v4();
        let event = event_for(owner, "Match", SportType::Soccer, 3);
        repo.insert_event(&event).await.unwrap();

        assert!(!repo.update_poster_url(event.id, Uuid::new_v4(), Some("http://x/a.png")).await.unwrap());
        assert!(repo.update_poster_url(event.id, owner, Some("http://x/a.png")).await.unwrap());
        let stored = repo.find_owned(event.id, owner).await.unwrap().unwrap();
        assert_eq!(stored.poster_url.as_deref(), Some("http://x/a.png"));

        assert!(repo.poster_url_in_use("http://x/a.png").await.unwrap());
        assert!(!repo.poster_url_in_use("http://x/b.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_sorted_and_filtered() {
        let repo = InMemoryEventRepository::new();
        let user = Uuid::new_v4();
        let late = event_for(user, "Evening Run", SportType::Basketball, 20);
        let early = event_for(user, "Morning run", SportType::Basketball, 10);
        let tennis = event_for(user, "Doubles", SportType::Tennis, 15);
        for e in [&late, &early, &tennis] {
            repo.insert_event(e).await.unwrap();
        }

        let all = repo.list(&EventFilter::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|e| e.event.name.as_str()).collect();
        assert_eq!(names, vec!["Morning run", "Doubles", "Evening Run"]);

        let runs = repo
            .list(&EventFilter { name_contains: Some("RUN".into()), sport_type: None })
            .await
            .unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].event.date_time < runs[1].event.date_time);

        let tennis_only = repo
            .list(&EventFilter { name_contains: None, sport_type: Some(SportType::Tennis) })
            .await
            .unwrap();
        assert_eq!(tennis_only.len(), 1);
        assert!(tennis_only[0].event.date_time - early.date_time == Duration::days(5));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let repo = InMemoryEventRepository::new();
        repo.fail_on(RepositoryOperation::InsertEvent);
        let event = event_for(Uuid::new_v4(), "Match", SportType::Soccer, 1);
        assert!(repo.insert_event(&event).await.is_err());

        repo.clear_failures();
        assert!(repo.insert_event(&event).await.is_ok());
    }
}
