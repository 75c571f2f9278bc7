//! Event and Venue Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SportType;

pub const EVENT_NAME_MAX_CHARS: usize = 100;
pub const EVENT_DESCRIPTION_MAX_CHARS: usize = 500;

/// A scheduled sports event, owned by the user who created it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,

    /// Owning user (identity provider id)
    pub user_id: Uuid,

    pub name: String,
    pub sport_type: SportType,
    pub date_time: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Public URL of the poster image, attached after upload
    pub poster_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        user_id: Uuid,
        name: impl Into<String>,
        sport_type: SportType,
        date_time: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            sport_type,
            date_time,
            description: None,
            poster_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Blank descriptions are stored as absent.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Venue input as submitted with an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVenue {
    pub name: String,
    pub address: Option<String>,
    pub capacity: Option<i32>,
}

impl NewVenue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            capacity: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// A physical location of an event. Cannot outlive its event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Venue {
    pub fn new(event_id: Uuid, venue: NewVenue) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            name: venue.name,
            address: venue.address.filter(|a| !a.trim().is_empty()),
            capacity: venue.capacity,
            created_at: Utc::now(),
        }
    }
}

/// Event joined with its venues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithVenues {
    #[serde(flatten)]
    pub event: Event,
    pub venues: Vec<Venue>,
}

/// Listing filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Case-insensitive substring of the event name
    pub name_contains: Option<String>,
    pub sport_type: Option<SportType>,
}

impl EventFilter {
    /// Build a filter from raw query values.
    ///
    /// Blank search text and the sport sentinel `all` mean "no filter".
    pub fn from_query(search: Option<&str>, sport: Option<&str>) -> Result<Self, String> {
        let name_contains = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let sport_type = match sport.map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(s.parse::<SportType>()?),
        };

        Ok(Self { name_contains, sport_type })
    }

    pub fn matches(&self, event: &Event) -> bool {
        let name_ok = self
            .name_contains
            .as_ref()
            .map(|needle| event.name.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(true);
        let sport_ok = self.sport_type.map(|s| s == event.sport_type).unwrap_or(true);
        name_ok && sport_ok
    }
}
