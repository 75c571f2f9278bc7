//! PostgreSQL Event Repository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{Event, EventFilter, EventWithVenues, SportType, Venue};
use crate::error::{PlatformError, Result};
use crate::repository::EventRepository;

const EVENT_COLUMNS: &str =
    "id, user_id, name, sport_type, date_time, description, poster_url, created_at, updated_at";

pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL,
                name VARCHAR(100) NOT NULL CHECK (length(trim(name)) > 0),
                sport_type TEXT NOT NULL,
                date_time TIMESTAMPTZ NOT NULL,
                description VARCHAR(500),
                poster_url TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_date_time ON events(date_time);
            CREATE INDEX IF NOT EXISTS idx_events_user_id ON events(user_id);

            CREATE TABLE IF NOT EXISTS venues (
                id UUID PRIMARY KEY,
                event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                name TEXT NOT NULL CHECK (length(trim(name)) > 0),
                address TEXT,
                capacity INTEGER CHECK (capacity IS NULL OR capacity >= 0),
                created_at TIMESTAMPTZ NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_venues_event_id ON venues(event_id);
            "#,
        )
        .execute(&self.pool)
        .await?;
        info!("Event schema initialized");
        Ok(())
    }

    async fn venues_for(&self, event_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Venue>>> {
        let mut by_event: HashMap<Uuid, Vec<Venue>> = HashMap::new();
        if event_ids.is_empty() {
            return Ok(by_event);
        }

        let rows = sqlx::query(
            "SELECT id, event_id, name, address, capacity, created_at FROM venues WHERE event_id = ANY($1) ORDER BY created_at, id",
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let venue = venue_from_row(&row);
            by_event.entry(venue.event_id).or_default().push(venue);
        }
        Ok(by_event)
    }
}

fn event_from_row(row: &PgRow) -> Result<Event> {
    let sport: String = row.get("sport_type");
    let sport_type = sport
        .parse::<SportType>()
        .map_err(PlatformError::internal)?;

    Ok(Event {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        sport_type,
        date_time: row.get("date_time"),
        description: row.get("description"),
        poster_url: row.get("poster_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn venue_from_row(row: &PgRow) -> Venue {
    Venue {
        id: row.get("id"),
        event_id: row.get("event_id"),
        name: row.get("name"),
        address: row.get("address"),
        capacity: row.get("capacity"),
        created_at: row.get("created_at"),
    }
}

/// Escape LIKE wildcards so search text matches literally.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (id, user_id, name, sport_type, date_time, description, poster_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(&event.name)
        .bind(event.sport_type.as_str())
        .bind(event.date_time)
        .bind(&event.description)
        .bind(&event.poster_url)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(PlatformError::duplicate("Event", "id", event.id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_poster_url(&self, id: Uuid, user_id: Uuid, poster_url: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE events SET poster_url = $1, updated_at = $2 WHERE id = $3 AND user_id = $4",
        )
        .bind(poster_url)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_venues(&self, venues: &[Venue]) -> Result<()> {
        if venues.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for venue in venues {
            sqlx::query(
                "INSERT INTO venues (id, event_id, name, address, capacity, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(venue.id)
            .bind(venue.event_id)
            .bind(&venue.name)
            .bind(&venue.address)
            .bind(venue.capacity)
            .bind(venue.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(count = venues.len(), "Inserted venues");
        Ok(())
    }

    async fn delete_event(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EventWithVenues>> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let event = event_from_row(&row)?;
        let mut venues = self.venues_for(&[event.id]).await?;
        Ok(Some(EventWithVenues {
            venues: venues.remove(&event.id).unwrap_or_default(),
            event,
        }))
    }

    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM events WHERE id = $1 AND user_id = $2",
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(event_from_row).transpose()
    }

    async fn poster_url_in_use(&self, poster_url: &str) -> Result<bool> {
        let in_use: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM events WHERE poster_url = $1)")
            .bind(poster_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(in_use)
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<EventWithVenues>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM events
            WHERE ($1::text IS NULL OR name ILIKE $1)
            AND ($2::text IS NULL OR sport_type = $2)
            ORDER BY date_time ASC, created_at ASC
            "#,
            EVENT_COLUMNS
        ))
        .bind(filter.name_contains.as_deref().map(like_pattern))
        .bind(filter.sport_type.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        let events = rows.iter().map(event_from_row).collect::<Result<Vec<_>>>()?;
        let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let mut venues = self.venues_for(&ids).await?;

        Ok(events
            .into_iter()
            .map(|event| EventWithVenues {
                venues: venues.remove(&event.id).unwrap_or_default(),
                event,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("run"), "%run%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
