//! Event Storage
//! Mission: SQLite persistence for campus events and their attendance counters

use crate::events::{
    error::EventError,
    models::{Event, EventFilter, EventStatus},
};
use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ?1 status, ?2 keyword, ?3 location, ?4..?5 date range, ?6..?7 attendee range
const FILTER_CLAUSE: &str = "(?1 IS NULL OR status = ?1)
     AND (?2 IS NULL OR title LIKE ?2 ESCAPE '\\' OR description LIKE ?2 ESCAPE '\\'
          OR location LIKE ?2 ESCAPE '\\')
     AND (?3 IS NULL OR location LIKE ?3 ESCAPE '\\')
     AND (?4 IS NULL OR date_ms >= ?4)
     AND (?5 IS NULL OR date_ms <= ?5)
     AND (?6 IS NULL OR current_attendees >= ?6)
     AND (?7 IS NULL OR current_attendees <= ?7)";

const EVENT_COLUMNS: &str = "id, title, date_ms, location, description, max_attendees, \
     current_attendees, status, created_by, created_at_ms, updated_at_ms";

/// Event storage with SQLite backend
pub struct EventStore {
    db_path: String,
}

impl EventStore {
    pub fn new(db_path: &str) -> anyhow::Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn connect(&self) -> anyhow::Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open event database at {}", self.db_path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn init_db(&self) -> anyhow::Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                date_ms INTEGER NOT NULL,
                location TEXT NOT NULL,
                description TEXT,
                max_attendees INTEGER,
                current_attendees INTEGER NOT NULL DEFAULT 0 CHECK (current_attendees >= 0),
                status TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL,
                updated_at_ms INTEGER NOT NULL
            )",
            [],
        )
        .context("Failed to create events table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_date ON events(date_ms)",
            [],
        )?;

        info!("📅 Event database ready at {}", self.db_path);
        Ok(())
    }

    fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
        let uuid = |idx: usize| -> rusqlite::Result<Uuid> {
            let raw: String = row.get(idx)?;
            Uuid::parse_str(&raw)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
        };
        let timestamp = |idx: usize| -> rusqlite::Result<DateTime<Utc>> {
            let ms: i64 = row.get(idx)?;
            Utc.timestamp_millis_opt(ms)
                .single()
                .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
        };
        let status: String = row.get(7)?;

        Ok(Event {
            id: uuid(0)?,
            title: row.get(1)?,
            date: timestamp(2)?,
            location: row.get(3)?,
            description: row.get(4)?,
            max_attendees: row.get(5)?,
            current_attendees: row.get(6)?,
            status: status
                .parse::<EventStatus>()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into()))?,
            created_by: uuid(8)?,
            created_at: timestamp(9)?,
            updated_at: timestamp(10)?,
        })
    }

    pub fn create(&self, event: &Event) -> Result<(), EventError> {
        let conn = self.connect()?;
        conn.execute(
            &format!(
                "INSERT INTO events ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                EVENT_COLUMNS
            ),
            params![
                event.id.to_string(),
                event.title,
                event.date.timestamp_millis(),
                event.location,
                event.description,
                event.max_attendees,
                event.current_attendees,
                event.status.as_str(),
                event.created_by.to_string(),
                event.created_at.timestamp_millis(),
                event.updated_at.timestamp_millis(),
            ],
        )
        .context("Failed to insert event")?;

        info!("✅ Created event: {} ({})", event.title, event.id);
        Ok(())
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<Event>, EventError> {
        let conn = self.connect()?;
        let event = conn
            .query_row(
                &format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS),
                params![id.to_string()],
                Self::row_to_event,
            )
            .optional()
            .context("Failed to query event")?;
        Ok(event)
    }

    /// One page of events ordered by date, plus the total matching count
    /// Page through events matching `filter`, soonest first
    pub fn list(
        &self,
        filter: &EventFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Event>, u64), EventError> {
        let conn = self.connect()?;
        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);

        let status = filter.status.map(|s| s.as_str());
        let keyword = filter.keyword.as_deref().map(like_pattern);
        let location = filter.location.as_deref().map(like_pattern);
        let start_ms = filter.start.map(|d| d.timestamp_millis());
        let end_ms = filter.end.map(|d| d.timestamp_millis());

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM events WHERE {}", FILTER_CLAUSE),
                params![
                    status,
                    keyword,
                    location,
                    start_ms,
                    end_ms,
                    filter.min_attendees,
                    filter.max_attendees
                ],
                |row| row.get(0),
            )
            .context("Failed to count events")?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM events WHERE {}
                 ORDER BY date_ms ASC LIMIT ?8 OFFSET ?9",
                EVENT_COLUMNS, FILTER_CLAUSE
            ))
            .context("Failed to prepare event listing")?;
        let events = stmt
            .query_map(
                params![
                    status,
                    keyword,
                    location,
                    start_ms,
                    end_ms,
                    filter.min_attendees,
                    filter.max_attendees,
                    limit,
                    offset
                ],
                Self::row_to_event,
            )
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .context("Failed to list events")?;

        Ok((events, total.max(0) as u64))
    }

    /// Overwrite the editable fields. The attendee counter is left untouched.
    pub fn update(&self, event: &Event) -> Result<Event, EventError> {
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE events SET title = ?2, date_ms = ?3, location = ?4, description = ?5,
                     max_attendees = ?6, status = ?7, updated_at_ms = ?8
                 WHERE id = ?1 AND (?6 IS NULL OR current_attendees <= ?6)",
                params![
                    event.id.to_string(),
                    event.title,
                    event.date.timestamp_millis(),
                    event.location,
                    event.description,
                    event.max_attendees,
                    event.status.as_str(),
                    event.updated_at.timestamp_millis(),
                ],
            )
            .context("Failed to update event")?;

        if changed == 0 {
            return match self.get(&event.id)? {
                None => Err(EventError::NotFound),
                Some(_) => Err(EventError::Validation(
                    "Maximum attendees cannot be below current registrations".to_string(),
                )),
            };
        }
        self.get(&event.id)?.ok_or(EventError::NotFound)
    }

    pub fn delete(&self, id: &Uuid) -> Result<(), EventError> {
        let conn = self.connect()?;
        let rows_affected = conn
            .execute("DELETE FROM events WHERE id = ?1", params![id.to_string()])
            .context("Failed to delete event")?;

        if rows_affected == 0 {
            return Err(EventError::NotFound);
        }

        info!("🗑️  Deleted event: {}", id);
        Ok(())
    }

    /// Take one seat, atomically respecting capacity and status
    pub fn register_attendee(&self, id: &Uuid, now: DateTime<Utc>) -> Result<Event, EventError> {
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE events
                 SET current_attendees = current_attendees + 1, updated_at_ms = ?2
                 WHERE id = ?1
                   AND status IN ('upcoming', 'ongoing')
                   AND (max_attendees IS NULL OR current_attendees < max_attendees)",
                params![id.to_string(), now.timestamp_millis()],
            )
            .context("Failed to register attendee")?;

        let event = self.get(id)?.ok_or(EventError::NotFound)?;
        if changed == 0 {
            return Err(if event.status.accepts_registrations() {
                EventError::EventFull
            } else {
                EventError::EventClosed
            });
        }
        Ok(event)
    }

    /// Release one seat; the counter never goes below zero
    pub fn unregister_attendee(&self, id: &Uuid, now: DateTime<Utc>) -> Result<Event, EventError> {
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE events
                 SET current_attendees = current_attendees - 1, updated_at_ms = ?2
                 WHERE id = ?1 AND current_attendees > 0",
                params![id.to_string(), now.timestamp_millis()],
            )
            .context("Failed to unregister attendee")?;

        let event = self.get(id)?.ok_or(EventError::NotFound)?;
        if changed == 0 {
            return Err(EventError::NoRegistrations);
        }
        Ok(event)
    }
}

/// Substring pattern for LIKE; user wildcards match literally
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
