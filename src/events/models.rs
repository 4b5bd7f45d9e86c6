//! Event Models
//! Mission: Campus event records, their validation rules and derived stats

use crate::events::error::EventError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_LOCATION_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Whether attendees may still sign up
    pub fn accepts_registrations(&self) -> bool {
        matches!(self, EventStatus::Upcoming | EventStatus::Ongoing)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "ongoing" => Ok(EventStatus::Ongoing),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(EventError::Validation(format!(
                "Unknown event status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub description: Option<String>,
    pub max_attendees: Option<u32>,
    pub current_attendees: u32,
    pub status: EventStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Check every field rule. Text fields are trimmed in place first.
    pub fn validate(&mut self) -> Result<(), EventError> {
        self.title = self.title.trim().to_string();
        self.location = self.location.trim().to_string();
        self.description = self
            .description
            .take()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        if self.title.is_empty() {
            return Err(EventError::Validation(
                "Please add a title for the event".to_string(),
            ));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(EventError::Validation(format!(
                "Title cannot be more than {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if self.location.is_empty() {
            return Err(EventError::Validation(
                "Please add a location for the event".to_string(),
            ));
        }
        if self.location.chars().count() > MAX_LOCATION_CHARS {
            return Err(EventError::Validation(format!(
                "Location cannot be more than {} characters",
                MAX_LOCATION_CHARS
            )));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(EventError::Validation(format!(
                    "Description cannot be more than {} characters",
                    MAX_DESCRIPTION_CHARS
                )));
            }
        }
        if let Some(max) = self.max_attendees {
            if max < 1 {
                return Err(EventError::Validation(
                    "Maximum attendees must be at least 1".to_string(),
                ));
            }
            if self.current_attendees > max {
                return Err(EventError::Validation(
                    "Maximum attendees cannot be below current registrations".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn stats(&self, now: DateTime<Utc>) -> EventStats {
        let millis_until = (self.date - now).num_milliseconds();
        // Ceiling division that also rounds toward +inf for negative values
        let days_until = millis_until.div_euclid(MILLIS_PER_DAY)
            + i64::from(millis_until.rem_euclid(MILLIS_PER_DAY) != 0);

        let registration_percentage = match self.max_attendees {
            Some(max) if max > 0 => {
                (f64::from(self.current_attendees) / f64::from(max) * 100.0).round() as u32
            }
            _ => 0,
        };

        let current_status = match self.status {
            EventStatus::Cancelled => EventStatus::Cancelled,
            _ if self.date < now => EventStatus::Completed,
            _ if self.date.date_naive() == now.date_naive() => EventStatus::Ongoing,
            status => status,
        };

        EventStats {
            event_id: self.id,
            title: self.title.clone(),
            days_until,
            registration_percentage,
            current_status,
            is_fully_booked: self
                .max_attendees
                .is_some_and(|max| self.current_attendees >= max),
            spots_available: self
                .max_attendees
                .map(|max| max.saturating_sub(self.current_attendees)),
        }
    }
}

/// POST /api/events body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub description: Option<String>,
    pub max_attendees: Option<u32>,
    pub status: Option<EventStatus>,
}

impl CreateEventRequest {
    pub fn into_event(self, created_by: Uuid, now: DateTime<Utc>) -> Result<Event, EventError> {
        let mut event = Event {
            id: Uuid::new_v4(),
            title: self.title,
            date: self.date,
            location: self.location,
            description: self.description,
            max_attendees: self.max_attendees,
            current_attendees: 0,
            status: self.status.unwrap_or_default(),
            created_by,
            created_at: now,
            updated_at: now,
        };
        event.validate()?;
        Ok(event)
    }
}

/// PUT /api/events/:id body. Absent fields keep their value.
///
/// `description` and `maxAttendees` accept an explicit `null` to clear them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    #[serde(default, with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub max_attendees: Option<Option<u32>>,
    pub status: Option<EventStatus>,
}

impl UpdateEventRequest {
    pub fn apply(self, mut event: Event, now: DateTime<Utc>) -> Result<Event, EventError> {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(location) = self.location {
            event.location = location;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(max_attendees) = self.max_attendees {
            event.max_attendees = max_attendees;
        }
        if let Some(status) = self.status {
            event.status = status;
        }
        event.updated_at = now;
        event.validate()?;
        Ok(event)
    }
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// GET /api/events query string
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<EventStatus>,
    /// Case-insensitive match on title, description or location
    pub keyword: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "query_date::deserialize")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "query_date::deserialize")]
    pub end_date: Option<DateTime<Utc>>,
    pub min_attendees: Option<u32>,
    pub max_attendees: Option<u32>,
}

impl EventQuery {
    pub fn filter(&self) -> EventFilter {
        let text = |raw: &Option<String>| {
            raw.as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };

        EventFilter {
            status: self.status,
            keyword: text(&self.keyword),
            location: text(&self.location),
            start: self.start_date,
            end: self.end_date,
            min_attendees: self.min_attendees,
            max_attendees: self.max_attendees,
        }
    }
}

/// Listing criteria; every `None` matches all events. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub min_attendees: Option<u32>,
    pub max_attendees: Option<u32>,
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC)
mod query_date {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(None),
        };
        let raw = raw.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Some(dt.and_utc()))
            .ok_or_else(|| D::Error::custom(format!("invalid date: {}", raw)))
    }
}

/// Paged event listing
#[derive(Debug, Serialize)]
pub struct EventPage {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub page: u32,
    pub pages: u64,
    pub data: Vec<Event>,
}

#[derive(Debug, Serialize)]
pub struct EventEnvelope {
    pub success: bool,
    pub data: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub event_id: Uuid,
    pub title: String,
    pub days_until: i64,
    pub registration_percentage: u32,
    pub current_status: EventStatus,
    pub is_fully_booked: bool,
    pub spots_available: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event_at(date: DateTime<Utc>) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Hackathon".to_string(),
            date,
            location: "Main Hall".to_string(),
            description: None,
            max_attendees: Some(50),
            current_attendees: 10,
            status: EventStatus::Upcoming,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_request_trims_and_defaults() {
        let req: CreateEventRequest = serde_json::from_str(
            r#"{"title":"  Tech Talk ","date":"2030-03-01T18:00:00Z","location":" Room 101 ","description":"   "}"#,
        )
        .unwrap();
        let event = req.into_event(Uuid::new_v4(), Utc::now()).unwrap();

        assert_eq!(event.title, "Tech Talk");
        assert_eq!(event.location, "Room 101");
        assert_eq!(event.description, None);
        assert_eq!(event.status, EventStatus::Upcoming);
        assert_eq!(event.current_attendees, 0);
        assert_eq!(event.max_attendees, None);
    }

    #[test]
    fn test_validation_limits() {
        let date = Utc::now() + Duration::days(3);

        let mut event = event_at(date);
        event.title = "t".repeat(MAX_TITLE_CHARS + 1);
        assert!(matches!(event.validate(), Err(EventError::Validation(_))));

        let mut event = event_at(date);
        event.location = "  ".to_string();
        assert!(matches!(event.validate(), Err(EventError::Validation(_))));

        let mut event = event_at(date);
        event.description = Some("d".repeat(MAX_DESCRIPTION_CHARS + 1));
        assert!(matches!(event.validate(), Err(EventError::Validation(_))));

        let mut event = event_at(date);
        event.max_attendees = Some(0);
        assert!(matches!(event.validate(), Err(EventError::Validation(_))));

        let mut event = event_at(date);
        event.max_attendees = Some(5);
        assert!(matches!(event.validate(), Err(EventError::Validation(_))));

        let mut event = event_at(date);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_update_request_partial_and_null_fields() {
        let now = Utc::now();
        let mut original = event_at(now + Duration::days(10));
        original.description = Some("Bring laptops".to_string());

        let update: UpdateEventRequest =
            serde_json::from_str(r#"{"title":"Hackathon 2.0","maxAttendees":null}"#).unwrap();
        let updated = update.apply(original.clone(), now).unwrap();

        assert_eq!(updated.title, "Hackathon 2.0");
        assert_eq!(updated.max_attendees, None);
        assert_eq!(updated.description.as_deref(), Some("Bring laptops"));
        assert_eq!(updated.location, original.location);
        assert_eq!(updated.current_attendees, original.current_attendees);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventStatus::Cancelled).unwrap(),
            r#""cancelled""#
        );
        assert_eq!("ongoing".parse::<EventStatus>().unwrap(), EventStatus::Ongoing);
        assert!("postponed".parse::<EventStatus>().is_err());
    }

    #[test]
    fn test_stats_for_future_event() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let event = event_at(now + Duration::days(2) + Duration::hours(1));
        let stats = event.stats(now);

        assert_eq!(stats.days_until, 3);
        assert_eq!(stats.registration_percentage, 20);
        assert_eq!(stats.current_status, EventStatus::Upcoming);
        assert!(!stats.is_fully_booked);
        assert_eq!(stats.spots_available, Some(40));
    }

    #[test]
    fn test_stats_derives_completed_and_ongoing() {
        let now = Utc.with_ymd_and_hms(2030, 1, 10, 12, 0, 0).unwrap();

        let past = event_at(now - Duration::days(2));
        let stats = past.stats(now);
        assert_eq!(stats.current_status, EventStatus::Completed);
        assert_eq!(stats.days_until, -2);

        let today = event_at(now + Duration::hours(3));
        assert_eq!(today.stats(now).current_status, EventStatus::Ongoing);

        let mut cancelled = event_at(now - Duration::days(1));
        cancelled.status = EventStatus::Cancelled;
        assert_eq!(cancelled.stats(now).current_status, EventStatus::Cancelled);
    }

    #[test]
    fn test_stats_without_capacity() {
        let now = Utc::now();
        let mut event = event_at(now + Duration::days(1));
        event.max_attendees = None;
        event.current_attendees = 500;

        let stats = event.stats(now);
        assert_eq!(stats.registration_percentage, 0);
        assert!(!stats.is_fully_booked);
        assert_eq!(stats.spots_available, None);
    }

    #[test]
    fn test_days_until_rounds_sub_second_remainders_up() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();

        let soon = event_at(now + Duration::milliseconds(500));
        assert_eq!(soon.stats(now).days_until, 1);

        let just_past = event_at(now - Duration::milliseconds(500));
        assert_eq!(just_past.stats(now).days_until, 0);

        let exactly_one_day = event_at(now + Duration::days(1));
        assert_eq!(exactly_one_day.stats(now).days_until, 1);
    }

    #[test]
    fn test_query_builds_filter() {
        let query: EventQuery = serde_json::from_str(
            r#"{"keyword":"  hack ","location":"","startDate":"2030-01-01","endDate":"2030-02-01T10:00:00+02:00","minAttendees":5}"#,
        )
        .unwrap();
        let filter = query.filter();

        assert_eq!(filter.keyword.as_deref(), Some("hack"));
        assert_eq!(filter.location, None);
        assert_eq!(
            filter.start,
            Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            filter.end,
            Some(Utc.with_ymd_and_hms(2030, 2, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(filter.min_attendees, Some(5));
        assert_eq!(filter.max_attendees, None);

        assert!(serde_json::from_str::<EventQuery>(r#"{"startDate":"next week"}"#).is_err());
        assert_eq!(EventQuery::default().filter(), EventFilter::default());
    }
}
