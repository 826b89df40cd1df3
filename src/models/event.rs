use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
  pub id: i64,
  pub title: String,
  pub description: Option<String>,
  pub location: Option<String>,
  pub starts_at: DateTime<Utc>,
  pub capacity: Option<i64>,
  pub created_at: DateTime<Utc>,
  pub registered_count: i64,
}

impl Event {
  /// None when the event has no capacity limit
  pub fn spots_remaining(&self) -> Option<i64> {
    self
      .capacity
      .map(|cap| (cap - self.registered_count).max(0))
  }

  pub fn is_full(&self) -> bool {
    self.spots_remaining() == Some(0)
  }
}

/// Event plus derived availability, as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventView {
  #[serde(flatten)]
  pub event: Event,
  pub spots_remaining: Option<i64>,
  pub is_full: bool,
}

impl From<Event> for EventView {
  fn from(event: Event) -> Self {
    Self {
      spots_remaining: event.spots_remaining(),
      is_full: event.is_full(),
      event,
    }
  }
}

/// For inserting new events (without id, created_at)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
  pub title: String,
  pub description: Option<String>,
  pub location: Option<String>,
  pub starts_at: DateTime<Utc>,
  pub capacity: Option<i64>,
}

/// Partial update. For the nullable fields the outer `Option` says whether
/// the field was sent; `Some(None)` (JSON `null`) clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default, deserialize_with = "present")]
  pub description: Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub location: Option<Option<String>>,
  #[serde(default)]
  pub starts_at: Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "present")]
  pub capacity: Option<Option<i64>>,
}

/// A key that is present, even with a `null` value, becomes `Some(_)`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
  pub id: i64,
  pub event_id: i64,
  pub name: String,
  pub email: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegistration {
  pub name: String,
  pub email: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_event_update_tells_null_from_absent() {
    let update: EventUpdate =
      serde_json::from_str(r#"{ "capacity": null, "location": "Studio B" }"#).unwrap();

    assert_eq!(update.capacity, Some(None));
    assert_eq!(update.location, Some(Some("Studio B".to_string())));
    assert_eq!(update.description, None);
    assert_eq!(update.title, None);
  }
}
