//! Event book: studio events and attendee registrations

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{StudioError, StudioResult};
use crate::models::{Event, EventUpdate, NewEvent, NewRegistration, Registration};

const SELECT_EVENTS: &str = r#"
  SELECT
    e.id, e.title, e.description, e.location, e.starts_at, e.capacity, e.created_at,
    (SELECT COUNT(*) FROM event_registrations r WHERE r.event_id = e.id) AS registered_count
  FROM events e
"#;

/// ---------------------------------------------------------------------------
/// Validation
/// ---------------------------------------------------------------------------

fn validate_title(title: &str) -> StudioResult<String> {
  let trimmed = title.trim();
  if trimmed.is_empty() {
    return Err(StudioError::validation("Event title is required"));
  }
  Ok(trimmed.to_string())
}

fn validate_capacity(capacity: Option<i64>) -> StudioResult<()> {
  match capacity {
    Some(cap) if cap < 1 => Err(StudioError::validation(format!(
      "Capacity must be at least 1 (got {})",
      cap
    ))),
    _ => Ok(()),
  }
}

fn normalize_email(email: &str) -> StudioResult<String> {
  let email = email.trim().to_lowercase();
  let valid = match email.split_once('@') {
    Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !email.contains(' '),
    None => false,
  };
  if !valid {
    return Err(StudioError::validation(format!("Invalid email address: {}", email)));
  }
  Ok(email)
}

/// ---------------------------------------------------------------------------
/// Events
/// ---------------------------------------------------------------------------

/// All events by start time. `upcoming_only` drops events that already started.
pub async fn list_events(pool: &SqlitePool, upcoming_only: bool) -> StudioResult<Vec<Event>> {
  let sql = format!("{} ORDER BY e.starts_at, e.id", SELECT_EVENTS);
  let events = sqlx::query_as::<_, Event>(&sql).fetch_all(pool).await?;

  if !upcoming_only {
    return Ok(events);
  }

  let now = Utc::now();
  Ok(events.into_iter().filter(|e| e.starts_at >= now).collect())
}

pub async fn load_event(pool: &SqlitePool, id: i64) -> StudioResult<Event> {
  let sql = format!("{} WHERE e.id = ?", SELECT_EVENTS);
  sqlx::query_as::<_, Event>(&sql)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StudioError::not_found(format!("Event {}", id)))
}

pub async fn create_event(pool: &SqlitePool, new: NewEvent) -> StudioResult<Event> {
  let title = validate_title(&new.title)?;
  validate_capacity(new.capacity)?;

  let result = sqlx::query(
    r#"
    INSERT INTO events (title, description, location, starts_at, capacity, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
  )
  .bind(&title)
  .bind(&new.description)
  .bind(&new.location)
  .bind(new.starts_at)
  .bind(new.capacity)
  .bind(Utc::now())
  .execute(pool)
  .await?;

  let id = result.last_insert_rowid();
  info!(event_id = id, "Created event {}", title);

  load_event(pool, id).await
}

pub async fn update_event(pool: &SqlitePool, id: i64, update: EventUpdate) -> StudioResult<Event> {
  load_event(pool, id).await?;

  let title = update.title.as_deref().map(validate_title).transpose()?;
  if let Some(capacity) = update.capacity {
    validate_capacity(capacity)?;
  }

  // The capacity floor is checked in the same statement that writes it
  let result = sqlx::query(
    r#"
    UPDATE events SET
      title = COALESCE(?1, title),
      description = CASE WHEN ?2 THEN ?3 ELSE description END,
      location = CASE WHEN ?4 THEN ?5 ELSE location END,
      starts_at = COALESCE(?6, starts_at),
      capacity = CASE WHEN ?7 THEN ?8 ELSE capacity END
    WHERE id = ?9
      AND (NOT ?7 OR ?8 IS NULL
        OR (SELECT COUNT(*) FROM event_registrations r WHERE r.event_id = events.id) <= ?8)
    "#,
  )
  .bind(title)
  .bind(update.description.is_some())
  .bind(update.description.flatten())
  .bind(update.location.is_some())
  .bind(update.location.flatten())
  .bind(update.starts_at)
  .bind(update.capacity.is_some())
  .bind(update.capacity.flatten())
  .bind(id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    // Either the event is gone or the new capacity is below its registrations
    let event = load_event(pool, id).await?;
    return Err(StudioError::validation(format!(
      "Capacity {} is below the {} existing registrations",
      update.capacity.flatten().unwrap_or_default(),
      event.registered_count
    )));
  }

  load_event(pool, id).await
}

/// Registrations go with the event (ON DELETE CASCADE)
pub async fn delete_event(pool: &SqlitePool, id: i64) -> StudioResult<()> {
  let result = sqlx::query("DELETE FROM events WHERE id = ?")
    .bind(id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(StudioError::not_found(format!("Event {}", id)));
  }

  info!(event_id = id, "Deleted event");
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Registrations
/// ---------------------------------------------------------------------------

/// Register an attendee. The capacity check and the insert are one statement.
pub async fn register_for_event(
  pool: &SqlitePool,
  event_id: i64,
  new: NewRegistration,
) -> StudioResult<Registration> {
  let name = new.name.trim().to_string();
  if name.is_empty() {
    return Err(StudioError::validation("Attendee name is required"));
  }
  let email = normalize_email(&new.email)?;

  let event = load_event(pool, event_id).await?;

  let result = sqlx::query(
    r#"
    INSERT INTO event_registrations (event_id, name, email, created_at)
    SELECT e.id, ?1, ?2, ?3
    FROM events e
    WHERE e.id = ?4
      AND (e.capacity IS NULL
        OR (SELECT COUNT(*) FROM event_registrations r WHERE r.event_id = e.id) < e.capacity)
    "#,
  )
  .bind(&name)
  .bind(&email)
  .bind(Utc::now())
  .bind(event_id)
  .execute(pool)
  .await;

  let result = match result {
    Ok(result) => result,
    Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
      return Err(StudioError::Conflict(format!(
        "{} is already registered for {}",
        email, event.title
      )));
    }
    Err(e) => return Err(e.into()),
  };

  if result.rows_affected() == 0 {
    return Err(StudioError::Conflict(format!("{} is full", event.title)));
  }

  let registration = sqlx::query_as::<_, Registration>(
    "SELECT id, event_id, name, email, created_at FROM event_registrations WHERE id = ?",
  )
  .bind(result.last_insert_rowid())
  .fetch_one(pool)
  .await?;

  info!(event_id, registration_id = registration.id, "Registered attendee");
  Ok(registration)
}

pub async fn list_registrations(
  pool: &SqlitePool,
  event_id: i64,
) -> StudioResult<Vec<Registration>> {
  load_event(pool, event_id).await?;

  let registrations = sqlx::query_as::<_, Registration>(
    r#"
    SELECT id, event_id, name, email, created_at
    FROM event_registrations
    WHERE event_id = ?
    ORDER BY id
    "#,
  )
  .bind(event_id)
  .fetch_all(pool)
  .await?;

  Ok(registrations)
}

pub async fn cancel_registration(
  pool: &SqlitePool,
  event_id: i64,
  registration_id: i64,
) -> StudioResult<()> {
  let result = sqlx::query("DELETE FROM event_registrations WHERE id = ? AND event_id = ?")
    .bind(registration_id)
    .bind(event_id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(StudioError::not_found(format!("Registration {}", registration_id)));
  }

  info!(event_id, registration_id, "Cancelled registration");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;
  use chrono::Duration;

  fn attendee(name: &str, email: &str) -> NewRegistration {
    NewRegistration {
      name: name.to_string(),
      email: email.to_string(),
    }
  }

  #[tokio::test]
  async fn test_create_and_load_event() {
    let pool = setup_test_db().await;

    let event = create_event(&pool, mock_new_event("  Open Gym Night ", Some(20), 3))
      .await
      .expect("Should create event");

    assert_eq!(event.title, "Open Gym Night");
    assert_eq!(event.capacity, Some(20));
    assert_eq!(event.registered_count, 0);
    assert_eq!(event.spots_remaining(), Some(20));

    let loaded = load_event(&pool, event.id).await.unwrap();
    assert_eq!(loaded.starts_at, event.starts_at);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_create_event_rejects_bad_capacity() {
    let pool = setup_test_db().await;

    let err = create_event(&pool, mock_new_event("Clinic", Some(0), 3))
      .await
      .unwrap_err();

    assert!(matches!(err, StudioError::Validation(_)));
    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_list_upcoming_events_only() {
    let pool = setup_test_db().await;
    create_event(&pool, mock_new_event("Last week", None, -7)).await.unwrap();
    create_event(&pool, mock_new_event("Next week", None, 7)).await.unwrap();
    create_event(&pool, mock_new_event("Tomorrow", None, 1)).await.unwrap();

    let all = list_events(&pool, false).await.unwrap();
    assert_eq!(
      all.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
      vec!["Last week", "Tomorrow", "Next week"]
    );

    let upcoming = list_events(&pool, true).await.unwrap();
    assert_eq!(
      upcoming.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
      vec!["Tomorrow", "Next week"]
    );

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_registration_respects_capacity() {
    let pool = setup_test_db().await;
    let event = create_event(&pool, mock_new_event("Small class", Some(2), 2)).await.unwrap();

    register_for_event(&pool, event.id, attendee("Ana", "ana@example.com")).await.unwrap();
    register_for_event(&pool, event.id, attendee("Ben", "ben@example.com")).await.unwrap();

    let err = register_for_event(&pool, event.id, attendee("Cy", "cy@example.com"))
      .await
      .unwrap_err();
    assert!(matches!(err, StudioError::Conflict(_)));
    assert!(err.to_string().contains("full"));

    let reloaded = load_event(&pool, event.id).await.unwrap();
    assert_eq!(reloaded.registered_count, 2);
    assert!(reloaded.is_full());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_duplicate_email_rejected() {
    let pool = setup_test_db().await;
    let event = create_event(&pool, mock_new_event("Workshop", None, 2)).await.unwrap();

    register_for_event(&pool, event.id, attendee("Ana", "ana@example.com")).await.unwrap();
    let err = register_for_event(&pool, event.id, attendee("Ana again", " ANA@example.com "))
      .await
      .unwrap_err();

    assert!(err.to_string().contains("already registered"));
    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_register_validates_attendee() {
    let pool = setup_test_db().await;
    let event = create_event(&pool, mock_new_event("Workshop", None, 2)).await.unwrap();

    assert!(register_for_event(&pool, event.id, attendee("", "a@b.co")).await.is_err());
    assert!(register_for_event(&pool, event.id, attendee("Ana", "not-an-email")).await.is_err());
    assert!(matches!(
      register_for_event(&pool, 999, attendee("Ana", "a@b.co")).await,
      Err(StudioError::NotFound(_))
    ));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_cancel_registration_frees_spot() {
    let pool = setup_test_db().await;
    let event = create_event(&pool, mock_new_event("Solo", Some(1), 2)).await.unwrap();
    let reg = register_for_event(&pool, event.id, attendee("Ana", "ana@example.com"))
      .await
      .unwrap();

    cancel_registration(&pool, event.id, reg.id).await.unwrap();
    assert!(list_registrations(&pool, event.id).await.unwrap().is_empty());

    register_for_event(&pool, event.id, attendee("Ben", "ben@example.com")).await.unwrap();
    assert!(matches!(
      cancel_registration(&pool, event.id, reg.id).await,
      Err(StudioError::NotFound(_))
    ));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_update_event_capacity_floor() {
    let pool = setup_test_db().await;
    let event = create_event(&pool, mock_new_event("Bootcamp", Some(5), 2)).await.unwrap();
    register_for_event(&pool, event.id, attendee("Ana", "ana@example.com")).await.unwrap();
    register_for_event(&pool, event.id, attendee("Ben", "ben@example.com")).await.unwrap();

    let err = update_event(
      &pool,
      event.id,
      EventUpdate {
        capacity: Some(Some(1)),
        ..Default::default()
      },
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("below"));
    assert_eq!(load_event(&pool, event.id).await.unwrap().capacity, Some(5));

    let moved = datetime_days_from_now(10);
    let updated = update_event(
      &pool,
      event.id,
      EventUpdate {
        location: Some(Some("Main floor".to_string())),
        starts_at: Some(moved),
        capacity: Some(Some(2)),
        ..Default::default()
      },
    )
    .await
    .unwrap();

    assert_eq!(updated.title, "Bootcamp");
    assert_eq!(updated.location.as_deref(), Some("Main floor"));
    assert_eq!(updated.capacity, Some(2));
    assert!(updated.starts_at - moved < Duration::seconds(1));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_update_event_clears_optional_fields() {
    let pool = setup_test_db().await;
    let mut new = mock_new_event("Open Mat", Some(1), 2);
    new.description = Some("Bring a partner".to_string());
    new.location = Some("Room 2".to_string());
    let event = create_event(&pool, new).await.unwrap();
    register_for_event(&pool, event.id, attendee("Ana", "ana@example.com")).await.unwrap();

    let updated = update_event(
      &pool,
      event.id,
      EventUpdate {
        description: Some(None),
        capacity: Some(None),
        ..Default::default()
      },
    )
    .await
    .unwrap();

    assert_eq!(updated.capacity, None);
    assert_eq!(updated.description, None);
    assert_eq!(updated.location.as_deref(), Some("Room 2"));
    assert_eq!(updated.spots_remaining(), None);

    // No cap any more, so the event takes another attendee
    register_for_event(&pool, event.id, attendee("Ben", "ben@example.com")).await.unwrap();

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_update_missing_event_is_not_found() {
    let pool = setup_test_db().await;

    let result = update_event(&pool, 404, EventUpdate::default()).await;

    assert!(matches!(result, Err(StudioError::NotFound(_))));
    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_delete_event_cascades_registrations() {
    let pool = setup_test_db().await;
    let event = create_event(&pool, mock_new_event("Social", None, 2)).await.unwrap();
    register_for_event(&pool, event.id, attendee("Ana", "ana@example.com")).await.unwrap();

    delete_event(&pool, event.id).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_registrations")
      .fetch_one(&pool)
      .await
      .unwrap();
    assert_eq!(count, 0);
    assert!(matches!(load_event(&pool, event.id).await, Err(StudioError::NotFound(_))));

    teardown_test_db(pool).await;
  }
}
