//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Seed data and mock factories
//! - Time helpers

use crate::db::AppState;
use crate::models::{NewEvent, NewProgram};
use crate::phases::PhaseInput;
use crate::programs::create_program;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

pub fn test_state(pool: &SqlitePool) -> Arc<AppState> {
  Arc::new(AppState { db: pool.clone() })
}

/// Seed two programs through the normal create path
/// Returns their ids in creation order
pub async fn seed_test_programs(pool: &SqlitePool) -> Vec<i64> {
  let programs = vec![
    mock_new_program("Strength Foundations", &[("Hypertrophy", 4), ("Strength", 4)]),
    mock_new_program(
      "Race Prep",
      &[("Base", 4), ("Build", 6), ("Peak", 2)],
    ),
  ];

  let mut ids = Vec::new();
  for program in programs {
    let created = create_program(pool, program)
      .await
      .expect("Failed to seed program");
    ids.push(created.id);
  }

  ids
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_new_program(name: &str, phases: &[(&str, i64)]) -> NewProgram {
  NewProgram {
    name: name.to_string(),
    description: None,
    phases: phases
      .iter()
      .map(|(phase, weeks)| PhaseInput::new(*phase, "", *weeks))
      .collect(),
    current_week: None,
  }
}

/// Event starting `days_from_now` days out (negative for past events)
pub fn mock_new_event(title: &str, capacity: Option<i64>, days_from_now: i64) -> NewEvent {
  NewEvent {
    title: title.to_string(),
    description: Some("Bring water".to_string()),
    location: None,
    starts_at: datetime_days_from_now(days_from_now),
    capacity,
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

pub fn datetime_days_from_now(days: i64) -> DateTime<Utc> {
  Utc::now() + Duration::days(days)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('training_programs', 'active_program', 'events', 'event_registrations')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {:?}", tables);

    let pointer_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM active_program")
      .fetch_one(&pool)
      .await
      .expect("Failed to count pointer rows");
    assert_eq!(pointer_rows, 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_programs_returns_ids() {
    let pool = setup_test_db().await;

    let ids = seed_test_programs(&pool).await;
    assert_eq!(ids.len(), 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM training_programs")
      .fetch_one(&pool)
      .await
      .expect("Failed to count programs");
    assert_eq!(count, 2);

    teardown_test_db(pool).await;
  }
}
