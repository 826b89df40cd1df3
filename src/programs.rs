//! Training program store and actions
//!
//! Programs own an ordered phase list persisted as JSON in `phases_json`.
//! Every action that touches phases or the current week rebuilds the whole
//! schedule through [`phases::schedule`] before writing; there is no partial
//! update of one phase's range.
//!
//! The active program is a single-row pointer (`active_program`), so
//! switching programs is one write.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::{StudioError, StudioResult};
use crate::models::{NewProgram, PhaseUpdate, ProgramUpdate, TrainingProgram};
use crate::phases::{self, PhaseInput, ProgramPhase, MAX_PHASE_WEEKS};

const SELECT_PROGRAMS: &str = r#"
    SELECT
        p.id, p.name, p.description, p.phases_json, p.current_week,
        p.created_at, p.updated_at,
        CASE WHEN a.program_id IS NULL THEN 0 ELSE 1 END AS is_active
    FROM training_programs p
    LEFT JOIN active_program a ON a.program_id = p.id
"#;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_name(name: &str) -> StudioResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StudioError::validation("Program name is required"));
    }
    Ok(trimmed.to_string())
}

/// The scheduler coerces bad durations into range; explicit bad values
/// coming from callers are rejected here instead.
fn validate_phase_input(input: &PhaseInput) -> StudioResult<()> {
    match input.weeks {
        Some(weeks) if weeks < 1 || weeks > i64::from(MAX_PHASE_WEEKS) => {
            Err(StudioError::validation(format!(
                "Phase weeks must be between 1 and {} (got {})",
                MAX_PHASE_WEEKS, weeks
            )))
        }
        _ => Ok(()),
    }
}

/// Caller-supplied ids must be unique across the resulting phase list.
fn validate_phase_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> StudioResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StudioError::validation(format!(
                "Phase id {} is used more than once",
                id
            )));
        }
    }
    Ok(())
}

fn validate_phase_inputs(inputs: &[PhaseInput]) -> StudioResult<()> {
    inputs.iter().try_for_each(validate_phase_input)?;
    validate_phase_ids(supplied_ids(inputs))
}

fn supplied_ids(inputs: &[PhaseInput]) -> impl Iterator<Item = &str> {
    inputs
        .iter()
        .filter_map(|p| p.id.as_deref())
        .filter(|id| !id.trim().is_empty())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Rebuild ranges, statuses, total and clamped week from a new phase list.
fn replan(program: &mut TrainingProgram, inputs: Vec<PhaseInput>, current_week: i64) {
    let schedule = phases::schedule(inputs, current_week);
    program.phases = schedule.phases;
    program.total_weeks = schedule.total_weeks;
    program.current_week = schedule.current_week;
}

// ---------------------------------------------------------------------------
// Database Operations
// ---------------------------------------------------------------------------

fn program_from_row(row: &SqliteRow) -> StudioResult<TrainingProgram> {
    let phases_json: String = row.try_get("phases_json")?;
    let stored: Vec<ProgramPhase> = serde_json::from_str(&phases_json)?;
    let current_week: i64 = row.try_get("current_week")?;
    let is_active: i64 = row.try_get("is_active")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    // Status is derived, so it is refreshed from the stored week on every read.
    let total_weeks = phases::total_weeks(&stored);
    let current_week = phases::clamp_week(current_week, total_weeks);

    Ok(TrainingProgram {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        phases: phases::apply_statuses(stored, current_week),
        total_weeks,
        current_week,
        is_active: is_active != 0,
        created_at,
        updated_at,
    })
}

/// Load all programs, oldest first
pub async fn load_all_programs(pool: &SqlitePool) -> StudioResult<Vec<TrainingProgram>> {
    let sql = format!("{} ORDER BY p.id", SELECT_PROGRAMS);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(program_from_row).collect()
}

pub async fn load_program(pool: &SqlitePool, id: i64) -> StudioResult<TrainingProgram> {
    let sql = format!("{} WHERE p.id = ?", SELECT_PROGRAMS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StudioError::not_found(format!("Program {}", id)))?;

    program_from_row(&row)
}

/// Write a program back. Unconditional overwrite keyed by id.
pub async fn save_program(pool: &SqlitePool, program: &mut TrainingProgram) -> StudioResult<()> {
    let phases_json = serde_json::to_string(&program.phases)?;
    program.updated_at = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE training_programs
        SET name = ?,
            description = ?,
            phases_json = ?,
            total_weeks = ?,
            current_week = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&program.name)
    .bind(&program.description)
    .bind(&phases_json)
    .bind(program.total_weeks)
    .bind(program.current_week)
    .bind(program.updated_at)
    .bind(program.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StudioError::not_found(format!("Program {}", program.id)));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Program Actions
// ---------------------------------------------------------------------------

pub async fn create_program(pool: &SqlitePool, new: NewProgram) -> StudioResult<TrainingProgram> {
    let name = validate_name(&new.name)?;
    validate_phase_inputs(&new.phases)?;

    let schedule = phases::schedule(new.phases, new.current_week.unwrap_or(1));
    let phases_json = serde_json::to_string(&schedule.phases)?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO training_programs
            (name, description, phases_json, total_weeks, current_week, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&name)
    .bind(normalize_description(new.description))
    .bind(&phases_json)
    .bind(schedule.total_weeks)
    .bind(schedule.current_week)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    info!(program_id = id, total_weeks = schedule.total_weeks, "Created program {}", name);

    load_program(pool, id).await
}

pub async fn update_program(
    pool: &SqlitePool,
    id: i64,
    update: ProgramUpdate,
) -> StudioResult<TrainingProgram> {
    let mut program = load_program(pool, id).await?;

    if let Some(name) = update.name {
        program.name = validate_name(&name)?;
    }
    if update.description.is_some() {
        program.description = normalize_description(update.description);
    }

    let inputs = match update.phases {
        Some(inputs) => {
            validate_phase_inputs(&inputs)?;
            inputs
        }
        None => program.phase_inputs(),
    };
    let week = update
        .current_week
        .unwrap_or(i64::from(program.current_week));

    replan(&mut program, inputs, week);
    save_program(pool, &mut program).await?;

    Ok(program)
}

pub async fn delete_program(pool: &SqlitePool, id: i64) -> StudioResult<()> {
    let result = sqlx::query("DELETE FROM training_programs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StudioError::not_found(format!("Program {}", id)));
    }

    info!(program_id = id, "Deleted program");
    Ok(())
}

// ---------------------------------------------------------------------------
// Phase Actions
// ---------------------------------------------------------------------------

/// Append a phase at the end of the program
pub async fn add_phase(
    pool: &SqlitePool,
    id: i64,
    input: PhaseInput,
) -> StudioResult<TrainingProgram> {
    validate_phase_input(&input)?;

    let mut program = load_program(pool, id).await?;
    let mut inputs = program.phase_inputs();
    inputs.push(input);
    validate_phase_ids(supplied_ids(&inputs))?;

    let week = i64::from(program.current_week);
    replan(&mut program, inputs, week);
    save_program(pool, &mut program).await?;

    Ok(program)
}

/// Edit one phase's labels or duration; later ranges shift accordingly
pub async fn update_phase(
    pool: &SqlitePool,
    id: i64,
    phase_id: &str,
    update: PhaseUpdate,
) -> StudioResult<TrainingProgram> {
    let mut program = load_program(pool, id).await?;
    let mut inputs = program.phase_inputs();

    let target = inputs
        .iter_mut()
        .find(|p| p.id.as_deref() == Some(phase_id))
        .ok_or_else(|| StudioError::not_found(format!("Phase {}", phase_id)))?;

    if let Some(name) = update.name {
        target.name = name;
    }
    if let Some(focus) = update.focus {
        target.focus = focus;
    }
    if update.weeks.is_some() {
        target.weeks = update.weeks;
    }
    validate_phase_input(target)?;

    let week = i64::from(program.current_week);
    replan(&mut program, inputs, week);
    save_program(pool, &mut program).await?;

    Ok(program)
}

pub async fn remove_phase(
    pool: &SqlitePool,
    id: i64,
    phase_id: &str,
) -> StudioResult<TrainingProgram> {
    let mut program = load_program(pool, id).await?;
    let mut inputs = program.phase_inputs();

    let idx = inputs
        .iter()
        .position(|p| p.id.as_deref() == Some(phase_id))
        .ok_or_else(|| StudioError::not_found(format!("Phase {}", phase_id)))?;
    inputs.remove(idx);

    let week = i64::from(program.current_week);
    replan(&mut program, inputs, week);
    save_program(pool, &mut program).await?;

    Ok(program)
}

/// Reorder phases by an explicit id sequence covering every phase
pub async fn reorder_phases(
    pool: &SqlitePool,
    id: i64,
    phase_ids: &[String],
) -> StudioResult<TrainingProgram> {
    let mut program = load_program(pool, id).await?;
    let inputs = phases::reorder(&program.phases, phase_ids)?;

    let week = i64::from(program.current_week);
    replan(&mut program, inputs, week);
    save_program(pool, &mut program).await?;

    Ok(program)
}

// ---------------------------------------------------------------------------
// Current Week
// ---------------------------------------------------------------------------

/// Move the week cursor, clamped to the program's length
pub async fn set_current_week(
    pool: &SqlitePool,
    id: i64,
    week: i64,
) -> StudioResult<TrainingProgram> {
    let mut program = load_program(pool, id).await?;
    let inputs = program.phase_inputs();

    replan(&mut program, inputs, week);
    save_program(pool, &mut program).await?;

    Ok(program)
}

pub async fn advance_week(pool: &SqlitePool, id: i64) -> StudioResult<TrainingProgram> {
    let program = load_program(pool, id).await?;
    set_current_week(pool, id, i64::from(program.current_week) + 1).await
}

// ---------------------------------------------------------------------------
// Active Program
// ---------------------------------------------------------------------------

/// Point the active slot at `id`. Replaces whichever program was active.
pub async fn activate_program(pool: &SqlitePool, id: i64) -> StudioResult<TrainingProgram> {
    // Surface a not-found instead of a foreign key failure
    load_program(pool, id).await?;

    sqlx::query("UPDATE active_program SET program_id = ?, updated_at = ? WHERE id = 1")
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    info!(program_id = id, "Activated program");
    load_program(pool, id).await
}

pub async fn deactivate_programs(pool: &SqlitePool) -> StudioResult<()> {
    sqlx::query("UPDATE active_program SET program_id = NULL, updated_at = ? WHERE id = 1")
        .bind(Utc::now())
        .execute(pool)
        .await?;

    info!("Cleared active program");
    Ok(())
}

pub async fn load_active_program(pool: &SqlitePool) -> StudioResult<Option<TrainingProgram>> {
    let sql = format!("{} WHERE a.program_id IS NOT NULL", SELECT_PROGRAMS);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;

    row.as_ref().map(program_from_row).transpose()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
