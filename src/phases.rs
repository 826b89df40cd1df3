//! Phase Scheduler
//!
//! Lays out a training program's phases on an absolute week axis and derives
//! each phase's status from the program's current week:
//! - phases tile weeks 1..=total_weeks contiguously, in list order
//! - a phase is completed once the current week passes its end week
//! - status is never stored on its own; it is recomputed from the ranges
//!
//! Every mutation of a program's phase list goes through [`schedule`], which
//! runs [`recompute_ranges`] then [`apply_statuses`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Longest single phase the scheduler will lay out (ten years).
pub const MAX_PHASE_WEEKS: u32 = 520;

// ---------------------------------------------------------------------------
/// Phase Status: Where a phase sits relative to the current week
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// current_week < start_week
    #[default]
    Upcoming,
    /// start_week <= current_week <= end_week
    Current,
    /// current_week > end_week
    Completed,
}

impl PhaseStatus {
    pub fn for_week(start_week: u32, end_week: u32, current_week: u32) -> Self {
        if current_week > end_week {
            Self::Completed
        } else if current_week >= start_week {
            Self::Current
        } else {
            Self::Upcoming
        }
    }
}

// ---------------------------------------------------------------------------
/// Phase Input: What callers hand to the scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub focus: String,
    /// Duration in weeks. Missing or non-positive values schedule as 1,
    /// anything past [`MAX_PHASE_WEEKS`] as [`MAX_PHASE_WEEKS`].
    #[serde(default)]
    pub weeks: Option<i64>,
}

impl PhaseInput {
    pub fn new(name: impl Into<String>, focus: impl Into<String>, weeks: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            focus: focus.into(),
            weeks: Some(weeks),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn coerced_weeks(&self) -> u32 {
        match self.weeks {
            Some(w) if w >= 1 => u32::try_from(w)
                .unwrap_or(MAX_PHASE_WEEKS)
                .min(MAX_PHASE_WEEKS),
            _ => 1,
        }
    }
}

// ---------------------------------------------------------------------------
/// Program Phase: A scheduled phase with derived range and status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramPhase {
    pub id: String,
    pub name: String,
    pub focus: String,
    pub weeks: u32,
    /// 1-based position among sibling phases
    pub order: u32,
    /// Inclusive, 1-based
    pub start_week: u32,
    /// Inclusive, 1-based
    pub end_week: u32,
    #[serde(default)]
    pub status: PhaseStatus,
}

impl ProgramPhase {
    pub fn contains_week(&self, week: u32) -> bool {
        self.start_week <= week && week <= self.end_week
    }
}

impl From<&ProgramPhase> for PhaseInput {
    fn from(phase: &ProgramPhase) -> Self {
        Self {
            id: Some(phase.id.clone()),
            name: phase.name.clone(),
            focus: phase.focus.clone(),
            weeks: Some(i64::from(phase.weeks)),
        }
    }
}

// ---------------------------------------------------------------------------
/// Phase Schedule: Output of the full pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSchedule {
    pub phases: Vec<ProgramPhase>,
    pub total_weeks: u32,
    pub current_week: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("Unknown phase id: {0}")]
    UnknownPhase(String),

    #[error("Phase id listed more than once: {0}")]
    DuplicatePhase(String),

    #[error("Phase id missing from new order: {0}")]
    MissingPhase(String),
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Assign order, ids and contiguous week ranges. Statuses are reset to
/// `Upcoming`; run [`apply_statuses`] afterwards.
///
/// Ids stay unique within the list: a blank id, or one already taken by an
/// earlier phase, is replaced with a fresh UUID.
pub fn recompute_ranges(phases: Vec<PhaseInput>) -> Vec<ProgramPhase> {
    let mut next_start = 1u32;
    let mut taken = HashSet::new();

    phases
        .into_iter()
        .enumerate()
        .map(|(idx, input)| {
            let weeks = input.coerced_weeks();
            let start_week = next_start;
            let end_week = start_week.saturating_add(weeks - 1);
            next_start = end_week.saturating_add(1);

            let id = input
                .id
                .filter(|id| !id.trim().is_empty() && !taken.contains(id))
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            taken.insert(id.clone());

            ProgramPhase {
                id,
                name: input.name,
                focus: input.focus,
                weeks,
                order: idx as u32 + 1,
                start_week,
                end_week,
                status: PhaseStatus::Upcoming,
            }
        })
        .collect()
}

/// Derive each phase's status from `current_week`.
pub fn apply_statuses(phases: Vec<ProgramPhase>, current_week: u32) -> Vec<ProgramPhase> {
    phases
        .into_iter()
        .map(|mut phase| {
            phase.status = PhaseStatus::for_week(phase.start_week, phase.end_week, current_week);
            phase
        })
        .collect()
}

pub fn total_weeks(phases: &[ProgramPhase]) -> u32 {
    phases.iter().fold(0u32, |acc, p| acc.saturating_add(p.weeks))
}

/// Keep a current week inside `[1, max(1, total_weeks)]`.
pub fn clamp_week(week: i64, total_weeks: u32) -> u32 {
    let upper = i64::from(total_weeks.max(1));
    week.clamp(1, upper) as u32
}

/// Full pipeline: ranges, clamped current week, statuses, total.
pub fn schedule(phases: Vec<PhaseInput>, current_week: i64) -> PhaseSchedule {
    let ranged = recompute_ranges(phases);
    let total_weeks = total_weeks(&ranged);
    let current_week = clamp_week(current_week, total_weeks);

    PhaseSchedule {
        phases: apply_statuses(ranged, current_week),
        total_weeks,
        current_week,
    }
}

/// Rearrange phases to follow `ids`. `ids` must name every existing phase
/// exactly once.
pub fn reorder(phases: &[ProgramPhase], ids: &[String]) -> Result<Vec<PhaseInput>, PhaseError> {
    let mut reordered = Vec::with_capacity(phases.len());
    let mut seen = HashSet::new();
    let mut used = vec![false; phases.len()];

    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(PhaseError::DuplicatePhase(id.clone()));
        }
        let idx = phases
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| PhaseError::UnknownPhase(id.clone()))?;
        used[idx] = true;
        reordered.push(PhaseInput::from(&phases[idx]));
    }

    // Every phase is consumed exactly once, including any stored with a repeated id
    if let Some(idx) = used.iter().position(|u| !u) {
        return Err(PhaseError::MissingPhase(phases[idx].id.clone()));
    }
    debug_assert_eq!(reordered.len(), phases.len());

    Ok(reordered)
}

/// The phase whose range holds `current_week`, if any.
pub fn current_phase(phases: &[ProgramPhase], current_week: u32) -> Option<&ProgramPhase> {
    phases.iter().find(|p| p.contains_week(current_week))
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
