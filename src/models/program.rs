use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phases::{self, PhaseInput, ProgramPhase};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingProgram {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub phases: Vec<ProgramPhase>,
  pub total_weeks: u32,
  pub current_week: u32,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TrainingProgram {
  pub fn current_phase(&self) -> Option<&ProgramPhase> {
    phases::current_phase(&self.phases, self.current_week)
  }

  /// Phase list as scheduler input, in current order
  pub fn phase_inputs(&self) -> Vec<PhaseInput> {
    self.phases.iter().map(PhaseInput::from).collect()
  }
}

/// For creating programs (without id, timestamps)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProgram {
  pub name: String,
  pub description: Option<String>,
  #[serde(default)]
  pub phases: Vec<PhaseInput>,
  pub current_week: Option<i64>,
}

/// Partial update; `phases` replaces the whole list when present
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramUpdate {
  pub name: Option<String>,
  pub description: Option<String>,
  pub phases: Option<Vec<PhaseInput>>,
  pub current_week: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseUpdate {
  pub name: Option<String>,
  pub focus: Option<String>,
  pub weeks: Option<i64>,
}
