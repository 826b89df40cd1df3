pub mod event;
pub mod program;

pub use event::{Event, EventUpdate, EventView, NewEvent, NewRegistration, Registration};
pub use program::{NewProgram, PhaseUpdate, ProgramUpdate, TrainingProgram};
