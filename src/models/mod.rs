//! Domain models for research runs and their children.

mod answer;
mod event;
mod run;
mod source;
mod step;

pub use answer::Answer;
pub use event::{EventType, ExecutionMode, PipelineEvent};
pub use run::{ResearchRun, RunStatus};
pub use source::Source;
pub use step::{ResearchStep, StepStatus, StepType};
