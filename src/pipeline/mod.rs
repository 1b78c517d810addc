//! The research pipeline: planner, searcher, reader, and synthesizer
//! stages sequenced by the orchestrator.

mod orchestrator;
mod planner;
mod stages;
mod state;
mod synthesis;

pub use orchestrator::PipelineOrchestrator;
pub use planner::derive_plan;
pub use state::{project_state, RunState, StepState};
pub use synthesis::SynthesisOutput;
