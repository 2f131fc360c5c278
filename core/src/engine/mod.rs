mod prompt;
mod run;
mod types;

pub use prompt::{build_step_prompt, STEP_PROMPT};
pub use run::{apply_response, run_request};
pub use types::{NoopSessionObserver, RunSummary, SessionObserver};
