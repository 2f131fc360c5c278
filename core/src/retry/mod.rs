//! Bounded retry with dependency auto-install and AI-assisted repair.

mod analysis;
mod controller;
mod dependency;
mod solution;
mod strategy;

/// Default attempt budget of one `execute_with_retry` call.
pub const MAX_RETRIES: u32 = 50;
/// Default fixed delay between attempts.
pub const RETRY_DELAY_MS: u64 = 2000;

pub use analysis::{
    parse_analysis, ErrorAnalysis, ErrorAnalyzer, ErrorReport, LlmErrorAnalyzer, DIAGNOSIS_PROMPT,
};
pub use controller::{NoopObserver, RetryContext, RetryController, RetryObserver};
pub use dependency::{
    extract_dependency, find_pinned_version, DependencyInstaller, Ecosystem, MissingDependency,
    ShellDependencyInstaller,
};
pub use solution::{classify, EditorBridge, SolutionApplier, SolutionKind};
pub use strategy::{FixedDelayStrategy, RetryStrategy};
