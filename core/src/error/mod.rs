pub mod code;
#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;
pub mod planner;
pub mod retry;

pub use code::ErrorCode;
pub use error::CliError;
pub use executor::ExecutorError;
pub use planner::PlanError;
pub use retry::RetryError;
