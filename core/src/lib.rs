//! codepilot core: response protocol, executor, planner, retry controller and session engine.

pub mod api;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod events_out;
pub mod executor;
pub mod llm;
pub mod planner;
pub mod protocol;
pub mod retry;
pub mod util;
