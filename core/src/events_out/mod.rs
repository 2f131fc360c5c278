//! Optional JSONL sink for progress events and result entries.

pub mod helpers;
pub mod writer;

pub use crate::config::EventsOutConfig;
pub use helpers::{write_event, write_progress, write_result, RunEvent};
pub use writer::{start_events_out, EventsOutTx};
