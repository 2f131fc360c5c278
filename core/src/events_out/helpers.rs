use serde::Serialize;

use crate::events_out::EventsOutTx;
use crate::executor::ResultEntry;
use crate::planner::ProgressEvent;

/// One JSONL record: `{"v":1,"type":...,"ts":...,"run_id":...,"data":...}`.
#[derive(Debug, Serialize)]
pub struct RunEvent<'a, T: Serialize> {
    pub v: u8,
    #[serde(rename = "type")]
    pub event_type: &'a str,
    pub ts: String,
    pub run_id: &'a str,
    pub data: &'a T,
}

impl<'a, T: Serialize> RunEvent<'a, T> {
    pub fn new(event_type: &'a str, run_id: &'a str, data: &'a T) -> Self {
        Self {
            v: 1,
            event_type,
            ts: chrono::Utc::now().to_rfc3339(),
            run_id,
            data,
        }
    }
}

pub async fn write_event<T: Serialize>(
    out: Option<&EventsOutTx>,
    event_type: &str,
    run_id: &str,
    data: &T,
) {
    let Some(out) = out else {
        return;
    };
    if let Ok(line) = serde_json::to_string(&RunEvent::new(event_type, run_id, data)) {
        out.send_line(line).await;
    }
}

pub async fn write_progress(out: Option<&EventsOutTx>, run_id: &str, ev: &ProgressEvent) {
    write_event(out, "plan.progress", run_id, ev).await;
}

pub async fn write_result(out: Option<&EventsOutTx>, run_id: &str, entry: &ResultEntry) {
    write_event(out, "step.result", run_id, entry).await;
}
