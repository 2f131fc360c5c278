mod common;

use std::sync::Mutex;

use codepilot_core::api::{
    apply_response, parse_response, run_request, CliError, FileOperation, NoopSessionObserver,
    ResultEntry, RetryError, SessionObserver, StepStatus,
};
use pretty_assertions::assert_eq;
use tokio_test::assert_ok;

#[derive(Default)]
struct RecordingObserver {
    results: Mutex<Vec<ResultEntry>>,
}

impl RecordingObserver {
    fn outcomes(&self) -> Vec<(String, bool)> {
        self.results
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.description.clone(), e.succeeded))
            .collect()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_result(&self, entry: &ResultEntry) {
        self.results.lock().unwrap().push(entry.clone());
    }
}

const TODO_PLAN: &str = r#"{
  "totalSteps": 5,
  "steps": [
    {"description": "Create the project folder", "files": ["my-app"], "dependencies": []},
    {"description": "Write package.json", "files": ["my-app/package.json"], "dependencies": [0]},
    {"description": "Write the App component", "files": ["my-app/src/App.js"], "dependencies": [1]},
    {"description": "Add a todo input", "files": ["my-app/src/App.js"], "dependencies": [2]},
    {"description": "Install dependencies", "files": [], "dependencies": [1]}
  ]
}"#;

const STEP_1: &str = "I'll start by creating the folder.\n$$$ FOLDER_CREATE my-app %%%\n";

const STEP_2: &str = r#"$$$ FILE_CREATE my-app/package.json
{
  "name": "my-app",
  "dependencies": {"react": "^18.2.0"}
}
$$$ FILE_END %%%"#;

const STEP_3: &str = r#"$$$ FILE_CREATE my-app/src/App.js
import React from 'react';

function App() {
  return <h1>Todos</h1>;
}

export default App;
$$$ FILE_END %%%"#;

const STEP_4: &str = r#"$$$ FILE_MODIFY my-app/src/App.js
### REPLACE_BLOCK_START heading
  return <h1>Todos</h1>;
### REPLACE_BLOCK_END
### NEW_BLOCK_START heading
  return <div><h1>Todos</h1><input placeholder="New todo" /></div>;
### NEW_BLOCK_END
### INSERT_AFTER line:"import React from 'react';"
import './App.css';
### INSERT_END
$$$ FILE_END %%%"#;

const STEP_5: &str = r#"$$$ COMMAND_EXEC
{"command": "npm install", "cwd": "my-app", "description": "Install dependencies"}
$$$ COMMAND_END %%%"#;

#[test]
fn first_step_response_yields_one_folder() {
    let out = parse_response(STEP_1);
    assert_eq!(
        out.operations,
        vec![FileOperation::CreateFolder {
            path: "my-app".to_string()
        }]
    );
}

#[tokio::test]
async fn react_todo_app_runs_end_to_end() {
    let h = common::harness(3, &[TODO_PLAN, STEP_1, STEP_2, STEP_3, STEP_4, STEP_5]).await;

    let summary = run_request(&h.ctx, "Create a React todo app", &NoopSessionObserver)
        .await
        .unwrap();

    assert_eq!(summary.plan.total_steps, 5);
    assert!(summary.plan.is_terminal());
    assert!(summary
        .plan
        .steps
        .iter()
        .all(|s| s.status == StepStatus::Completed));
    assert_eq!(summary.plan.steps[0].files, vec!["my-app".to_string()]);
    assert!(summary.results.iter().all(|r| r.succeeded));
    assert_eq!(h.llm.remaining(), 0);

    let app = std::fs::read_to_string(h.dir.path().join("my-app/src/App.js")).unwrap();
    assert!(app.contains("import './App.css';"));
    assert!(app.contains("placeholder=\"New todo\""));
    assert_eq!(h.runner.commands(), vec!["npm install".to_string()]);

    let prompts = h.llm.prompts();
    assert!(prompts[2].user_prompt.contains("1. Create the project folder [my-app]"));
}

#[tokio::test]
async fn failed_step_is_repaired_by_diagnosis() {
    let plan = r#"{"totalSteps": 1, "steps": [{"description": "Run the tests"}]}"#;
    let step = r#"$$$ COMMAND_EXEC
{"command": "npm test"}
$$$ COMMAND_END %%%"#;
    let diagnosis = r#"{"analysis": "no test script", "explanation": "add one", "solution": "$$$ FILE_CREATE package.json\n{\"scripts\": {\"test\": \"node -e 0\"}}\n$$$ FILE_END %%%", "shouldStop": false}"#;
    let h = common::harness(3, &[plan, step, diagnosis, step]).await;
    h.runner.push_failure(1, "npm ERR! Missing script: \"test\"");

    let observer = RecordingObserver::default();
    let summary = assert_ok!(run_request(&h.ctx, "test it", &observer).await);
    assert!(summary.plan.is_terminal());
    assert_eq!(
        observer.outcomes(),
        vec![("npm test".to_string(), false), ("npm test".to_string(), true)]
    );
    assert_eq!(summary.results.len(), 1);
    assert_eq!(
        h.runner.commands(),
        vec!["npm test".to_string(), "npm test".to_string()]
    );
    assert!(h.dir.path().join("package.json").exists());

    let prompts = h.llm.prompts();
    assert!(prompts[2].user_prompt.contains("Missing script"));
    assert!(prompts[2].user_prompt.contains("\"command\": \"npm test\""));
    assert!(prompts[3].user_prompt.contains("previous attempt at this step failed"));
}

#[tokio::test]
async fn missing_module_is_installed_without_diagnosis() {
    let plan = r#"{"totalSteps": 1, "steps": [{"description": "Start the app"}]}"#;
    let step = r#"$$$ COMMAND_EXEC
{"command": "node index.js"}
$$$ COMMAND_END %%%"#;
    let h = common::harness(3, &[plan, step, step]).await;
    h.runner.push_failure(1, "Error: Cannot find module 'lodash'");
    h.runner
        .push_stdout(r#"{"dependencies": {"lib": {"version": "1.0.0", "dependencies": {"lodash": {"version": "4.17.21"}}}}}"#);

    assert_ok!(run_request(&h.ctx, "start", &NoopSessionObserver).await);
    assert_eq!(
        h.runner.commands(),
        vec![
            "node index.js".to_string(),
            "npm ls lodash --all --json".to_string(),
            "npm install lodash@4.17.21".to_string(),
            "node index.js".to_string(),
        ]
    );
    assert_eq!(h.llm.remaining(), 0);
}

#[tokio::test]
async fn exhaustion_reports_attempts_and_marks_step_failed() {
    let plan = r#"{"totalSteps": 1, "steps": [{"description": "Build"}]}"#;
    let step = r#"$$$ COMMAND_EXEC
{"command": "npm run build"}
$$$ COMMAND_END %%%"#;
    let diagnosis = r#"{"analysis": "flaky", "explanation": "try again", "solution": null, "shouldStop": false}"#;
    let h = common::harness(2, &[plan, step, diagnosis, step]).await;
    h.runner.push_failure(2, "webpack exploded");
    h.runner.push_failure(2, "webpack exploded");

    let err = run_request(&h.ctx, "build", &NoopSessionObserver)
        .await
        .unwrap_err();
    match &err {
        CliError::Retry(RetryError::Exhausted {
            attempts, context, ..
        }) => {
            assert_eq!(*attempts, 2);
            assert!(context.starts_with("step 1"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("webpack exploded"));
}

#[tokio::test]
async fn escalation_stops_immediately() {
    let plan = r#"{"totalSteps": 1, "steps": [{"description": "Deploy"}]}"#;
    let step = r#"$$$ COMMAND_EXEC
{"command": "npm run deploy"}
$$$ COMMAND_END %%%"#;
    let diagnosis = r#"{"analysis": "no credentials", "explanation": "log in first", "solution": null, "shouldStop": true}"#;
    let h = common::harness(50, &[plan, step, diagnosis]).await;
    h.runner.push_failure(1, "401 Unauthorized");

    let err = run_request(&h.ctx, "deploy", &NoopSessionObserver)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CliError::Retry(RetryError::EscalatedStop { attempt: 1, .. })
    ));
    assert_eq!(h.runner.commands().len(), 1);
}

#[tokio::test]
async fn invalid_plan_is_retried() {
    let good = r#"{"totalSteps": 1, "steps": [{"description": "Make dir"}]}"#;
    let diagnosis = r#"{"analysis": "bad json", "explanation": "retry", "solution": null, "shouldStop": false}"#;
    let h = common::harness(3, &["Sure! Here's a plan.", diagnosis, good, "$$$ FOLDER_CREATE out %%%"]).await;

    let summary = assert_ok!(run_request(&h.ctx, "make a dir", &NoopSessionObserver).await);
    assert_eq!(summary.plan.steps[0].files, vec!["out".to_string()]);
    assert!(h.dir.path().join("out").is_dir());
}

#[tokio::test]
async fn apply_writes_files_without_planning() {
    let h = common::harness(1, &[]).await;
    let entries = apply_response(
        &h.ctx,
        "$$$ FILE_CREATE notes/a.txt\nhello\n$$$ FILE_END %%%",
        false,
        &NoopSessionObserver,
    )
    .await
    .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        std::fs::read_to_string(h.dir.path().join("notes/a.txt")).unwrap(),
        "hello"
    );
}

#[tokio::test]
async fn apply_rejects_path_escape() {
    let h = common::harness(1, &[]).await;
    let err = apply_response(
        &h.ctx,
        "$$$ FOLDER_CREATE ../outside %%%",
        false,
        &NoopSessionObserver,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::Executor(e) if e.is_path_validation()));
}

#[tokio::test]
async fn apply_reports_completed_and_failed_entries() {
    let h = common::harness(1, &[]).await;
    let response = r#"$$$ FOLDER_CREATE done %%%
$$$ FILE_MODIFY missing.js
### INSERT_AFTER line:"x"
y
### INSERT_END
$$$ FILE_END %%%"#;
    let observer = RecordingObserver::default();

    let err = apply_response(&h.ctx, response, false, &observer)
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Executor(_)));
    assert_eq!(
        observer.outcomes(),
        vec![
            ("Create folder done".to_string(), true),
            ("Modify file missing.js (1 edits)".to_string(), false),
        ]
    );
    assert!(h.dir.path().join("done").is_dir());
}
