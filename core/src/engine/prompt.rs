use crate::planner::{TaskPlan, TaskStep};

/// System prompt for step execution: describes the marker protocol.
pub const STEP_PROMPT: &str = r#"You are a coding agent that edits a project by emitting marker directives.
Only directives are executed; prose is ignored. Every directive must end with %%%.

Create a folder:
$$$ FOLDER_CREATE relative/path %%%

Create or overwrite a file:
$$$ FILE_CREATE relative/path
<full file content>
$$$ FILE_END %%%

Modify a file:
$$$ FILE_MODIFY relative/path
### REPLACE_BLOCK_START <id>
<exact existing text>
### REPLACE_BLOCK_END
### NEW_BLOCK_START <id>
<replacement text>
### NEW_BLOCK_END
### INSERT_AFTER line:"<literal text of an existing line>"
<code>
### INSERT_END
### INSERT_BEFORE line:"<literal text of an existing line>"
<code>
### INSERT_END
$$$ FILE_END %%%

Run commands (JSON object or array; cwd is relative to the project root):
$$$ COMMAND_EXEC
{"command": "npm install", "cwd": "my-app", "isBackground": false, "description": "Install dependencies"}
$$$ COMMAND_END %%%

Show code without writing it:
&&& CODE_BLOCK_START <language>
<code>
&&& CODE_BLOCK_END

Rules:
- Paths are relative to the project root; never use absolute paths or "..".
- One command per entry; no pipes, redirection, ';', '&&' or subshells.
- Long-running servers must set "isBackground": true."#;

/// User prompt for one step, without the previous-failure section.
pub fn build_step_prompt(plan: &TaskPlan, index: usize, step: &TaskStep) -> String {
    let mut out = String::new();
    out.push_str("Original request:\n");
    out.push_str(plan.original_request.trim());
    out.push_str(&format!(
        "\n\nCurrent step ({} of {}):\n{}\n",
        index + 1,
        plan.total_steps,
        step.description
    ));
    if !step.files.is_empty() {
        out.push_str(&format!("Expected files: {}\n", step.files.join(", ")));
    }

    let done: Vec<String> = plan
        .completed_steps()
        .map(|(i, s)| {
            if s.files.is_empty() {
                format!("{}. {}", i + 1, s.description)
            } else {
                format!("{}. {} [{}]", i + 1, s.description, s.files.join(", "))
            }
        })
        .collect();
    if !done.is_empty() {
        out.push_str("\nCompleted steps:\n");
        out.push_str(&done.join("\n"));
        out.push('\n');
    }
    out
}

pub fn with_previous_failure(base: &str, failure: Option<&str>) -> String {
    match failure {
        Some(err) => format!(
            "{base}\nThe previous attempt at this step failed with:\n{err}\nFix the cause and emit the complete directives again.\n"
        ),
        None => base.to_string(),
    }
}
