use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "codepilot",
    version,
    about = "Plan, generate and apply model-driven code changes"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; defaults to ~/.codepilot/config.toml, then ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Directory every file operation and command is confined to.
    #[arg(long, global = true)]
    pub root: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct PromptInput {
    #[arg(long)]
    pub prompt: Option<String>,

    #[arg(long)]
    pub prompt_file: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: PromptInput,

    /// Print the run summary as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: PromptInput,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ParseArgs {
    /// File holding a protocol response ("-" reads stdin).
    #[arg(long)]
    pub file: String,

    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ApplyArgs {
    /// File holding a protocol response ("-" reads stdin).
    #[arg(long)]
    pub file: String,

    /// Apply once; skip dependency install and diagnosis on failure.
    #[arg(long, default_value_t = false)]
    pub no_retry: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan a request and drive every step to completion.
    Run(RunArgs),
    /// Print the task plan for a request without executing it.
    Plan(PlanArgs),
    /// Parse a protocol response and print the resulting operations.
    Parse(ParseArgs),
    /// Parse and apply a protocol response under the configured root.
    Apply(ApplyArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_accepts_prompt_and_global_root() {
        let args = Args::try_parse_from([
            "codepilot",
            "run",
            "--prompt",
            "Create a React todo app",
            "--root",
            "/tmp/w",
        ])
        .unwrap();
        assert_eq!(args.root.as_deref(), Some("/tmp/w"));
        match args.command {
            Commands::Run(r) => {
                assert_eq!(r.input.prompt.as_deref(), Some("Create a React todo app"));
                assert!(r.input.prompt_file.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn prompt_and_prompt_file_conflict() {
        let res = Args::try_parse_from([
            "codepilot",
            "plan",
            "--prompt",
            "x",
            "--prompt-file",
            "p.txt",
        ]);
        assert!(res.is_err());
        assert!(Args::try_parse_from(["codepilot", "plan"]).is_err());
    }

    #[test]
    fn apply_no_retry_flag() {
        let args = Args::try_parse_from(["codepilot", "apply", "--file", "resp.txt", "--no-retry"])
            .unwrap();
        match args.command {
            Commands::Apply(a) => {
                assert_eq!(a.file, "resp.txt");
                assert!(a.no_retry);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
