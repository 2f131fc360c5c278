use std::io::Read;

use codepilot_core::api::{
    apply_response, run_request, AppConfig, AppContext, CliError, MarkerProtocolParser,
    ParseOutput, ResponseProtocolParser,
};
use codepilot_core::protocol::FileOperation;
use codepilot_plugins::PluginServicesFactory;

use crate::commands::cli::{ApplyArgs, Commands, ParseArgs, PlanArgs, PromptInput, RunArgs};
use crate::progress::ProgressMonitor;

pub async fn dispatch(cmd: Commands, cfg: AppConfig) -> Result<i32, CliError> {
    match cmd {
        Commands::Run(args) => run(args, cfg).await,
        Commands::Plan(args) => plan(args, cfg).await,
        Commands::Parse(args) => parse(args),
        Commands::Apply(args) => apply(args, cfg).await,
    }
}

fn read_input(path: &str) -> Result<String, CliError> {
    if path == "-" {
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s)?;
        return Ok(s);
    }
    Ok(std::fs::read_to_string(path)?)
}

fn read_prompt(input: &PromptInput) -> Result<String, CliError> {
    let prompt = match (&input.prompt, &input.prompt_file) {
        (Some(p), _) => p.clone(),
        (None, Some(f)) => read_input(f)?,
        (None, None) => String::new(),
    };
    if prompt.trim().is_empty() {
        return Err(CliError::Config("prompt is empty".to_string()));
    }
    Ok(prompt)
}

fn show_progress(json: bool) -> bool {
    !json && atty::is(atty::Stream::Stderr)
}

async fn run(args: RunArgs, cfg: AppConfig) -> Result<i32, CliError> {
    let prompt = read_prompt(&args.input)?;
    let ctx = AppContext::new(cfg, &PluginServicesFactory).await?;
    let monitor = ProgressMonitor::new(show_progress(args.json));

    let res = run_request(&ctx, &prompt, &monitor).await;
    monitor.finish(res.is_ok());
    ctx.shutdown().await;
    let summary = res?;

    if args.json {
        println!("{}", to_json(&summary)?);
    } else {
        println!(
            "✅ {} of {} steps completed (run {})",
            summary.plan.completed_steps().count(),
            summary.plan.total_steps,
            summary.run_id
        );
        for step in &summary.plan.steps {
            for f in &step.files {
                println!("  {f}");
            }
        }
    }
    Ok(0)
}

async fn plan(args: PlanArgs, cfg: AppConfig) -> Result<i32, CliError> {
    let prompt = read_prompt(&args.input)?;
    let ctx = AppContext::new(cfg, &PluginServicesFactory).await?;
    let res = ctx.planner().plan(&prompt).await;
    ctx.shutdown().await;
    let plan = res?;
    println!("{}", to_json(&plan)?);
    Ok(0)
}

fn parse(args: ParseArgs) -> Result<i32, CliError> {
    let input = read_input(&args.file)?;
    let parser = MarkerProtocolParser;
    let output = parser.parse(&input);
    if args.json {
        println!("{}", to_json(&output)?);
    } else {
        print!("{}", render_parse_output(&output));
    }
    // 有被丢弃的指令时返回非零，便于脚本检测
    let validation = parser.validate_format(&input);
    Ok(if validation.is_valid { 0 } else { 2 })
}

async fn apply(args: ApplyArgs, cfg: AppConfig) -> Result<i32, CliError> {
    let input = read_input(&args.file)?;
    let ctx = AppContext::new(cfg, &PluginServicesFactory).await?;
    let monitor = ProgressMonitor::new(false);
    let res = apply_response(&ctx, &input, !args.no_retry, &monitor).await;
    ctx.shutdown().await;
    // 失败时监视器已打印失败条目，错误交给 main 映射退出码
    let entries = res?;
    println!("applied {} operation(s)", entries.len());
    Ok(0)
}

fn to_json<T: serde::Serialize>(v: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(v).map_err(|e| CliError::Anyhow(e.into()))
}

fn render_parse_output(output: &ParseOutput) -> String {
    let mut out = String::new();
    for (i, op) in output.operations.iter().enumerate() {
        out.push_str(&format!("{:>3}. {}\n", i + 1, op.describe()));
        if let FileOperation::ExecCommand { commands } = op {
            for c in commands {
                let bg = if c.is_background { " (background)" } else { "" };
                out.push_str(&format!("       $ {}{bg}\n", c.command));
            }
        }
    }
    for block in &output.code_blocks {
        out.push_str(&format!(
            "  [code block: {}, {} lines]\n",
            if block.language.is_empty() { "text" } else { &block.language },
            block.code.lines().count()
        ));
    }
    for w in &output.warnings {
        out.push_str(&format!("  warning (line {}): {}\n", w.line, w.message));
    }
    if output.operations.is_empty() && output.warnings.is_empty() {
        out.push_str("no operations\n");
    }
    out
}
