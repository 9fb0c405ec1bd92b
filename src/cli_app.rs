//! Top-level CLI definition and dispatch.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use dashview::core::config::Config;
use dashview::core::errors::DashError;
use dashview::dashboard::model::{CardId, ViewState};
use dashview::dashboard::orchestrator::Orchestrator;
use dashview::dashboard::snapshot::RenderSnapshot;
use dashview::dashboard::timer::VirtualClock;
use dashview::logger::MemoryJournal;
use dashview::logger::jsonl::LogEntry;

/// Dashboard view-state and card-expansion orchestrator.
#[derive(Debug, Parser)]
#[command(
    name = "dashview",
    author,
    version,
    about = "Dashboard view-state orchestrator - scripted simulation and config tools",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run a command script against a virtual clock and print every snapshot.
    Simulate(SimulateArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct SimulateArgs {
    /// Steps: normal|loading|skeleton|error|empty, toggle:<card>, wait:<ms>.
    #[arg(required = true, value_name = "STEP")]
    steps: Vec<String>,
    /// Print only the snapshot left after the last step.
    #[arg(long)]
    final_only: bool,
    /// Also print the transition journal.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<DashError> for CliError {
    fn from(err: DashError) -> Self {
        match err {
            DashError::InvalidConfig { .. }
            | DashError::MissingConfig { .. }
            | DashError::ConfigParse { .. }
            | DashError::InvalidCardSet { .. }
            | DashError::UnknownCard { .. } => Self::User(err.to_string()),
            DashError::Io { .. }
            | DashError::ChannelClosed { .. }
            | DashError::Runtime { .. } => Self::Runtime(err.to_string()),
            DashError::Serialization { .. } => Self::Internal(err.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Simulate(args) => run_simulate(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// One scripted simulator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimStep {
    Set(ViewState),
    Toggle(usize),
    Wait(u64),
}

impl SimStep {
    fn label(self) -> String {
        match self {
            Self::Set(state) => state.label().to_string(),
            Self::Toggle(index) => format!("toggle:{index}"),
            Self::Wait(ms) => format!("wait:{ms}"),
        }
    }
}

fn parse_step(raw: &str) -> Result<SimStep, CliError> {
    let raw = raw.trim();
    if let Some(state) = ViewState::from_label(raw) {
        return Ok(SimStep::Set(state));
    }
    let (verb, arg) = raw
        .split_once(':')
        .ok_or_else(|| CliError::User(format!("unrecognized step {raw:?}")))?;
    let number = |what: &str| {
        arg.trim()
            .parse::<u64>()
            .map_err(|_| CliError::User(format!("step {raw:?}: {what} must be a number")))
    };
    match verb.trim().to_ascii_lowercase().as_str() {
        "toggle" => {
            let index = usize::try_from(number("card index")?)
                .map_err(|_| CliError::User(format!("step {raw:?}: card index too large")))?;
            Ok(SimStep::Toggle(index))
        }
        "wait" => Ok(SimStep::Wait(number("milliseconds")?)),
        _ => Err(CliError::User(format!("unrecognized step {raw:?}"))),
    }
}

/// A snapshot tagged with when and why it was emitted.
#[derive(Debug, Clone, Serialize)]
struct SimFrame {
    t_ms: u64,
    step: String,
    snapshot: RenderSnapshot,
}

#[derive(Debug)]
struct SimOutcome {
    frames: Vec<SimFrame>,
    journal: Vec<LogEntry>,
}

fn simulate(config: &Config, steps: &[SimStep], trace: bool) -> Result<SimOutcome, CliError> {
    let memory = MemoryJournal::new();
    let mut dash = Orchestrator::simulated(config)?;
    if trace {
        dash = dash.with_journal(memory.clone());
    }
    let emitted: Rc<RefCell<Vec<RenderSnapshot>>> = Rc::default();
    let sink = Rc::clone(&emitted);
    dash.subscribe(move |s| sink.borrow_mut().push(s.clone()));

    let mut frames = Vec::new();
    let mut collect = |dash: &Orchestrator<VirtualClock>, step: &str| {
        let t_ms = u64::try_from(dash.now().as_millis()).unwrap_or(u64::MAX);
        frames.extend(emitted.borrow_mut().drain(..).map(|snapshot| SimFrame {
            t_ms,
            step: step.to_string(),
            snapshot,
        }));
    };

    for step in steps {
        let label = step.label();
        match *step {
            SimStep::Set(state) => {
                dash.set_view_state(state);
                collect(&dash, &label);
            }
            SimStep::Toggle(index) => {
                dash.toggle_card(CardId::new(index))?;
                collect(&dash, &label);
            }
            SimStep::Wait(ms) => {
                let target = dash.now() + Duration::from_millis(ms);
                while let Some(deadline) = dash.timer().next_deadline().filter(|d| *d <= target)
                {
                    let _ = dash.advance(deadline.saturating_sub(dash.now()));
                    collect(&dash, &label);
                }
                let _ = dash.advance(target.saturating_sub(dash.now()));
            }
        }
    }
    drop(dash);

    Ok(SimOutcome {
        frames,
        journal: memory.entries(),
    })
}

fn run_simulate(cli: &Cli, args: &SimulateArgs) -> Result<(), CliError> {
    let steps = args
        .steps
        .iter()
        .map(|raw| parse_step(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let config = Config::load(cli.config.as_deref())?;
    let outcome = simulate(&config, &steps, args.trace)?;

    let frames: Vec<&SimFrame> = if args.final_only {
        outcome.frames.last().into_iter().collect()
    } else {
        outcome.frames.iter().collect()
    };

    match output_mode(cli) {
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            for frame in frames {
                writeln!(stdout, "{}", render_frame_line(frame))?;
            }
            if args.trace {
                writeln!(stdout, "{}", "journal:".bold())?;
                for entry in &outcome.journal {
                    writeln!(stdout, "  {}", serde_json::to_string(entry)?)?;
                }
            }
        }
        OutputMode::Json => {
            for frame in frames {
                write_json_line(&serde_json::to_value(frame)?)?;
            }
            if args.trace {
                for entry in &outcome.journal {
                    write_json_line(&json!({ "journal": entry }))?;
                }
            }
        }
    }
    Ok(())
}

fn render_frame_line(frame: &SimFrame) -> String {
    let s = &frame.snapshot;
    let state = match s.view_state {
        ViewState::Normal => s.view_state.label().green(),
        ViewState::Loading | ViewState::Skeleton => s.view_state.label().yellow(),
        ViewState::Error => s.view_state.label().red(),
        ViewState::Empty => s.view_state.label().dimmed(),
    };
    let mut line = format!(
        "t={:>6}ms  {:<12} {:<9} epoch={:<3} {:<18}",
        frame.t_ms,
        frame.step,
        state,
        s.reveal_epoch,
        s.expansion.label(),
    );
    if s.fading_from_skeleton {
        line.push_str(" fading");
    }
    for card in &s.cards {
        let marker = if card.interactable { "" } else { "x" };
        let _ = write!(
            line,
            "  {}={:.2}/{}ms{marker}",
            card.id,
            card.opacity(),
            card.render.transition.delay_ms
        );
    }
    if let Some(id) = s.overlay.visible_card {
        let _ = write!(line, "  overlay={}", id.to_string().cyan());
    }
    line
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let value = serde_json::to_value(&config)?;
                    let payload = json!({
                        "command": "config show",
                        "config": value,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("{}", "Configuration is valid.".green());
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("{} {e}", "Configuration is INVALID:".red());
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("DASHVIEW_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
