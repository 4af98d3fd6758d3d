pub mod console;
pub mod render;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use nl2sparql_console::adapters::{AutoConfirm, HttpRemoteService, SystemClock, TerminalPrompt};
use nl2sparql_console::app::polling::{LogPoller, PerfPoller, Poller};
use nl2sparql_console::app::ActionOrchestrator;
use nl2sparql_console::config::{
    BackendConfig, ConfigMode, ConsoleSettings, TokenFailurePolicy, DEFAULT_LOG_LIMIT,
    DEFAULT_PERF_WINDOW_MINUTES, MAX_LOG_LIMIT, MAX_PERF_WINDOW_MINUTES,
};
use nl2sparql_console::ports::{ConfirmationPrompt, RemoteServicePort};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

#[derive(Parser, Debug)]
#[command(author, version, about = "Operator console for the NL2SPARQL backend", long_about = None)]
pub struct Cli {
    /// Backend base address for this run (not persisted).
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Access key sent as x-api-key for this run (not persisted).
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Config file holding the saved backend address and key.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of activity records fetched per poll.
    #[arg(long, global = true, default_value_t = DEFAULT_LOG_LIMIT)]
    pub log_limit: usize,

    /// Performance aggregation window in minutes.
    #[arg(long, global = true, default_value_t = DEFAULT_PERF_WINDOW_MINUTES)]
    pub perf_window: u32,

    /// Seconds between activity and performance polls.
    #[arg(long, global = true, default_value_t = 15)]
    pub poll_interval_secs: u64,

    /// What a failed generate or preview does to a held token (retain|clear).
    #[arg(long, global = true, default_value = "retain", value_parser = parse_failure_policy)]
    pub failure_policy: TokenFailurePolicy,

    /// Confirm execute and undo without asking.
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the backend answers.
    Health,

    /// List ontology classes and properties.
    Terms,

    /// Turn a natural-language request into SPARQL.
    Generate(GenerateArgs),

    /// Validate a statement.
    Validate(StatementArgs),

    /// Explain a statement.
    Explain(StatementArgs),

    /// Validate and explain a statement and obtain a confirmation token.
    Preview(StatementArgs),

    /// Preview a statement, confirm, then execute it.
    Apply(StatementArgs),

    /// Run a SELECT or ASK query.
    Select(StatementArgs),

    /// Run the KPS sample query.
    Kps,

    /// Show recent activity records.
    Logs,

    /// Show backend performance statistics.
    Perf,

    /// Undo an applied update from the activity log.
    Undo(UndoArgs),

    /// Show or change the saved backend configuration.
    #[command(subcommand)]
    Config(ConfigAction),

    /// Interactive console with live activity polling.
    Console,
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("statement_src").required(true).args(["sparql", "file"])))]
pub struct StatementArgs {
    /// SPARQL text.
    #[arg(long)]
    pub sparql: Option<String>,

    /// Path to a file holding the SPARQL text.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Natural-language request.
    #[arg(long)]
    pub text: String,

    /// Intent hint passed through to the generator (e.g. select, insert).
    #[arg(long)]
    pub intent: Option<String>,

    /// Execute the generated statement after confirmation.
    #[arg(long)]
    pub execute: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UndoArgs {
    /// Position of the record in `logs` output.
    #[arg(long)]
    pub index: usize,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective backend configuration.
    Show,
    /// Save a new backend base address.
    SetEndpoint { url: String },
    /// Save a new access key; an empty value removes it.
    SetApiKey { key: String },
}

fn parse_failure_policy(value: &str) -> Result<TokenFailurePolicy, String> {
    value.parse()
}

impl Cli {
    pub fn settings(&self) -> ConsoleSettings {
        ConsoleSettings {
            log_limit: self.log_limit.clamp(1, MAX_LOG_LIMIT),
            perf_window_minutes: self.perf_window.clamp(1, MAX_PERF_WINDOW_MINUTES),
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            failure_policy: self.failure_policy,
            auto_confirm: self.yes,
            ..ConsoleSettings::default()
        }
    }

    fn backend_config(&self) -> Result<Arc<BackendConfig>> {
        let config = match &self.config {
            Some(path) => BackendConfig::local(Some(path.clone()))?,
            None => BackendConfig::load()?,
        };
        config.apply_overrides(self.endpoint.as_deref(), self.api_key.as_deref());
        Ok(Arc::new(config))
    }
}

/// Shared wiring for every subcommand.
pub struct Runtime {
    pub config: Arc<BackendConfig>,
    pub remote: Arc<dyn RemoteServicePort>,
    pub prompt: Arc<dyn ConfirmationPrompt>,
    pub settings: ConsoleSettings,
}

impl Runtime {
    fn orchestrator(&self) -> ActionOrchestrator {
        ActionOrchestrator::new(
            Arc::clone(&self.remote),
            Arc::clone(&self.prompt),
            Arc::new(SystemClock),
            &self.settings,
        )
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings();
    let config = cli.backend_config()?;
    let remote: Arc<dyn RemoteServicePort> = Arc::new(HttpRemoteService::new(config.clone())?);
    let prompt: Arc<dyn ConfirmationPrompt> = if settings.auto_confirm {
        Arc::new(AutoConfirm::new(true))
    } else {
        Arc::new(TerminalPrompt)
    };
    let runtime = Runtime {
        config,
        remote,
        prompt,
        settings,
    };

    match cli.command {
        Command::Health => {
            let orchestrator = runtime.orchestrator();
            let healthy = orchestrator.ping().await?;
            println!("backend {}", if healthy { "ok" } else { "unhealthy" });
            if !healthy {
                bail!("backend reports unhealthy");
            }
            Ok(())
        }
        Command::Terms => {
            let terms = runtime.orchestrator().load_terms().await?;
            print!("{}", render::terms(&terms));
            Ok(())
        }
        Command::Generate(args) => run_generate(&runtime, args).await,
        Command::Validate(args) => {
            let orchestrator = load_statement(&runtime, &args).await?;
            let report = orchestrator.validate().await?;
            print!("{}", render::validation(&report));
            Ok(())
        }
        Command::Explain(args) => {
            let orchestrator = load_statement(&runtime, &args).await?;
            let report = orchestrator.explain().await?;
            print!("{}", render::explain(&report));
            Ok(())
        }
        Command::Preview(args) => {
            let orchestrator = load_statement(&runtime, &args).await?;
            orchestrator.preview().await?;
            print_reports(&orchestrator);
            println!("{}", render::token(orchestrator.view().token.as_ref()));
            Ok(())
        }
        Command::Apply(args) => {
            let orchestrator = load_statement(&runtime, &args).await?;
            orchestrator.preview().await?;
            print_reports(&orchestrator);
            execute(&orchestrator).await
        }
        Command::Select(args) => {
            let orchestrator = load_statement(&runtime, &args).await?;
            let results = orchestrator.run_select().await?;
            print!("{}", render::select(&results));
            Ok(())
        }
        Command::Kps => {
            let results = runtime.orchestrator().run_kps_sample().await?;
            print!("{}", render::select(&results));
            Ok(())
        }
        Command::Logs => {
            let poller = LogPoller::new(Arc::clone(&runtime.remote), runtime.settings.log_limit);
            poller.poll_once().await?;
            print!("{}", render::logs(&poller.records()));
            Ok(())
        }
        Command::Perf => {
            let poller = PerfPoller::new(
                Arc::clone(&runtime.remote),
                runtime.settings.perf_window_minutes,
            );
            poller.poll_once().await?;
            let snapshot = poller
                .snapshot()
                .ok_or_else(|| anyhow!("backend returned no performance data"))?;
            print!("{}", render::perf(&snapshot));
            Ok(())
        }
        Command::Undo(args) => run_undo(&runtime, args).await,
        Command::Config(action) => run_config(&runtime.config, action),
        Command::Console => console::run(runtime).await,
    }
}

async fn run_generate(runtime: &Runtime, args: GenerateArgs) -> Result<()> {
    let orchestrator = runtime.orchestrator();
    orchestrator.set_nl_text(args.text);
    let outcome = orchestrator.generate(args.intent).await?;
    if let Some(model) = &outcome.model {
        println!("model: {}", model);
    }
    println!("{}", outcome.statement);
    print_reports(&orchestrator);
    println!("{}", render::token(orchestrator.view().token.as_ref()));
    if args.execute {
        execute(&orchestrator).await?;
    }
    Ok(())
}

async fn run_undo(runtime: &Runtime, args: UndoArgs) -> Result<()> {
    let poller = LogPoller::new(Arc::clone(&runtime.remote), runtime.settings.log_limit);
    poller.poll_once().await?;
    let records = poller.records();
    let record = records.get(args.index).with_context(|| {
        format!(
            "no activity record #{} (fetched {})",
            args.index,
            records.len()
        )
    })?;
    let outcome = runtime.orchestrator().undo(record).await?;
    println!("{}", outcome.message);
    Ok(())
}

fn run_config(config: &BackendConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let values = config.values();
            match config.mode() {
                ConfigMode::Locked => println!("mode: locked"),
                ConfigMode::Local { path: Some(path) } => {
                    println!("mode: local ({})", path.display())
                }
                ConfigMode::Local { path: None } => println!("mode: local (not saved)"),
            }
            println!("endpoint: {}", values.base_url);
            println!(
                "api key: {}",
                if values.api_key.is_some() { "set" } else { "not set" }
            );
        }
        ConfigAction::SetEndpoint { url } => {
            config.set_base_url(&url)?;
            println!("endpoint: {}", config.base_url());
        }
        ConfigAction::SetApiKey { key } => {
            config.set_api_key(&key)?;
            println!(
                "api key {}",
                if config.api_key().is_some() { "saved" } else { "removed" }
            );
        }
    }
    if config.is_locked() {
        println!("(configuration is locked in this build; changes are ignored)");
    }
    Ok(())
}

async fn execute(orchestrator: &ActionOrchestrator) -> Result<()> {
    let outcome = orchestrator.execute().await?;
    println!("{}", outcome.message);
    if let Some(undo) = outcome.undo_statement {
        println!("undo statement:\n{}", undo);
    }
    Ok(())
}

fn print_reports(orchestrator: &ActionOrchestrator) {
    let snapshot = orchestrator.session_snapshot();
    if let Some(report) = &snapshot.validation {
        print!("{}", render::validation(report));
    }
    if let Some(report) = &snapshot.explain {
        print!("{}", render::explain(report));
    }
}

async fn load_statement(runtime: &Runtime, args: &StatementArgs) -> Result<ActionOrchestrator> {
    let text = resolve_statement(args).await?;
    let orchestrator = runtime.orchestrator();
    orchestrator.edit_statement(text);
    Ok(orchestrator)
}

async fn resolve_statement(args: &StatementArgs) -> Result<String> {
    if let Some(sparql) = &args.sparql {
        return Ok(sparql.clone());
    }
    let path = args
        .file
        .clone()
        .ok_or_else(|| anyhow!("either --sparql or --file must be provided"))?;
    let content = task::spawn_blocking(move || std::fs::read_to_string(path)).await??;
    Ok(content)
}
