//! Interactive console: one orchestrator for the whole session, with the
//! activity and performance feeds polling in the background.

use super::{render, Runtime};
use anyhow::{anyhow, Context, Result};
use nl2sparql_console::adapters::SystemClock;
use nl2sparql_console::app::{ConsoleError, ConsoleResult};
use nl2sparql_console::Console;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};
use tracing::debug;

const HELP: &str = "\
commands:
  <text>             set the natural-language request
  :generate [intent] generate SPARQL from the request
  :set <sparql>      replace the statement with one line
  :edit              replace the statement; finish with a line holding only '.'
  :load <path>       replace the statement with a file's contents
  :template [n]      list templates or load template n
  :validate  :explain  :preview  :execute
  :select            run the statement as SELECT/ASK
  :kps               run the KPS sample query
  :logs              show recent activity
  :undo <n>          undo activity record n
  :perf              show performance statistics
  :limit <n>         activity records per poll
  :window <min>      performance window in minutes
  :terms  :ping  :status  :help  :quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Request(String),
    Generate(Option<String>),
    Set(String),
    Edit,
    Load(PathBuf),
    Templates,
    Template(usize),
    Validate,
    Explain,
    Preview,
    Execute,
    Select,
    Kps,
    Logs,
    Undo(usize),
    Perf,
    Limit(usize),
    Window(u32),
    Terms,
    Ping,
    Status,
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(ReplCommand::Request(line.to_string()));
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let command = match name.to_ascii_lowercase().as_str() {
        "generate" | "gen" => ReplCommand::Generate((!arg.is_empty()).then(|| arg.to_string())),
        "set" => ReplCommand::Set(required(name, arg, "a statement")?.to_string()),
        "edit" => ReplCommand::Edit,
        "load" => ReplCommand::Load(PathBuf::from(required(name, arg, "a path")?)),
        "template" | "templates" if arg.is_empty() => ReplCommand::Templates,
        "template" | "templates" => ReplCommand::Template(
            arg.parse()
                .with_context(|| format!("template index '{}'", arg))?,
        ),
        "validate" => ReplCommand::Validate,
        "explain" => ReplCommand::Explain,
        "preview" => ReplCommand::Preview,
        "execute" | "exec" => ReplCommand::Execute,
        "select" => ReplCommand::Select,
        "kps" => ReplCommand::Kps,
        "logs" => ReplCommand::Logs,
        "undo" => ReplCommand::Undo(
            required(name, arg, "a record number")?
                .parse()
                .with_context(|| format!("record number '{}'", arg))?,
        ),
        "perf" => ReplCommand::Perf,
        "limit" => ReplCommand::Limit(
            required(name, arg, "a number")?
                .parse()
                .with_context(|| format!("log limit '{}'", arg))?,
        ),
        "window" => ReplCommand::Window(
            required(name, arg, "minutes")?
                .parse()
                .with_context(|| format!("perf window '{}'", arg))?,
        ),
        "terms" => ReplCommand::Terms,
        "ping" | "health" => ReplCommand::Ping,
        "status" | "s" => ReplCommand::Status,
        "help" | "h" | "?" => ReplCommand::Help,
        "quit" | "q" | "exit" => ReplCommand::Quit,
        other => return Err(anyhow!("unknown command :{} (try :help)", other)),
    };
    Ok(command)
}

fn required<'a>(name: &str, arg: &'a str, what: &str) -> Result<&'a str> {
    if arg.is_empty() {
        Err(anyhow!(":{} needs {}", name, what))
    } else {
        Ok(arg)
    }
}

pub async fn run(runtime: Runtime) -> Result<()> {
    let console = Console::start(
        Arc::clone(&runtime.remote),
        Arc::clone(&runtime.prompt),
        Arc::new(SystemClock),
        &runtime.settings,
    );
    let expiry = spawn_expiry_watch(console.orchestrator().countdown());
    println!(
        "nl2sparql console on {} (:help for commands)",
        runtime.config.base_url()
    );
    if let Err(err) = console.orchestrator().ping().await {
        debug!(%err, "initial health check failed");
    }

    loop {
        let Some(line) = read_line("nl2sparql> ").await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{:#}", err);
                continue;
            }
        };
        if command == ReplCommand::Quit {
            break;
        }
        if let Err(err) = dispatch(&console, command).await {
            eprintln!("error: {:#}", err);
        }
    }

    expiry.abort();
    console.shutdown().await;
    Ok(())
}

async fn dispatch(console: &Console, command: ReplCommand) -> Result<()> {
    let orchestrator = console.orchestrator();
    match command {
        ReplCommand::Empty | ReplCommand::Quit => {}
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Request(text) => {
            orchestrator.set_nl_text(text);
            println!("request set; :generate to translate it");
        }
        ReplCommand::Generate(intent) => {
            if let Some(outcome) = report(console, orchestrator.generate(intent).await) {
                println!("{}", outcome.statement);
                print_session(console);
            }
        }
        ReplCommand::Set(text) => {
            orchestrator.edit_statement(text);
            println!("statement replaced");
        }
        ReplCommand::Edit => {
            println!("enter the statement; finish with a line holding only '.'");
            let mut lines = Vec::new();
            while let Some(line) = read_line("").await? {
                if line.trim_end() == "." {
                    break;
                }
                lines.push(line.trim_end_matches(['\r', '\n']).to_string());
            }
            orchestrator.edit_statement(lines.join("\n"));
            println!("statement replaced");
        }
        ReplCommand::Load(path) => {
            let shown = path.display().to_string();
            let text = task::spawn_blocking(move || std::fs::read_to_string(path))
                .await?
                .with_context(|| format!("reading {}", shown))?;
            orchestrator.edit_statement(text);
            println!("statement loaded from {}", shown);
        }
        ReplCommand::Templates => print!("{}", render::templates()),
        ReplCommand::Template(index) => {
            if report(console, orchestrator.apply_template(index)).is_some() {
                print_notice(console);
            }
        }
        ReplCommand::Validate => {
            if let Some(validation) = report(console, orchestrator.validate().await) {
                print!("{}", render::validation(&validation));
            }
        }
        ReplCommand::Explain => {
            if let Some(explain) = report(console, orchestrator.explain().await) {
                print!("{}", render::explain(&explain));
            }
        }
        ReplCommand::Preview => {
            if report(console, orchestrator.preview().await).is_some() {
                print_session(console);
            }
        }
        ReplCommand::Execute => {
            if let Some(outcome) = report(console, orchestrator.execute().await) {
                println!("{}", outcome.message);
            }
        }
        ReplCommand::Select => {
            if let Some(results) = report(console, orchestrator.run_select().await) {
                print!("{}", render::select(&results));
            }
        }
        ReplCommand::Kps => {
            if let Some(results) = report(console, orchestrator.run_kps_sample().await) {
                print!("{}", render::select(&results));
            }
        }
        ReplCommand::Logs => print!("{}", render::logs(&console.view().logs)),
        ReplCommand::Undo(index) => {
            let logs = console.view().logs;
            let record = logs
                .get(index)
                .with_context(|| format!("no activity record #{} (:logs to list)", index))?;
            if let Some(outcome) = report(console, orchestrator.undo(record).await) {
                println!("{}", outcome.message);
            }
        }
        ReplCommand::Perf => match console.view().perf {
            Some(snapshot) => print!("{}", render::perf(&snapshot)),
            None => println!("no performance data yet"),
        },
        ReplCommand::Limit(limit) => {
            console.polling().set_log_limit(limit);
            println!("activity limit {}", console.polling().logs().limit());
        }
        ReplCommand::Window(minutes) => {
            console.polling().set_perf_window(minutes);
            println!(
                "performance window {} min",
                console.polling().perf().window_minutes()
            );
        }
        ReplCommand::Terms => {
            if let Some(terms) = report(console, orchestrator.load_terms().await) {
                print!("{}", render::terms(&terms));
            }
        }
        ReplCommand::Ping => {
            if report(console, orchestrator.ping().await).is_some() {
                print_notice(console);
            }
        }
        ReplCommand::Status => print!("{}", render::status(&console.view())),
    }
    Ok(())
}

/// Action failures are shown through the notice area; stale responses are
/// dropped without a word.
fn report<T>(console: &Console, result: ConsoleResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(ConsoleError::Stale { action }) => {
            debug!(%action, "stale response ignored");
            None
        }
        Err(err) => {
            match console.orchestrator().notice() {
                Some(notice) => eprintln!("{}", render::notice(&notice)),
                None => eprintln!("{}", err),
            }
            None
        }
    }
}

fn print_notice(console: &Console) {
    if let Some(notice) = console.orchestrator().notice() {
        println!("{}", render::notice(&notice));
    }
}

fn print_session(console: &Console) {
    let view = console.view();
    if let Some(report) = &view.validation {
        print!("{}", render::validation(report));
    }
    if let Some(report) = &view.explain {
        print!("{}", render::explain(report));
    }
    println!("{}", render::token(view.token.as_ref()));
}

/// Tells the operator when the held token runs out.
fn spawn_expiry_watch(mut rx: watch::Receiver<Option<i64>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let expired = *rx.borrow_and_update() == Some(0);
            if expired {
                eprintln!("\nconfirmation token expired; run :preview or :generate again");
            }
        }
    })
}

/// Ok(None) on end of input.
async fn read_line(prompt: &'static str) -> Result<Option<String>> {
    let line = task::spawn_blocking(move || -> io::Result<Option<String>> {
        if !prompt.is_empty() {
            let mut stdout = io::stdout();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;
        }
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        Ok((read > 0).then_some(line))
    })
    .await??;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_sets_the_request() {
        assert_eq!(
            parse_command("Zeige alle Pfarrer\n").unwrap(),
            ReplCommand::Request("Zeige alle Pfarrer".into())
        );
        assert_eq!(parse_command("   ").unwrap(), ReplCommand::Empty);
    }

    #[test]
    fn commands_take_arguments() {
        assert_eq!(
            parse_command(":set ASK { ?s ?p ?o }").unwrap(),
            ReplCommand::Set("ASK { ?s ?p ?o }".into())
        );
        assert_eq!(parse_command(":template").unwrap(), ReplCommand::Templates);
        assert_eq!(parse_command(":template 1").unwrap(), ReplCommand::Template(1));
        assert_eq!(parse_command(":undo 3").unwrap(), ReplCommand::Undo(3));
        assert_eq!(parse_command(":window 15").unwrap(), ReplCommand::Window(15));
        assert_eq!(
            parse_command(":generate insert").unwrap(),
            ReplCommand::Generate(Some("insert".into()))
        );
        assert_eq!(parse_command(":GEN").unwrap(), ReplCommand::Generate(None));
        assert_eq!(parse_command(":q").unwrap(), ReplCommand::Quit);
    }

    #[test]
    fn malformed_commands_are_errors() {
        assert!(parse_command(":undo").is_err());
        assert!(parse_command(":limit many").is_err());
        assert!(parse_command(":set").is_err());
        assert!(parse_command(":frobnicate").is_err());
    }
}
