//! todosync shell: a long-lived session driven by stdin.
//!
//! The list is redrawn after every change while saves run in the background.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{Error, Result};
use crate::output::{format_task_list, TerminalRenderer};

use super::{guest_warning, Context};

const HELP: &str = "commands: add <text> | toggle <id> | rm <id> | clear | list | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShellCommand {
    Add(String),
    Toggle(i64),
    Delete(i64),
    ClearCompleted,
    List,
    Help,
    Quit,
    Empty,
}

pub(crate) fn parse_line(line: &str) -> Result<ShellCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellCommand::Empty);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb {
        "add" | "a" => Ok(ShellCommand::Add(rest.to_string())),
        "toggle" | "t" => parse_id(rest).map(ShellCommand::Toggle),
        "rm" | "delete" | "d" => parse_id(rest).map(ShellCommand::Delete),
        "clear" => Ok(ShellCommand::ClearCompleted),
        "list" | "ls" => Ok(ShellCommand::List),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => Err(Error::InvalidArgument(format!("unknown command '{other}'"))),
    }
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| Error::InvalidArgument(format!("expected a task id, got '{raw}'")))
}

pub async fn run(context: &Context) -> Result<()> {
    if context.options.json {
        return Err(Error::InvalidArgument(
            "shell is interactive and has no JSON output; use list/add/toggle/rm/clear with --json"
                .to_string(),
        ));
    }

    let renderer = TerminalRenderer {
        quiet: context.options.quiet,
    };
    let mut session = context.session(renderer)?;
    let identity = session.start().await;
    if let Some(warning) = guest_warning(&identity, session.backend_kind()) {
        eprintln!("warning: {warning}");
    }
    if !context.options.quiet {
        eprintln!("{HELP}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut read_error = None;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "stopping shell on unreadable input");
                read_error = Some(err);
                break;
            }
        };
        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("error: {err}");
                continue;
            }
        };

        match command {
            ShellCommand::Add(text) => {
                if session.add(&text).is_none() {
                    eprintln!("nothing added: task text is empty");
                }
            }
            ShellCommand::Toggle(id) => {
                if !session.toggle(id) {
                    eprintln!("no task with id {id}");
                }
            }
            ShellCommand::Delete(id) => {
                if !session.delete(id) {
                    eprintln!("no task with id {id}");
                }
            }
            ShellCommand::ClearCompleted => {
                session.clear_completed();
            }
            ShellCommand::List => {
                if !context.options.quiet {
                    println!("{}", format_task_list(session.tasks()));
                }
            }
            ShellCommand::Help => eprintln!("{HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::Empty => {}
        }
    }

    session.shutdown().await;
    match read_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
