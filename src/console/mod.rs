//! Line-oriented operator console.
//!
//! Reads commands from stdin, forwards them to the queue actor and redraws
//! the message list whenever the actor publishes a new snapshot. This is the
//! only place user input is checked for emptiness before an `add`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use uuid::Uuid;

use crate::queue::{Message, QueueHandle, TEXT_ADDRESS};
use crate::utils::QueueError;

pub const HELP: &str = "\
commands:
  add <table> <text...>   queue a message
  send <n|id>             put a message on the wall
  cancel <n|id>           take a sent message off the wall
  delete <n|id>           remove a message everywhere
  clear                   blank the wall and expire sent messages
  list                    show the queue
  help                    this text
  quit                    leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// 1-based position in the rendered list.
    Index(usize),
    Id(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Add { table: String, text: String },
    Send(Target),
    Cancel(Target),
    Delete(Target),
    Clear,
    List,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<ConsoleCommand, QueueError> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));

    match verb.to_lowercase().as_str() {
        "add" => {
            let (table, text) = rest
                .split_once(char::is_whitespace)
                .map(|(table, text)| (table.trim(), text.trim()))
                .unwrap_or((rest, ""));
            if table.is_empty() || text.is_empty() {
                return Err(QueueError::InvalidCommand(
                    "add needs a table and some text".to_string(),
                ));
            }
            Ok(ConsoleCommand::Add {
                table: table.to_string(),
                text: text.to_string(),
            })
        }
        "send" => parse_target(rest).map(ConsoleCommand::Send),
        "cancel" => parse_target(rest).map(ConsoleCommand::Cancel),
        "delete" | "rm" => parse_target(rest).map(ConsoleCommand::Delete),
        "clear" => Ok(ConsoleCommand::Clear),
        "list" | "ls" | "" => Ok(ConsoleCommand::List),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(QueueError::InvalidCommand(format!(
            "unknown command '{other}', try 'help'"
        ))),
    }
}

fn parse_target(arg: &str) -> Result<Target, QueueError> {
    if let Ok(index) = arg.parse::<usize>() {
        if index == 0 {
            return Err(QueueError::InvalidCommand("positions start at 1".to_string()));
        }
        return Ok(Target::Index(index));
    }
    Uuid::parse_str(arg)
        .map(Target::Id)
        .map_err(|_| QueueError::InvalidCommand(format!("'{arg}' is not a position or id")))
}

pub fn resolve(target: &Target, messages: &[Message]) -> Option<Uuid> {
    match target {
        Target::Index(index) => messages.get(index - 1).map(|m| m.id),
        Target::Id(id) => messages.iter().find(|m| m.id == *id).map(|m| m.id),
    }
}

fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn render(messages: &[Message], timeout: Duration, now: DateTime<Utc>) -> String {
    if messages.is_empty() {
        return "(queue empty)".to_string();
    }
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            format!(
                "{:>2}. [{:<7}] table {:<4} {:>5}  {}",
                i + 1,
                m.status.to_string(),
                m.table_number,
                format_remaining(m.remaining(timeout, now)),
                m.value
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run one command. Returns `false` when the operator asked to quit.
pub async fn execute(
    queue: &QueueHandle,
    command: ConsoleCommand,
    timeout: Duration,
) -> Result<bool, QueueError> {
    let messages = queue.snapshot();
    let lookup = |target: &Target| {
        resolve(target, &messages)
            .ok_or_else(|| QueueError::InvalidCommand("no such message".to_string()))
    };

    match command {
        ConsoleCommand::Add { table, text } => {
            queue.add(TEXT_ADDRESS, text, table).await?;
        }
        ConsoleCommand::Send(target) => {
            queue.send(lookup(&target)?).await?;
        }
        ConsoleCommand::Cancel(target) => {
            if queue.cancel(lookup(&target)?).await?.is_none() {
                println!("only a sent message can be canceled");
            }
        }
        ConsoleCommand::Delete(target) => {
            queue.remove(lookup(&target)?).await?;
        }
        ConsoleCommand::Clear => {
            queue.clear_screen().await?;
        }
        ConsoleCommand::List => println!("{}", render(&messages, timeout, Utc::now())),
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}

/// Drive the queue from stdin until `quit` or end of input.
pub async fn run(queue: QueueHandle, timeout: Duration) -> Result<(), QueueError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = queue.subscribe();

    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let outcome = match parse(&line) {
                    Ok(command) => execute(&queue, command, timeout).await,
                    Err(e) => Err(e),
                };
                match outcome {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(QueueError::ActorClosed) => return Err(QueueError::ActorClosed),
                    Err(e) => println!("error: {e}"),
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let messages = updates.borrow_and_update().clone();
                debug!("Redrawing {} message(s)", messages.len());
                println!("{}", render(&messages, timeout, Utc::now()));
            }
        }
    }
    Ok(())
}
