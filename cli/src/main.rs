//! Terminal front end for the review chat.
//!
//! Drives a [`ConversationClient`] against a running gateway and keeps the
//! conversation in `--state-dir`, so `history` and later `chat` sessions pick
//! up where the last one stopped.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use client::{ConversationClient, FileStore, GatewayError, HttpGateway, SubmitOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use wire::Message;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("failed to read context document {path}: {source}")]
    Context { path: PathBuf, source: std::io::Error },
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("the assistant could not answer")]
    NoAnswer,
}

#[derive(Parser, Debug)]
#[command(name = "review-chat", about = "Chat with the code review assistant")]
struct Cli {
    #[arg(long, env = "CHAT_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "CHAT_STATE_DIR", default_value = ".chat")]
    state_dir: PathBuf,

    /// Context document (for example a diff) the assistant should reference.
    #[arg(long)]
    context: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive session.
    Chat,
    /// Ask one question and print the answer.
    Ask {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print the saved conversation.
    History,
    /// Forget the saved conversation.
    Clear,
    /// Check that the gateway is up.
    Ping,
}

/// A line typed into the interactive session.
#[derive(Debug, PartialEq, Eq)]
enum ReplLine<'a> {
    Submit(&'a str),
    LoadContext,
    Clear,
    History,
    Quit,
    Help,
    Unknown(&'a str),
    Blank,
}

fn parse_line(line: &str) -> ReplLine<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => ReplLine::Blank,
        "/context" => ReplLine::LoadContext,
        "/clear" => ReplLine::Clear,
        "/history" => ReplLine::History,
        "/quit" | "/exit" => ReplLine::Quit,
        "/help" => ReplLine::Help,
        cmd if cmd.starts_with('/') => ReplLine::Unknown(cmd),
        text => ReplLine::Submit(text),
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let gateway = Arc::new(HttpGateway::new(&cli.base_url)?);

    if matches!(cli.command, Command::Ping) {
        gateway.health().await?;
        println!("ok");
        return Ok(());
    }

    let context = match &cli.context {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .map_err(|source| CliError::Context { path: path.clone(), source })?,
        ),
        None => None,
    };
    let store = Arc::new(FileStore::new(&cli.state_dir));
    let chat = ConversationClient::mount(gateway, store, context);

    match cli.command {
        Command::Chat => run_chat(&chat).await,
        Command::Ask { text } => run_ask(&chat, &text.join(" ")).await,
        Command::History => {
            print_history(&chat.messages());
            Ok(())
        }
        Command::Clear => {
            chat.clear();
            println!("conversation cleared");
            Ok(())
        }
        Command::Ping => Ok(()),
    }
}

async fn run_ask(chat: &ConversationClient, text: &str) -> Result<(), CliError> {
    chat.load_context();
    match chat.submit(text).await {
        SubmitOutcome::Replied => {
            print_last_reply(chat);
            Ok(())
        }
        SubmitOutcome::Failed => {
            print_last_reply(chat);
            Err(CliError::NoAnswer)
        }
        SubmitOutcome::Ignored => Ok(()),
    }
}

async fn run_chat(chat: &ConversationClient) -> Result<(), CliError> {
    if !chat.messages().is_empty() {
        print_history(&chat.messages());
    }
    if chat.has_context() {
        eprintln!("context document attached; type /context to load it");
    }
    eprintln!("type /help for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        match parse_line(&line) {
            ReplLine::Blank => {}
            ReplLine::Submit(text) => {
                if chat.submit(text).await != SubmitOutcome::Ignored {
                    print_last_reply(chat);
                }
            }
            ReplLine::LoadContext => {
                if chat.load_context() {
                    eprintln!("context loaded");
                } else {
                    eprintln!("no context document; pass --context <file>");
                }
            }
            ReplLine::Clear => {
                chat.clear();
                eprintln!("conversation cleared");
            }
            ReplLine::History => print_history(&chat.messages()),
            ReplLine::Quit => return Ok(()),
            ReplLine::Help => {
                eprintln!("/context  load the context document");
                eprintln!("/clear    forget the conversation");
                eprintln!("/history  print the conversation");
                eprintln!("/quit     exit");
            }
            ReplLine::Unknown(cmd) => eprintln!("unknown command {cmd}; type /help"),
        }
    }
}

fn prompt() -> Result<(), CliError> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}

fn print_last_reply(chat: &ConversationClient) {
    if let Some(reply) = chat.messages().last() {
        println!("{}", reply.content);
    }
}

fn print_history(messages: &[Message]) {
    for message in messages {
        println!("{}: {}", message.role, message.content);
    }
}
