//! Chat with Palaver in the terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use palaver::core::StateChange;
use palaver::core::conversation::Role;
use palaver::{FileStore, QUICK_ACTIONS, QuickAction, Session, SessionBuilder};
use palaver_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Idle,
    Reply(String),
}

enum Command<'a> {
    Quit,
    Help,
    Clear,
    Image(&'a str, Option<String>),
    QuickAction(&'static QuickAction),
    Text(&'a str),
    Unknown(&'a str),
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config_builder = GeminiConfigBuilder::from_env();
    if let Ok(model) = env::var("PALAVER_MODEL") {
        config_builder = config_builder.with_model(model);
    }
    if let Ok(base_url) = env::var("PALAVER_BASE_URL") {
        config_builder = config_builder.with_base_url(base_url);
    }
    let config = config_builder.build();
    if !config.has_api_key() {
        eprintln!(
            "No API key found, set PALAVER_API_KEY or GEMINI_API_KEY to get \
             real answers"
        );
    }
    let model_provider = GeminiProvider::new(config);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut builder = SessionBuilder::with_model_provider(model_provider)
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(SessionEvent::Idle).ok();
            }
        })
        .on_state_change({
            let event_tx = event_tx.clone();
            move |change| {
                let StateChange::MessageAppended(msg) = change else {
                    return;
                };
                if msg.role() == Role::Assistant {
                    event_tx
                        .send(SessionEvent::Reply(msg.text().to_owned()))
                        .ok();
                }
            }
        });
    match FileStore::default_path() {
        Some(path) => builder = builder.with_store(FileStore::open(path)),
        None => warn!("no config directory, visits will not be remembered"),
    }
    let session = builder.build();

    match session.snapshot().await {
        Ok(snapshot) => {
            for msg in &snapshot.messages {
                print_reply(msg.text());
            }
        }
        Err(err) => {
            error!("{err}");
            return;
        }
    }
    print_help();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let command = parse_command(line.trim());
        if matches!(command, Command::Quit) {
            break;
        }
        if !submit(&session, command).await {
            continue;
        }

        let mut progress_bar = None;

        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🌍 Consulting the elders...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            // Finish the progress bar before printing anything else.
            if let Some(progress_bar) = &progress_bar {
                progress_bar.finish_and_clear();
            }
            progress_bar = None;

            match event {
                SessionEvent::Reply(text) => print_reply(&text),
                SessionEvent::Idle => break,
            }
        }
    }
}

fn parse_command(line: &str) -> Command<'_> {
    let Some(command) = line.strip_prefix('/') else {
        return Command::Text(line);
    };
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));
    match name {
        "quit" | "exit" => Command::Quit,
        "help" => Command::Help,
        "clear" => Command::Clear,
        "image" if !rest.is_empty() => {
            let (path, caption) = rest
                .split_once(char::is_whitespace)
                .map(|(path, caption)| {
                    (path, Some(caption.trim().to_owned()))
                })
                .unwrap_or((rest, None));
            Command::Image(path, caption)
        }
        _ => match QuickAction::find(name) {
            Some(action) => Command::QuickAction(action),
            None => Command::Unknown(name),
        },
    }
}

/// Hands the command to the session. Returns whether a reply is on its
/// way.
async fn submit(session: &Session, command: Command<'_>) -> bool {
    match command {
        Command::Quit => false,
        Command::Help => {
            print_help();
            false
        }
        Command::Clear => {
            session.discard_image();
            println!("Image discarded.");
            false
        }
        Command::Image(path, caption) => {
            match palaver::load_image(path).await {
                Ok(image) => {
                    session.attach_image(image);
                    session.send_image(caption);
                    true
                }
                Err(err) => {
                    eprintln!("{path}: {err}");
                    false
                }
            }
        }
        Command::QuickAction(action) => {
            println!("{}", action.label.dimmed());
            session.quick_action(action);
            true
        }
        Command::Text(text) => {
            if text.is_empty() {
                return false;
            }
            session.send_message(text);
            true
        }
        Command::Unknown(name) => {
            eprintln!("Unknown command /{name}, try /help");
            false
        }
    }
}

fn print_reply(text: &str) {
    println!("{}🌍 {}", BAR_CHAR.bright_cyan(), text.bright_white());
}

fn print_help() {
    println!("{}", "Commands:".bold());
    for action in &QUICK_ACTIONS {
        println!("  /{:<24} {}", action.name, action.label);
    }
    println!("  /{:<24} Ask about an image", "image <path> [caption]");
    println!("  /{:<24} Discard a picked image", "clear");
    println!("  /{:<24} Show this help", "help");
    println!("  /{:<24} Leave", "quit");
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
