//! Line-oriented console front end.
//!
//! Holds the input fields (API key, URL), forwards actions to the
//! [`Orchestrator`] and prints the summary/insights panes whenever a result is
//! applied. All display mutation happens on this loop.

use anyhow::{Context, Result};
use common::CredentialStore;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::clipboard;
use crate::error::AppError;
use crate::orchestrator::{DisplayState, Orchestrator};
use crate::processing::Backend;

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Key(String),
    Url(String),
    Paste,
    Summarize,
    Refine(String),
    Show,
    Cancel,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> ConsoleCommand {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleCommand::Empty;
    }
    if clipboard::url_from_clipboard_text(line).is_some() {
        return ConsoleCommand::Url(line.to_string());
    }
    let Some(command) = line.strip_prefix(':') else {
        return ConsoleCommand::Unknown(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    match name {
        "key" => ConsoleCommand::Key(rest.to_string()),
        "url" => ConsoleCommand::Url(rest.to_string()),
        "paste" | "p" => ConsoleCommand::Paste,
        "summarize" | "s" => ConsoleCommand::Summarize,
        "refine" | "r" => ConsoleCommand::Refine(rest.to_string()),
        "show" => ConsoleCommand::Show,
        "cancel" | "c" => ConsoleCommand::Cancel,
        "help" | "h" | "?" => ConsoleCommand::Help,
        "quit" | "q" | "exit" => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(line.to_string()),
    }
}

const HELP: &str = "\
뉴스 요약기
  :key <API 키>        OpenAI API 키 설정
  :url <URL>           뉴스 기사 URL 설정 (http로 시작하는 줄도 URL로 인식)
  :paste               클립보드에서 URL 가져오기
  :summarize           요약하기
  :refine <추가 의견>  요약 다듬기
  :show                요약과 인사이트 다시 보기
  :cancel              진행 중인 작업 취소
  :quit                종료";

/// Renders both panes and the status line as plain text
pub fn render(display: &DisplayState) -> String {
    let mut out = String::new();
    if !display.summary.is_empty() || !display.insights.is_empty() {
        out.push_str("=== 요약 ===\n");
        out.push_str(&display.summary);
        out.push_str("\n\n=== 인사이트 ===\n");
        out.push_str(&display.insights);
        out.push('\n');
    }
    if let Some(status) = &display.status {
        out.push_str("» ");
        out.push_str(status);
        out.push('\n');
    }
    out
}

fn print_out(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

/// Input fields owned by the console
#[derive(Debug, Default)]
struct Fields {
    api_key: String,
    url: String,
}

/// Runs the console until `:quit`, end of input or ctrl-c, then saves the credential.
pub async fn run_console(
    backend: Arc<dyn Backend>,
    store: &dyn CredentialStore,
    initial_url: Option<String>,
) -> Result<()> {
    let (mut orchestrator, mut events) = Orchestrator::new(backend);
    let mut fields = Fields {
        api_key: store.load(),
        url: initial_url.unwrap_or_default(),
    };
    info!(has_key = !fields.api_key.is_empty(), "console starting");

    print_out(&format!("{HELP}\n"));
    if !fields.api_key.is_empty() {
        print_out("» 저장된 API 키를 불러왔습니다\n");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read console input")? else {
                    break;
                };
                if !handle_command(parse_command(&line), &mut fields, &mut orchestrator).await {
                    break;
                }
            }
            Some(event) = events.recv() => {
                if orchestrator.apply(event) {
                    print_out(&render(orchestrator.display()));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received");
                break;
            }
        }
    }

    orchestrator.cancel();
    store.save(&fields.api_key);
    info!("console stopped");
    Ok(())
}

/// Returns false when the console should stop
async fn handle_command(command: ConsoleCommand, fields: &mut Fields, orchestrator: &mut Orchestrator) -> bool {
    match command {
        ConsoleCommand::Key(key) => {
            fields.api_key = key;
            print_out("» API 키가 설정되었습니다\n");
        }
        ConsoleCommand::Url(url) => {
            print_out(&format!("» URL: {url}\n"));
            fields.url = url;
        }
        ConsoleCommand::Paste => match clipboard::read_clipboard_url().await {
            Ok(Some(url)) => {
                print_out(&format!("» URL: {url}\n"));
                fields.url = url;
            }
            Ok(None) => print_out("» 클립보드에 유효한 URL이 없습니다.\n"),
            Err(e) => {
                warn!(error = %e, "clipboard read failed");
                print_out(&format!("» {}\n", AppError::Clipboard(e)));
            }
        },
        ConsoleCommand::Summarize => {
            orchestrator.dispatch_summarize(fields.api_key.clone(), fields.url.clone());
            print_out(&render(orchestrator.display()));
        }
        ConsoleCommand::Refine(instruction) => {
            orchestrator.dispatch_refine(fields.api_key.clone(), instruction);
            print_out(&render(&DisplayState {
                status: orchestrator.display().status.clone(),
                ..DisplayState::default()
            }));
        }
        ConsoleCommand::Show => print_out(&render(orchestrator.display())),
        ConsoleCommand::Cancel => {
            if orchestrator.is_busy() {
                orchestrator.cancel();
                print_out("» 취소되었습니다\n");
            } else {
                print_out("» 진행 중인 작업이 없습니다\n");
            }
        }
        ConsoleCommand::Help => print_out(&format!("{HELP}\n")),
        ConsoleCommand::Quit => return false,
        ConsoleCommand::Empty => {}
        ConsoleCommand::Unknown(line) => print_out(&format!("» 알 수 없는 명령: {line} (:help)\n")),
    }
    true
}
