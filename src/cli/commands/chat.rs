//! Interactive editing session.

use crate::cli::output::content_preview;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::{PointerUpdate, Role, Session};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Run the interactive chat command.
pub async fn run_chat(
    video: &Path,
    model: Option<String>,
    in_process: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'reelcut doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.agent.model = model;
    }

    let spinner = Output::spinner("Starting editing session...");
    let started = if in_process {
        Session::start_in_process(settings, video).await
    } else {
        Session::start(settings, video).await
    };
    spinner.finish_and_clear();
    let mut session = started?;

    println!("\n{}", style("Reelcut").bold().cyan());
    Output::kv("Video", &session.original_path().display().to_string());
    if let Some(reason) = session.disabled_reason() {
        Output::warning(&format!("Editing is disabled: {}", reason));
    }
    println!(
        "{}\n",
        style("Describe an edit, or 'exit' to quit. 'status' shows the current video, 'clear' resets the transcript.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear_transcript();
            Output::info("Transcript cleared.");
            continue;
        }

        if input.eq_ignore_ascii_case("status") {
            print_status(&session);
            continue;
        }

        let spinner = Output::spinner("Editing...");
        let result = session.handle_turn(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(report) => {
                for tool in &report.tools_used {
                    println!("{}", style(format!("  [{}]", tool)).dim());
                }
                println!("\n{} {}\n", style("Reelcut:").cyan().bold(), report.reply);
                if let Some(notice) = report.notice() {
                    match report.pointer {
                        PointerUpdate::Advanced(_) => Output::success(&notice),
                        _ => Output::warning(&notice),
                    }
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    session.close().await;
    Ok(())
}

fn print_status(session: &Session) {
    Output::header("Session");
    Output::kv("Id", &session.id().to_string());
    Output::kv("Original", &session.original_path().display().to_string());
    Output::kv("Current", &session.edited_path().display().to_string());
    match session.disabled_reason() {
        Some(reason) => Output::kv("Editing", &format!("disabled ({})", reason)),
        None => Output::kv("Editing", "enabled"),
    }

    let edits = session
        .transcript()
        .iter()
        .filter(|t| t.role == Role::User)
        .count();
    Output::kv("Requests", &edits.to_string());
    if let Some(last) = session.transcript().last() {
        Output::kv(
            "Last reply",
            &format!("{} {}", last.at.format("%H:%M:%S"), content_preview(&last.content, 80)),
        );
    }
    println!();
}
