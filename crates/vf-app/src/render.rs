use std::io::{self, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use vf_core::progress::step_board;
use vf_core::{GenerationResult, ProgressState, Stage};

use crate::events::AppEvent;

/// Terminal view of a submission: a spinner while the request is out, the
/// step board once it settles.
pub struct ProgressView {
    bar: ProgressBar,
}

impl ProgressView {
    pub fn new() -> Self {
        let bar = ProgressBar::new(ProgressState::LENGTH);
        let style = ProgressStyle::with_template("{spinner} [{bar:24}] {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    pub fn handle(&self, event: &AppEvent) {
        match event {
            AppEvent::Submitted { endpoint, base_url, .. } => {
                self.bar.enable_steady_tick(Duration::from_millis(120));
                self.bar.println(format!("Sending to {base_url} ({endpoint})"));
            }
            AppEvent::Progress(state) => {
                self.bar.set_position(state.position());
                self.bar.set_message(status_line(state));
                if state.is_terminal() {
                    self.bar.finish_and_clear();
                    for line in board_lines(state) {
                        println!("{line}");
                    }
                }
            }
            AppEvent::Completed { result, elapsed_secs, .. } => {
                println!("Completed in {elapsed_secs}s");
                for line in result_lines(result) {
                    println!("{line}");
                }
            }
            AppEvent::Failed { error, .. } => eprintln!("Error: {error}"),
            // Side actions run after the bar is finished, when its println is a no-op.
            AppEvent::Status(_) | AppEvent::Warning(_) => {
                if let Some(line) = notice_line(event) {
                    eprintln!("{line}");
                }
            }
        }
    }
}

impl Default for ProgressView {
    fn default() -> Self {
        Self::new()
    }
}

fn status_line(state: &ProgressState) -> String {
    match state {
        ProgressState::InProgress(stage) => format!("{}...", stage.label()),
        other => other.headline().to_string(),
    }
}

fn notice_line(event: &AppEvent) -> Option<String> {
    match event {
        AppEvent::Status(message) => Some(message.clone()),
        AppEvent::Warning(message) => Some(format!("Warning: {message}")),
        _ => None,
    }
}

pub fn board_lines(state: &ProgressState) -> Vec<String> {
    let mut lines = vec![state.headline().to_string()];
    lines.extend(
        step_board(state, &Stage::ALL)
            .into_iter()
            .map(|(stage, status)| format!("  {} {}", status.icon(), stage.label())),
    );
    if let Some(message) = state.error_message() {
        lines.push(format!("  {message}"));
    }
    lines
}

pub fn result_lines(result: &GenerationResult) -> Vec<String> {
    let mut lines = vec![format!("Video: {}", result.artifact_url)];
    if let Some(script) = &result.script {
        lines.push("Script:".to_string());
        lines.extend(script.lines().map(|line| format!("  {line}")));
    }
    lines
}

pub fn share_message(result: &GenerationResult) -> String {
    format!("Check out this video I made with AI! {}", result.artifact_url)
}

pub fn share(result: &GenerationResult, mut out: impl Write) -> io::Result<()> {
    writeln!(out, "{}", share_message(result))?;
    out.flush()
}
