//! Terminal facade: one typed line in, rendered output lines out.
//!
//! [`Terminal::execute_line`] runs the whole pipeline for a line: echo,
//! history, pseudo-commands, parse, catalog check, connection check,
//! translation, the correlated device request and rendering of its reply.

mod history;
mod line;

pub use history::CommandHistory;
pub use line::{LineKind, TerminalLine};

use crate::command::{describe, help_lines, is_known, parse, suggest, to_hex, translate};
use crate::config::TerminalConfig;
use crate::device::DeviceSession;
use crate::error::{AppError, AppResult};
use crate::protocol::{ProtocolCommand, ProtocolResponse};
use std::collections::VecDeque;
use tracing::{debug, info};

/// What the caller should do after a line ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Continue,
    /// The output buffer was reset
    Clear,
    Quit,
}

/// Lines produced by one call to [`Terminal::execute_line`].
#[derive(Debug, Clone)]
pub struct Execution {
    pub lines: Vec<TerminalLine>,
    pub directive: Directive,
}

impl Execution {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            directive: Directive::Continue,
        }
    }

    /// Text of every line, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|line| line.text.as_str()).collect()
    }
}

/// Render a reply: status name, then the payload as text when it is
/// printable UTF-8, as hex otherwise.
pub fn render_response(response: &ProtocolResponse) -> String {
    let status = response.status_label();
    if response.payload.is_empty() {
        return status;
    }
    match printable(&response.payload) {
        Some(text) => format!("{status}: {text}"),
        None => format!("{status}: {}", to_hex(&response.payload)),
    }
}

/// Render an unsolicited frame as text when printable, hex otherwise.
pub fn render_frame(frame: &[u8]) -> String {
    printable(frame)
        .map(str::to_string)
        .unwrap_or_else(|| to_hex(frame))
}

fn printable(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes)
        .ok()
        .filter(|text| text.chars().all(|c| !c.is_control() || c.is_whitespace()))
}

/// The interactive terminal.
#[derive(Debug)]
pub struct Terminal {
    device: DeviceSession,
    config: TerminalConfig,
    history: CommandHistory,
    output: VecDeque<TerminalLine>,
}

impl Terminal {
    pub fn new(device: DeviceSession, config: TerminalConfig) -> Self {
        let mut terminal = Self {
            device,
            history: CommandHistory::new(config.history_size),
            output: VecDeque::new(),
            config,
        };
        terminal.output.extend(welcome_lines());
        terminal
    }

    pub fn device(&self) -> &DeviceSession {
        &self.device
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn previous_command(&mut self) -> Option<String> {
        self.history.previous().map(str::to_string)
    }

    pub fn next_command(&mut self) -> Option<String> {
        self.history.next().map(str::to_string)
    }

    /// Everything shown so far, oldest first.
    pub fn output(&self) -> impl Iterator<Item = &TerminalLine> {
        self.output.iter()
    }

    /// Run one line typed by the operator.
    pub async fn execute_line(&mut self, input: &str) -> Execution {
        let mut execution = Execution::new();
        let line = input.trim();
        if line.is_empty() {
            return execution;
        }

        self.emit(
            &mut execution,
            TerminalLine::command(format!("{}{line}", self.config.prompt)),
        );
        self.history.push(line);

        if let Some(directive) = self.pseudo_command(line, &mut execution) {
            execution.directive = directive;
            return execution;
        }

        match self.run(line, &mut execution).await {
            Ok(response) => {
                let rendered = render_response(&response);
                self.emit(&mut execution, TerminalLine::response(rendered));
            }
            Err(err) => {
                debug!(error = %err, "line failed");
                self.emit(&mut execution, TerminalLine::error(err.to_string()));
                if let Some(hint) = err.hint() {
                    self.emit(&mut execution, TerminalLine::info(hint));
                }
            }
        }
        execution
    }

    /// Record a frame that arrived without a request waiting for it.
    pub fn record_unsolicited(&mut self, frame: &[u8]) -> TerminalLine {
        let line = TerminalLine::response(render_frame(frame));
        self.push_output(line.clone());
        line
    }

    /// Reset the output buffer to the cleared banner.
    pub fn clear(&mut self) -> Vec<TerminalLine> {
        let lines = vec![TerminalLine::info("Terminal cleared"), TerminalLine::blank()];
        self.output = lines.iter().cloned().collect();
        lines
    }

    fn pseudo_command(&mut self, line: &str, execution: &mut Execution) -> Option<Directive> {
        let lowered = line.to_lowercase();
        match lowered.as_str() {
            "help" => {
                for text in help_lines() {
                    self.emit(execution, TerminalLine::info(text));
                }
                Some(Directive::Continue)
            }
            "clear" | "cls" => {
                execution.lines.extend(self.clear());
                Some(Directive::Clear)
            }
            "quit" | "exit" => {
                self.emit(execution, TerminalLine::info("Goodbye!"));
                Some(Directive::Quit)
            }
            _ => {
                let topic = lowered.strip_prefix("help ")?.trim();
                self.emit(execution, TerminalLine::info(describe(topic)));
                Some(Directive::Continue)
            }
        }
    }

    async fn run(&mut self, line: &str, execution: &mut Execution) -> AppResult<ProtocolResponse> {
        let command = parse(line).ok_or(AppError::Parse)?;

        if !is_known(&command.keyword) {
            return Err(AppError::UnknownCommand {
                suggestions: suggest(&command.keyword)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                keyword: command.keyword,
            });
        }

        if !self.device.connection().is_connected() {
            return Err(AppError::NotConnected);
        }

        let request: ProtocolCommand = translate(&command).map_err(|e| {
            debug!(reason = %e, "not translated");
            AppError::Unsupported(command.full_command())
        })?;

        self.emit(
            execution,
            TerminalLine::info(format!("Executing: {}", command.full_command())),
        );
        info!(command = %command, opcode = %request.opcode(), "executing");

        let deadline = self.device.timeouts().deadline_for(request.opcode());
        let response = self.device.execute(&request, deadline).await?;
        Ok(response)
    }

    fn emit(&mut self, execution: &mut Execution, line: TerminalLine) {
        self.push_output(line.clone());
        execution.lines.push(line);
    }

    fn push_output(&mut self, line: TerminalLine) {
        self.output.push_back(line);
        while self.output.len() > self.config.output_limit {
            self.output.pop_front();
        }
    }
}

fn welcome_lines() -> [TerminalLine; 3] {
    [
        TerminalLine::info("Chameleon Ultra Terminal"),
        TerminalLine::info("Type 'help' for available commands"),
        TerminalLine::blank(),
    ]
}
