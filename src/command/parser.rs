//! Tokenizer and catalog checks for dialect input.

use super::catalog::KNOWN_COMMANDS;
use std::fmt;

/// Maximum number of suggestions offered for an unknown command.
pub const MAX_SUGGESTIONS: usize = 10;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCommand {
    /// First token, lowercased. Never empty.
    pub keyword: String,
    /// Remaining tokens with their original case.
    pub args: Vec<String>,
}

impl TextCommand {
    /// Keyword and arguments joined by single spaces.
    pub fn full_command(&self) -> String {
        if self.args.is_empty() {
            self.keyword.clone()
        } else {
            format!("{} {}", self.keyword, self.args.join(" "))
        }
    }

    pub fn category(&self) -> CommandCategory {
        categorize(&self.keyword)
    }

    pub(crate) fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

impl fmt::Display for TextCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_command())
    }
}

/// Command family, decided by keyword prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    Hf,
    Lf,
    Data,
    Hw,
    Script,
    Trace,
    Emv,
    Other,
}

const CATEGORY_PREFIXES: [(&str, CommandCategory); 7] = [
    ("hf", CommandCategory::Hf),
    ("lf", CommandCategory::Lf),
    ("data", CommandCategory::Data),
    ("hw", CommandCategory::Hw),
    ("script", CommandCategory::Script),
    ("trace", CommandCategory::Trace),
    ("emv", CommandCategory::Emv),
];

/// Split a line into keyword and arguments.
///
/// Returns `None` for blank input.
pub fn parse(line: &str) -> Option<TextCommand> {
    let mut tokens = line.split_whitespace();
    let keyword = tokens.next()?.to_lowercase();
    let args = tokens.map(str::to_string).collect();
    Some(TextCommand { keyword, args })
}

pub fn categorize(keyword: &str) -> CommandCategory {
    CATEGORY_PREFIXES
        .iter()
        .find(|(prefix, _)| keyword.starts_with(prefix))
        .map(|(_, category)| *category)
        .unwrap_or(CommandCategory::Other)
}

/// Whether any catalog entry starts with `keyword`.
///
/// This is a prefix test, so a bare family such as `hf` counts as known even
/// though it cannot be executed on its own.
pub fn is_known(keyword: &str) -> bool {
    let keyword = keyword.to_lowercase();
    KNOWN_COMMANDS.iter().any(|entry| entry.starts_with(&keyword))
}

/// Catalog entries starting with `partial`, in catalog order, at most ten.
pub fn suggest(partial: &str) -> Vec<&'static str> {
    let partial = partial.to_lowercase();
    KNOWN_COMMANDS
        .iter()
        .copied()
        .filter(|entry| entry.starts_with(&partial))
        .take(MAX_SUGGESTIONS)
        .collect()
}
