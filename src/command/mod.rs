//! Proxmark-style command dialect: catalog, parser and translator.

pub mod catalog;
pub mod hex;
pub mod parser;
pub mod translator;

pub use catalog::{describe, help_lines, KNOWN_COMMANDS};
pub use hex::{parse_hex, parse_hex_args, to_hex};
pub use parser::{categorize, is_known, parse, suggest, CommandCategory, TextCommand};
pub use translator::{translate, TranslateError};
