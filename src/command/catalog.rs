//! Static table of recognised dialect commands.
//!
//! Order matters: suggestions are returned in declaration order.

pub const KNOWN_COMMANDS: &[&str] = &[
    // HF
    "hf search",
    "hf 14a info",
    "hf 14a reader",
    "hf 14a raw",
    "hf 14a apdu",
    "hf 14a dump",
    "hf 14a clone",
    "hf 14b info",
    "hf 14b reader",
    "hf 14b raw",
    "hf 15 info",
    "hf 15 reader",
    "hf mf rdbl",
    "hf mf rdsc",
    "hf mf wrbl",
    "hf mf chk",
    "hf mf nested",
    "hf mf hardnested",
    "hf mf autopwn",
    "hf mf dump",
    "hf mf restore",
    "hf mf clone",
    "hf mfu info",
    "hf mfu dump",
    "hf mfu wrbl",
    // LF
    "lf search",
    "lf read",
    "lf tune",
    "lf em 410x reader",
    "lf em 410x clone",
    "lf em 410x dump",
    "lf hid reader",
    "lf hid clone",
    "lf indala reader",
    "lf indala clone",
    "lf t55xx detect",
    "lf t55xx read",
    "lf t55xx write",
    "lf t55xx dump",
    // data
    "data hex2bin",
    "data bin2hex",
    "data bitsamples",
    "data samples",
    "data autocorr",
    "data dirthreshold",
    "data undecimate",
    // hw
    "hw status",
    "hw ping",
    "hw version",
    "hw tune",
    "hw setlfdivisor",
    "hw setmux",
    "hw reset",
    "hw standalone",
    // other
    "help",
    "quit",
    "exit",
    "clear",
    "cls",
];

/// Commands that actually reach the device, with their help text.
pub const EXECUTABLE_COMMANDS: &[(&str, &str)] = &[
    ("hw version", "Get device firmware version"),
    ("hw status", "Get device status"),
    ("hf search", "Search for HF tags"),
    ("hf 14a info", "Get ISO14443A tag info"),
    ("hf 14a reader", "Read ISO14443A tag"),
    ("hf 14a raw <hex>", "Send raw ISO14443A command"),
    ("data setslot <0-7>", "Set active emulation slot"),
    ("help", "Show this help"),
    ("clear", "Clear terminal"),
    ("quit", "Exit application"),
];

/// Lines printed by the `help` pseudo-command.
pub fn help_lines() -> Vec<String> {
    EXECUTABLE_COMMANDS
        .iter()
        .map(|(usage, text)| format!("{usage} - {text}"))
        .collect()
}

/// One-line description of a command, matched case-insensitively.
pub fn describe(command: &str) -> &'static str {
    match command.trim().to_lowercase().as_str() {
        "hw version" => "Get device firmware version",
        "hw status" => "Get device status information",
        "hf search" => "Search for HF tags",
        "hf 14a info" => "Get ISO14443A tag information",
        "hf 14a reader" => "Read ISO14443A tag",
        "hf 14a raw" => "Send raw ISO14443A command",
        "data setslot" => "Set active emulation slot (0-7)",
        "help" => "Show available commands",
        "quit" | "exit" => "Exit the application",
        "clear" | "cls" => "Clear terminal output",
        _ => "Unknown command. Type 'help' for available commands.",
    }
}
