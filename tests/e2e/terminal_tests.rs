//! Terminal facade: the execute-line pipeline as an operator sees it.

use crate::common::{reply, Harness};
use chameleon_term::config::Config;
use chameleon_term::{Directive, LineKind};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn test_supported_command_round_trip() {
    let harness = Harness::connected().await;
    let mut terminal = harness.terminal();

    let execution = terminal.execute_line("  hw version  ").await;

    assert_eq!(
        execution.texts(),
        vec![
            "proxmark3> hw version",
            "Executing: hw version",
            "OK: ChameleonUltra v2.0",
        ]
    );
    assert_eq!(execution.lines[0].kind, LineKind::Command);
    assert_eq!(execution.lines[2].kind, LineKind::Response);
    assert_eq!(execution.directive, Directive::Continue);
}

#[tokio::test]
async fn test_raw_command_sends_hex_payload() {
    let harness = Harness::new();
    harness.usb.respond_with(|_| Some(reply(0x00, &[0x04, 0x00])));
    harness.session.connect_usb(None).await.unwrap();
    let mut terminal = harness.terminal();

    let execution = terminal.execute_line("hf 14a raw 26 93 20").await;

    assert_eq!(execution.texts().last(), Some(&"OK: 0400"));
    assert_eq!(
        harness.usb.written(),
        vec![vec![0x00, 0x00, 0x20, 0x01, 0x26, 0x93, 0x20]]
    );
}

#[tokio::test]
async fn test_not_connected() {
    let harness = Harness::new();
    let mut terminal = harness.terminal();

    let execution = terminal.execute_line("hw version").await;
    assert_eq!(
        execution.texts(),
        vec!["proxmark3> hw version", "Device not connected"]
    );
    assert_eq!(execution.lines[1].kind, LineKind::Error);
}

#[tokio::test]
async fn test_unknown_command() {
    let harness = Harness::new();
    let mut terminal = harness.terminal();

    let execution = terminal.execute_line("xyz 1 2").await;
    assert_eq!(execution.texts(), vec!["proxmark3> xyz 1 2", "Unknown command: xyz"]);
}

#[tokio::test]
async fn test_known_but_untranslatable_command() {
    let harness = Harness::connected().await;
    let mut terminal = harness.terminal();

    let execution = terminal.execute_line("hf mf rdbl 0").await;
    assert_eq!(
        execution.texts().last(),
        Some(&"Command not supported: hf mf rdbl 0")
    );

    let execution = terminal.execute_line("data setslot 9").await;
    assert_eq!(
        execution.texts().last(),
        Some(&"Command not supported: data setslot 9")
    );
    assert!(harness.usb.written().is_empty());
}

#[tokio::test]
async fn test_reply_timeout_is_reported() {
    let mut config = Config::default();
    config.device.scan_timeout_ms = 100;
    let harness = Harness::with_config(config);
    harness.session.connect_usb(None).await.unwrap();
    let mut terminal = harness.terminal();

    let execution = terminal.execute_line("hf search").await;
    assert_eq!(
        execution.texts().last(),
        Some(&"No response from device within 0.1s")
    );
    assert!(harness.session.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_scan_waits_for_the_scan_deadline() {
    let harness = Harness::new();
    harness.session.connect_usb(None).await.unwrap();
    let mut terminal = harness.terminal();

    let started = tokio::time::Instant::now();
    let execution = terminal.execute_line("hf search").await;

    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(
        execution.texts().last(),
        Some(&"No response from device within 10s")
    );
}

#[tokio::test(start_paused = true)]
async fn test_version_uses_its_own_deadline() {
    let harness = Harness::new();
    harness.session.connect_usb(None).await.unwrap();
    let mut terminal = harness.terminal();

    let started = tokio::time::Instant::now();
    let execution = terminal.execute_line("hw version").await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(10));
    assert_eq!(
        execution.texts().last(),
        Some(&"No response from device within 5s")
    );
}

#[tokio::test]
async fn test_error_status_is_rendered() {
    let harness = Harness::new();
    harness.usb.respond_with(|_| Some(reply(0x03, &[])));
    harness.session.connect_usb(None).await.unwrap();
    let mut terminal = harness.terminal();

    let execution = terminal.execute_line("hf 14a info").await;
    assert_eq!(execution.texts().last(), Some(&"TIMEOUT"));
}

#[tokio::test]
async fn test_pseudo_commands() {
    let harness = Harness::new();
    let mut terminal = harness.terminal();

    let help = terminal.execute_line("HELP").await;
    assert!(help.texts().contains(&"hw version - Get device firmware version"));
    assert!(help.lines[1..].iter().all(|line| line.kind == LineKind::Info));

    let topic = terminal.execute_line("help data setslot").await;
    assert_eq!(topic.texts().last(), Some(&"Set active emulation slot (0-7)"));

    let clear = terminal.execute_line("cls").await;
    assert_eq!(clear.directive, Directive::Clear);
    let output: Vec<_> = terminal.output().map(|line| line.text.clone()).collect();
    assert_eq!(output, vec!["Terminal cleared".to_string(), String::new()]);

    let quit = terminal.execute_line("exit").await;
    assert_eq!(quit.directive, Directive::Quit);
    assert_eq!(quit.texts().last(), Some(&"Goodbye!"));
}

#[tokio::test]
async fn test_blank_line_does_nothing() {
    let harness = Harness::new();
    let mut terminal = harness.terminal();

    let execution = terminal.execute_line("   ").await;
    assert!(execution.lines.is_empty());
    assert!(terminal.history().is_empty());
}

#[tokio::test]
async fn test_history_navigation() {
    let harness = Harness::new();
    let mut terminal = harness.terminal();
    for line in ["help", "hw version", "hf search"] {
        terminal.execute_line(line).await;
    }

    assert_eq!(terminal.previous_command().as_deref(), Some("hf search"));
    assert_eq!(terminal.previous_command().as_deref(), Some("hw version"));
    assert_eq!(terminal.next_command().as_deref(), Some("hf search"));
    assert_eq!(terminal.next_command().as_deref(), Some(""));
    assert_eq!(terminal.next_command(), None);
}

#[tokio::test]
async fn test_history_is_capped() {
    let harness = Harness::new();
    let mut terminal = harness.terminal();
    for i in 0..120 {
        terminal.execute_line(&format!("help {i}")).await;
    }
    assert_eq!(terminal.history().len(), 100);
    assert_eq!(terminal.history().entries().next(), Some("help 20"));
}

#[tokio::test]
async fn test_output_buffer_is_bounded() {
    let mut config = Config::default();
    config.terminal.output_limit = 10;
    let harness = Harness::with_config(config);
    let mut terminal = harness.terminal();

    for _ in 0..20 {
        terminal.execute_line("xyz").await;
    }
    assert_eq!(terminal.output().count(), 10);
}

#[tokio::test]
async fn test_unsolicited_frames_are_recorded() {
    let harness = Harness::new();
    let mut terminal = harness.terminal();

    let line = terminal.record_unsolicited(&[0x00, 0xFF]);
    assert_eq!(line.text, "00ff");
    assert_eq!(line.kind, LineKind::Response);
    assert_eq!(terminal.output().last().map(|l| l.text.as_str()), Some("00ff"));
}
