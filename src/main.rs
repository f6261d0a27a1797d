use chameleon_term::command::parse_hex;
use chameleon_term::config::{Config, ConfigLoader, LogFormat, LoggingConfig};
use chameleon_term::terminal::{render_response, Directive, Execution, LineKind, Terminal};
use chameleon_term::transport::{
    BondedPeers, LinkTransports, SerialAdapters, SystemBondedPeers, SystemSerialAdapters,
};
use chameleon_term::{AppError, ConnectionSession, DeviceSession};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Proxmark-style terminal for Chameleon Ultra devices.
#[derive(Parser, Debug)]
#[command(name = "chameleon-term")]
#[command(version, about)]
struct Args {
    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connect over USB serial at startup, optionally to a given port
    #[arg(long, value_name = "PORT", num_args = 0..=1, default_missing_value = "")]
    usb: Option<String>,

    /// Connect to a bonded radio peer at startup, optionally by name
    #[arg(
        long,
        value_name = "NAME",
        num_args = 0..=1,
        default_missing_value = "",
        conflicts_with = "usb"
    )]
    radio: Option<String>,

    /// List USB adapters and bonded radio peers, then exit
    #[arg(long)]
    list: bool,

    /// Run a command and exit (repeatable)
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    commands: Vec<String>,

    /// Log filter, overriding the config file (RUST_LOG still wins)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();
    if let Some(level) = args.log_level.clone() {
        config.logging.level = level;
    }
    init_logging(&config.logging);

    if args.list {
        list_links()?;
        return Ok(());
    }

    let factory = LinkTransports::system(&config);
    let session = ConnectionSession::new(Arc::new(factory));
    let device = DeviceSession::new(session.clone(), config.device.clone());
    let mut terminal = Terminal::new(device, config.terminal.clone());

    if let Some(target) = args.usb.clone() {
        report(connect(&session, Link::Usb, target).await);
    } else if let Some(target) = args.radio.clone() {
        report(connect(&session, Link::Radio, target).await);
    }

    if !args.commands.is_empty() {
        for line in &args.commands {
            let execution = terminal.execute_line(line).await;
            print_execution(&execution, true);
            if execution.directive == Directive::Quit {
                break;
            }
        }
        session.disconnect().await;
        return Ok(());
    }

    run_repl(&mut terminal, &session, &config).await?;
    session.disconnect().await;
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Link {
    Usb,
    Radio,
}

async fn connect(session: &ConnectionSession, link: Link, target: String) -> Result<String, AppError> {
    let target = Some(target).filter(|t| !t.trim().is_empty());
    match link {
        Link::Usb => session.connect_usb(target).await?,
        Link::Radio => session.connect_radio(target).await?,
    }
    Ok(format!("Connected ({})", session.state()))
}

fn report(result: Result<String, AppError>) {
    match result {
        Ok(message) => println!("{message}"),
        Err(e) => {
            error!(error = %e, "connect failed");
            println!("{e}");
        }
    }
}

fn list_links() -> Result<(), AppError> {
    let adapters = SystemSerialAdapters.list().map_err(|e| AppError::Device(e.to_string()))?;
    println!("Serial adapters:");
    if adapters.is_empty() {
        println!("  (none)");
    }
    for info in &adapters {
        println!("  {info} [{:?}]", info.link_type);
    }

    let peers = SystemBondedPeers.bonded().map_err(|e| AppError::Device(e.to_string()))?;
    println!("Bonded radio peers:");
    if peers.is_empty() {
        println!("  (none)");
    }
    for peer in &peers {
        println!("  {peer}");
    }
    Ok(())
}

fn print_execution(execution: &Execution, echo: bool) {
    if execution.directive == Directive::Clear {
        // ANSI clear screen and home
        print!("\x1b[2J\x1b[H");
    }
    for line in &execution.lines {
        if line.kind == LineKind::Command && !echo {
            continue;
        }
        println!("{line}");
    }
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

async fn run_repl(
    terminal: &mut Terminal,
    session: &ConnectionSession,
    config: &Config,
) -> Result<(), AppError> {
    for line in terminal.output() {
        println!("{line}");
    }

    let mut unsolicited = session.subscribe_unsolicited();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(&config.terminal.prompt);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if let Some(app_command) = line.trim().strip_prefix(':') {
                    run_app_command(app_command, terminal, session).await;
                } else {
                    let execution = terminal.execute_line(&line).await;
                    print_execution(&execution, false);
                    if execution.directive == Directive::Quit {
                        break;
                    }
                }
                prompt(&config.terminal.prompt);
            }
            frame = unsolicited.recv() => match frame {
                Ok(frame) => {
                    let line = terminal.record_unsolicited(&frame);
                    println!("\n{line}");
                    prompt(&config.terminal.prompt);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    info!(missed, "unsolicited frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }
    Ok(())
}

async fn run_app_command(command: &str, terminal: &mut Terminal, session: &ConnectionSession) {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let target = parts.collect::<Vec<_>>().join(" ");

    match name.as_str() {
        "usb" => report(connect(session, Link::Usb, target).await),
        "radio" | "bt" => report(connect(session, Link::Radio, target).await),
        "disconnect" => {
            session.disconnect().await;
            println!("Disconnected");
        }
        "status" => {
            let kind = session
                .active_transport_kind()
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "none".to_string());
            println!("State: {} (link: {kind})", session.state());
        }
        "ports" => {
            if let Err(e) = list_links() {
                println!("{e}");
            }
        }
        "history" => {
            for (i, entry) in terminal.history().entries().enumerate() {
                println!("{:>4}  {entry}", i + 1);
            }
        }
        "raw" => match parse_hex(&target.replace(' ', "")) {
            Some(frame) if !frame.is_empty() => {
                match terminal.device().send_raw(&frame).await {
                    Ok(response) => println!("{}", render_response(&response)),
                    Err(e) => println!("{}", AppError::from(e)),
                }
            }
            _ => println!("Usage: :raw <hex frame>"),
        },
        _ => {
            println!("Application commands: :usb [PORT], :radio [NAME], :disconnect, :status, :ports, :history, :raw <hex>");
        }
    }
}
