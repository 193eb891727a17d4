//! ttlkv - An In-Memory Key-Value Store with Expiring Entries
//!
//! This is the main entry point for the ttlkv shell.
//! It sets up logging, picks a clock, and runs one session over stdin/stdout.

use std::io::IsTerminal;
use tokio::io::{stdin, stdout, BufReader};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ttlkv::clock::{Clock, ManualClock, SystemClock};
use ttlkv::commands::CommandHandler;
use ttlkv::shell::Session;
use ttlkv::storage::Store;

/// Shell configuration
struct Config {
    /// Start a manual clock at this reading instead of using wall-clock time
    manual_clock: Option<u64>,
    /// Default log level when RUST_LOG is unset
    log_level: String,
    /// Suppress the banner
    quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manual_clock: None,
            log_level: "warn".to_string(),
            quiet: false,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--manual-clock" => {
                    if i + 1 < args.len() {
                        config.manual_clock = Some(args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid clock start value");
                            std::process::exit(1);
                        }));
                        i += 2;
                    } else {
                        eprintln!("Error: --manual-clock requires a value");
                        std::process::exit(1);
                    }
                }
                "--log-level" => {
                    if i + 1 < args.len() {
                        config.log_level = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --log-level requires a value");
                        std::process::exit(1);
                    }
                }
                "--quiet" | "-q" => {
                    config.quiet = true;
                    i += 1;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("ttlkv version {}", ttlkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Describes the selected clock
    fn clock_description(&self) -> String {
        match self.manual_clock {
            Some(start) => format!("manual clock starting at {}", start),
            None => "system clock".to_string(),
        }
    }
}

fn print_help() {
    println!(
        r#"
ttlkv - An In-Memory Key-Value Store with Expiring Entries

USAGE:
    ttlkv [OPTIONS]

OPTIONS:
        --manual-clock <START>  Use a manual clock starting at START seconds
        --log-level <LEVEL>     Log level when RUST_LOG is unset (default: warn)
    -q, --quiet                 Do not print the banner
    -v, --version               Print version information
    -h, --help                  Print this help message

EXAMPLES:
    ttlkv                           # Interactive shell on the system clock
    ttlkv --manual-clock 0          # Drive time by hand with ADVANCE/SETTIME
    ttlkv -q < script.txt           # Run a script of commands

SESSION:
    ttlkv> SET session token123 60
    OK
    ttlkv> TTL session
    (integer) 60
    ttlkv> RANGE a 10
    1) "session"
    2) "token123"
"#
    );
}

fn print_banner(config: &Config) {
    println!(
        r#"
ttlkv v{} - In-Memory Key-Value Store with Expiring Entries
──────────────────────────────────────────────────────────────
Running on the {}.
Type commands one per line; QUIT or Ctrl+D ends the session.
"#,
        ttlkv::VERSION,
        config.clock_description()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging; stdout belongs to the session
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    if !config.quiet {
        print_banner(&config);
    }

    info!(clock = %config.clock_description(), "Starting shell");

    match config.manual_clock {
        Some(start) => {
            let clock = ManualClock::new(start);
            let handler = CommandHandler::with_time_control(Store::new(clock.clone()), clock);
            run_shell(handler).await?;
        }
        None => {
            run_shell(CommandHandler::new(Store::new(SystemClock::new()))).await?;
        }
    }

    info!("Shell shutdown complete");
    Ok(())
}

/// Runs one session over stdin/stdout until it ends or Ctrl+C arrives
async fn run_shell<C: Clock>(handler: CommandHandler<C>) -> anyhow::Result<()> {
    let mut session = Session::new(BufReader::new(stdin()), stdout(), handler);
    if std::io::stdin().is_terminal() {
        session = session.with_prompt("ttlkv> ");
    }

    tokio::select! {
        result = session.run() => {
            let stats = result?;
            info!(
                commands = stats.commands_processed,
                errors = stats.errors,
                "Session finished"
            );
        }
        result = signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received, stopping shell...");
        }
    }

    Ok(())
}
