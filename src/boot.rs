use chrono::Local;
use log::LevelFilter;
use std::io::{self, Write};

use env_logger::{Builder, Target};

pub const LOG_FILE_ENV: &str = "UARTLINE_LOG_FILE";

cfg_if::cfg_if! {
    if #[cfg(debug_assertions)] {
        fn default_log_file() -> Option<String> {
            Some(format!("./uartline_{}.log", Local::now().format("%Y%m%d%H%M%S")))
        }
    } else {
        /// Release builds log to stderr, silent unless `RUST_LOG` asks
        /// otherwise so the TUI is never overwritten.
        fn default_log_file() -> Option<String> {
            None
        }
    }
}

/// Initialize logging once at startup.
pub fn init_logging() {
    let log_file = std::env::var(LOG_FILE_ENV).ok().or_else(default_log_file);

    if let Some(path) = log_file {
        if let Err(err) = init_file_logger(&path) {
            eprintln!("Failed to initialize file logger at '{path}': {err}");
            init_stderr_logger();
        }
    } else {
        init_stderr_logger();
    }
}

fn init_stderr_logger() {
    let _ = Builder::new()
        .filter_level(LevelFilter::Off)
        .parse_default_env()
        .target(Target::Stderr)
        .try_init();
}

fn init_file_logger(path: &str) -> io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .filter_level(LevelFilter::Debug)
        .parse_default_env();

    if builder.try_init().is_ok() {
        log::info!("File logger initialized at {path}");
    }
    Ok(())
}
