//! Logger module
//!
//! Server lifecycle, job and access logging. Lines go through the global
//! writer once `init` has run and straight to stdout/stderr before that.

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use crate::config::Config;
use crate::media::{MediaError, Operation};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config
        .logging
        .level
        .parse::<Level>()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        level,
    )
}

fn write(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write(level, message),
        None if level <= Level::Warn => eprintln!("{message}"),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, upload_dir: &Path, processed_dir: &Path) {
    write(Level::Info, "======================================");
    write(Level::Info, "Media gateway started");
    write(Level::Info, &format!("Listening on: http://{addr}"));
    write(Level::Info, &format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write(Level::Info, &format!("Worker threads: {workers}"));
    }
    write(Level::Info, &format!("Media tool: {}", config.media.tool));
    write(Level::Info, &format!("Uploads: {}", upload_dir.display()));
    write(Level::Info, &format!("Processed: {}", processed_dir.display()));
    if let Some(limit) = config.media.max_concurrent_jobs {
        write(Level::Info, &format!("Max concurrent jobs: {limit}"));
    }
    if let Some(secs) = config.media.timeout_secs {
        write(Level::Info, &format!("Job timeout: {secs}s"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write(Level::Info, &format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write(Level::Info, &format!("Error log: {path}"));
    }
    write(Level::Info, "======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write(Level::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write(Level::Error, &format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write(Level::Info, &format!("[INFO] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}

pub fn log_job_started(operation: Operation, input: &Path, output: &Path) {
    write(
        Level::Info,
        &format!(
            "[Job] {operation}: {} -> {}",
            input.display(),
            output.display()
        ),
    );
}

pub fn log_job_finished(operation: Operation, output: &Path, elapsed: Duration) {
    write(
        Level::Info,
        &format!(
            "[Job] {operation} finished in {:.2}s: {}",
            elapsed.as_secs_f64(),
            output.display()
        ),
    );
}

pub fn log_job_failed(operation: Operation, err: &MediaError) {
    write(Level::Error, &format!("[Job] {operation} failed: {err}"));
}

pub fn log_shutdown(active_connections: usize) {
    write(
        Level::Info,
        &format!("[Shutdown] Stopped accepting, {active_connections} connection(s) in flight"),
    );
}
