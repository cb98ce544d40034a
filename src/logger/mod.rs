//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Server lifecycle logging
//! - Error and warning logging
//! - File-based logging support
//!
//! Requests are not logged individually.

pub mod writer;

use crate::config::Config;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Minimum severity written by the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.level,
        config.logging.info_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: Level) -> bool {
    // Before init, everything up to info goes to the console
    writer::get().map_or(level <= Level::Info, |w| level <= w.level())
}

/// Write to info log
fn write_info(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, root: &Path, config: &Config) {
    write_info(Level::Info, "======================================");
    write_info(Level::Info, "Cross-origin isolated file server started");
    write_info(Level::Info, &format!("Listening on: http://{addr}"));
    write_info(Level::Info, &format!("Serving root: {}", root.display()));
    write_info(Level::Info, "Headers: Cross-Origin-Opener-Policy: same-origin");
    write_info(Level::Info, "         Cross-Origin-Embedder-Policy: require-corp");
    if let Some(workers) = config.server.workers {
        write_info(Level::Info, &format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.info_log_file {
        write_info(Level::Info, &format!("Info log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(Level::Info, &format!("Error log: {path}"));
    }
    write_info(Level::Info, "======================================\n");
}

pub fn log_info(message: &str) {
    write_info(Level::Info, &format!("[INFO] {message}"));
}

pub fn log_debug(message: &str) {
    write_info(Level::Debug, &format!("[DEBUG] {message}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(
        Level::Debug,
        &format!("[Connection] Accepted from: {peer_addr}"),
    );
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(
        Level::Warn,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_error(message: &str) {
    write_error(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_bind_failed(addr: &SocketAddr, err: &std::io::Error) {
    log_error(&format!("✗ Failed to bind {addr}: {err}"));
}

pub fn log_shutdown_requested(signal: &str) {
    write_info(
        Level::Info,
        &format!("\n[SIGNAL] {signal} received, shutting down..."),
    );
}

pub fn log_listener_closed(addr: &SocketAddr) {
    write_info(
        Level::Info,
        &format!("[SHUTDOWN] ✓ Listener on {addr} closed and resources released"),
    );
}
