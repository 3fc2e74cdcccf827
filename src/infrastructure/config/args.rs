use super::app_config::{LogLevel, ProtocolMode};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "snapview",
    version,
    about = "An asynchronous image viewer for the terminal",
    long_about = None
)]
pub struct CliArgs {
    /// Image sources: file paths or HTTP(S) URLs.
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Terminal graphics protocol.
    #[arg(long, value_enum)]
    pub protocol: Option<ProtocolMode>,

    /// Skip memory and disk caches.
    #[arg(long)]
    pub no_cache: bool,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
