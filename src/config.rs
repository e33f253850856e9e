use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::store::DEFAULT_PATH;

/// Web dashboard for tracking member points and event attendance.
#[derive(Debug, Clone, Parser)]
#[command(name = "dashboard", version, about)]
pub struct Config {
    /// Workbook holding the `members` and `event_attendance` sheets
    #[arg(short, long, default_value = DEFAULT_PATH)]
    pub data: PathBuf,

    /// Address the HTTP server listens on
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,
}

/// Set up `env_logger`, defaulting to `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
