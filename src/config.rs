use crate::booking::{
    BookingService, BookingServiceBuilder, ITEMS_FILE, LEDGER_FILE, LOG_FILE, LockMode,
};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Port the server listens on when neither `--port` nor `PORT` is given.
pub const DEFAULT_PORT: u16 = 5000;

/// Process configuration, read from the command line or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "stockbook", version, about = "Inventory booking service")]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory holding the inventory, ledger and audit log.
    #[arg(long, env = "STOCKBOOK_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Inventory JSON document.
    #[arg(long, env = "STOCKBOOK_ITEMS_FILE", default_value = ITEMS_FILE)]
    pub items_file: PathBuf,

    /// Registration ledger workbook.
    #[arg(long, env = "STOCKBOOK_LEDGER_FILE", default_value = LEDGER_FILE)]
    pub ledger_file: PathBuf,

    /// Plain-text audit log.
    #[arg(long, env = "STOCKBOOK_LOG_FILE", default_value = LOG_FILE)]
    pub log_file: PathBuf,

    /// Skip the exclusive lock on the data directory.
    #[arg(long)]
    pub no_lock: bool,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// A [`BookingService`] builder pointed at the configured files.
    pub fn service_builder(&self) -> BookingServiceBuilder {
        let lock_mode = if self.no_lock {
            LockMode::None
        } else {
            LockMode::Flock
        };
        BookingService::builder(&self.data_dir)
            .items_file(&self.items_file)
            .ledger_file(&self.ledger_file)
            .log_file(&self.log_file)
            .lock_mode(lock_mode)
    }
}
