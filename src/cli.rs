use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "packetward")]
#[command(author, version, about = "inline intrusion prevention system")]
pub struct Cli {
    /// The device to capture packets from.
    #[arg(long, default_value = "enp9s0")]
    pub device: String,

    /// The maximum size to read for each packet.
    #[arg(long, default_value_t = 65535)]
    pub snaplen: i32,

    /// Put the device in promiscuous mode.
    #[arg(long)]
    pub promiscuous: bool,

    /// Save the recorded packets into the file specified by this flag.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Read packets from the file specified by this flag instead of a device.
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Set a BPF expression to filter captured packets.
    #[arg(long)]
    pub filter: Option<String>,

    /// Path to the configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub debug: bool,
}
