//! Detection modules
//!
//! Each module subscribes to one or more bus topics and votes on every frame
//! it sees. The reporting modules (`report`, `dns_inspect`, `pcap_write`)
//! always allow; only the DoS module ever vetoes.

pub mod arp_watch;
pub mod dns_inspect;
pub mod dos;
pub mod pcap_write;
pub mod report;
pub mod wifi;

pub use arp_watch::ArpWatchModule;
pub use dns_inspect::DnsInspectModule;
pub use dos::DosModule;
pub use pcap_write::PcapWriteModule;
pub use report::ReportModule;
pub use wifi::WifiModule;
