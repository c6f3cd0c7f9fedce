//! Captured-frame representation and layer parsing

pub mod layers;
pub mod packet;
pub mod parser;

pub use layers::{EthernetInfo, Ipv4Info, Ipv6Info, Layer3, Layer4, TcpFlags, TcpInfo, UdpInfo};
pub use packet::{Frame, LinkKind};
pub use parser::parse_frame;
