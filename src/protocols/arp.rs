//! ARP wire-format decoding (RFC 826)
//!
//! Only Ethernet hardware addressing is supported; the protocol address
//! space may be IPv4, ARP or IPv6.

use std::fmt;

use thiserror::Error;

/// The Ethernet broadcast hardware address.
pub const BROADCAST_ADDR: [u8; 6] = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff];

/// Errors produced while decoding an ARP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArpError {
    #[error("packet too short for ARP")]
    Truncated,
    #[error("link layer protocols other than Ethernet are not supported")]
    UnsupportedHardwareType,
    #[error("ethernet types other than IPv4, ARP and IPv6 are not supported")]
    UnsupportedProtocolType,
    #[error("opcode should be 1 (request) or 2 (reply)")]
    UnsupportedOpcode,
}

/// Hardware address space (ar$hrd).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareType {
    Ethernet,
}

impl fmt::Display for HardwareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareType::Ethernet => write!(f, "Ethernet"),
        }
    }
}

/// Protocol address space (ar$pro), drawn from the EtherType registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolType {
    Ipv4,
    Arp,
    Ipv6,
}

impl ProtocolType {
    pub fn to_u16(self) -> u16 {
        match self {
            ProtocolType::Ipv4 => 0x0800,
            ProtocolType::Arp => 0x0806,
            ProtocolType::Ipv6 => 0x86dd,
        }
    }
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolType::Ipv4 => write!(f, "IPv4"),
            ProtocolType::Arp => write!(f, "ARP"),
            ProtocolType::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// Kind of ARP packet (ar$op).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Request,
    Reply,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Request => write!(f, "Request"),
            Opcode::Reply => write!(f, "Reply"),
        }
    }
}

/// A decoded ARP packet.
///
/// The address fields keep their wire length: `h_length` bytes for hardware
/// addresses, `p_length` bytes for protocol addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPacket {
    pub hardware_type: HardwareType,
    pub protocol_type: ProtocolType,
    pub h_length: u8,
    pub p_length: u8,
    pub opcode: Opcode,
    pub sender_hw: Vec<u8>,
    pub sender_proto: Vec<u8>,
    pub target_hw: Vec<u8>,
    pub target_proto: Vec<u8>,
}

impl ArpPacket {
    /// Decode an ARP payload. The caller supplies exactly the ARP layer.
    pub fn decode(data: &[u8]) -> Result<ArpPacket, ArpError> {
        if data.len() < 8 {
            return Err(ArpError::Truncated);
        }

        let hardware_type = match u16::from_be_bytes([data[0], data[1]]) {
            1 => HardwareType::Ethernet,
            _ => return Err(ArpError::UnsupportedHardwareType),
        };
        let protocol_type = match u16::from_be_bytes([data[2], data[3]]) {
            0x0800 => ProtocolType::Ipv4,
            0x0806 => ProtocolType::Arp,
            0x86dd => ProtocolType::Ipv6,
            _ => return Err(ArpError::UnsupportedProtocolType),
        };
        let h_length = data[4];
        let p_length = data[5];
        let opcode = match u16::from_be_bytes([data[6], data[7]]) {
            1 => Opcode::Request,
            2 => Opcode::Reply,
            _ => return Err(ArpError::UnsupportedOpcode),
        };

        let h = h_length as usize;
        let p = p_length as usize;
        if data.len() < 8 + 2 * (h + p) {
            return Err(ArpError::Truncated);
        }

        Ok(ArpPacket {
            hardware_type,
            protocol_type,
            h_length,
            p_length,
            opcode,
            sender_hw: data[8..8 + h].to_vec(),
            sender_proto: data[8 + h..8 + h + p].to_vec(),
            target_hw: data[8 + h + p..8 + 2 * h + p].to_vec(),
            target_proto: data[8 + 2 * h + p..8 + 2 * (h + p)].to_vec(),
        })
    }

    /// Serialise back to the wire layout. Inverse of [`ArpPacket::decode`]
    /// for well-formed packets.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + 2 * (self.h_length as usize + self.p_length as usize));
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&self.protocol_type.to_u16().to_be_bytes());
        out.push(self.h_length);
        out.push(self.p_length);
        let opcode: u16 = match self.opcode {
            Opcode::Request => 1,
            Opcode::Reply => 2,
        };
        out.extend_from_slice(&opcode.to_be_bytes());
        out.extend_from_slice(&self.sender_hw);
        out.extend_from_slice(&self.sender_proto);
        out.extend_from_slice(&self.target_hw);
        out.extend_from_slice(&self.target_proto);
        out
    }

    /// A request not addressed to the Ethernet broadcast address.
    pub fn is_unicast_request(&self) -> bool {
        self.target_hw != BROADCAST_ADDR
    }

    /// Sender announcing its own binding: sender and target protocol
    /// addresses match and the target hardware address is broadcast.
    pub fn is_gratuitous(&self) -> bool {
        self.sender_proto == self.target_proto && self.target_hw == BROADCAST_ADDR
    }

    /// Sender claiming the Ethernet broadcast address as its own.
    pub fn is_binding_ethernet(&self) -> bool {
        self.sender_hw == BROADCAST_ADDR
    }

    /// Reply addressed to the broadcast protocol address.
    pub fn is_broadcast_reply(&self) -> bool {
        self.target_proto == BROADCAST_ADDR
    }
}

/// Render a hardware address in the usual colon-separated form.
pub fn fmt_hardware_addr(addr: &[u8]) -> String {
    addr.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Render a protocol address: dotted quad for IPv4-sized addresses,
/// hex bytes otherwise.
pub fn fmt_protocol_addr(addr: &[u8]) -> String {
    if addr.len() == 4 {
        format!("{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
    } else {
        fmt_hardware_addr(addr)
    }
}
