//! Synthetic frame builders
//!
//! Hand-built Ethernet and 802.11 frames for exercising the pipeline without
//! a capture device. Checksums are left zeroed; the parser does not verify
//! them.

use std::net::Ipv4Addr;

use crate::core::layers::ether_types;
use crate::protocols::arp::{ArpPacket, HardwareType, Opcode, ProtocolType};

const DST_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x01];
const SRC_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x02];

fn ethernet_header(dst: [u8; 6], src: [u8; 6], ethertype: u16) -> Vec<u8> {
    let mut data = Vec::with_capacity(14);
    data.extend_from_slice(&dst);
    data.extend_from_slice(&src);
    data.extend_from_slice(&ethertype.to_be_bytes());
    data
}

/// Ethernet + IPv4 + TCP frame with the given flags and no payload.
pub fn tcp_frame(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    flags: u8,
    seq: u32,
) -> Vec<u8> {
    let mut data = ethernet_header(DST_MAC, SRC_MAC, ether_types::IPV4);
    // IPv4: 20-byte header, 20-byte TCP, no payload
    data.extend_from_slice(&[0x45, 0x00]);
    data.extend_from_slice(&40u16.to_be_bytes());
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    data.push(64); // TTL
    data.push(6); // TCP
    data.extend_from_slice(&[0x00, 0x00]); // header checksum
    data.extend_from_slice(&src.octets());
    data.extend_from_slice(&dst.octets());
    // TCP
    data.extend_from_slice(&src_port.to_be_bytes());
    data.extend_from_slice(&dst_port.to_be_bytes());
    data.extend_from_slice(&seq.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes()); // ack
    data.push(0x50); // data offset = 5
    data.push(flags);
    data.extend_from_slice(&1024u16.to_be_bytes()); // window
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // checksum, urgent
    data
}

/// Ethernet + IPv4 + UDP frame carrying `payload` between the given ports.
pub fn udp_frame(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let udp_len = 8 + payload.len() as u16;
    let total_len = 20 + udp_len;

    let mut data = ethernet_header(DST_MAC, SRC_MAC, ether_types::IPV4);
    data.extend_from_slice(&[0x45, 0x00]);
    data.extend_from_slice(&total_len.to_be_bytes());
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    data.push(64);
    data.push(17); // UDP
    data.extend_from_slice(&[0x00, 0x00]);
    data.extend_from_slice(&src.octets());
    data.extend_from_slice(&dst.octets());
    // UDP
    data.extend_from_slice(&src_port.to_be_bytes());
    data.extend_from_slice(&dst_port.to_be_bytes());
    data.extend_from_slice(&udp_len.to_be_bytes());
    data.extend_from_slice(&[0x00, 0x00]); // checksum
    data.extend_from_slice(payload);
    data
}

/// Ethernet frame carrying the given ARP packet.
pub fn arp_frame(arp: &ArpPacket) -> Vec<u8> {
    let mut src = [0u8; 6];
    if arp.sender_hw.len() == 6 {
        src.copy_from_slice(&arp.sender_hw);
    }
    let mut data = ethernet_header([0xff; 6], src, ether_types::ARP);
    data.extend_from_slice(&arp.encode());
    data
}

/// An ARP request from `sender` looking for `target`.
pub fn arp_request(
    sender_hw: [u8; 6],
    sender_ip: Ipv4Addr,
    target_hw: [u8; 6],
    target_ip: Ipv4Addr,
) -> ArpPacket {
    ArpPacket {
        hardware_type: HardwareType::Ethernet,
        protocol_type: ProtocolType::Ipv4,
        h_length: 6,
        p_length: 4,
        opcode: Opcode::Request,
        sender_hw: sender_hw.to_vec(),
        sender_proto: sender_ip.octets().to_vec(),
        target_hw: target_hw.to_vec(),
        target_proto: target_ip.octets().to_vec(),
    }
}

/// An ARP reply answering `arp_request` with swapped roles.
pub fn arp_reply(
    sender_hw: [u8; 6],
    sender_ip: Ipv4Addr,
    target_hw: [u8; 6],
    target_ip: Ipv4Addr,
) -> ArpPacket {
    ArpPacket {
        opcode: Opcode::Reply,
        ..arp_request(sender_hw, sender_ip, target_hw, target_ip)
    }
}

/// A raw 802.11 deauthentication frame aimed at `addr1`.
pub fn dot11_deauth(addr1: [u8; 6], reason_code: u16) -> Vec<u8> {
    let mut data = vec![0xc0, 0x00, 0x00, 0x00];
    data.extend_from_slice(&addr1);
    data.extend_from_slice(&SRC_MAC);
    data.extend_from_slice(&SRC_MAC); // BSSID
    data.extend_from_slice(&[0x00, 0x00]);
    data.extend_from_slice(&reason_code.to_le_bytes());
    data
}

/// A raw protected (WEP) 802.11 data frame with the given ciphertext body.
pub fn dot11_wep_data(addr1: [u8; 6], ciphertext: &[u8]) -> Vec<u8> {
    let mut data = vec![0x08, 0x40, 0x00, 0x00];
    data.extend_from_slice(&addr1);
    data.extend_from_slice(&SRC_MAC);
    data.extend_from_slice(&SRC_MAC);
    data.extend_from_slice(&[0x00, 0x00]);
    data.extend_from_slice(ciphertext);
    data
}
