//! Link-type-aware frame parsing
//!
//! Ethernet, IPv4/IPv6 and TCP/UDP fields come from `etherparse`; 802.11
//! frames go through this crate's own decoder. ARP and DNS payloads are not
//! decoded here - the detection modules run those decoders on the payload
//! slices the frame exposes.

use etherparse::{NetSlice, SlicedPacket, TransportSlice};

use super::layers::{
    ether_types, EthernetInfo, Ipv4Info, Ipv6Info, Layer3, Layer4, TcpFlags, TcpInfo, UdpInfo,
};
use super::packet::{Frame, LinkKind};
use crate::wireless::frame::Dot11Frame;
use crate::wireless::radiotap;

/// Parse one captured frame according to the capture source's link type.
///
/// Parsing never fails: unrecognised or malformed frames simply carry fewer
/// decoded views.
pub fn parse_frame(data: Vec<u8>, link: LinkKind) -> Frame {
    match link {
        LinkKind::Ethernet => parse_ethernet(data),
        LinkKind::Ieee80211 => parse_dot11(data, 0),
        LinkKind::Radiotap => {
            let offset = radiotap::header_len(&data).unwrap_or(0);
            parse_dot11(data, offset)
        }
        LinkKind::Other(_) => Frame::undecoded(data, link),
    }
}

fn parse_ethernet(data: Vec<u8>) -> Frame {
    let mut frame = Frame::undecoded(data, LinkKind::Ethernet);

    let Some((ethernet, l3_offset)) = parse_ethernet_header(&frame.data) else {
        return frame;
    };
    frame.link_payload_offset = Some(l3_offset);
    frame.ethernet = Some(ethernet);

    let Ok(sliced) = SlicedPacket::from_ethernet(&frame.data) else {
        return frame;
    };

    match &sliced.net {
        Some(NetSlice::Ipv4(ipv4)) => {
            let header = ipv4.header();
            frame.l3_offset = Some(l3_offset);
            frame.l4_offset = Some(l3_offset + header.ihl() as usize * 4);
            frame.layer3 = Some(Layer3::Ipv4(Ipv4Info {
                src_addr: header.source_addr(),
                dst_addr: header.destination_addr(),
                protocol: header.protocol().0,
                ttl: header.ttl(),
                identification: header.identification(),
                header_len: header.ihl() as usize * 4,
                total_len: header.total_len(),
            }));
        }
        Some(NetSlice::Ipv6(ipv6)) => {
            let header = ipv6.header();
            frame.l3_offset = Some(l3_offset);
            frame.l4_offset = Some(l3_offset + 40);
            frame.layer3 = Some(Layer3::Ipv6(Ipv6Info {
                src_addr: header.source_addr(),
                dst_addr: header.destination_addr(),
                next_header: header.next_header().0,
                hop_limit: header.hop_limit(),
            }));
        }
        _ => return frame,
    }

    match &sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => {
            frame.layer4 = Some(Layer4::Tcp(TcpInfo {
                src_port: tcp.source_port(),
                dst_port: tcp.destination_port(),
                seq: tcp.sequence_number(),
                ack: tcp.acknowledgment_number(),
                window: tcp.window_size(),
                flags: TcpFlags {
                    fin: tcp.fin(),
                    syn: tcp.syn(),
                    rst: tcp.rst(),
                    psh: tcp.psh(),
                    ack: tcp.ack(),
                    urg: tcp.urg(),
                    ece: tcp.ece(),
                    cwr: tcp.cwr(),
                },
                header_len: tcp.data_offset() as usize * 4,
            }));
            // Offset from the header walk rather than the end of the buffer:
            // short frames may carry trailer padding past the IP payload.
            frame.payload_offset = frame
                .l4_offset
                .map(|l4| l4 + tcp.data_offset() as usize * 4);
            frame.payload_len = tcp.payload().len();
        }
        Some(TransportSlice::Udp(udp)) => {
            frame.layer4 = Some(Layer4::Udp(UdpInfo {
                src_port: udp.source_port(),
                dst_port: udp.destination_port(),
                length: udp.length(),
            }));
            frame.payload_offset = frame.l4_offset.map(|l4| l4 + 8);
            frame.payload_len = udp.payload().len();
        }
        _ => {}
    }

    frame
}

/// Manual Ethernet header walk: yields the L2 info and the payload offset,
/// stepping over a single 802.1Q tag.
fn parse_ethernet_header(data: &[u8]) -> Option<(EthernetInfo, usize)> {
    if data.len() < 14 {
        return None;
    }

    let mut dst_mac = [0u8; 6];
    let mut src_mac = [0u8; 6];
    dst_mac.copy_from_slice(&data[0..6]);
    src_mac.copy_from_slice(&data[6..12]);

    let mut ethertype = u16::from_be_bytes([data[12], data[13]]);
    let mut offset = 14;
    let mut vlan = None;

    if ethertype == ether_types::VLAN {
        if data.len() < 18 {
            return None;
        }
        vlan = Some(u16::from_be_bytes([data[14], data[15]]) & 0x0fff);
        ethertype = u16::from_be_bytes([data[16], data[17]]);
        offset = 18;
    }

    Some((
        EthernetInfo {
            src_mac,
            dst_mac,
            ethertype,
            vlan,
        },
        offset,
    ))
}

fn parse_dot11(data: Vec<u8>, offset: usize) -> Frame {
    let link = if offset == 0 {
        LinkKind::Ieee80211
    } else {
        LinkKind::Radiotap
    };
    let mut frame = Frame::undecoded(data, link);
    frame.link_payload_offset = Some(offset);
    frame.dot11 = frame.data.get(offset..).and_then(Dot11Frame::parse);
    frame
}
