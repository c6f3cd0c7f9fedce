//! Pipeline driver
//!
//! Owns the capture handle, wires the modules onto the bus, and processes
//! frames until the source is exhausted:
//!
//! ```text
//!   capture -> publish("packet") -> [arp, wifi, dos, dns, write] -> verdict
//!                                         |                           |
//!                                         +--> publish("log") -> report
//!                                                                    |
//!                                               forward to fwd_ip <--+-- or drop
//! ```
//!
//! Frames are processed sequentially: the ARP and wireless modules depend on
//! observing frames in capture order.

pub mod capture;

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use pnet::packet::ipv4::MutableIpv4Packet;
use pnet::packet::tcp::MutableTcpPacket;
use pnet::packet::udp::MutableUdpPacket;
use tracing::{debug, info, warn};

use crate::bus::{Bus, Message, Module, TOPIC_PACKET};
use crate::config::Config;
use crate::core::{parse_frame, Frame, Layer4};
use crate::modules::{
    ArpWatchModule, DnsInspectModule, DosModule, PcapWriteModule, ReportModule, WifiModule,
};

pub use capture::{CaptureHandle, RawFrame};

/// Capture-side options, resolved from the command line.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub device: String,
    pub snaplen: i32,
    pub promiscuous: bool,
    /// Record captured frames to this pcap file.
    pub path: Option<PathBuf>,
    /// Replay frames from this pcap file instead of capturing live.
    pub source: Option<PathBuf>,
    /// BPF expression to apply to the capture.
    pub filter: Option<String>,
}

/// Run the pipeline until the capture source is exhausted.
pub fn run(options: &CaptureOptions, config: &Config) -> Result<()> {
    let mut capture = match &options.source {
        Some(source) => CaptureHandle::open_file(source)?,
        None => CaptureHandle::open_device(&options.device, options.snaplen, options.promiscuous)?,
    };

    if let Some(filter) = &options.filter {
        capture.apply_filter(filter)?;
    }

    let forward_ip: Ipv4Addr = config
        .forward_ip
        .parse()
        .with_context(|| format!("can't parse forwarding IP address: {}", config.forward_ip))?;

    let mut modules: Vec<Box<dyn Module>> = vec![
        Box::new(ArpWatchModule::new()),
        Box::new(WifiModule::new()),
        Box::new(DosModule::new()),
        Box::new(DnsInspectModule::new()),
        Box::new(ReportModule::new()),
    ];

    // Recording runs as just another subscriber on the packet topic; it
    // applies to live capture only.
    if let (Some(path), None) = (&options.path, &options.source) {
        match capture.savefile(path) {
            Ok(savefile) => modules.push(Box::new(PcapWriteModule::new(savefile))),
            Err(e) => warn!("recording disabled: {:#}", e),
        }
    }

    let mut bus = Bus::new();
    for mut module in modules {
        match module.init(config) {
            Ok(()) => bus.subscribe(module),
            Err(e) => warn!("module {} disabled: {:#}", module.name(), e),
        }
    }
    info!("{} modules subscribed", bus.len());

    let link = capture.link_kind();
    let mut forwarded = 0u64;
    let mut dropped = 0u64;

    while let Some(raw) = capture.next_frame()? {
        let frame = Arc::new(
            parse_frame(raw.data, link).with_timestamp(raw.ts_sec, raw.ts_usec, raw.orig_len),
        );

        if bus.publish(TOPIC_PACKET, &Message::Packet(frame.clone())) {
            forward(&mut capture, &frame, forward_ip);
            forwarded += 1;
        } else {
            debug!("dropping vetoed frame");
            dropped += 1;
        }
    }

    info!(forwarded, dropped, "capture source exhausted");
    Ok(())
}

/// Forward a frame downstream: rewrite the IPv4 destination to the
/// configured address, fix the checksums the rewrite invalidated, and emit
/// the frame through the capture handle.
fn forward(capture: &mut CaptureHandle, frame: &Frame, forward_ip: Ipv4Addr) {
    let mut data = frame.data.clone();
    rewrite_destination(&mut data, frame, forward_ip);
    if let Err(e) = capture.inject(&data) {
        warn!("forwarding failed: {:#}", e);
    }
}

fn rewrite_destination(data: &mut [u8], frame: &Frame, forward_ip: Ipv4Addr) {
    let (Some(ipv4), Some(l3_offset)) = (frame.ipv4(), frame.l3_offset) else {
        return;
    };
    let src = ipv4.src_addr;

    {
        let Some(mut ip_packet) = MutableIpv4Packet::new(&mut data[l3_offset..]) else {
            return;
        };
        ip_packet.set_destination(forward_ip);
        let checksum = pnet::packet::ipv4::checksum(&ip_packet.to_immutable());
        ip_packet.set_checksum(checksum);
    }

    // The transport checksum covers a pseudo-header that includes the
    // destination address.
    let Some(l4_offset) = frame.l4_offset else {
        return;
    };
    match &frame.layer4 {
        Some(Layer4::Tcp(_)) => {
            if let Some(mut tcp_packet) = MutableTcpPacket::new(&mut data[l4_offset..]) {
                tcp_packet.set_checksum(0);
                let checksum = pnet::packet::tcp::ipv4_checksum(
                    &tcp_packet.to_immutable(),
                    &src,
                    &forward_ip,
                );
                tcp_packet.set_checksum(checksum);
            }
        }
        Some(Layer4::Udp(_)) => {
            if let Some(mut udp_packet) = MutableUdpPacket::new(&mut data[l4_offset..]) {
                recompute_udp_checksum(&mut udp_packet, src, forward_ip);
            }
        }
        _ => {}
    }
}

/// A zero UDP checksum means "not computed" and stays zero; anything else is
/// recomputed over the new pseudo-header.
fn recompute_udp_checksum(udp_packet: &mut MutableUdpPacket<'_>, src: Ipv4Addr, dst: Ipv4Addr) {
    if udp_packet.get_checksum() == 0 {
        return;
    }
    udp_packet.set_checksum(0);
    let checksum = pnet::packet::udp::ipv4_checksum(&udp_packet.to_immutable(), &src, &dst);
    udp_packet.set_checksum(checksum);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LinkKind;
    use crate::testing::synthetic;
    use pnet::packet::Packet;

    #[test]
    fn rewrite_changes_destination_and_checksums() {
        let src = Ipv4Addr::new(10, 0, 0, 1);
        let dst = Ipv4Addr::new(10, 0, 0, 2);
        let fwd = Ipv4Addr::new(127, 0, 0, 1);

        let frame = parse_frame(
            synthetic::tcp_frame(src, dst, 40000, 80, 0x02, 1),
            LinkKind::Ethernet,
        );
        let mut data = frame.data.clone();
        rewrite_destination(&mut data, &frame, fwd);

        let ip_packet = pnet::packet::ipv4::Ipv4Packet::new(&data[14..]).unwrap();
        assert_eq!(ip_packet.get_destination(), fwd);
        assert_eq!(ip_packet.get_source(), src);
        assert_eq!(
            ip_packet.get_checksum(),
            pnet::packet::ipv4::checksum(&ip_packet)
        );

        let tcp_packet = pnet::packet::tcp::TcpPacket::new(ip_packet.payload()).unwrap();
        assert_eq!(
            tcp_packet.get_checksum(),
            {
                let mut copy = data[34..].to_vec();
                let mut rebuilt = MutableTcpPacket::new(&mut copy).unwrap();
                rebuilt.set_checksum(0);
                pnet::packet::tcp::ipv4_checksum(&rebuilt.to_immutable(), &src, &fwd)
            }
        );
    }

    #[test]
    fn rewrite_leaves_non_ip_frames_alone() {
        let arp = synthetic::arp_request(
            [0x02, 0, 0, 0, 0, 0x02],
            Ipv4Addr::new(192, 168, 0, 1),
            [0xff; 6],
            Ipv4Addr::new(192, 168, 0, 2),
        );
        let frame = parse_frame(synthetic::arp_frame(&arp), LinkKind::Ethernet);
        let mut data = frame.data.clone();
        rewrite_destination(&mut data, &frame, Ipv4Addr::new(127, 0, 0, 1));
        assert_eq!(data, frame.data);
    }
}
