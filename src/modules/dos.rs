//! SYN flood mitigation
//!
//! Counts connection-opening SYNs over a rolling interval. Once the count
//! crosses the configured threshold, SYNs from sources that never completed
//! a handshake are dropped (vetoed) and answered with a best-effort TCP RST;
//! roughly one in a hundred is let through so legitimate clients retrying
//! during an attack still have a way in. Sources observed sending a plain
//! ACK are marked established and never rate-limited afterwards.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::MutableIpv4Packet;
use pnet::packet::tcp::MutableTcpPacket;
use pnet::transport::{transport_channel, TransportChannelType};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::bus::{Message, Module, Reception};
use crate::config::Config;
use crate::core::layers::{Ipv4Info, TcpInfo};

/// One in this many over-threshold SYNs is forwarded anyway.
const FORWARD_MODULUS: u32 = 100;

/// Mutable detection state, guarded by the module's single mutex.
#[derive(Debug)]
struct DosState {
    /// SYNs seen in the current interval.
    syns: u32,
    window_start: Instant,
    /// Sources that completed a handshake at some point.
    established: HashMap<Ipv4Addr, bool>,
}

impl DosState {
    /// Reset the counter when the interval has elapsed. Called on every
    /// observation, so the counter never survives a full quiet interval.
    fn rollover(&mut self, interval: Duration) {
        if self.window_start.elapsed() >= interval {
            self.syns = 0;
            self.window_start = Instant::now();
        }
    }
}

/// The SYN flood mitigation module.
pub struct DosModule {
    threshold: u32,
    interval: Duration,
    own_ip: Option<Ipv4Addr>,
    state: Mutex<DosState>,
}

impl DosModule {
    pub fn new() -> Self {
        Self {
            threshold: 1,
            interval: Duration::from_millis(1000),
            own_ip: None,
            state: Mutex::new(DosState {
                syns: 0,
                window_start: Instant::now(),
                established: HashMap::new(),
            }),
        }
    }

    /// Local address discovered at init, if any. The transport channel lets
    /// the kernel pick the egress, so this is informational.
    pub fn own_ip(&self) -> Option<Ipv4Addr> {
        self.own_ip
    }

    /// SYN count of the current interval.
    pub fn current_syns(&self) -> u32 {
        let mut state = self.state.lock();
        state.rollover(self.interval);
        state.syns
    }

    /// Whether the source has ever completed a handshake.
    pub fn is_established(&self, src: Ipv4Addr) -> bool {
        self.state
            .lock()
            .established
            .get(&src)
            .copied()
            .unwrap_or(false)
    }

    fn handle_tcp(&self, ip: &Ipv4Info, tcp: &TcpInfo) -> bool {
        if tcp.flags.is_syn() {
            let mut state = self.state.lock();
            state.rollover(self.interval);
            state.syns += 1;

            let established = state.established.get(&ip.src_addr).copied().unwrap_or(false);
            let over_threshold = state.syns > self.threshold;
            drop(state);

            if !established && over_threshold {
                if rand::rng().random_range(0..FORWARD_MODULUS) == 1 {
                    return true;
                }
                self.send_reset(ip, tcp);
                return false;
            }
        } else if tcp.flags.is_ack() {
            self.state.lock().established.insert(ip.src_addr, true);
        }
        true
    }

    /// Answer the rejected SYN with a RST. Emission is best effort: the raw
    /// socket needs privileges, and failures must not stall the pipeline.
    fn send_reset(&self, ip: &Ipv4Info, tcp: &TcpInfo) {
        let packet = match build_reset(ip, tcp) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("failed to build RST packet: {:#}", e);
                return;
            }
        };
        if let Err(e) = send_raw_ipv4(&packet, ip.src_addr) {
            debug!("failed to send RST to {}: {:#}", ip.src_addr, e);
        }
    }
}

impl Default for DosModule {
    fn default() -> Self {
        Self::new()
    }
}

/// Construct the IPv4+TCP reset answering the given SYN: addresses swapped,
/// sequence number advanced by one, RST flag set, checksums computed.
fn build_reset(ip: &Ipv4Info, tcp: &TcpInfo) -> Result<Vec<u8>> {
    // Source and destination trade places.
    let src = ip.dst_addr;
    let dst = ip.src_addr;

    let mut buf = vec![0u8; 40];

    {
        let mut tcp_packet =
            MutableTcpPacket::new(&mut buf[20..]).ok_or_else(|| anyhow!("TCP buffer too small"))?;
        tcp_packet.set_source(tcp.src_port);
        tcp_packet.set_destination(tcp.dst_port);
        tcp_packet.set_sequence(tcp.seq.wrapping_add(1));
        tcp_packet.set_acknowledgement(tcp.ack);
        tcp_packet.set_data_offset(5);
        tcp_packet.set_flags(pnet::packet::tcp::TcpFlags::RST);
        tcp_packet.set_window(tcp.window);
        let checksum = pnet::packet::tcp::ipv4_checksum(&tcp_packet.to_immutable(), &src, &dst);
        tcp_packet.set_checksum(checksum);
    }

    {
        let mut ip_packet =
            MutableIpv4Packet::new(&mut buf).ok_or_else(|| anyhow!("IP buffer too small"))?;
        ip_packet.set_version(4);
        ip_packet.set_header_length(5);
        ip_packet.set_total_length(40);
        ip_packet.set_ttl(64);
        ip_packet.set_next_level_protocol(IpNextHeaderProtocols::Tcp);
        ip_packet.set_source(src);
        ip_packet.set_destination(dst);
        let checksum = pnet::packet::ipv4::checksum(&ip_packet.to_immutable());
        ip_packet.set_checksum(checksum);
    }

    Ok(buf)
}

/// Write a complete IPv4 packet through a raw socket. The socket is opened
/// per emission and closed on return.
fn send_raw_ipv4(packet: &[u8], dst: Ipv4Addr) -> Result<()> {
    let protocol = TransportChannelType::Layer3(IpNextHeaderProtocols::Tcp);
    let (mut tx, _rx) =
        transport_channel(4096, protocol).context("failed to open raw IPv4 socket")?;
    let ip_packet = pnet::packet::ipv4::Ipv4Packet::new(packet)
        .ok_or_else(|| anyhow!("invalid IPv4 packet"))?;
    tx.send_to(ip_packet, IpAddr::V4(dst))
        .context("raw socket write failed")?;
    Ok(())
}

/// First non-loopback local IPv4 address.
fn first_local_ipv4() -> Option<Ipv4Addr> {
    for interface in pnet::datalink::interfaces() {
        if interface.is_loopback() {
            continue;
        }
        for network in &interface.ips {
            if let IpAddr::V4(addr) = network.ip() {
                return Some(addr);
            }
        }
    }
    None
}

impl Module for DosModule {
    fn name(&self) -> &'static str {
        "dos"
    }

    fn topics(&self) -> &'static [&'static str] {
        &[crate::bus::TOPIC_PACKET]
    }

    fn init(&mut self, config: &Config) -> Result<()> {
        self.threshold = config.syn_threshold;
        self.interval = Duration::from_millis(config.syn_interval);
        config
            .forward_ip
            .parse::<Ipv4Addr>()
            .with_context(|| format!("can't parse forwarding IP address: {}", config.forward_ip))?;

        self.own_ip = first_local_ipv4();
        match self.own_ip {
            Some(addr) => info!("found local IP: {}", addr),
            None => warn!("no non-loopback IPv4 address found; RST source discovery degraded"),
        }

        self.state.lock().window_start = Instant::now();
        Ok(())
    }

    fn receive(&mut self, message: &Message) -> Reception {
        let Message::Packet(frame) = message else {
            return Reception::allow();
        };
        let (Some(ip), Some(tcp)) = (frame.ipv4(), frame.tcp()) else {
            return Reception::allow();
        };

        if self.handle_tcp(ip, tcp) {
            Reception::allow()
        } else {
            Reception::veto()
        }
    }
}
