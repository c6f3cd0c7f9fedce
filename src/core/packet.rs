//! Captured frame representation
//!
//! A [`Frame`] owns the raw link-layer bytes of one captured packet plus the
//! decoded layer views. The raw buffer is kept alongside the views because
//! forwarding and RST injection rewrite header bytes in place; the numeric
//! offsets locate each header inside `data`.
//!
//! Frames are immutable for the duration of dispatch; modules receive a
//! shared read-only view.

use super::layers::{ether_types, EthernetInfo, Ipv4Info, Layer3, Layer4, TcpInfo, UdpInfo};
use crate::wireless::frame::Dot11Frame;

/// Link layer of the capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Ethernet,
    /// Raw 802.11 frames.
    Ieee80211,
    /// 802.11 frames behind a radiotap header.
    Radiotap,
    Other(i32),
}

/// One captured frame with decoded layer accessors.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw link-layer bytes as captured.
    pub data: Vec<u8>,
    pub link: LinkKind,

    pub ethernet: Option<EthernetInfo>,
    pub layer3: Option<Layer3>,
    pub layer4: Option<Layer4>,
    /// Parsed 802.11 frame for wireless link types.
    pub dot11: Option<Dot11Frame>,

    /// Offset of the link-layer payload (past Ethernet/radiotap header).
    pub link_payload_offset: Option<usize>,
    /// Offset of the IP header within `data`.
    pub l3_offset: Option<usize>,
    /// Offset of the transport header within `data`.
    pub l4_offset: Option<usize>,
    /// Offset and length of the transport payload within `data`.
    pub payload_offset: Option<usize>,
    pub payload_len: usize,

    /// Capture timestamp (seconds, microseconds) and original wire length,
    /// carried for the pcap writer.
    pub ts_sec: i64,
    pub ts_usec: i64,
    pub orig_len: u32,
}

impl Frame {
    /// An undecoded frame; the parser fills in the views it recognises.
    pub fn undecoded(data: Vec<u8>, link: LinkKind) -> Self {
        Self {
            data,
            link,
            ethernet: None,
            layer3: None,
            layer4: None,
            dot11: None,
            link_payload_offset: None,
            l3_offset: None,
            l4_offset: None,
            payload_offset: None,
            payload_len: 0,
            ts_sec: 0,
            ts_usec: 0,
            orig_len: 0,
        }
    }

    pub fn with_timestamp(mut self, ts_sec: i64, ts_usec: i64, orig_len: u32) -> Self {
        self.ts_sec = ts_sec;
        self.ts_usec = ts_usec;
        self.orig_len = orig_len;
        self
    }

    pub fn ipv4(&self) -> Option<&Ipv4Info> {
        self.layer3.as_ref().and_then(Layer3::as_ipv4)
    }

    pub fn tcp(&self) -> Option<&TcpInfo> {
        self.layer4.as_ref().and_then(Layer4::as_tcp)
    }

    pub fn udp(&self) -> Option<&UdpInfo> {
        self.layer4.as_ref().and_then(Layer4::as_udp)
    }

    /// The transport payload bytes, if a transport layer was decoded.
    pub fn transport_payload(&self) -> Option<&[u8]> {
        let offset = self.payload_offset?;
        self.data.get(offset..offset + self.payload_len)
    }

    /// The ARP layer bytes, for Ethernet frames carrying ARP.
    pub fn arp_payload(&self) -> Option<&[u8]> {
        let eth = self.ethernet.as_ref()?;
        if eth.ethertype != ether_types::ARP {
            return None;
        }
        self.data.get(self.link_payload_offset?..)
    }

    /// The DNS payload for UDP frames on port 53, either direction.
    pub fn dns_payload(&self) -> Option<&[u8]> {
        let udp = self.udp()?;
        if udp.src_port != 53 && udp.dst_port != 53 {
            return None;
        }
        self.transport_payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecoded_frame_has_no_views() {
        let frame = Frame::undecoded(vec![0u8; 64], LinkKind::Ethernet);
        assert!(frame.ipv4().is_none());
        assert!(frame.tcp().is_none());
        assert!(frame.arp_payload().is_none());
        assert!(frame.dns_payload().is_none());
        assert!(frame.transport_payload().is_none());
    }
}
