//! Capture handle
//!
//! Wraps the two pcap capture modes behind one interface:
//! - live capture from a network device
//! - offline replay of a previously recorded file
//!
//! The handle also carries the write primitives: packet injection on a live
//! device and savefile creation for recording.

use std::path::Path;

use anyhow::{Context, Result};
use pcap::{Active, Capture, Offline, Savefile};
use tracing::debug;

use crate::core::LinkKind;

/// Read timeout for live captures, in milliseconds. Keeps the read loop
/// responsive without busy-waiting.
const READ_TIMEOUT_MS: i32 = 500;

/// One frame as delivered by libpcap.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub ts_sec: i64,
    pub ts_usec: i64,
    pub orig_len: u32,
}

/// A live or offline capture source.
pub enum CaptureHandle {
    Live(Capture<Active>),
    File(Capture<Offline>),
}

impl CaptureHandle {
    /// Open a device for live capture.
    pub fn open_device(device: &str, snaplen: i32, promiscuous: bool) -> Result<Self> {
        let capture = Capture::from_device(device)
            .with_context(|| format!("failed to open device {}", device))?
            .promisc(promiscuous)
            .snaplen(snaplen)
            .timeout(READ_TIMEOUT_MS)
            .open()
            .with_context(|| format!("failed to activate capture on {}", device))?;
        Ok(CaptureHandle::Live(capture))
    }

    /// Open a recorded capture file for replay.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let capture = Capture::from_file(&path)
            .with_context(|| format!("failed to open capture file {}", path.as_ref().display()))?;
        Ok(CaptureHandle::File(capture))
    }

    /// Apply a BPF expression.
    pub fn apply_filter(&mut self, bpf: &str) -> Result<()> {
        match self {
            CaptureHandle::Live(capture) => capture.filter(bpf, true),
            CaptureHandle::File(capture) => capture.filter(bpf, true),
        }
        .with_context(|| format!("invalid BPF expression: {}", bpf))
    }

    /// Link type of the capture source.
    pub fn link_kind(&self) -> LinkKind {
        let linktype = match self {
            CaptureHandle::Live(capture) => capture.get_datalink(),
            CaptureHandle::File(capture) => capture.get_datalink(),
        };
        match linktype.0 {
            1 => LinkKind::Ethernet,
            105 => LinkKind::Ieee80211,
            127 => LinkKind::Radiotap,
            other => LinkKind::Other(other),
        }
    }

    /// Read the next frame. Returns `None` at end of file; live read
    /// timeouts are retried internally.
    pub fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        loop {
            let result = match self {
                CaptureHandle::Live(capture) => capture.next_packet(),
                CaptureHandle::File(capture) => capture.next_packet(),
            };
            match result {
                Ok(packet) => {
                    return Ok(Some(RawFrame {
                        data: packet.data.to_vec(),
                        ts_sec: packet.header.ts.tv_sec as i64,
                        ts_usec: packet.header.ts.tv_usec as i64,
                        orig_len: packet.header.len,
                    }));
                }
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(pcap::Error::NoMorePackets) => return Ok(None),
                Err(e) => return Err(e).context("capture read failed"),
            }
        }
    }

    /// Emit a frame on the wire. Replay sources have no wire; the frame is
    /// dropped with a debug note.
    pub fn inject(&mut self, data: &[u8]) -> Result<()> {
        match self {
            CaptureHandle::Live(capture) => capture
                .sendpacket(data)
                .context("packet injection failed"),
            CaptureHandle::File(_) => {
                debug!("offline source: not injecting {} bytes", data.len());
                Ok(())
            }
        }
    }

    /// Create a savefile recording frames in libpcap format.
    pub fn savefile<P: AsRef<Path>>(&self, path: P) -> Result<Savefile> {
        match self {
            CaptureHandle::Live(capture) => capture.savefile(&path),
            CaptureHandle::File(capture) => capture.savefile(&path),
        }
        .with_context(|| format!("failed to create capture file {}", path.as_ref().display()))
    }
}
