//! Capture-to-file recording
//!
//! Appends every published frame to a pcap savefile, preserving the capture
//! timestamps. Verdicts of the detection modules have no influence on what
//! is recorded: the file shows the traffic as it arrived.

use pcap::{Packet, PacketHeader, Savefile};

use crate::bus::{Message, Module, Reception};

/// The pcap writer module.
pub struct PcapWriteModule {
    writer: Savefile,
}

impl PcapWriteModule {
    pub fn new(writer: Savefile) -> Self {
        Self { writer }
    }
}

impl Module for PcapWriteModule {
    fn name(&self) -> &'static str {
        "write"
    }

    fn topics(&self) -> &'static [&'static str] {
        &[crate::bus::TOPIC_PACKET]
    }

    fn receive(&mut self, message: &Message) -> Reception {
        if let Message::Packet(frame) = message {
            let header = PacketHeader {
                ts: libc::timeval {
                    tv_sec: frame.ts_sec as _,
                    tv_usec: frame.ts_usec as _,
                },
                caplen: frame.data.len() as u32,
                len: frame.orig_len.max(frame.data.len() as u32),
            };
            self.writer.write(&Packet::new(&header, &frame.data));
        }
        Reception::allow()
    }
}
